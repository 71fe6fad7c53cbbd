use clipboard_rs::{Clipboard, ClipboardContext};
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::error::GameError;
use crate::model::*;
use crate::renderer::{GameView, Renderer};
use crate::session::{MoveOutcome, Session};

pub const HINTS: [&str; 6] = [
    "Try filling the largest bucket first.",
    "Use the smallest bucket as a measuring cup.",
    "Pour from the big buckets into the small ones.",
    "Empty the small bucket whenever it is full.",
    "Combine fill, pour and empty in a cycle.",
    "Work backwards from the amount you need.",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
    /// Asks before wiping the current game.
    ConfirmReset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(kind: NoticeKind, title: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn buttons(&self) -> Vec<Button> {
        match self.kind {
            NoticeKind::ConfirmReset => vec![
                Button::new("Yes", ControlAction::ConfirmReset, DANGER),
                Button::new("No", ControlAction::CancelDialog, NEUTRAL),
            ],
            _ => vec![Button::new("OK", ControlAction::Dismiss, WATER)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    None,
    Bucket(BucketId),
}

pub struct GameEngine {
    session: Session,
    buttons: Vec<Button>,
    renderer: Renderer,
    selected: Selection,
    notice: Option<Notice>,
}

impl GameEngine {
    pub fn new(session: Session) -> Self {
        let mut engine = Self {
            session,
            buttons: Vec::new(),
            renderer: Renderer::new(),
            selected: Selection::None,
            notice: None,
        };
        engine.rebuild_buttons();
        engine
    }

    pub fn get_session(&self) -> &Session {
        &self.session
    }

    pub fn get_notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn get_selected(&self) -> Option<BucketId> {
        match self.selected {
            Selection::Bucket(id) => Some(id),
            Selection::None => None,
        }
    }

    pub fn get_buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// One button per fill/empty, one per ordered pour pair, then presets and utilities.
    fn rebuild_buttons(&mut self) {
        let mut buttons: Vec<Button> = PRESETS
            .iter()
            .map(|preset| {
                let color = if Some(preset.difficulty) == self.session.get_difficulty() {
                    WATER
                } else {
                    WATER_LIGHT
                };
                Button::new(
                    &preset.get_label(),
                    ControlAction::ChangeDifficulty(preset.difficulty),
                    color,
                )
            })
            .collect();

        let ids: Vec<BucketId> = self.session.get_buckets().iter().map(|b| b.get_id()).collect();
        for &id in &ids {
            buttons.push(Button::new("Fill", ControlAction::Fill(id), WATER));
            buttons.push(Button::new("Empty", ControlAction::Empty(id), DANGER));
        }
        for &from in &ids {
            for &to in &ids {
                if from != to {
                    buttons.push(Button::new(
                        &format!("{from}L > {to}L"),
                        ControlAction::Pour(from, to),
                        POUR,
                    ));
                }
            }
        }
        buttons.push(Button::new("Hint", ControlAction::Hint, HINT));
        buttons.push(Button::new("Reset", ControlAction::RequestReset, NEUTRAL));
        buttons.push(Button::new("Copy log", ControlAction::CopyHistory, COPY));
        self.buttons = buttons;
    }

    pub fn render(&mut self) {
        self.renderer.autoset_viewport();
        let notice_buttons = self.notice.as_ref().map(Notice::buttons).unwrap_or_default();
        let view = GameView {
            session: &self.session,
            buttons: &self.buttons,
            selected: self.get_selected(),
            notice: self.notice.as_ref(),
            notice_buttons: &notice_buttons,
        };
        self.renderer.render_game(&view);
    }

    pub fn handle_click(&mut self, x: f32, y: f32) {
        if let Some(hit) = self.renderer.get_hit_test_registry().hit_test(x, y) {
            let item = hit.item;
            self.handle_hit_item(item);
        }
    }

    fn handle_hit_item(&mut self, item: HitItem) {
        let action = match item {
            HitItem::Backdrop => return,
            HitItem::Button { action } => action,
            HitItem::Bucket { id } => match self.selected {
                Selection::Bucket(from) if from == id => ControlAction::Deselect,
                Selection::Bucket(_) => ControlAction::PourSelected(id),
                Selection::None => ControlAction::SelectBucket(id),
            },
        };
        self.handle_game_action(action);
    }

    pub fn handle_game_action(&mut self, action: ControlAction) {
        let modal_action = matches!(
            action,
            ControlAction::Dismiss | ControlAction::ConfirmReset | ControlAction::CancelDialog
        );
        if self.notice.is_some() != modal_action {
            debug!(?action, "ignored while the dialog state does not allow it");
            return;
        }
        if action == ControlAction::ConfirmReset
            && self.notice.as_ref().map(|n| n.kind) != Some(NoticeKind::ConfirmReset)
        {
            debug!("reset confirmation without a pending request");
            return;
        }
        match action {
            ControlAction::Fill(id) => {
                let result = self.session.fill(id);
                self.report_move(result);
            }
            ControlAction::Empty(id) => {
                let result = self.session.empty(id);
                self.report_move(result);
            }
            ControlAction::Pour(from, to) => {
                let result = self.session.pour(from, to);
                self.report_move(result);
            }
            ControlAction::PourSelected(to) => {
                let Selection::Bucket(from) = self.selected else {
                    self.selected = Selection::Bucket(to);
                    return;
                };
                match self.session.pour(from, to) {
                    Ok(outcome) => {
                        self.selected = Selection::None;
                        self.report_move(Ok(outcome));
                    }
                    // A click pour that does nothing just picks the clicked bucket.
                    Err(err) if err.is_no_op() => {
                        debug!(error = %err, bucket = %to, "click pour rejected, reselecting");
                        self.selected = Selection::Bucket(to);
                    }
                    Err(err) => {
                        self.selected = Selection::None;
                        self.report_move(Err(err));
                    }
                }
            }
            ControlAction::SelectBucket(id) => {
                debug!(bucket = %id, "selected");
                self.selected = Selection::Bucket(id);
            }
            ControlAction::Deselect => {
                self.selected = Selection::None;
            }
            ControlAction::ChangeDifficulty(difficulty) => {
                self.change_difficulty(difficulty);
            }
            ControlAction::RequestReset => {
                self.notice = Some(Notice::new(
                    NoticeKind::ConfirmReset,
                    "Reset",
                    "Are you sure you want to reset the game?",
                ));
            }
            ControlAction::ConfirmReset => {
                self.session.reset();
                self.selected = Selection::None;
                info!("game reset");
                self.notice = Some(Notice::new(NoticeKind::Info, "Reset", "The game has been reset!"));
            }
            ControlAction::CancelDialog | ControlAction::Dismiss => {
                self.notice = None;
            }
            ControlAction::Hint => {
                let hint = HINTS.choose(&mut rand::rng()).copied().unwrap_or(HINTS[0]);
                self.notice = Some(Notice::new(NoticeKind::Info, "Hint", hint));
            }
            ControlAction::CopyHistory => {
                self.copy_history();
            }
        }
    }

    fn change_difficulty(&mut self, difficulty: Difficulty) {
        self.session.load_difficulty(difficulty);
        self.selected = Selection::None;
        self.rebuild_buttons();
        info!(%difficulty, goal = self.session.get_goal(), "difficulty changed");
        self.notice = Some(Notice::new(
            NoticeKind::Info,
            "Difficulty",
            format!(
                "Difficulty changed to: {}\nTarget: {}L",
                difficulty.name().to_uppercase(),
                self.session.get_goal()
            ),
        ));
    }

    /// Turns a session result into whatever the player should see.
    fn report_move(&mut self, result: Result<MoveOutcome, GameError>) {
        match result {
            Ok(MoveOutcome {
                solved: Some(winner),
                step,
                ..
            }) => {
                info!(bucket = %winner, steps = step, "puzzle solved");
                self.notice = Some(Notice::new(
                    NoticeKind::Success,
                    "Congratulations!",
                    format!(
                        "You solved the puzzle!\n\nSteps taken: {step}\nTarget: {}L reached in the {winner}L bucket",
                        self.session.get_goal()
                    ),
                ));
            }
            Ok(_) => {}
            Err(err) if err.is_no_op() => {
                self.notice = Some(Notice::new(NoticeKind::Info, "Info", capitalize(&err.to_string())));
            }
            Err(err) => {
                warn!(error = %err, "action failed");
                self.notice = Some(Notice::new(NoticeKind::Error, "Error", capitalize(&err.to_string())));
            }
        }
    }

    fn copy_history(&mut self) {
        let transcript = self.session.history_transcript();
        match set_clipboard(&transcript) {
            Ok(()) => {
                info!(entries = self.session.get_history().len(), "history copied");
                self.notice = Some(Notice::new(NoticeKind::Info, "Copied", "History copied to the clipboard."));
            }
            Err(err) => {
                warn!(error = %err, "clipboard unavailable");
                self.notice = Some(Notice::new(
                    NoticeKind::Error,
                    "Error",
                    format!("Could not copy the history: {err}"),
                ));
            }
        }
    }
}

fn set_clipboard(content: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let ctx = ClipboardContext::new()?;
    ctx.set_text(content.to_string())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const B8: BucketId = BucketId(8);
    const B5: BucketId = BucketId(5);
    const B3: BucketId = BucketId(3);

    fn engine() -> GameEngine {
        GameEngine::new(Session::default())
    }

    fn amounts(engine: &GameEngine) -> Vec<u32> {
        engine.get_session().get_config().get_amounts()
    }

    #[test]
    fn buttons_cover_every_bucket_and_pair() {
        let engine = engine();
        let buttons = engine.get_buttons();
        assert_eq!(buttons.iter().filter(|b| b.is_difficulty()).count(), 3);
        assert_eq!(buttons.iter().filter(|b| b.bucket() == Some(B5)).count(), 2);
        let pours = buttons
            .iter()
            .filter(|b| matches!(b.get_action(), ControlAction::Pour(_, _)))
            .count();
        assert_eq!(pours, 6);
        assert!(buttons.iter().any(|b| b.get_label() == "8L > 3L"));
    }

    #[test]
    fn quiet_moves_raise_no_notice() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Fill(B8));
        engine.handle_game_action(ControlAction::Pour(B8, B5));
        assert_eq!(amounts(&engine), vec![3, 5, 0]);
        assert!(engine.get_notice().is_none());
    }

    #[test]
    fn no_op_shows_info_and_blocks_until_dismissed() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Empty(B3));
        let notice = engine.get_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.message, "The 3L bucket is already empty");

        engine.handle_game_action(ControlAction::Fill(B8));
        assert_eq!(amounts(&engine), vec![0, 0, 0]);
        engine.handle_game_action(ControlAction::Dismiss);
        engine.handle_game_action(ControlAction::Fill(B8));
        assert_eq!(amounts(&engine), vec![8, 0, 0]);
    }

    #[test]
    fn invalid_reference_is_an_error_notice() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Fill(BucketId(42)));
        assert_eq!(engine.get_notice().map(|n| n.kind), Some(NoticeKind::Error));
        assert_eq!(engine.get_session().get_step_count(), 0);
    }

    #[test]
    fn win_is_announced_and_play_continues() {
        let mut engine = engine();
        for action in [
            ControlAction::Fill(B5),
            ControlAction::Pour(B5, B3),
            ControlAction::Pour(B3, B8),
            ControlAction::Pour(B5, B3),
            ControlAction::Fill(B5),
            ControlAction::Pour(B5, B3),
        ] {
            engine.handle_game_action(action);
        }
        let notice = engine.get_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert!(notice.message.contains("Steps taken: 6"));
        assert!(notice.message.contains("in the 5L bucket"));
        engine.handle_game_action(ControlAction::Dismiss);
        engine.handle_game_action(ControlAction::Empty(B5));
        assert_eq!(engine.get_session().get_step_count(), 7);
    }

    #[test]
    fn bucket_clicks_select_then_pour() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Fill(B8));
        engine.handle_hit_item(HitItem::Bucket { id: B8 });
        assert_eq!(engine.get_selected(), Some(B8));
        engine.handle_hit_item(HitItem::Bucket { id: B3 });
        assert_eq!(amounts(&engine), vec![5, 0, 3]);
        assert_eq!(engine.get_selected(), None);

        engine.handle_hit_item(HitItem::Bucket { id: B5 });
        engine.handle_hit_item(HitItem::Bucket { id: B5 });
        assert_eq!(engine.get_selected(), None);
    }

    #[test]
    fn rejected_click_pour_moves_selection() {
        let mut engine = engine();
        engine.handle_hit_item(HitItem::Bucket { id: B8 });
        engine.handle_hit_item(HitItem::Bucket { id: B5 });
        assert_eq!(engine.get_selected(), Some(B5));
        assert!(engine.get_notice().is_none());
        assert_eq!(engine.get_session().get_step_count(), 0);
    }

    #[test]
    fn rejected_button_pour_keeps_its_notice_and_selection() {
        let mut engine = engine();
        engine.handle_hit_item(HitItem::Bucket { id: B3 });
        engine.handle_game_action(ControlAction::Pour(B8, B5));
        let notice = engine.get_notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.message, "The source bucket (8L) is empty");
        assert_eq!(engine.get_selected(), Some(B3));
    }

    #[test]
    fn confirm_reset_needs_a_pending_request() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Fill(B8));
        engine.handle_game_action(ControlAction::Hint);
        engine.handle_game_action(ControlAction::ConfirmReset);
        assert_eq!(engine.get_session().get_step_count(), 1);
        assert_eq!(engine.get_notice().map(|n| n.title.as_str()), Some("Hint"));
    }

    #[test]
    fn emptying_after_a_win_does_not_congratulate_again() {
        let mut engine = engine();
        for action in [
            ControlAction::Fill(B5),
            ControlAction::Pour(B5, B3),
            ControlAction::Pour(B3, B8),
            ControlAction::Pour(B5, B3),
            ControlAction::Fill(B5),
            ControlAction::Pour(B5, B3),
        ] {
            engine.handle_game_action(action);
        }
        engine.handle_game_action(ControlAction::Dismiss);
        engine.handle_game_action(ControlAction::Empty(B3));
        assert_eq!(engine.get_session().get_config().get_amounts(), vec![3, 4, 0]);
        assert!(engine.get_notice().is_none());
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Fill(B8));
        engine.handle_game_action(ControlAction::RequestReset);
        assert_eq!(engine.get_notice().map(|n| n.kind), Some(NoticeKind::ConfirmReset));
        engine.handle_game_action(ControlAction::CancelDialog);
        assert_eq!(amounts(&engine), vec![8, 0, 0]);

        engine.handle_game_action(ControlAction::RequestReset);
        engine.handle_game_action(ControlAction::ConfirmReset);
        assert_eq!(amounts(&engine), vec![0, 0, 0]);
        assert_eq!(engine.get_session().get_step_count(), 0);
        assert_eq!(engine.get_notice().map(|n| n.title.as_str()), Some("Reset"));
    }

    #[test]
    fn difficulty_change_rebuilds_buttons() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::ChangeDifficulty(Difficulty::Hard));
        assert_eq!(engine.get_session().get_goal(), 5);
        assert!(engine.get_notice().unwrap().message.contains("HARD"));
        assert!(engine.get_buttons().iter().any(|b| b.bucket() == Some(BucketId(12))));
        assert!(!engine.get_buttons().iter().any(|b| b.bucket() == Some(B3)));
    }

    #[test]
    fn backdrop_swallows_clicks() {
        let mut engine = engine();
        engine.handle_game_action(ControlAction::Hint);
        let hint = engine.get_notice().unwrap().message.clone();
        assert!(HINTS.contains(&hint.as_str()));
        engine.handle_hit_item(HitItem::Backdrop);
        assert!(engine.get_notice().is_some());
    }
}
