use std::{
    collections::HashMap,
    sync::Mutex,
};

use macroquad::prelude::*;
use crate::gameplay::{Notice, NoticeKind};
use crate::model::{
    BACKGROUND, BORDER, Bucket, BucketId, Button, CANVAS, GOAL_GREEN, DANGER, HINT, HitItem,
    HitTestRegistry, PANEL, SHADE, TEXT, TEXT_FAINT, TEXT_MUTED, WATER,
};
use crate::session::Session;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Align {
    Left,
    Center,
}

#[derive(Hash, PartialEq, Eq, Clone, Debug)]
struct TextCacheKey {
    text: String,
    w_px: u16,
    h_px: u16,
    max_size: u16,
}
/// Font size plus the horizontal padding and baseline offset inside the rect.
type TextPlacement = (f32, f32, f32);
/// Width, height and top-to-baseline offset at the reference font size.
type TextExtent = (f32, f32, f32);

pub struct CachedTextSizer {
    placement_cache: Mutex<HashMap<TextCacheKey, TextPlacement>>,
    extent_cache: Mutex<HashMap<String, TextExtent>>,
}

impl CachedTextSizer {
    const REFERENCE_SIZE: u16 = 100;

    pub fn new() -> Self {
        Self {
            placement_cache: Mutex::new(HashMap::new()),
            extent_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Largest font (capped at `max_size`) that fits `text` in the rect, centered.
    pub fn fit(&self, text: &str, rect_width: f32, rect_height: f32, max_size: f32) -> TextPlacement {
        let key = TextCacheKey {
            text: text.to_string(),
            w_px: rect_width.round().clamp(0.0, u16::MAX as f32) as u16,
            h_px: rect_height.round().clamp(0.0, u16::MAX as f32) as u16,
            max_size: max_size.round().clamp(0.0, u16::MAX as f32) as u16,
        };

        if let Ok(cache) = self.placement_cache.lock()
            && let Some(cached) = cache.get(&key)
        {
            return *cached;
        }

        let placement = self.place(text, rect_width, rect_height, max_size);
        if let Ok(mut cache) = self.placement_cache.lock() {
            cache.insert(key, placement);
        }
        placement
    }

    fn extent(&self, text: &str) -> TextExtent {
        if let Ok(cache) = self.extent_cache.lock()
            && let Some(extent) = cache.get(text)
        {
            return *extent;
        }
        let dimensions = measure_text(text, None, Self::REFERENCE_SIZE, 1.0);
        let extent = (dimensions.width, dimensions.height, dimensions.offset_y);
        if let Ok(mut cache) = self.extent_cache.lock() {
            cache.insert(text.to_string(), extent);
        }
        extent
    }

    fn place(&self, text: &str, rect_width: f32, rect_height: f32, max_size: f32) -> TextPlacement {
        let (size_x, size_y, baseline) = self.extent(text);
        if size_x <= 0.0 || size_y <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        let reference = Self::REFERENCE_SIZE as f32;
        let scale = (rect_width / size_x)
            .min(rect_height / size_y)
            .min(max_size / reference);
        let offset_x = (rect_width - size_x * scale) / 2.0;
        let offset_y = (rect_height - size_y * scale) / 2.0 + baseline * scale;
        (reference * scale, offset_x, offset_y)
    }
}

/// Everything a frame needs from the engine.
pub struct GameView<'a> {
    pub session: &'a Session,
    pub buttons: &'a [Button],
    pub selected: Option<BucketId>,
    pub notice: Option<&'a Notice>,
    pub notice_buttons: &'a [Button],
}

pub struct Renderer {
    cached_text_sizer: CachedTextSizer,
    hit_test: HitTestRegistry,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
}
impl Renderer {
    pub fn new() -> Self {
        Self {
            cached_text_sizer: CachedTextSizer::new(),
            hit_test: HitTestRegistry::new(),
            x: 0.0,
            y: 0.0,
            width: 1100.0,
            height: 800.0,
        }
    }

    pub fn get_hit_test_registry(&self) -> &HitTestRegistry {
        &self.hit_test
    }

    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) -> bool {
        if self.x == x && self.y == y && self.width == width && self.height == height {
            return false;
        }
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        true
    }

    pub fn autoset_viewport(&mut self) -> bool {
        let (screen_w, screen_h) = (screen_width(), screen_height());
        self.set_viewport(0.0, 0.0, screen_w, screen_h)
    }

    /// Vertical band of the window, `top` and `height` as fractions of its height.
    fn band(&self, top: f32, height: f32) -> Rect {
        let padding = 30.0;
        Rect::new(
            self.x + padding,
            self.y + self.height * top,
            self.width - 2.0 * padding,
            self.height * height,
        )
    }

    pub fn render_game(&mut self, view: &GameView) {
        self.hit_test.clear();
        clear_background(BACKGROUND);

        let session = view.session;
        self.render_text("Water Bucket Puzzle", self.band(0.01, 0.05), BORDER, 40.0, Align::Center);
        self.render_text(
            "Get the exact amount of water into one of the buckets!",
            self.band(0.06, 0.03),
            TEXT,
            20.0,
            Align::Center,
        );

        let difficulty_buttons: Vec<&Button> = view.buttons.iter().filter(|b| b.is_difficulty()).collect();
        self.render_button_lineup(&difficulty_buttons, self.band(0.1, 0.05));

        self.render_stats(session.get_step_count(), session.get_goal(), self.band(0.165, 0.09));

        let canvas = self.band(0.27, 0.33);
        let columns = self.render_bucket_lineup(session, view.selected, canvas);

        let controls = self.band(0.61, 0.045);
        for (bucket, column) in session.get_buckets().iter().zip(columns) {
            let bucket_buttons: Vec<&Button> = view
                .buttons
                .iter()
                .filter(|b| b.bucket() == Some(bucket.get_id()))
                .collect();
            let width = (column.w * 0.8).min(260.0);
            self.render_button_lineup(
                &bucket_buttons,
                Rect::new(column.x + (column.w - width) / 2.0, controls.y, width, controls.h),
            );
        }

        let action_buttons: Vec<&Button> = view
            .buttons
            .iter()
            .filter(|b| !b.is_difficulty() && b.bucket().is_none())
            .collect();
        self.render_button_lineup(&action_buttons, self.band(0.67, 0.045));

        self.render_history(session, self.band(0.73, 0.255));

        if let Some(notice) = view.notice {
            self.render_notice(notice, view.notice_buttons);
        }
    }

    pub fn render_text(&self, text: &str, rect: Rect, color: Color, max_size: f32, align: Align) {
        let (size, x, y) = self
            .cached_text_sizer
            .fit(text, rect.w, rect.h, max_size);
        if size <= 0.0 {
            return;
        }
        let x = match align {
            Align::Left => 0.0,
            Align::Center => x,
        };
        draw_text(text, rect.x + x, rect.y + y, size, color);
    }

    fn render_panel(&self, rect: Rect, fill: Color, border: Color) {
        draw_rectangle(rect.x, rect.y, rect.w, rect.h, fill);
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 3.0, border);
    }

    fn render_stats(&self, steps: u32, goal: u32, rect: Rect) {
        let spacing = 20.0;
        let panel_w = (rect.w - spacing) / 2.0;
        let panels = [
            ("Steps", steps.to_string(), WATER),
            ("Target", format!("{goal}L"), GOAL_GREEN),
        ];
        for (i, (label, value, color)) in panels.iter().enumerate() {
            let panel = Rect::new(rect.x + i as f32 * (panel_w + spacing), rect.y, panel_w, rect.h);
            self.render_panel(panel, PANEL, TEXT_MUTED);
            self.render_text(
                label,
                Rect::new(panel.x, panel.y + 4.0, panel.w, panel.h * 0.3),
                TEXT_MUTED,
                20.0,
                Align::Center,
            );
            self.render_text(
                value,
                Rect::new(panel.x, panel.y + panel.h * 0.35, panel.w, panel.h * 0.6),
                *color,
                48.0,
                Align::Center,
            );
        }
    }

    /// Draws every bucket in its own column and returns the columns.
    fn render_bucket_lineup(&mut self, session: &Session, selected: Option<BucketId>, rect: Rect) -> Vec<Rect> {
        self.render_panel(rect, CANVAS, TEXT_FAINT);
        let buckets = session.get_buckets();
        if buckets.is_empty() {
            return Vec::new();
        }
        let column_w = rect.w / buckets.len() as f32;
        let mut columns = Vec::with_capacity(buckets.len());
        for (i, bucket) in buckets.iter().enumerate() {
            let column = Rect::new(rect.x + i as f32 * column_w, rect.y, column_w, rect.h);
            self.render_bucket(bucket, Some(bucket.get_id()) == selected, column);
            columns.push(column);
        }
        columns
    }

    pub fn render_bucket(&mut self, bucket: &Bucket, selected: bool, column: Rect) {
        let label_h = (column.h * 0.12).min(30.0);
        let body_h = column.h - 2.0 * label_h - 10.0;
        let body_w = (column.w * 0.4).min(120.0);
        let body = Rect::new(
            column.x + (column.w - body_w) / 2.0,
            column.y + label_h + 5.0,
            body_w,
            body_h,
        );
        self.hit_test.push(body, HitItem::Bucket { id: bucket.get_id() });

        draw_rectangle(body.x, body.y, body.w, body.h, PANEL);
        if !bucket.is_empty() {
            let water_h = body.h * bucket.get_fill_ratio();
            draw_rectangle(body.x, body.y + body.h - water_h, body.w, water_h, WATER);
        }
        draw_rectangle_lines(body.x, body.y, body.w, body.h, 5.0, BORDER);

        let capacity = bucket.get_capacity();
        let mark_w = 8.0;
        for level in 1..=capacity {
            let mark_y = body.y + body.h - body.h * level as f32 / capacity as f32;
            draw_line(body.x - mark_w, mark_y, body.x, mark_y, 3.0, TEXT_MUTED);
            self.render_text(
                &level.to_string(),
                Rect::new(body.x - mark_w - 24.0, mark_y - 7.0, 20.0, 14.0),
                TEXT_MUTED,
                14.0,
                Align::Center,
            );
        }

        let amount_color = if bucket.is_empty() { TEXT_FAINT } else { WATER };
        self.render_text(
            &format!("{}L", bucket.get_amount()),
            Rect::new(column.x, column.y, column.w, label_h),
            amount_color,
            24.0,
            Align::Center,
        );
        self.render_text(
            &format!("{capacity}L"),
            Rect::new(column.x, body.y + body.h + 5.0, column.w, label_h),
            TEXT,
            26.0,
            Align::Center,
        );

        if selected {
            draw_rectangle_lines(body.x - 4.0, body.y - 4.0, body.w + 8.0, body.h + 8.0, 3.0, HINT);
        }
    }

    fn render_history(&self, session: &Session, rect: Rect) {
        self.render_panel(rect, PANEL, TEXT_MUTED);
        self.render_text(
            "History",
            Rect::new(rect.x + 10.0, rect.y + 5.0, rect.w - 20.0, 22.0),
            BORDER,
            20.0,
            Align::Left,
        );
        let line_h = 18.0;
        let top = rect.y + 32.0;
        let visible = ((rect.y + rect.h - top - 5.0) / line_h).max(0.0) as usize;
        let history = session.get_history();
        let first = history.len().saturating_sub(visible);
        for (row, (index, record)) in history.iter().enumerate().skip(first).enumerate() {
            self.render_text(
                &format!("{}. {record}", index + 1),
                Rect::new(rect.x + 10.0, top + row as f32 * line_h, rect.w - 20.0, line_h - 2.0),
                TEXT,
                16.0,
                Align::Left,
            );
        }
    }

    fn render_notice(&mut self, notice: &Notice, buttons: &[Button]) {
        let screen = Rect::new(self.x, self.y, self.width, self.height);
        draw_rectangle(screen.x, screen.y, screen.w, screen.h, SHADE);
        self.hit_test.push(screen, HitItem::Backdrop);

        let w = (self.width * 0.45).max(360.0).min(self.width);
        let h = (self.height * 0.32).max(220.0).min(self.height);
        let dialog = Rect::new(self.x + (self.width - w) / 2.0, self.y + (self.height - h) / 2.0, w, h);
        let accent = match notice.kind {
            NoticeKind::Info => WATER,
            NoticeKind::Success => GOAL_GREEN,
            NoticeKind::Error | NoticeKind::ConfirmReset => DANGER,
        };
        self.render_panel(dialog, PANEL, accent);
        self.render_text(
            &notice.title,
            Rect::new(dialog.x + 20.0, dialog.y + 10.0, dialog.w - 40.0, 36.0),
            accent,
            30.0,
            Align::Center,
        );

        let line_h = 22.0;
        for (row, line) in notice.message.lines().enumerate() {
            self.render_text(
                line,
                Rect::new(dialog.x + 20.0, dialog.y + 56.0 + row as f32 * line_h, dialog.w - 40.0, line_h - 2.0),
                TEXT,
                18.0,
                Align::Center,
            );
        }

        let refs: Vec<&Button> = buttons.iter().collect();
        let row_w = 120.0 * refs.len() as f32 + 10.0 * (refs.len().saturating_sub(1)) as f32;
        self.render_button_lineup(
            &refs,
            Rect::new(dialog.x + (dialog.w - row_w) / 2.0, dialog.y + dialog.h - 56.0, row_w, 40.0),
        );
    }

    pub fn render_button(&mut self, button: &Button, rect: Rect) {
        self.hit_test.push(rect, HitItem::Button { action: button.get_action() });

        draw_rectangle(rect.x, rect.y, rect.w, rect.h, button.get_color());
        draw_rectangle_lines(rect.x, rect.y, rect.w, rect.h, 2.0, BORDER);
        let inset = 6.0;
        self.render_text(
            button.get_label(),
            Rect::new(rect.x + inset, rect.y + inset, rect.w - 2.0 * inset, rect.h - 2.0 * inset),
            WHITE,
            20.0,
            Align::Center,
        );
    }

    pub fn render_button_lineup(&mut self, buttons: &[&Button], rect: Rect) {
        if buttons.is_empty() {
            return;
        }
        let button_count = buttons.len() as f32;
        let spacing = 10.0;
        let total_spacing = spacing * (button_count - 1.0);
        let button_width = (rect.w - total_spacing) / button_count;
        for (i, button) in buttons.iter().enumerate() {
            let button_x = rect.x + i as f32 * (button_width + spacing);
            self.render_button(
                button,
                Rect::new(button_x, rect.y, button_width, rect.h),
            );
        }
    }
}
