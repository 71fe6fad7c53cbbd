use std::fmt;

use tracing::{info, warn};

use crate::error::{GameResult, Rejection};
use crate::model::*;

/// One accepted action, as recorded in the history log.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveRecord {
    Fill { capacity: u32, from: u32 },
    Empty { capacity: u32, previous: u32 },
    Pour { amount: u32, from_capacity: u32, to_capacity: u32 },
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRecord::Fill { capacity, from } => {
                write!(f, "Filled the {capacity}L bucket (from {from}L to {capacity}L)")
            }
            MoveRecord::Empty { capacity, previous } => {
                write!(f, "Emptied the {capacity}L bucket (was {previous}L)")
            }
            MoveRecord::Pour {
                amount,
                from_capacity,
                to_capacity,
            } => write!(
                f,
                "Poured {amount}L from the {from_capacity}L bucket into the {to_capacity}L bucket"
            ),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub record: MoveRecord,
    pub step: u32,
    /// Bucket holding exactly the goal after this move, if any.
    pub solved: Option<BucketId>,
}

/// The whole mutable state of a game: buckets, goal, step counter and history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    config: PuzzleConfig,
    difficulty: Option<Difficulty>,
    step_count: u32,
    history: Vec<MoveRecord>,
}

impl Default for Session {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::default())
    }
}

impl Session {
    pub fn new(config: PuzzleConfig) -> Self {
        Self {
            config,
            difficulty: None,
            step_count: 0,
            history: Vec::new(),
        }
    }

    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut session = Self::new(difficulty.preset().config());
        session.difficulty = Some(difficulty);
        session
    }

    pub fn get_config(&self) -> &PuzzleConfig {
        &self.config
    }

    pub fn get_goal(&self) -> u32 {
        self.config.get_goal()
    }

    pub fn get_buckets(&self) -> &[Bucket] {
        self.config.get_buckets()
    }

    pub fn get_bucket(&self, id: BucketId) -> GameResult<&Bucket> {
        let index = self.config.position(id)?;
        Ok(&self.config.get_buckets()[index])
    }

    /// `None` for a custom puzzle.
    pub fn get_difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn get_step_count(&self) -> u32 {
        self.step_count
    }

    pub fn get_history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn fill(&mut self, id: BucketId) -> GameResult<MoveOutcome> {
        let index = self.config.position(id)?;
        let bucket = self.config.bucket_mut(index);
        if bucket.is_full() {
            warn!(bucket = %id, "fill rejected, bucket already full");
            return Err(Rejection::AlreadyFull {
                capacity: bucket.get_capacity(),
            }
            .into());
        }
        let from = bucket.get_amount();
        bucket.fill();
        let record = MoveRecord::Fill {
            capacity: bucket.get_capacity(),
            from,
        };
        Ok(self.record(record))
    }

    pub fn empty(&mut self, id: BucketId) -> GameResult<MoveOutcome> {
        let index = self.config.position(id)?;
        let bucket = self.config.bucket_mut(index);
        if bucket.is_empty() {
            warn!(bucket = %id, "empty rejected, bucket already empty");
            return Err(Rejection::AlreadyEmpty {
                capacity: bucket.get_capacity(),
            }
            .into());
        }
        let previous = bucket.get_amount();
        bucket.empty();
        let record = MoveRecord::Empty {
            capacity: bucket.get_capacity(),
            previous,
        };
        Ok(self.record(record))
    }

    pub fn pour(&mut self, from: BucketId, to: BucketId) -> GameResult<MoveOutcome> {
        let from_index = self.config.position(from)?;
        let to_index = self.config.position(to)?;
        if from_index == to_index {
            let capacity = self.config.get_buckets()[from_index].get_capacity();
            return Err(Rejection::SameBucket { capacity }.into());
        }
        let (source, destination) = self.config.bucket_pair_mut(from_index, to_index);
        if source.is_empty() {
            warn!(from = %from, to = %to, "pour rejected, source empty");
            return Err(Rejection::SourceEmpty {
                capacity: source.get_capacity(),
            }
            .into());
        }
        if destination.is_full() {
            warn!(from = %from, to = %to, "pour rejected, destination full");
            return Err(Rejection::DestinationFull {
                capacity: destination.get_capacity(),
            }
            .into());
        }
        let amount = source.pour_into(destination);
        let record = MoveRecord::Pour {
            amount,
            from_capacity: source.get_capacity(),
            to_capacity: destination.get_capacity(),
        };
        Ok(self.record(record))
    }

    fn record(&mut self, record: MoveRecord) -> MoveOutcome {
        self.step_count += 1;
        self.history.push(record);
        // Emptying cannot create a new match, so it never announces a win.
        let solved = match record {
            MoveRecord::Empty { .. } => None,
            _ => self.is_solved().map(|b| b.get_id()),
        };
        info!(
            step = self.step_count,
            amounts = ?self.config.get_amounts(),
            solved = solved.is_some(),
            "{record}"
        );
        MoveOutcome {
            record,
            step: self.step_count,
            solved,
        }
    }

    /// First bucket (in display order) holding exactly the goal.
    pub fn is_solved(&self) -> Option<&Bucket> {
        let goal = self.config.get_goal();
        self.config
            .get_buckets()
            .iter()
            .find(|b| b.get_amount() == goal)
    }

    /// Switches to a named preset. Unknown names leave the session untouched.
    pub fn change_difficulty(&mut self, preset: &str) -> GameResult<Difficulty> {
        let difficulty: Difficulty = preset.parse()?;
        self.load_difficulty(difficulty);
        Ok(difficulty)
    }

    pub fn load_difficulty(&mut self, difficulty: Difficulty) {
        self.load_config(difficulty.preset().config());
        self.difficulty = Some(difficulty);
    }

    pub fn load_config(&mut self, config: PuzzleConfig) {
        self.config = config;
        self.difficulty = None;
        self.reset();
        info!(goal = self.config.get_goal(), "loaded new puzzle");
    }

    pub fn reset(&mut self) {
        self.config.empty_all();
        self.step_count = 0;
        self.history.clear();
    }

    /// Numbered, newline-separated history, as shown in the log panel.
    pub fn history_transcript(&self) -> String {
        self.history
            .iter()
            .enumerate()
            .map(|(i, record)| format!("{}. {record}\n", i + 1))
            .collect()
    }
}
