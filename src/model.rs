use std::fmt;
use std::str::FromStr;

use macroquad::prelude::*;

use crate::error::{GameError, GameResult};

pub const BACKGROUND: Color = Color::new(0.961, 0.961, 0.961, 1.0);
pub const PANEL: Color = Color::new(1.0, 1.0, 1.0, 1.0);
pub const CANVAS: Color = Color::new(0.980, 0.980, 0.980, 1.0);
pub const WATER: Color = Color::new(0.098, 0.463, 0.824, 1.0); // #1976D2
pub const WATER_LIGHT: Color = Color::new(0.259, 0.647, 0.961, 1.0); // #42A5F5
pub const BORDER: Color = Color::new(0.051, 0.278, 0.631, 1.0); // #0D47A1
pub const TEXT: Color = Color::new(0.129, 0.129, 0.129, 1.0); // #212121
pub const TEXT_MUTED: Color = Color::new(0.259, 0.259, 0.259, 1.0); // #424242
pub const TEXT_FAINT: Color = Color::new(0.620, 0.620, 0.620, 1.0); // #9E9E9E
pub const GOAL_GREEN: Color = Color::new(0.180, 0.490, 0.196, 1.0); // #2E7D32
pub const DANGER: Color = Color::new(0.827, 0.184, 0.184, 1.0); // #D32F2F
pub const POUR: Color = Color::new(0.482, 0.122, 0.635, 1.0); // #7B1FA2
pub const HINT: Color = Color::new(0.961, 0.486, 0.0, 1.0); // #F57C00
pub const NEUTRAL: Color = Color::new(0.259, 0.259, 0.259, 1.0); // #424242
pub const COPY: Color = Color::new(0.0, 0.537, 0.482, 1.0); // #00897B
pub const SHADE: Color = Color::new(0.0, 0.0, 0.0, 0.45);

/// Buckets are keyed by a small integer, which for every preset is the capacity.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BucketId(pub u32);

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BucketId {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['L', 'l']);
        trimmed
            .parse::<u32>()
            .map(BucketId)
            .map_err(|_| GameError::InvalidConfiguration(format!("not a bucket id: {s:?}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    id: BucketId,
    capacity: u32,
    amount: u32,
}

impl Bucket {
    pub fn new(id: BucketId, capacity: u32) -> Self {
        Self {
            id,
            capacity,
            amount: 0,
        }
    }

    pub fn get_id(&self) -> BucketId {
        self.id
    }

    pub fn get_capacity(&self) -> u32 {
        self.capacity
    }

    pub fn get_amount(&self) -> u32 {
        self.amount
    }

    pub fn get_empty_space(&self) -> u32 {
        self.capacity - self.amount
    }

    pub fn is_full(&self) -> bool {
        self.amount == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.amount == 0
    }

    /// Fraction of the bucket holding water, for drawing.
    pub fn get_fill_ratio(&self) -> f32 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.amount as f32 / self.capacity as f32
    }

    pub fn fill(&mut self) {
        self.amount = self.capacity;
    }

    pub fn empty(&mut self) {
        self.amount = 0;
    }

    pub fn get_pourable_amount(&self, other: &Bucket) -> u32 {
        self.amount.min(other.get_empty_space())
    }

    /// Moves as much water as fits into `other` and returns how much moved.
    pub fn pour_into(&mut self, other: &mut Bucket) -> u32 {
        let transfer_amount = self.get_pourable_amount(other);
        self.amount -= transfer_amount;
        other.amount += transfer_amount;
        transfer_amount
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn preset(&self) -> &'static Preset {
        match self {
            Difficulty::Easy => &PRESETS[0],
            Difficulty::Medium => &PRESETS[1],
            Difficulty::Hard => &PRESETS[2],
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Difficulty {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Difficulty::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GameError::InvalidPreset(s.to_string()))
    }
}

#[derive(Debug)]
pub struct Preset {
    pub difficulty: Difficulty,
    pub capacities: &'static [u32],
    pub goal: u32,
}

impl Preset {
    pub fn config(&self) -> PuzzleConfig {
        PuzzleConfig::from_sorted(self.capacities, self.goal)
    }

    pub fn get_label(&self) -> String {
        let sizes = self
            .capacities
            .iter()
            .map(|c| format!("{c}L"))
            .collect::<Vec<_>>()
            .join(", ");
        let mut name = self.difficulty.name().to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!("{name} - Target: {}L ({sizes})", self.goal)
    }
}

pub static PRESETS: [Preset; 3] = [
    Preset {
        difficulty: Difficulty::Easy,
        capacities: &[8, 5, 3],
        goal: 4,
    },
    Preset {
        difficulty: Difficulty::Medium,
        capacities: &[10, 7, 3],
        goal: 6,
    },
    Preset {
        difficulty: Difficulty::Hard,
        capacities: &[12, 8, 5],
        goal: 5,
    },
];

/// Largest custom bucket; each litre gets its own level mark on screen.
pub const MAX_CAPACITY: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleConfig {
    buckets: Vec<Bucket>,
    goal: u32,
}

impl PuzzleConfig {
    /// Builds a custom puzzle. Buckets are keyed by capacity and shown largest first.
    pub fn new(capacities: &[u32], goal: u32) -> GameResult<Self> {
        if capacities.len() < 2 {
            return Err(GameError::InvalidConfiguration(
                "at least two buckets are needed".to_string(),
            ));
        }
        if capacities.iter().any(|&c| c > MAX_CAPACITY) {
            return Err(GameError::InvalidConfiguration(format!(
                "bucket capacities must be at most {MAX_CAPACITY}"
            )));
        }
        if capacities.contains(&0) {
            return Err(GameError::InvalidConfiguration(
                "bucket capacities must be positive".to_string(),
            ));
        }
        let mut sorted = capacities.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        if sorted.windows(2).any(|w| w[0] == w[1]) {
            return Err(GameError::InvalidConfiguration(
                "bucket capacities must be distinct".to_string(),
            ));
        }
        if goal == 0 || goal > sorted[0] {
            return Err(GameError::InvalidConfiguration(format!(
                "goal must be between 1 and {}",
                sorted[0]
            )));
        }
        Ok(Self::from_sorted(&sorted, goal))
    }

    fn from_sorted(capacities: &[u32], goal: u32) -> Self {
        Self {
            buckets: capacities
                .iter()
                .map(|&c| Bucket::new(BucketId(c), c))
                .collect(),
            goal,
        }
    }

    pub fn get_goal(&self) -> u32 {
        self.goal
    }

    pub fn get_buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub(crate) fn position(&self, id: BucketId) -> GameResult<usize> {
        self.buckets
            .iter()
            .position(|b| b.id == id)
            .ok_or(GameError::InvalidBucketReference(id))
    }

    pub(crate) fn bucket_mut(&mut self, index: usize) -> &mut Bucket {
        &mut self.buckets[index]
    }

    /// Mutable access to two distinct buckets at once.
    pub(crate) fn bucket_pair_mut(&mut self, a: usize, b: usize) -> (&mut Bucket, &mut Bucket) {
        assert!(a != b, "bucket pair must be distinct");
        if a < b {
            let (left, right) = self.buckets.split_at_mut(b);
            (&mut left[a], &mut right[0])
        } else {
            let (left, right) = self.buckets.split_at_mut(a);
            (&mut right[0], &mut left[b])
        }
    }

    pub(crate) fn empty_all(&mut self) {
        for bucket in &mut self.buckets {
            bucket.empty();
        }
    }

    pub fn get_amounts(&self) -> Vec<u32> {
        self.buckets.iter().map(|b| b.amount).collect()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlAction {
    Fill(BucketId),
    Empty(BucketId),
    Pour(BucketId, BucketId),
    /// Pours the selected bucket into the given one (bucket click).
    PourSelected(BucketId),
    SelectBucket(BucketId),
    Deselect,
    ChangeDifficulty(Difficulty),
    RequestReset,
    ConfirmReset,
    CancelDialog,
    Hint,
    CopyHistory,
    Dismiss,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    label: String,
    action: ControlAction,
    color: Color,
}

impl Button {
    pub fn new(label: &str, action: ControlAction, color: Color) -> Self {
        Self {
            label: label.to_string(),
            action,
            color,
        }
    }
    pub fn get_action(&self) -> ControlAction {
        self.action
    }
    pub fn get_label(&self) -> &str {
        &self.label
    }
    pub fn get_color(&self) -> Color {
        self.color
    }
    /// The bucket a fill/empty button sits under.
    pub fn bucket(&self) -> Option<BucketId> {
        match self.action {
            ControlAction::Fill(id) | ControlAction::Empty(id) => Some(id),
            _ => None,
        }
    }
    pub fn is_difficulty(&self) -> bool {
        matches!(self.action, ControlAction::ChangeDifficulty(_))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HitItem {
    Button { action: ControlAction },
    Bucket { id: BucketId },
    /// Blocks clicks from reaching anything under a modal.
    Backdrop,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitRecord {
    pub rect: Rect,
    pub item: HitItem,
}

#[derive(Default)]
pub struct HitTestRegistry {
    items: Vec<HitRecord>,
}

impl HitTestRegistry {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, rect: Rect, item: HitItem) {
        self.items.push(HitRecord { rect, item });
    }

    /// Returns the topmost item under the point (last drawn wins).
    pub fn hit_test(&self, x: f32, y: f32) -> Option<&HitRecord> {
        self.items
            .iter()
            .rev()
            .find(|r| r.rect.contains(vec2(x, y)))
    }
}
