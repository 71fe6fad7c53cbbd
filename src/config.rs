use clap::Parser;

use crate::error::GameResult;
use crate::model::{Difficulty, PuzzleConfig};
use crate::session::Session;

/// Measure out the target amount of water using only fill, empty and pour.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "water-bucket", version)]
pub struct Args {
    /// Starting difficulty preset (easy, medium, hard).
    #[arg(long, default_value_t = Difficulty::Easy)]
    pub difficulty: Difficulty,

    /// Custom bucket capacities, comma separated. Overrides --difficulty.
    #[arg(long, value_delimiter = ',', requires = "goal")]
    pub capacities: Option<Vec<u32>>,

    /// Target amount for a custom puzzle.
    #[arg(long, requires = "capacities")]
    pub goal: Option<u32>,

    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn build_session(&self) -> GameResult<Session> {
        match (&self.capacities, self.goal) {
            (Some(capacities), Some(goal)) => Ok(Session::new(PuzzleConfig::new(capacities, goal)?)),
            _ => Ok(Session::from_difficulty(self.difficulty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GameError;
    use crate::model::BucketId;

    #[test]
    fn defaults_to_easy() {
        let args = Args::try_parse_from(["water-bucket"]).unwrap();
        assert_eq!(args.difficulty, Difficulty::Easy);
        assert_eq!(args.log_level, "info");
        let session = args.build_session().unwrap();
        assert_eq!(session.get_goal(), 4);
    }

    #[test]
    fn parses_difficulty_by_name() {
        let args = Args::try_parse_from(["water-bucket", "--difficulty", "Medium"]).unwrap();
        assert_eq!(args.build_session().unwrap().get_difficulty(), Some(Difficulty::Medium));
        assert!(Args::try_parse_from(["water-bucket", "--difficulty", "extreme"]).is_err());
    }

    #[test]
    fn custom_puzzle_needs_both_halves() {
        let args =
            Args::try_parse_from(["water-bucket", "--capacities", "9,4", "--goal", "6"]).unwrap();
        let session = args.build_session().unwrap();
        assert_eq!(session.get_difficulty(), None);
        assert!(session.get_bucket(BucketId(9)).is_ok());
        assert!(Args::try_parse_from(["water-bucket", "--goal", "6"]).is_err());
    }

    #[test]
    fn invalid_custom_puzzle_is_reported() {
        let args =
            Args::try_parse_from(["water-bucket", "--capacities", "4,4", "--goal", "2"]).unwrap();
        assert!(matches!(args.build_session(), Err(GameError::InvalidConfiguration(_))));
    }
}
