//! Single-elimination tournament brackets.
//!
//! A bracket is driven by two pure steps: pair the remaining players into
//! matchups, then collect the winners of a finished round and pair them again,
//! until one player is left. Two formats are supported:
//!
//! - **Pong**: players are shuffled before each round; a win is worth 10, 20 or
//!   40 points depending on the round
//! - **Tic-Tac-Toe**: players keep their seeding order (winners of games 1 and 2
//!   meet next) and each win is a single point
//!
//! ## Example
//!
//! ```
//! use gang_arcade::tournament::{Bracket, BracketPlayer, RoundProgress, TournamentFormat};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let players = ["ana", "bo", "cy", "di"].map(BracketPlayer::new).to_vec();
//! let mut bracket =
//!     Bracket::new(players, TournamentFormat::tic_tac_toe(), &mut StdRng::seed_from_u64(1)).unwrap();
//!
//! bracket.record_outcome(0, "ana").unwrap();
//! let progress = bracket.record_outcome(1, "cy").unwrap();
//! assert!(matches!(progress, RoundProgress::NextRound { round: 2, .. }));
//!
//! let progress = bracket.record_outcome(0, "cy").unwrap();
//! assert_eq!(progress, RoundProgress::Champion("cy".to_string()));
//! ```

pub mod bracket;
pub mod models;

pub use bracket::{Bracket, BracketSnapshot, RoundProgress, TournamentError, TournamentResult, pair};
pub use models::{BracketPlayer, Matchup, Pairing, Score, ScoringRule, TournamentFormat};
