//! Game sessions, aggregate win/loss counters and live tournaments.
//!
//! Finished games are stored as a JSON blob of rounds of matches. Saving a
//! session also folds every match played by a registered user into that
//! user's `wins`/`losses`. Tournaments in progress live in memory until their
//! champion is known, at which point the bracket is saved like any other
//! session.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{GameError, GameResult};
pub use manager::GameManager;
pub use models::{
    GameAchievementRequest, GameId, GameKind, GameSession, MatchRecord, OutcomeRecorded,
    OutcomeRequest, SaveSessionRequest, StartDuelRequest, StartTournamentRequest, TournamentGuest,
    TournamentStarted,
};
