//! Game error types.

use crate::{mail::MailError, tournament::TournamentError};
use thiserror::Error;

/// Game errors
#[derive(Debug, Error)]
pub enum GameError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Missing or invalid fields")]
    MissingFields,

    #[error("Invalid username format.")]
    InvalidUsername,

    #[error("Invalid email format.")]
    InvalidEmail,

    #[error("Invalid gamename format.")]
    InvalidGameName(String),

    /// `rounds` is not a JSON array of rounds of matches
    #[error("Invalid rounds: {0}")]
    InvalidRounds(#[from] serde_json::Error),

    /// The hosting user of a new game does not exist
    #[error("User not found")]
    HostNotFound,

    /// The user a session is saved for does not exist
    #[error("User not found.")]
    UnknownUser,

    /// Looking up the games of a user that does not exist
    #[error("User not found")]
    UserNotFound,

    /// Acting on another player's session or tournament
    #[error("You can only record your own games")]
    Forbidden,

    #[error("Tournament not found")]
    TournamentNotFound,

    #[error("{0}")]
    Tournament(#[from] TournamentError),

    #[error("Email delivery failed: {0}")]
    Mail(#[from] MailError),
}

impl GameError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) => "Internal Server Error".to_string(),
            GameError::InvalidRounds(_) => "Invalid rounds format.".to_string(),
            GameError::Mail(_) => "Failed to send email".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;
