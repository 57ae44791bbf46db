//! Friendship error types.

use thiserror::Error;

/// Friendship errors
#[derive(Debug, Error)]
pub enum FriendshipError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("You cannot friend yourself")]
    SelfRequest,

    /// Only the receiver of a request may answer it
    #[error("You can only answer requests sent to you.")]
    NotReceiver,

    /// Unfriending a pair the caller is not part of
    #[error("You can only change your own friendships.")]
    NotParticipant,

    #[error("You are already friends")]
    AlreadyFriends,

    #[error("Friend status not found.")]
    NotFound,

    /// Status column held a value outside the enumeration
    #[error("Unknown friendship status: {0}")]
    UnknownStatus(String),
}

impl FriendshipError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            FriendshipError::Database(_) | FriendshipError::UnknownStatus(_) => {
                "Internal Server Error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for friendship operations
pub type FriendshipResult<T> = Result<T, FriendshipError>;
