//! Profile error types.

use thiserror::Error;

/// Profile errors
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Upload could not be written
    #[error("Error saving file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid username format.")]
    InvalidUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("No profiles found")]
    NoProfiles,

    /// Editing someone else's profile
    #[error("You can only edit your own profile")]
    Forbidden,

    #[error("Field not allowed to update")]
    FieldNotAllowed,

    #[error("Name must contain only alphabetic characters.")]
    InvalidName,

    #[error("Invalid date format.")]
    InvalidDate,

    /// Value outside an enumerated column's allowed set
    #[error("Invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("No file uploaded")]
    NoFile,

    #[error("File too large")]
    FileTooLarge,

    #[error("Invalid file type")]
    InvalidFileType,
}

impl ProfileError {
    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            ProfileError::Database(_) => "Internal Server Error".to_string(),
            ProfileError::Io(_) => "Error saving file".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for profile operations
pub type ProfileResult<T> = Result<T, ProfileError>;
