//! Player profiles: reads, field-level edits and avatar uploads.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ProfileError, ProfileResult};
pub use manager::ProfileManager;
pub use models::{
    ALLOWED_PICTURE_TYPES, AuthProvider, Avatar, Gender, Language, LeaderboardEntry,
    MAX_PICTURE_BYTES, OnlineStatus, Profile, ProfileField, UpdateFieldRequest,
};
