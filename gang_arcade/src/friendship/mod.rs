//! Friendship graph.
//!
//! Every ordered pair of users has one row. Registration seeds both directions
//! as `Not Friend`; a request flips the sender's row to `Pending`; accepting,
//! declining or unfriending rewrites both directions in one transaction.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{FriendshipError, FriendshipResult};
pub use manager::FriendshipManager;
pub use models::{Friendship, FriendshipStatus, FriendshipView, PairRequest, UserSummary};
