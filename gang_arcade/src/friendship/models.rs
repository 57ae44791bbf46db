//! Friendship data models.

use super::errors::FriendshipError;
use crate::auth::UserId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Status of one directed friendship row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FriendshipStatus {
    #[serde(rename = "Not Friend")]
    NotFriend,
    Pending,
    Friend,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::NotFriend => "Not Friend",
            FriendshipStatus::Pending => "Pending",
            FriendshipStatus::Friend => "Friend",
        }
    }
}

impl fmt::Display for FriendshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendshipStatus {
    type Err = FriendshipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Not Friend" => Ok(FriendshipStatus::NotFriend),
            "Pending" => Ok(FriendshipStatus::Pending),
            "Friend" => Ok(FriendshipStatus::Friend),
            other => Err(FriendshipError::UnknownStatus(other.to_string())),
        }
    }
}

/// A directed friendship row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub sender_username: String,
    pub receiver_username: String,
    pub status: FriendshipStatus,
}

/// Outgoing row joined with the receiver's presence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipView {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub receiver_username: String,
    pub online_status: String,
    pub status: FriendshipStatus,
}

/// `{sender_id, receiver_id}` body shared by accept, decline and unfriend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRequest {
    pub sender_id: UserId,
    pub receiver_id: UserId,
}

/// Minimal user listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}
