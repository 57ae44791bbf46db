//! Friendship manager implementation.

use super::{
    errors::{FriendshipError, FriendshipResult},
    models::{Friendship, FriendshipStatus, FriendshipView, PairRequest, UserSummary},
};
use crate::auth::UserId;
use sqlx::{Row, SqliteConnection, SqlitePool, sqlite::SqliteRow};
use std::sync::Arc;

/// Insert `Not Friend` rows in both directions between a new user and everyone else.
///
/// Runs on the caller's connection so registration can do it inside its own
/// transaction. Existing rows are left untouched.
pub(crate) async fn seed_rows(
    conn: &mut SqliteConnection,
    user_id: UserId,
    username: &str,
) -> Result<u64, sqlx::Error> {
    let outgoing = sqlx::query(
        r#"
        INSERT OR IGNORE INTO friendships (sender_id, receiver_id, sender_username, receiver_username, status)
        SELECT ?, id, ?, username, 'Not Friend' FROM users WHERE id != ?
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    let incoming = sqlx::query(
        r#"
        INSERT OR IGNORE INTO friendships (sender_id, receiver_id, sender_username, receiver_username, status)
        SELECT id, ?, username, ?, 'Not Friend' FROM users WHERE id != ?
        "#,
    )
    .bind(user_id)
    .bind(username)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(outgoing.rows_affected() + incoming.rows_affected())
}

/// Friendship manager
#[derive(Clone)]
pub struct FriendshipManager {
    pool: Arc<SqlitePool>,
}

impl FriendshipManager {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Seed rows for a user created outside [`crate::auth::AuthManager`].
    pub async fn seed_for_new_user(&self, user_id: UserId, username: &str) -> FriendshipResult<u64> {
        let mut conn = self.pool.acquire().await?;
        Ok(seed_rows(&mut *conn, user_id, username).await?)
    }

    /// Mark the `sender -> receiver` row as `Pending`.
    ///
    /// # Errors
    ///
    /// * `FriendshipError::SelfRequest` - Sender and receiver are the same user
    /// * `FriendshipError::AlreadyFriends` - The pair is already connected
    /// * `FriendshipError::NotFound` - No row exists for the pair
    pub async fn send_request(&self, sender_id: UserId, receiver_id: UserId) -> FriendshipResult<()> {
        if sender_id == receiver_id {
            return Err(FriendshipError::SelfRequest);
        }

        let row = sqlx::query("SELECT status FROM friendships WHERE sender_id = ? AND receiver_id = ?")
            .bind(sender_id)
            .bind(receiver_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(FriendshipError::NotFound)?;

        let status: FriendshipStatus = row.get::<String, _>("status").parse()?;
        if status == FriendshipStatus::Friend {
            return Err(FriendshipError::AlreadyFriends);
        }

        sqlx::query("UPDATE friendships SET status = ? WHERE sender_id = ? AND receiver_id = ?")
            .bind(FriendshipStatus::Pending.as_str())
            .bind(sender_id)
            .bind(receiver_id)
            .execute(self.pool.as_ref())
            .await?;

        log::debug!("Friend request {sender_id} -> {receiver_id}");
        Ok(())
    }

    /// Requests waiting for `user_id` to answer
    pub async fn pending_requests(&self, user_id: UserId) -> FriendshipResult<Vec<Friendship>> {
        let rows = sqlx::query(
            r#"
            SELECT sender_id, receiver_id, sender_username, receiver_username, status
            FROM friendships
            WHERE receiver_id = ? AND status = 'Pending'
            ORDER BY sender_username
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(friendship_from_row).collect()
    }

    /// Outgoing rows of `user_id` with each receiver's presence
    pub async fn list(&self, user_id: UserId) -> FriendshipResult<Vec<FriendshipView>> {
        let rows = sqlx::query(
            r#"
            SELECT f.sender_id, f.receiver_id, f.receiver_username, u.online_status, f.status
            FROM friendships f
            JOIN users u ON u.id = f.receiver_id
            WHERE f.sender_id = ?
            ORDER BY f.receiver_username
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(FriendshipView {
                    sender_id: row.get("sender_id"),
                    receiver_id: row.get("receiver_id"),
                    receiver_username: row.get("receiver_username"),
                    online_status: row.get("online_status"),
                    status: row.get::<String, _>("status").parse()?,
                })
            })
            .collect()
    }

    /// Accept a pending request addressed to `current_user`.
    ///
    /// # Errors
    ///
    /// * `FriendshipError::NotReceiver` - `current_user` is not the receiver
    /// * `FriendshipError::NotFound` - No pending request for the pair
    pub async fn accept(&self, current_user: UserId, pair: PairRequest) -> FriendshipResult<()> {
        if pair.receiver_id != current_user {
            return Err(FriendshipError::NotReceiver);
        }

        let mut tx = self.pool.begin().await?;

        let request = sqlx::query(
            r#"
            UPDATE friendships SET status = 'Friend'
            WHERE sender_id = ? AND receiver_id = ? AND status = 'Pending'
            "#,
        )
        .bind(pair.sender_id)
        .bind(pair.receiver_id)
        .execute(&mut *tx)
        .await?;

        if request.rows_affected() == 0 {
            return Err(FriendshipError::NotFound);
        }

        sqlx::query("UPDATE friendships SET status = 'Friend' WHERE sender_id = ? AND receiver_id = ?")
            .bind(pair.receiver_id)
            .bind(pair.sender_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        log::info!("Users {} and {} are now friends", pair.sender_id, pair.receiver_id);
        Ok(())
    }

    /// Decline a request addressed to `current_user`.
    ///
    /// # Errors
    ///
    /// * `FriendshipError::NotReceiver` - `current_user` is not the receiver
    /// * `FriendshipError::NotFound` - No row exists for the pair
    pub async fn decline(&self, current_user: UserId, pair: PairRequest) -> FriendshipResult<()> {
        if pair.receiver_id != current_user {
            return Err(FriendshipError::NotReceiver);
        }
        self.set_pair_status(pair, FriendshipStatus::NotFriend).await
    }

    /// Reset both directions of the pair to `Not Friend`.
    ///
    /// # Errors
    ///
    /// * `FriendshipError::NotParticipant` - `current_user` is neither side
    /// * `FriendshipError::NotFound` - No row exists for the pair
    pub async fn unfriend(&self, current_user: UserId, pair: PairRequest) -> FriendshipResult<()> {
        if pair.sender_id != current_user && pair.receiver_id != current_user {
            return Err(FriendshipError::NotParticipant);
        }
        self.set_pair_status(pair, FriendshipStatus::NotFriend).await
    }

    /// Everyone except `current_user`
    pub async fn list_users(&self, current_user: UserId) -> FriendshipResult<Vec<UserSummary>> {
        let rows = sqlx::query("SELECT id, username FROM users WHERE id != ? ORDER BY username")
            .bind(current_user)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows
            .iter()
            .map(|row| UserSummary {
                id: row.get("id"),
                username: row.get("username"),
            })
            .collect())
    }

    async fn set_pair_status(&self, pair: PairRequest, status: FriendshipStatus) -> FriendshipResult<()> {
        let mut tx = self.pool.begin().await?;
        let mut changed = 0;

        for (sender, receiver) in [
            (pair.sender_id, pair.receiver_id),
            (pair.receiver_id, pair.sender_id),
        ] {
            changed += sqlx::query("UPDATE friendships SET status = ? WHERE sender_id = ? AND receiver_id = ?")
                .bind(status.as_str())
                .bind(sender)
                .bind(receiver)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        if changed == 0 {
            return Err(FriendshipError::NotFound);
        }

        tx.commit().await?;
        log::debug!("Pair {}/{} set to {}", pair.sender_id, pair.receiver_id, status);
        Ok(())
    }
}

fn friendship_from_row(row: &SqliteRow) -> FriendshipResult<Friendship> {
    Ok(Friendship {
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        sender_username: row.get("sender_username"),
        receiver_username: row.get("receiver_username"),
        status: row.get::<String, _>("status").parse()?,
    })
}
