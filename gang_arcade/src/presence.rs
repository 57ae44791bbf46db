//! Online presence.
//!
//! Clients post a heartbeat while a page is open; a periodic sweep marks users
//! offline once their last heartbeat is older than the idle threshold.

use crate::auth::UserId;
use chrono::Utc;
use sqlx::SqlitePool;
use std::{sync::Arc, time::Duration};

/// Heartbeat bookkeeping over the `users` table
#[derive(Clone)]
pub struct PresenceTracker {
    pool: Arc<SqlitePool>,
}

impl PresenceTracker {
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Mark `user_id` online as of now.
    pub async fn touch(&self, user_id: UserId) -> Result<(), sqlx::Error> {
        self.touch_at(user_id, Utc::now().timestamp_millis()).await
    }

    /// Mark `user_id` online with an explicit activity timestamp in ms.
    pub async fn touch_at(&self, user_id: UserId, now_ms: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET online_status = 'online', last_activity = ? WHERE id = ?")
            .bind(now_ms)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }

    /// Mark online users idle for longer than `idle` as offline.
    ///
    /// Returns the number of users that went offline.
    pub async fn sweep(&self, idle: Duration) -> Result<u64, sqlx::Error> {
        self.sweep_at(idle, Utc::now().timestamp_millis()).await
    }

    /// [`sweep`](Self::sweep) against an explicit clock.
    pub async fn sweep_at(&self, idle: Duration, now_ms: i64) -> Result<u64, sqlx::Error> {
        let idle_ms = i64::try_from(idle.as_millis()).unwrap_or(i64::MAX);
        let cutoff = now_ms.saturating_sub(idle_ms);

        let result = sqlx::query(
            "UPDATE users SET online_status = 'offline' WHERE online_status = 'online' AND last_activity < ?",
        )
        .bind(cutoff)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() > 0 {
            log::debug!("{} idle users marked offline", result.rows_affected());
        }
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use sqlx::Row;

    async fn status(pool: &SqlitePool, id: i64) -> String {
        sqlx::query("SELECT online_status FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
            .get("online_status")
    }

    #[tokio::test]
    async fn test_sweep_marks_idle_users_offline() {
        let db = Database::in_memory().await.unwrap();
        let pool = Arc::new(db.pool().clone());
        for name in ["ana", "bo"] {
            sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
                .bind(name)
                .bind(format!("{name}@example.com"))
                .execute(pool.as_ref())
                .await
                .unwrap();
        }

        let presence = PresenceTracker::new(pool.clone());
        let now = 10_000_000;
        presence.touch_at(1, now - 200_000).await.unwrap();
        presence.touch_at(2, now - 60_000).await.unwrap();

        let swept = presence.sweep_at(Duration::from_secs(180), now).await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(status(&pool, 1).await, "offline");
        assert_eq!(status(&pool, 2).await, "online");

        // Nothing left to sweep
        assert_eq!(presence.sweep_at(Duration::from_secs(180), now).await.unwrap(), 0);
    }
}
