//! Profile manager implementation.

use super::{
    errors::{ProfileError, ProfileResult},
    models::{
        ALLOWED_PICTURE_TYPES, LeaderboardEntry, MAX_PICTURE_BYTES, Profile, ProfileField,
        picture_extension,
    },
};
use crate::{auth::UserId, validation};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use std::{path::PathBuf, sync::Arc};
use uuid::Uuid;

/// URL prefix under which uploaded pictures are served
pub const UPLOAD_URL_PREFIX: &str = "/profile-pics/uploads";

const PROFILE_COLUMNS: &str = "username, email, profile_pic, first_name, last_name, gender, \
    date_of_birth, wins, losses, language, fav_avatar";

/// Profile manager
#[derive(Clone)]
pub struct ProfileManager {
    pool: Arc<SqlitePool>,
    upload_dir: PathBuf,
}

impl ProfileManager {
    /// Create a profile manager storing uploads in `upload_dir`
    pub fn new(pool: Arc<SqlitePool>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            upload_dir: upload_dir.into(),
        }
    }

    /// Directory holding uploaded pictures
    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }

    /// Profile by user id
    pub async fn get_profile(&self, user_id: UserId) -> ProfileResult<Profile> {
        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(ProfileError::UserNotFound)?;

        profile_from_row(&row)
    }

    /// Profile by username
    pub async fn get_public_profile(&self, username: &str) -> ProfileResult<Profile> {
        if !validation::is_valid_username(username) {
            return Err(ProfileError::InvalidUsername);
        }

        let row = sqlx::query(&format!("SELECT {PROFILE_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(ProfileError::UserNotFound)?;

        profile_from_row(&row)
    }

    /// Win/loss table of every player, best first
    pub async fn all_profiles(&self) -> ProfileResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(
            "SELECT username, wins, losses FROM users ORDER BY wins DESC, losses ASC, username ASC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        if rows.is_empty() {
            return Err(ProfileError::NoProfiles);
        }

        Ok(rows
            .iter()
            .map(|row| LeaderboardEntry {
                username: row.get("username"),
                wins: row.get("wins"),
                losses: row.get("losses"),
            })
            .collect())
    }

    /// Update one editable field of `user_id`'s profile
    ///
    /// # Errors
    ///
    /// * `ProfileError::Forbidden` - `current_user` is not `user_id`
    /// * `ProfileError::FieldNotAllowed` - Field is not editable
    /// * `ProfileError::InvalidName` / `InvalidDate` / `InvalidValue` - Value rejected
    /// * `ProfileError::UserNotFound` - No such user
    pub async fn update_field(
        &self,
        current_user: UserId,
        user_id: UserId,
        field: &str,
        value: &str,
    ) -> ProfileResult<()> {
        if current_user != user_id {
            return Err(ProfileError::Forbidden);
        }

        let field: ProfileField = field.parse()?;
        field.validate(value)?;

        // Column name comes from a closed enum, never from the request.
        let result = sqlx::query(&format!("UPDATE users SET {} = ? WHERE id = ?", field.column()))
            .bind(value)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await?;

        if result.rows_affected() == 0 {
            return Err(ProfileError::UserNotFound);
        }

        log::debug!("User {} updated {}", user_id, field.column());
        Ok(())
    }

    /// Store a new profile picture and return its public path
    ///
    /// # Errors
    ///
    /// * `ProfileError::Forbidden` - `current_user` is not `user_id`
    /// * `ProfileError::NoFile` - Empty upload
    /// * `ProfileError::FileTooLarge` - Over [`MAX_PICTURE_BYTES`]
    /// * `ProfileError::InvalidFileType` - Not one of [`ALLOWED_PICTURE_TYPES`]
    pub async fn set_profile_pic(
        &self,
        current_user: UserId,
        user_id: UserId,
        content_type: &str,
        bytes: &[u8],
    ) -> ProfileResult<String> {
        if current_user != user_id {
            return Err(ProfileError::Forbidden);
        }
        if bytes.is_empty() {
            return Err(ProfileError::NoFile);
        }
        if bytes.len() > MAX_PICTURE_BYTES {
            return Err(ProfileError::FileTooLarge);
        }
        if !ALLOWED_PICTURE_TYPES.contains(&content_type) {
            return Err(ProfileError::InvalidFileType);
        }
        let extension = picture_extension(content_type).ok_or(ProfileError::InvalidFileType)?;

        let file_name = format!("{}-{}.{}", user_id, Uuid::new_v4(), extension);
        let file_path = self.upload_dir.join(&file_name);
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(&file_path, bytes).await?;

        let public_path = format!("{UPLOAD_URL_PREFIX}/{file_name}");
        let updated = sqlx::query("UPDATE users SET profile_pic = ? WHERE id = ?")
            .bind(&public_path)
            .bind(user_id)
            .execute(self.pool.as_ref())
            .await
            .map_err(ProfileError::from)
            .and_then(|result| match result.rows_affected() {
                0 => Err(ProfileError::UserNotFound),
                _ => Ok(()),
            });

        if let Err(err) = updated {
            if let Err(e) = tokio::fs::remove_file(&file_path).await {
                log::warn!("Failed to remove {}: {e}", file_path.display());
            }
            return Err(err);
        }

        log::info!("User {user_id} uploaded {public_path}");
        Ok(public_path)
    }
}

fn profile_from_row(row: &SqliteRow) -> ProfileResult<Profile> {
    Ok(Profile {
        username: row.get("username"),
        email: row.get("email"),
        profile_pic: row.get("profile_pic"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        gender: row.get::<String, _>("gender").parse()?,
        date_of_birth: row.get("date_of_birth"),
        wins: row.get("wins"),
        losses: row.get("losses"),
        language: row.get::<String, _>("language").parse()?,
        fav_avatar: row.get::<String, _>("fav_avatar").parse()?,
    })
}
