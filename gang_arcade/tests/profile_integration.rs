//! Integration tests for player profiles and the leaderboard.

use gang_arcade::db::Database;
use gang_arcade::profile::{
    Avatar, Gender, Language, MAX_PICTURE_BYTES, ProfileError, ProfileManager,
};
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use std::sync::Arc;

struct TestContext {
    pool: Arc<SqlitePool>,
    profiles: ProfileManager,
    upload_dir: PathBuf,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

async fn setup() -> TestContext {
    let db = Database::in_memory().await.expect("Failed to create test database");
    let pool = Arc::new(db.pool().clone());
    let upload_dir = std::env::temp_dir().join(format!("gang-arcade-{}", uuid::Uuid::new_v4()));
    let profiles = ProfileManager::new(pool.clone(), &upload_dir);

    TestContext {
        pool,
        profiles,
        upload_dir,
    }
}

async fn create_user(pool: &SqlitePool, username: &str, wins: i64, losses: i64) -> i64 {
    sqlx::query(
        "INSERT INTO users (username, email, wins, losses) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(username)
    .bind(format!("{username}@example.com"))
    .bind(wins)
    .bind(losses)
    .fetch_one(pool)
    .await
    .unwrap()
    .get("id")
}

#[tokio::test]
async fn test_get_profile_defaults() {
    let ctx = setup().await;
    let id = create_user(&ctx.pool, "ana", 0, 0).await;

    let profile = ctx.profiles.get_profile(id).await.unwrap();
    assert_eq!(profile.username, "ana");
    assert_eq!(profile.gender, Gender::Other);
    assert_eq!(profile.language, Language::English);
    assert_eq!(profile.fav_avatar, Avatar::None);
    assert!(profile.first_name.is_none());

    let public = ctx.profiles.get_public_profile("ana").await.unwrap();
    assert_eq!(public, profile);

    assert!(matches!(
        ctx.profiles.get_profile(404).await,
        Err(ProfileError::UserNotFound)
    ));
    assert!(matches!(
        ctx.profiles.get_public_profile("no body").await,
        Err(ProfileError::InvalidUsername)
    ));
}

#[tokio::test]
async fn test_update_fields() {
    let ctx = setup().await;
    let id = create_user(&ctx.pool, "ana", 0, 0).await;

    ctx.profiles.update_field(id, id, "firstName", "Ana Marija").await.unwrap();
    ctx.profiles.update_field(id, id, "dateOfBirth", "1999-12-31").await.unwrap();
    ctx.profiles.update_field(id, id, "language", "finnish").await.unwrap();
    ctx.profiles.update_field(id, id, "favAvatar", "Burek").await.unwrap();
    ctx.profiles.update_field(id, id, "gender", "female").await.unwrap();

    let profile = ctx.profiles.get_profile(id).await.unwrap();
    assert_eq!(profile.first_name.as_deref(), Some("Ana Marija"));
    assert_eq!(profile.date_of_birth.as_deref(), Some("1999-12-31"));
    assert_eq!(profile.language, Language::Finnish);
    assert_eq!(profile.fav_avatar, Avatar::Burek);
    assert_eq!(profile.gender, Gender::Female);
}

#[tokio::test]
async fn test_update_field_rejections() {
    let ctx = setup().await;
    let ana = create_user(&ctx.pool, "ana", 0, 0).await;
    let bo = create_user(&ctx.pool, "bo", 0, 0).await;

    assert!(matches!(
        ctx.profiles.update_field(bo, ana, "firstName", "Bo").await,
        Err(ProfileError::Forbidden)
    ));
    assert!(matches!(
        ctx.profiles.update_field(ana, ana, "wins", "100").await,
        Err(ProfileError::FieldNotAllowed)
    ));
    assert!(matches!(
        ctx.profiles.update_field(ana, ana, "lastName", "R2D2").await,
        Err(ProfileError::InvalidName)
    ));
    assert!(matches!(
        ctx.profiles.update_field(ana, ana, "dateOfBirth", "1999-02-30").await,
        Err(ProfileError::InvalidDate)
    ));
    assert!(matches!(
        ctx.profiles.update_field(ana, ana, "language", "klingon").await,
        Err(ProfileError::InvalidValue { .. })
    ));
    assert!(matches!(
        ctx.profiles.update_field(999, 999, "gender", "male").await,
        Err(ProfileError::UserNotFound)
    ));
}

#[tokio::test]
async fn test_leaderboard_order() {
    let ctx = setup().await;
    assert!(matches!(
        ctx.profiles.all_profiles().await,
        Err(ProfileError::NoProfiles)
    ));

    create_user(&ctx.pool, "ana", 3, 1).await;
    create_user(&ctx.pool, "bo", 5, 2).await;
    create_user(&ctx.pool, "cy", 3, 0).await;

    let board = ctx.profiles.all_profiles().await.unwrap();
    let names: Vec<_> = board.iter().map(|e| e.username.as_str()).collect();
    assert_eq!(names, ["bo", "cy", "ana"]);
    assert_eq!(board[0].wins, 5);
}

#[tokio::test]
async fn test_profile_picture_upload() {
    let ctx = setup().await;
    let id = create_user(&ctx.pool, "ana", 0, 0).await;

    let path = ctx
        .profiles
        .set_profile_pic(id, id, "image/png", b"\x89PNG fake")
        .await
        .unwrap();
    assert!(path.starts_with("/profile-pics/uploads/"));
    assert!(path.ends_with(".png"));

    let file_name = path.rsplit('/').next().unwrap();
    let stored = std::fs::read(ctx.upload_dir.join(file_name)).unwrap();
    assert_eq!(stored, b"\x89PNG fake");

    let profile = ctx.profiles.get_profile(id).await.unwrap();
    assert_eq!(profile.profile_pic.as_deref(), Some(path.as_str()));
}

#[tokio::test]
async fn test_profile_picture_rejections() {
    let ctx = setup().await;
    let ana = create_user(&ctx.pool, "ana", 0, 0).await;

    assert!(matches!(
        ctx.profiles.set_profile_pic(ana + 1, ana, "image/png", b"x").await,
        Err(ProfileError::Forbidden)
    ));
    assert!(matches!(
        ctx.profiles.set_profile_pic(ana, ana, "image/png", b"").await,
        Err(ProfileError::NoFile)
    ));
    assert!(matches!(
        ctx.profiles.set_profile_pic(ana, ana, "image/gif", b"GIF89a").await,
        Err(ProfileError::InvalidFileType)
    ));

    let too_big = vec![0u8; MAX_PICTURE_BYTES + 1];
    assert!(matches!(
        ctx.profiles.set_profile_pic(ana, ana, "image/jpeg", &too_big).await,
        Err(ProfileError::FileTooLarge)
    ));

    // Nothing was written for rejected uploads
    assert!(!ctx.upload_dir.exists());

    assert!(matches!(
        ctx.profiles.set_profile_pic(999, 999, "image/jpeg", b"jpeg").await,
        Err(ProfileError::UserNotFound)
    ));
    let leftovers = std::fs::read_dir(&ctx.upload_dir).unwrap().count();
    assert_eq!(leftovers, 0, "file of an unknown user is removed");
}

#[tokio::test]
async fn test_profile_picture_removed_when_update_fails() {
    let ctx = setup().await;
    let ana = create_user(&ctx.pool, "ana", 0, 0).await;

    sqlx::query(
        "CREATE TRIGGER lock_profile_pic BEFORE UPDATE OF profile_pic ON users \
         BEGIN SELECT RAISE(ABORT, 'profile_pic is locked'); END",
    )
    .execute(ctx.pool.as_ref())
    .await
    .unwrap();

    assert!(matches!(
        ctx.profiles.set_profile_pic(ana, ana, "image/webp", b"RIFF webp").await,
        Err(ProfileError::Database(_))
    ));

    let leftovers = std::fs::read_dir(&ctx.upload_dir).unwrap().count();
    assert_eq!(leftovers, 0, "upload is removed when the row cannot be updated");

    let profile = ctx.profiles.get_profile(ana).await.unwrap();
    assert!(
        !profile
            .profile_pic
            .is_some_and(|pic| pic.starts_with("/profile-pics/uploads/"))
    );
}
