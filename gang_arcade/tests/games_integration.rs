//! Integration tests for game sessions and live tournaments.

use gang_arcade::db::Database;
use gang_arcade::games::{
    GameAchievementRequest, GameError, GameKind, GameManager, MatchRecord, SaveSessionRequest,
    StartDuelRequest, StartTournamentRequest, TournamentGuest,
};
use gang_arcade::mail::MemoryMailer;
use gang_arcade::tournament::{RoundProgress, TournamentError};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

struct TestContext {
    pool: Arc<SqlitePool>,
    mailer: Arc<MemoryMailer>,
    games: GameManager,
}

async fn setup() -> TestContext {
    let db = Database::in_memory().await.expect("Failed to create test database");
    let pool = Arc::new(db.pool().clone());
    let mailer = Arc::new(MemoryMailer::new());
    let games = GameManager::new(pool.clone(), mailer.clone());

    for name in ["ana", "bo"] {
        sqlx::query("INSERT INTO users (username, email) VALUES (?, ?)")
            .bind(name)
            .bind(format!("{name}@example.com"))
            .execute(pool.as_ref())
            .await
            .unwrap();
    }

    TestContext { pool, mailer, games }
}

async fn record_of(pool: &SqlitePool, username: &str) -> (i64, i64) {
    let row = sqlx::query("SELECT wins, losses FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await
        .unwrap();
    (row.get("wins"), row.get("losses"))
}

fn record(p1: &str, p2: &str, p1_wins: u32, p2_wins: u32) -> MatchRecord {
    MatchRecord {
        p1_username: p1.to_string(),
        p2_username: p2.to_string(),
        p1_avatar: "Burek".to_string(),
        p2_avatar: "Fish".to_string(),
        p1_wins,
        p2_wins,
    }
}

fn save_request(username: &str, game: &str, rounds: &[Vec<MatchRecord>]) -> SaveSessionRequest {
    SaveSessionRequest {
        username: username.to_string(),
        rounds: serde_json::to_string(rounds).unwrap(),
        game_name: game.to_string(),
    }
}

#[tokio::test]
async fn test_save_session_updates_registered_players() {
    let ctx = setup().await;
    let rounds = vec![
        vec![record("ana", "guest", 3, 1), record("bo", "ana", 2, 2)],
        vec![record("guest", "bo", 5, 0)],
    ];

    let id = ctx
        .games
        .save_session("ana", save_request("ana", "ping-pong", &rounds))
        .await
        .unwrap();
    assert!(id > 0);

    assert_eq!(record_of(&ctx.pool, "ana").await, (3, 1));
    assert_eq!(record_of(&ctx.pool, "bo").await, (2, 2));

    let sessions = ctx.games.games_for("ana").await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].game_name, GameKind::PingPong);
    let stored: Vec<Vec<MatchRecord>> = serde_json::from_str(&sessions[0].rounds_json).unwrap();
    assert_eq!(stored, rounds);

    assert!(ctx.games.games_for("bo").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tic_tac_toe_final_absence_costs_a_loss() {
    let ctx = setup().await;
    let rounds = vec![
        vec![record("ana", "guest1", 0, 1), record("guest2", "guest3", 1, 0)],
        vec![record("guest1", "guest2", 1, 0)],
    ];

    ctx.games
        .save_session("ana", save_request("ana", "tic-tac-toe", &rounds))
        .await
        .unwrap();

    assert_eq!(record_of(&ctx.pool, "ana").await, (0, 2));
}

#[tokio::test]
async fn test_save_session_rejections() {
    let ctx = setup().await;
    let rounds = vec![vec![record("ana", "bo", 1, 0)]];

    assert!(matches!(
        ctx.games
            .save_session("ana", save_request("ana!", "ping-pong", &rounds))
            .await,
        Err(GameError::InvalidUsername)
    ));
    assert!(matches!(
        ctx.games
            .save_session("ana", save_request("ana", "chess", &rounds))
            .await,
        Err(GameError::InvalidGameName(_))
    ));
    assert!(matches!(
        ctx.games
            .save_session("ana", save_request("bo", "ping-pong", &rounds))
            .await,
        Err(GameError::Forbidden)
    ));
    assert!(matches!(
        ctx.games
            .save_session("zed", save_request("zed", "ping-pong", &rounds))
            .await,
        Err(GameError::UnknownUser)
    ));

    let mut broken = save_request("ana", "ping-pong", &rounds);
    broken.rounds = "[[{\"p1_username\": 7}]]".to_string();
    assert!(matches!(
        ctx.games.save_session("ana", broken).await,
        Err(GameError::InvalidRounds(_))
    ));

    // Nothing was stored and nobody's counters moved
    assert!(ctx.games.games_for("ana").await.unwrap().is_empty());
    assert_eq!(record_of(&ctx.pool, "ana").await, (0, 0));
}

#[tokio::test]
async fn test_games_for_unknown_user() {
    let ctx = setup().await;
    assert!(matches!(
        ctx.games.games_for("zed").await,
        Err(GameError::UserNotFound)
    ));
}

#[tokio::test]
async fn test_start_duel() {
    let ctx = setup().await;
    let mut request = StartDuelRequest {
        user: "ana".to_string(),
        user_avatar: "Burek".to_string(),
        guest: "visitor".to_string(),
        guest_avatar: "Fish".to_string(),
    };
    ctx.games.start_duel(&request).await.unwrap();

    request.guest = "vis itor".to_string();
    assert!(matches!(
        ctx.games.start_duel(&request).await,
        Err(GameError::InvalidUsername)
    ));

    request.guest_avatar.clear();
    assert!(matches!(
        ctx.games.start_duel(&request).await,
        Err(GameError::MissingFields)
    ));

    let stranger = StartDuelRequest {
        user: "zed".to_string(),
        user_avatar: "Burek".to_string(),
        guest: "visitor".to_string(),
        guest_avatar: "Fish".to_string(),
    };
    assert!(matches!(
        ctx.games.start_duel(&stranger).await,
        Err(GameError::HostNotFound)
    ));
}

fn tournament_request(guests: &[&str]) -> StartTournamentRequest {
    StartTournamentRequest {
        user: "ana".to_string(),
        user_avatar: "Burek".to_string(),
        guests: guests
            .iter()
            .map(|name| TournamentGuest {
                username: name.to_string(),
                avatar: "Fish".to_string(),
            })
            .collect(),
        game_name: Some(GameKind::TicTacToe),
    }
}

#[tokio::test]
async fn test_tournament_runs_to_a_saved_session() {
    let ctx = setup().await;
    let started = ctx
        .games
        .start_tournament(tournament_request(&["bo", "cy", "di"]))
        .await
        .unwrap();
    assert_eq!(started.bracket.round, 1);
    assert_eq!(started.bracket.rounds[0].len(), 2);

    // Only the host may report results
    assert!(matches!(
        ctx.games
            .record_tournament_outcome("bo", started.id, 0, "ana")
            .await,
        Err(GameError::Forbidden)
    ));

    let first = ctx
        .games
        .record_tournament_outcome("ana", started.id, 0, "ana")
        .await
        .unwrap();
    assert_eq!(first.progress, RoundProgress::Pending { remaining: 1 });
    assert!(first.saved_game.is_none());

    let second = ctx
        .games
        .record_tournament_outcome("ana", started.id, 1, "cy")
        .await
        .unwrap();
    assert!(matches!(second.progress, RoundProgress::NextRound { round: 2, .. }));

    let last = ctx
        .games
        .record_tournament_outcome("ana", started.id, 0, "cy")
        .await
        .unwrap();
    assert_eq!(last.progress, RoundProgress::Champion("cy".to_string()));
    assert_eq!(last.bracket.champion.as_deref(), Some("cy"));
    let saved = last.saved_game.expect("finished tournament is saved");

    let sessions = ctx.games.games_for("ana").await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id_game, saved);
    assert_eq!(sessions[0].game_name, GameKind::TicTacToe);
    assert_eq!(record_of(&ctx.pool, "ana").await, (1, 1));

    // The finished bracket stays readable but takes no more results
    let snapshot = ctx.games.tournament(started.id).await.unwrap();
    assert_eq!(snapshot.champion.as_deref(), Some("cy"));
    assert!(matches!(
        ctx.games
            .record_tournament_outcome("ana", started.id, 0, "cy")
            .await,
        Err(GameError::Tournament(TournamentError::Finished))
    ));
}

#[tokio::test]
async fn test_final_outcome_can_be_retried_after_failed_save() {
    let ctx = setup().await;
    let started = ctx
        .games
        .start_tournament(tournament_request(&["bo"]))
        .await
        .unwrap();

    sqlx::query(
        "CREATE TRIGGER reject_games BEFORE INSERT ON games \
         BEGIN SELECT RAISE(ABORT, 'games are read-only'); END",
    )
    .execute(ctx.pool.as_ref())
    .await
    .unwrap();

    assert!(matches!(
        ctx.games
            .record_tournament_outcome("ana", started.id, 0, "ana")
            .await,
        Err(GameError::Database(_))
    ));

    // The failed outcome was not kept
    let snapshot = ctx.games.tournament(started.id).await.unwrap();
    assert!(snapshot.champion.is_none());
    assert!(snapshot.rounds[0][0].winner.is_none());
    assert_eq!(record_of(&ctx.pool, "ana").await, (0, 0));

    sqlx::query("DROP TRIGGER reject_games")
        .execute(ctx.pool.as_ref())
        .await
        .unwrap();

    let retried = ctx
        .games
        .record_tournament_outcome("ana", started.id, 0, "ana")
        .await
        .unwrap();
    assert_eq!(retried.progress, RoundProgress::Champion("ana".to_string()));
    let saved = retried.saved_game.expect("retried final is saved");

    let sessions = ctx.games.games_for("ana").await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id_game, saved);
    assert_eq!(record_of(&ctx.pool, "ana").await, (1, 0));
}

#[tokio::test]
async fn test_tournament_rejections() {
    let ctx = setup().await;

    assert!(matches!(
        ctx.games.start_tournament(tournament_request(&[])).await,
        Err(GameError::MissingFields)
    ));
    assert!(matches!(
        ctx.games.start_tournament(tournament_request(&["ana"])).await,
        Err(GameError::Tournament(TournamentError::DuplicatePlayer(_)))
    ));

    let mut stranger = tournament_request(&["bo"]);
    stranger.user = "zed".to_string();
    assert!(matches!(
        ctx.games.start_tournament(stranger).await,
        Err(GameError::HostNotFound)
    ));

    assert!(matches!(
        ctx.games.tournament(Uuid::new_v4()).await,
        Err(GameError::TournamentNotFound)
    ));

    let started = ctx
        .games
        .start_tournament(tournament_request(&["bo"]))
        .await
        .unwrap();
    assert!(matches!(
        ctx.games
            .record_tournament_outcome("ana", started.id, 0, "cy")
            .await,
        Err(GameError::Tournament(TournamentError::NotAParticipant(_)))
    ));
    assert!(matches!(
        ctx.games
            .record_tournament_outcome("ana", started.id, 3, "ana")
            .await,
        Err(GameError::Tournament(TournamentError::UnknownSlot(3)))
    ));
}

#[tokio::test]
async fn test_game_achievement() {
    let ctx = setup().await;

    let message = ctx
        .games
        .game_achievement(&GameAchievementRequest {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            position: 2,
        })
        .await
        .unwrap();
    assert_eq!(message, "Game result: ana finished in position 2");
    assert!(ctx.mailer.sent().is_empty(), "only first place is emailed");

    ctx.games
        .game_achievement(&GameAchievementRequest {
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            position: 1,
        })
        .await
        .unwrap();
    assert_eq!(ctx.mailer.sent().len(), 1);

    assert!(matches!(
        ctx.games
            .game_achievement(&GameAchievementRequest {
                username: "ana".to_string(),
                email: "nope".to_string(),
                position: 1,
            })
            .await,
        Err(GameError::InvalidEmail)
    ));
}
