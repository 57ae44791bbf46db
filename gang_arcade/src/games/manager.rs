//! Game manager implementation.

use super::{
    errors::{GameError, GameResult},
    models::{
        GameAchievementRequest, GameId, GameKind, GameSession, MatchRecord, OutcomeRecorded,
        SaveSessionRequest, StartDuelRequest, StartTournamentRequest, TournamentStarted,
    },
};
use crate::{
    mail::{Mailer, templates},
    tournament::{Bracket, BracketPlayer, BracketSnapshot, RoundProgress},
    validation,
};
use chrono::{DateTime, Duration, Utc};
use rand::{SeedableRng, rngs::StdRng};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a finished tournament stays readable
const FINISHED_RETENTION_MINUTES: i64 = 60;

/// How long an unfinished tournament is kept before it counts as abandoned
const ABANDONED_AFTER_HOURS: i64 = 24;

/// A tournament being played
#[derive(Debug)]
struct LiveTournament {
    host: String,
    kind: GameKind,
    bracket: Bracket,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Game manager
#[derive(Clone)]
pub struct GameManager {
    pool: Arc<SqlitePool>,
    mailer: Arc<dyn Mailer>,
    tournaments: Arc<RwLock<HashMap<Uuid, LiveTournament>>>,
}

impl GameManager {
    pub fn new(pool: Arc<SqlitePool>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            pool,
            mailer,
            tournaments: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check a duel can be played: all fields set, valid names, known host
    ///
    /// # Errors
    ///
    /// * `GameError::MissingFields` - A field is empty
    /// * `GameError::InvalidUsername` - A username is not alphanumeric
    /// * `GameError::HostNotFound` - `user` is not registered
    pub async fn start_duel(&self, request: &StartDuelRequest) -> GameResult<()> {
        if [&request.user, &request.user_avatar, &request.guest, &request.guest_avatar]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(GameError::MissingFields);
        }
        if !validation::is_valid_username(&request.user)
            || !validation::is_valid_username(&request.guest)
        {
            return Err(GameError::InvalidUsername);
        }

        self.user_id(&request.user)
            .await?
            .ok_or(GameError::HostNotFound)?;

        log::debug!("Duel {} vs {}", request.user, request.guest);
        Ok(())
    }

    /// Build a bracket of the host and their guests and keep it live
    ///
    /// # Errors
    ///
    /// * `GameError::MissingFields` - No host, avatar or guests
    /// * `GameError::HostNotFound` - `user` is not registered
    /// * `GameError::Tournament` - The entrants do not form a valid bracket
    pub async fn start_tournament(
        &self,
        request: StartTournamentRequest,
    ) -> GameResult<TournamentStarted> {
        if request.user.is_empty() || request.user_avatar.is_empty() || request.guests.is_empty() {
            return Err(GameError::MissingFields);
        }
        if !validation::is_valid_username(&request.user) {
            return Err(GameError::InvalidUsername);
        }

        self.user_id(&request.user)
            .await?
            .ok_or(GameError::HostNotFound)?;

        let kind = request.game_name.unwrap_or_default();
        let players: Vec<BracketPlayer> =
            std::iter::once(BracketPlayer::new(&request.user).with_avatar(&request.user_avatar))
                .chain(
                    request
                        .guests
                        .iter()
                        .map(|guest| BracketPlayer::new(&guest.username).with_avatar(&guest.avatar)),
                )
                .collect();

        let mut rng = StdRng::from_rng(&mut rand::rng());
        let bracket = Bracket::new(players, kind.tournament_format(), &mut rng)?;
        let snapshot = bracket.snapshot();

        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tournaments = self.tournaments.write().await;
        prune_stale(&mut tournaments, now);
        tournaments.insert(
            id,
            LiveTournament {
                host: request.user.clone(),
                kind,
                bracket,
                started_at: now,
                finished_at: None,
            },
        );

        log::info!(
            "Tournament {} ({}) started by {} with {} players",
            id,
            kind,
            request.user,
            request.guests.len() + 1
        );
        Ok(TournamentStarted {
            id,
            bracket: snapshot,
        })
    }

    /// Current state of a live tournament
    pub async fn tournament(&self, id: Uuid) -> GameResult<BracketSnapshot> {
        let tournaments = self.tournaments.read().await;
        let live = tournaments.get(&id).ok_or(GameError::TournamentNotFound)?;
        Ok(live.bracket.snapshot())
    }

    /// Record a match result; once a champion emerges the bracket is saved
    /// as a session of the host.
    ///
    /// The outcome is only kept if that save succeeds, so a failed final
    /// outcome can be reported again.
    ///
    /// # Errors
    ///
    /// * `GameError::TournamentNotFound` - Unknown id
    /// * `GameError::Forbidden` - `current_username` is not the host
    /// * `GameError::Tournament` - The outcome does not fit the bracket
    pub async fn record_tournament_outcome(
        &self,
        current_username: &str,
        id: Uuid,
        slot: usize,
        winner: &str,
    ) -> GameResult<OutcomeRecorded> {
        let mut tournaments = self.tournaments.write().await;
        let live = tournaments.get_mut(&id).ok_or(GameError::TournamentNotFound)?;
        if live.host != current_username {
            return Err(GameError::Forbidden);
        }

        let mut next = live.bracket.clone();
        let progress = next.record_outcome(slot, winner)?;
        let saved_game = match progress {
            RoundProgress::Champion(_) => {
                let rounds = next.to_session_rounds();
                let game_id = self.save_rounds(&live.host, live.kind, &rounds).await?;
                live.finished_at = Some(Utc::now());
                Some(game_id)
            }
            _ => None,
        };

        live.bracket = next;
        let bracket = live.bracket.snapshot();
        Ok(OutcomeRecorded {
            progress,
            bracket,
            saved_game,
        })
    }

    /// Store a finished session and update the players' counters
    ///
    /// # Errors
    ///
    /// * `GameError::InvalidUsername` - `username` is not alphanumeric
    /// * `GameError::InvalidGameName` - Unknown game
    /// * `GameError::Forbidden` - Saving for someone other than `current_username`
    /// * `GameError::UnknownUser` - `username` is not registered
    /// * `GameError::InvalidRounds` - `rounds` is not valid rounds JSON
    pub async fn save_session(
        &self,
        current_username: &str,
        request: SaveSessionRequest,
    ) -> GameResult<GameId> {
        if !validation::is_valid_username(&request.username) {
            return Err(GameError::InvalidUsername);
        }
        let kind: GameKind = request.game_name.parse()?;
        if request.username != current_username {
            return Err(GameError::Forbidden);
        }

        let rounds: Vec<Vec<MatchRecord>> = serde_json::from_str(&request.rounds)?;
        self.save_rounds(&request.username, kind, &rounds).await
    }

    /// Sessions stored for `username`, oldest first
    pub async fn games_for(&self, username: &str) -> GameResult<Vec<GameSession>> {
        if !validation::is_valid_username(username) {
            return Err(GameError::InvalidUsername);
        }
        let user_id = self
            .user_id(username)
            .await?
            .ok_or(GameError::UserNotFound)?;

        let rows = sqlx::query(
            r#"
            SELECT id_game, id_user, date, rounds_json, game_name
            FROM games
            WHERE id_user = ?
            ORDER BY id_game
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(GameSession {
                    id_game: row.get("id_game"),
                    id_user: row.get("id_user"),
                    date: row.get("date"),
                    rounds_json: row.get("rounds_json"),
                    game_name: row.get::<String, _>("game_name").parse()?,
                })
            })
            .collect()
    }

    /// Announce a placement; first place gets a congratulation email
    pub async fn game_achievement(&self, request: &GameAchievementRequest) -> GameResult<String> {
        if !validation::is_valid_username(&request.username) {
            return Err(GameError::InvalidUsername);
        }
        if !validation::is_valid_email(&request.email) {
            return Err(GameError::InvalidEmail);
        }

        if request.position == 1 {
            self.mailer
                .send(templates::game_achievement(&request.email, &request.username))
                .await?;
        }

        Ok(format!(
            "Game result: {} finished in position {}",
            request.username, request.position
        ))
    }

    async fn save_rounds(
        &self,
        username: &str,
        kind: GameKind,
        rounds: &[Vec<MatchRecord>],
    ) -> GameResult<GameId> {
        let rounds_json = serde_json::to_string(rounds)?;
        let mut tx = self.pool.begin().await?;

        let user_id = lookup_user(&mut *tx, username)
            .await?
            .ok_or(GameError::UnknownUser)?;

        let row = sqlx::query(
            "INSERT INTO games (id_user, rounds_json, game_name) VALUES (?, ?, ?) RETURNING id_game",
        )
        .bind(user_id)
        .bind(&rounds_json)
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let game_id: GameId = row.get("id_game");

        let mut registered = HashMap::new();
        for record in rounds.iter().flatten() {
            if !registered.contains_key(&record.p1_username) {
                let known = lookup_user(&mut *tx, &record.p1_username).await?.is_some();
                registered.insert(record.p1_username.clone(), known);
            }
        }

        let stats = aggregate_stats(kind, rounds, |name| {
            registered.get(name).copied().unwrap_or(false)
        });
        for (player, (wins, losses)) in &stats {
            sqlx::query("UPDATE users SET wins = wins + ?, losses = losses + ? WHERE username = ?")
                .bind(wins)
                .bind(losses)
                .bind(player)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        log::info!(
            "Saved {} session {} for {} ({} players updated)",
            kind,
            game_id,
            username,
            stats.len()
        );
        Ok(game_id)
    }

    async fn user_id(&self, username: &str) -> GameResult<Option<i64>> {
        let mut conn = self.pool.acquire().await?;
        Ok(lookup_user(&mut *conn, username).await?)
    }
}

async fn lookup_user(conn: &mut SqliteConnection, username: &str) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query("SELECT id FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|row| row.get("id")))
}

/// Per-player `(wins, losses)` deltas for a session.
///
/// Only player 1 of each match is credited, and only when registered. In
/// Tic-Tac-Toe the last registered player 1 also takes a loss when they are not
/// in the final match.
fn aggregate_stats(
    kind: GameKind,
    rounds: &[Vec<MatchRecord>],
    is_registered: impl Fn(&str) -> bool,
) -> BTreeMap<String, (i64, i64)> {
    let mut stats: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    let mut last_registered: Option<&str> = None;

    for record in rounds.iter().flatten() {
        if !is_registered(&record.p1_username) {
            log::debug!("Skipping stats for unregistered {}", record.p1_username);
            continue;
        }
        last_registered = Some(record.p1_username.as_str());
        let entry = stats.entry(record.p1_username.clone()).or_default();
        entry.0 += i64::from(record.p1_wins);
        entry.1 += i64::from(record.p2_wins);
    }

    if kind == GameKind::TicTacToe {
        if let Some(player) = last_registered {
            let final_p1 = rounds.last().and_then(|round| round.last()).map(|m| m.p1_username.as_str());
            if final_p1 != Some(player) {
                stats.entry(player.to_string()).or_default().1 += 1;
            }
        }
    }

    stats
}

/// Drop finished tournaments past their retention and abandoned ones
fn prune_stale(tournaments: &mut HashMap<Uuid, LiveTournament>, now: DateTime<Utc>) {
    let finished_cutoff = now - Duration::minutes(FINISHED_RETENTION_MINUTES);
    let abandoned_cutoff = now - Duration::hours(ABANDONED_AFTER_HOURS);
    let before = tournaments.len();
    tournaments.retain(|_, live| match live.finished_at {
        Some(at) => at > finished_cutoff,
        None => live.started_at > abandoned_cutoff,
    });

    let pruned = before - tournaments.len();
    if pruned > 0 {
        log::debug!("Pruned {pruned} stale tournaments");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(p1: &str, p2: &str, p1_wins: u32, p2_wins: u32) -> MatchRecord {
        MatchRecord {
            p1_username: p1.to_string(),
            p2_username: p2.to_string(),
            p1_avatar: String::new(),
            p2_avatar: String::new(),
            p1_wins,
            p2_wins,
        }
    }

    #[test]
    fn test_aggregate_counts_registered_player_one_only() {
        let rounds = vec![
            vec![record("ana", "guest1", 1, 0), record("guest2", "ana", 1, 0)],
            vec![record("ana", "guest2", 0, 1)],
        ];
        let stats = aggregate_stats(GameKind::PingPong, &rounds, |name| name == "ana");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats["ana"], (1, 1));
    }

    #[test]
    fn test_tic_tac_toe_extra_loss_when_missing_final() {
        let rounds = vec![
            vec![record("ana", "bo", 0, 1), record("cy", "di", 1, 0)],
            vec![record("bo", "cy", 1, 0)],
        ];
        let stats = aggregate_stats(GameKind::TicTacToe, &rounds, |name| name == "ana");
        assert_eq!(stats["ana"], (0, 2));

        // Same rounds in pong carry no extra loss
        let stats = aggregate_stats(GameKind::PingPong, &rounds, |name| name == "ana");
        assert_eq!(stats["ana"], (0, 1));
    }

    #[test]
    fn test_tic_tac_toe_no_extra_loss_when_in_final() {
        let rounds = vec![
            vec![record("ana", "bo", 1, 0), record("cy", "di", 1, 0)],
            vec![record("ana", "cy", 1, 0)],
        ];
        let stats = aggregate_stats(GameKind::TicTacToe, &rounds, |name| name == "ana");
        assert_eq!(stats["ana"], (2, 0));
    }

    fn live(started_at: DateTime<Utc>, finished_at: Option<DateTime<Utc>>) -> LiveTournament {
        let players = vec![BracketPlayer::new("ana"), BracketPlayer::new("bo")];
        let mut rng = StdRng::seed_from_u64(7);
        LiveTournament {
            host: "ana".to_string(),
            kind: GameKind::PingPong,
            bracket: Bracket::new(players, GameKind::PingPong.tournament_format(), &mut rng)
                .unwrap(),
            started_at,
            finished_at,
        }
    }

    #[test]
    fn test_prune_drops_abandoned_and_expired() {
        let now = Utc::now();
        let abandoned = Uuid::new_v4();
        let playing = Uuid::new_v4();
        let just_finished = Uuid::new_v4();
        let long_finished = Uuid::new_v4();

        let mut tournaments = HashMap::new();
        tournaments.insert(abandoned, live(now - Duration::hours(25), None));
        tournaments.insert(playing, live(now - Duration::hours(2), None));
        tournaments.insert(
            just_finished,
            live(now - Duration::hours(30), Some(now - Duration::minutes(5))),
        );
        tournaments.insert(
            long_finished,
            live(now - Duration::hours(3), Some(now - Duration::minutes(61))),
        );

        prune_stale(&mut tournaments, now);

        assert_eq!(tournaments.len(), 2);
        assert!(tournaments.contains_key(&playing));
        assert!(tournaments.contains_key(&just_finished));
    }

    #[test]
    fn test_aggregate_empty_rounds() {
        let stats = aggregate_stats(GameKind::TicTacToe, &[], |_| true);
        assert!(stats.is_empty());
    }
}
