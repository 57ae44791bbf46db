//! Game data models.

use super::errors::GameError;
use crate::tournament::{BracketSnapshot, RoundProgress, TournamentFormat};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Game session ID type
pub type GameId = i64;

/// Which arcade game a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameKind {
    #[default]
    #[serde(rename = "ping-pong")]
    PingPong,
    #[serde(rename = "tic-tac-toe")]
    TicTacToe,
}

impl GameKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::PingPong => "ping-pong",
            GameKind::TicTacToe => "tic-tac-toe",
        }
    }

    /// Bracket rules used by this game's tournaments
    pub fn tournament_format(&self) -> TournamentFormat {
        match self {
            GameKind::PingPong => TournamentFormat::pong(),
            GameKind::TicTacToe => TournamentFormat::tic_tac_toe(),
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ping-pong" => Ok(GameKind::PingPong),
            "tic-tac-toe" => Ok(GameKind::TicTacToe),
            other => Err(GameError::InvalidGameName(other.to_string())),
        }
    }
}

/// One match inside a saved round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub p1_username: String,
    pub p2_username: String,
    #[serde(default)]
    pub p1_avatar: String,
    #[serde(default)]
    pub p2_avatar: String,
    pub p1_wins: u32,
    pub p2_wins: u32,
}

/// A stored game session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub id_game: GameId,
    pub id_user: i64,
    pub date: String,
    /// Rounds of matches, kept as the JSON text that was saved
    pub rounds_json: String,
    pub game_name: GameKind,
}

/// Body of `POST /start-duel-ping-pong-game`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartDuelRequest {
    pub user: String,
    pub user_avatar: String,
    pub guest: String,
    pub guest_avatar: String,
}

/// A local guest joining a tournament
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentGuest {
    pub username: String,
    pub avatar: String,
}

/// Body of `POST /start-tournament-game`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartTournamentRequest {
    pub user: String,
    pub user_avatar: String,
    pub guests: Vec<TournamentGuest>,
    /// Defaults to ping-pong
    pub game_name: Option<GameKind>,
}

/// Reply to a started tournament
#[derive(Debug, Clone, Serialize)]
pub struct TournamentStarted {
    pub id: Uuid,
    pub bracket: BracketSnapshot,
}

/// Body of `POST /tournaments/{id}/outcome`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRequest {
    pub slot: usize,
    pub winner: String,
}

/// Reply to a recorded tournament outcome
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecorded {
    pub progress: RoundProgress,
    pub bracket: BracketSnapshot,
    /// Session saved once the champion is known
    pub saved_game: Option<GameId>,
}

/// Body of `POST /api/save-game-session`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveSessionRequest {
    pub username: String,
    /// JSON text: an array of rounds, each an array of [`MatchRecord`]
    pub rounds: String,
    pub game_name: String,
}

/// Body of `POST /game-achievement`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAchievementRequest {
    pub username: String,
    pub email: String,
    pub position: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::Pairing;

    #[test]
    fn test_game_kind_text() {
        assert_eq!("tic-tac-toe".parse::<GameKind>().unwrap(), GameKind::TicTacToe);
        assert!(matches!(
            "chess".parse::<GameKind>(),
            Err(GameError::InvalidGameName(name)) if name == "chess"
        ));
        assert_eq!(serde_json::to_string(&GameKind::PingPong).unwrap(), "\"ping-pong\"");
        assert_eq!(GameKind::TicTacToe.tournament_format().pairing, Pairing::InOrder);
    }

    #[test]
    fn test_requests_use_client_field_names() {
        let duel: StartDuelRequest = serde_json::from_str(
            r#"{"user":"ana","userAvatar":"Burek","guest":"bo","guestAvatar":"Fish"}"#,
        )
        .unwrap();
        assert_eq!(duel.guest_avatar, "Fish");

        let save: SaveSessionRequest =
            serde_json::from_str(r#"{"username":"ana","rounds":"[]","gameName":"ping-pong"}"#)
                .unwrap();
        assert_eq!(save.game_name, "ping-pong");

        let tournament: StartTournamentRequest = serde_json::from_str(
            r#"{"user":"ana","userAvatar":"Burek","guests":[{"username":"bo","avatar":"Fish"}],"gameName":"tic-tac-toe"}"#,
        )
        .unwrap();
        assert_eq!(tournament.game_name, Some(GameKind::TicTacToe));
        assert_eq!(tournament.guests[0].username, "bo");

        // Missing fields become empty values and are rejected by validation
        let empty: StartDuelRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.user.is_empty());
    }
}
