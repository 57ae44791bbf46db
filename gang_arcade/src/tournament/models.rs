//! Bracket data models.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Points a player has collected, or `?` before their first match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Score {
    #[default]
    Unknown,
    Points(u32),
}

impl Score {
    /// Points, counting an unplayed score as zero
    pub fn points(&self) -> u32 {
        match self {
            Score::Unknown => 0,
            Score::Points(points) => *points,
        }
    }

    /// Add `points`, turning `?` into a number
    pub fn add(&mut self, points: u32) {
        *self = Score::Points(self.points() + points);
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Score::Unknown => serializer.serialize_str("?"),
            Score::Points(points) => serializer.serialize_u32(*points),
        }
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(points) => Ok(Score::Points(points)),
            Raw::Text(text) if text == "?" => Ok(Score::Unknown),
            Raw::Text(text) => text
                .parse()
                .map(Score::Points)
                .map_err(|_| serde::de::Error::custom(format!("invalid score: {text}"))),
        }
    }
}

/// A tournament entrant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketPlayer {
    pub username: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub score: Score,
}

impl BracketPlayer {
    /// Player with the default avatar and no score yet
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            avatar: "None".to_string(),
            color: None,
            score: Score::Unknown,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// One pairing inside a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    /// Round ("circle"), 1-based
    pub round: u32,
    /// Position inside the round, 0-based
    pub slot: usize,
    pub player1: String,
    /// `None` means player 1 has a bye
    pub player2: Option<String>,
    pub winner: Option<String>,
}

impl Matchup {
    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    pub fn involves(&self, username: &str) -> bool {
        self.player1 == username || self.player2.as_deref() == Some(username)
    }

    /// The other side of a decided, non-bye matchup
    pub fn loser(&self) -> Option<&str> {
        let winner = self.winner.as_deref()?;
        let player2 = self.player2.as_deref()?;
        if winner == self.player1 {
            Some(player2)
        } else {
            Some(self.player1.as_str())
        }
    }
}

/// How players are paired into matchups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    /// Shuffle, then pair neighbours
    Shuffled,
    /// Pair neighbours in seeding order
    InOrder,
}

/// How a match win is scored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// 10 points in round 1, 20 in round 2, 40 from round 3 on
    RoundWeighted,
    /// One point per win
    WinFlag,
}

impl ScoringRule {
    pub fn points_for(&self, round: u32) -> u32 {
        match self {
            ScoringRule::RoundWeighted => match round {
                0 | 1 => 10,
                2 => 20,
                _ => 40,
            },
            ScoringRule::WinFlag => 1,
        }
    }
}

/// Pairing and scoring rules of a tournament
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentFormat {
    pub pairing: Pairing,
    pub scoring: ScoringRule,
}

impl TournamentFormat {
    pub fn pong() -> Self {
        Self {
            pairing: Pairing::Shuffled,
            scoring: ScoringRule::RoundWeighted,
        }
    }

    pub fn tic_tac_toe() -> Self {
        Self {
            pairing: Pairing::InOrder,
            scoring: ScoringRule::WinFlag,
        }
    }
}
