//! Bracket state machine.

use super::models::{BracketPlayer, Matchup, Pairing, Score, TournamentFormat};
use crate::games::MatchRecord;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Bracket errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TournamentError {
    #[error("A tournament needs at least 2 players")]
    NotEnoughPlayers,

    #[error("Player usernames cannot be empty")]
    EmptyUsername,

    #[error("Player {0} is entered twice")]
    DuplicatePlayer(String),

    #[error("Tournament already has a champion")]
    Finished,

    #[error("No matchup in slot {0} of the current round")]
    UnknownSlot(usize),

    #[error("Matchup in slot {0} is already decided")]
    AlreadyDecided(usize),

    #[error("{0} is not playing in this matchup")]
    NotAParticipant(String),
}

/// Result type for bracket operations
pub type TournamentResult<T> = Result<T, TournamentError>;

/// What changed after an outcome was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundProgress {
    /// The current round still has undecided matchups
    Pending { remaining: usize },
    /// The round finished and the next one was paired
    NextRound { round: u32, matchups: Vec<Matchup> },
    /// One player is left
    Champion(String),
}

/// Pair `players` into `⌈n/2⌉` matchups for `round`.
///
/// With an odd count the last matchup has no second player.
pub fn pair<R: Rng + ?Sized>(
    players: &[String],
    round: u32,
    pairing: Pairing,
    rng: &mut R,
) -> Vec<Matchup> {
    let mut order = players.to_vec();
    if pairing == Pairing::Shuffled {
        order.shuffle(rng);
    }

    order
        .chunks(2)
        .enumerate()
        .map(|(slot, pair)| Matchup {
            round,
            slot,
            player1: pair[0].clone(),
            player2: pair.get(1).cloned(),
            winner: None,
        })
        .collect()
}

/// Serializable view of a bracket
#[derive(Debug, Clone, Serialize)]
pub struct BracketSnapshot {
    pub format: TournamentFormat,
    pub round: u32,
    pub rounds: Vec<Vec<Matchup>>,
    pub next_matchup: Option<Matchup>,
    pub champion: Option<String>,
    pub standings: Vec<BracketPlayer>,
}

/// A single-elimination bracket
#[derive(Debug, Clone)]
pub struct Bracket {
    format: TournamentFormat,
    players: Vec<BracketPlayer>,
    rounds: Vec<Vec<Matchup>>,
    champion: Option<String>,
    rng: StdRng,
}

impl Bracket {
    /// Validate the entrants and pair round 1.
    ///
    /// # Errors
    ///
    /// * `TournamentError::NotEnoughPlayers` - Fewer than 2 players
    /// * `TournamentError::EmptyUsername` - A blank username
    /// * `TournamentError::DuplicatePlayer` - A username entered twice
    pub fn new(
        players: Vec<BracketPlayer>,
        format: TournamentFormat,
        rng: &mut impl Rng,
    ) -> TournamentResult<Self> {
        if players.len() < 2 {
            return Err(TournamentError::NotEnoughPlayers);
        }

        let mut seen = HashSet::new();
        for player in &players {
            if player.username.trim().is_empty() {
                return Err(TournamentError::EmptyUsername);
            }
            if !seen.insert(player.username.as_str()) {
                return Err(TournamentError::DuplicatePlayer(player.username.clone()));
            }
        }

        let mut bracket = Self {
            format,
            players,
            rounds: Vec::new(),
            champion: None,
            rng: StdRng::from_rng(rng),
        };

        let entrants: Vec<String> = bracket.players.iter().map(|p| p.username.clone()).collect();
        bracket.start_round(&entrants);
        Ok(bracket)
    }

    /// Record the winner of the matchup in `slot` of the current round.
    ///
    /// # Errors
    ///
    /// * `TournamentError::Finished` - A champion is already known
    /// * `TournamentError::UnknownSlot` - No such matchup in the current round
    /// * `TournamentError::AlreadyDecided` - The matchup already has a winner
    /// * `TournamentError::NotAParticipant` - `winner` is not in the matchup
    pub fn record_outcome(&mut self, slot: usize, winner: &str) -> TournamentResult<RoundProgress> {
        if self.champion.is_some() {
            return Err(TournamentError::Finished);
        }

        let round = self.current_round();
        let points = self.format.scoring.points_for(round);
        if self.score_mut(winner).is_none() {
            return Err(TournamentError::NotAParticipant(winner.to_string()));
        }

        let matchup = self
            .rounds
            .last_mut()
            .and_then(|matchups| matchups.get_mut(slot))
            .ok_or(TournamentError::UnknownSlot(slot))?;
        if matchup.is_decided() {
            return Err(TournamentError::AlreadyDecided(slot));
        }
        if !matchup.involves(winner) {
            return Err(TournamentError::NotAParticipant(winner.to_string()));
        }

        matchup.winner = Some(winner.to_string());
        let loser = matchup.loser().map(str::to_string);

        if let Some(score) = self.score_mut(winner) {
            score.add(points);
        }
        if let Some(score) = loser.and_then(|loser| self.score_mut(&loser)) {
            score.add(0);
        }

        log::debug!("Round {round} slot {slot} won by {winner}");
        Ok(self.advance())
    }

    /// Current round, 1-based
    pub fn current_round(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Every matchup of the current round
    pub fn current_matchups(&self) -> &[Matchup] {
        self.rounds.last().map(Vec::as_slice).unwrap_or_default()
    }

    /// Undecided matchups of the current round, in slot order
    pub fn pending(&self) -> Vec<&Matchup> {
        self.current_matchups()
            .iter()
            .filter(|matchup| !matchup.is_decided())
            .collect()
    }

    /// The matchup to play next
    pub fn next_matchup(&self) -> Option<&Matchup> {
        self.pending().into_iter().next()
    }

    pub fn champion(&self) -> Option<&str> {
        self.champion.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.champion.is_some()
    }

    pub fn format(&self) -> TournamentFormat {
        self.format
    }

    pub fn players(&self) -> &[BracketPlayer] {
        &self.players
    }

    /// All rounds paired so far
    pub fn rounds(&self) -> &[Vec<Matchup>] {
        &self.rounds
    }

    /// Players by points (highest first), ties by username
    pub fn standings(&self) -> Vec<BracketPlayer> {
        let mut standings = self.players.clone();
        standings.sort_by(|a, b| {
            b.score
                .points()
                .cmp(&a.score.points())
                .then_with(|| a.username.cmp(&b.username))
        });
        standings
    }

    /// Decided matches as game-session rounds, byes left out
    pub fn to_session_rounds(&self) -> Vec<Vec<MatchRecord>> {
        self.rounds
            .iter()
            .map(|matchups| {
                matchups
                    .iter()
                    .filter_map(|matchup| {
                        let player2 = matchup.player2.as_deref()?;
                        let winner = matchup.winner.as_deref()?;
                        let p1_won = winner == matchup.player1;
                        Some(MatchRecord {
                            p1_username: matchup.player1.clone(),
                            p2_username: player2.to_string(),
                            p1_avatar: self.avatar_of(&matchup.player1),
                            p2_avatar: self.avatar_of(player2),
                            p1_wins: u32::from(p1_won),
                            p2_wins: u32::from(!p1_won),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|round| !round.is_empty())
            .collect()
    }

    pub fn snapshot(&self) -> BracketSnapshot {
        BracketSnapshot {
            format: self.format,
            round: self.current_round(),
            rounds: self.rounds.clone(),
            next_matchup: self.next_matchup().cloned(),
            champion: self.champion.clone(),
            standings: self.standings(),
        }
    }

    /// Pair `entrants` as the next round and let byes through.
    fn start_round(&mut self, entrants: &[String]) {
        let round = self.current_round() + 1;
        let mut matchups = pair(entrants, round, self.format.pairing, &mut self.rng);
        for matchup in matchups.iter_mut().filter(|m| m.is_bye()) {
            matchup.winner = Some(matchup.player1.clone());
        }
        self.rounds.push(matchups);
    }

    /// Move on once the current round is fully decided.
    fn advance(&mut self) -> RoundProgress {
        loop {
            let remaining = self.pending().len();
            if remaining > 0 {
                return RoundProgress::Pending { remaining };
            }

            let winners: Vec<String> = self
                .current_matchups()
                .iter()
                .filter_map(|matchup| matchup.winner.clone())
                .collect();

            if winners.len() == 1 {
                let champion = winners[0].clone();
                log::info!("Tournament won by {champion}");
                self.champion = Some(champion.clone());
                return RoundProgress::Champion(champion);
            }

            self.start_round(&winners);
            if !self.pending().is_empty() {
                return RoundProgress::NextRound {
                    round: self.current_round(),
                    matchups: self.current_matchups().to_vec(),
                };
            }
        }
    }

    fn score_mut(&mut self, username: &str) -> Option<&mut Score> {
        self.players
            .iter_mut()
            .find(|player| player.username == username)
            .map(|player| &mut player.score)
    }

    fn avatar_of(&self, username: &str) -> String {
        self.players
            .iter()
            .find(|player| player.username == username)
            .map(|player| player.avatar.clone())
            .unwrap_or_default()
    }
}
