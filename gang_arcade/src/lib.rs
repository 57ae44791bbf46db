//! # Gang Arcade
//!
//! Backend library for the Gang arcade: player accounts, the friendship graph,
//! profiles, game-session logging and the tournament bracket engine that drives
//! the Pong and Tic-Tac-Toe tournaments.
//!
//! ## Core Modules
//!
//! - [`auth`]: Registration, login with an emailed second-factor code, password
//!   reset, Google sign-in and JWT access tokens
//! - [`friendship`]: Directed friendship rows kept symmetric per pair of users
//! - [`presence`]: Online/offline tracking driven by client heartbeats
//! - [`profile`]: Profile reads and field-level updates
//! - [`games`]: Game-session records and aggregate win/loss counters
//! - [`tournament`]: Single-elimination bracket state machine
//! - [`tictactoe`]: Classic and "madness" board rules
//! - [`db`]: SQLite connection pool and schema
//! - [`mail`]: Outgoing email (SMTP or log-only)
//! - [`oauth`]: Google OAuth code exchange
//!
//! ## Example
//!
//! ```
//! use gang_arcade::tournament::{Bracket, BracketPlayer, TournamentFormat};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let players = ["ana", "bo", "cy", "di"].map(BracketPlayer::new).to_vec();
//! let mut rng = StdRng::seed_from_u64(7);
//! let bracket = Bracket::new(players, TournamentFormat::pong(), &mut rng).unwrap();
//! assert_eq!(bracket.current_matchups().len(), 2);
//! ```

pub mod auth;
pub mod db;
pub mod friendship;
pub mod games;
pub mod mail;
pub mod oauth;
pub mod presence;
pub mod profile;
pub mod tictactoe;
pub mod tournament;
pub mod validation;

pub use auth::{AuthError, AuthManager};
pub use db::{Database, DatabaseConfig};
pub use friendship::{FriendshipError, FriendshipManager, FriendshipStatus};
pub use games::{GameError, GameKind, GameManager};
pub use presence::PresenceTracker;
pub use profile::{ProfileError, ProfileManager};
pub use tournament::{Bracket, TournamentError, TournamentFormat};
