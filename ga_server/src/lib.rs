//! HTTP server for the Gang arcade.
//!
//! The binary wires [`config::ServerConfig`] into the managers of the
//! `gang_arcade` library and serves [`api::create_router`]. Everything is
//! exposed as a library so the router can be driven in integration tests.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
