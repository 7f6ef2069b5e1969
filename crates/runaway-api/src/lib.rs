//! Runaway: HTTP API.
//!
//! Exposes sessions, passenger chat, the detective's guessing rounds and the
//! public wagon dataset over JSON.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod sweeper;
