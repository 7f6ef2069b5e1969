//! Domain model for the Session & Wagon Progress context.

pub mod commands;
pub mod session;
