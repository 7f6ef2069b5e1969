//! Route modules organized by bounded context.

pub mod chat;
pub mod guess;
pub mod health;
pub mod session;
pub mod wagons;
