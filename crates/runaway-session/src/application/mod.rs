//! Application layer: the session registry and the handlers that drive it.

pub mod command_handlers;
pub mod query_handlers;
pub mod registry;
pub mod turns;
