//! Runaway Core: shared domain abstractions.
//!
//! This crate defines the identifiers, ports and error types that the
//! session context and its adapters depend on. It contains no
//! infrastructure code.

pub mod catalog;
pub mod clock;
pub mod collaborator;
pub mod command;
pub mod error;
pub mod identity;
