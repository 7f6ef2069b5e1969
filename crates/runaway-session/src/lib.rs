//! Runaway: Session & Wagon Progress bounded context.
//!
//! Responsible for player sessions, the wagon-by-wagon progression state
//! machine, per-character conversations and passcode guessing.

pub mod application;
pub mod domain;
