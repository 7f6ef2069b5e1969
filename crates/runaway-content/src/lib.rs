//! Runaway: wagon dataset loading.
//!
//! Reads the wagon list and passenger profiles a session plays through from
//! JSON files on disk.

pub mod file_catalog;
