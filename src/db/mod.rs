//! Database module for entity persistence.
//!
//! This module provides:
//! - SQLite initialization, pragmas and schema
//! - The `EntityStore` trait with in-memory and SQLite implementations

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{EntityStore, MemoryStore, Record, SqliteStore, StoreError};
