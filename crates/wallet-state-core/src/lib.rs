//! Persisted wallet state migrations
//!
//! This crate upgrades a persisted application state snapshot from whatever
//! schema version it was written with to the current one, by applying an
//! ordered chain of version steps. Each step is a pure function over the JSON
//! state tree.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod registry;
pub mod runner;
pub mod state;
pub mod steps;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod schemas;

pub use context::MigrationContext;
pub use error::{ErrorCategory, MigrationError, Result};
pub use registry::{
    Migration, MigrationFn, MigrationRegistry, LATEST_VERSION, MIGRATIONS, MIGRATION_COUNT,
};
pub use runner::{migrate, MigrationReport, MigrationRunner};
pub use state::{PersistMeta, PersistedState, PERSIST_KEY, UNVERSIONED};
