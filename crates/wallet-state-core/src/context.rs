//! Inputs a migration step may read besides the state tree

/// Environment of one migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationContext {
    now_ms: i64,
}

impl MigrationContext {
    /// Context pinned to a wall-clock time (milliseconds since the epoch)
    pub const fn at(now_ms: i64) -> Self {
        Self { now_ms }
    }

    /// Context using the current time
    pub fn now() -> Self {
        Self::at(chrono::Utc::now().timestamp_millis())
    }

    /// Wall-clock time of the run in milliseconds
    pub const fn now_ms(&self) -> i64 {
        self.now_ms
    }
}

impl Default for MigrationContext {
    fn default() -> Self {
        Self::now()
    }
}
