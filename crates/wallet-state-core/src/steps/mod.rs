//! Migration steps
//!
//! One pure function per target version. A step takes the snapshot of the
//! previous version by value and returns the snapshot of its own version; it
//! never touches `_persist`, the runner tags the result once the whole run
//! succeeded. Steps that read a field they cannot do without fail with
//! [`MigrationError::MalformedInput`](crate::MigrationError::MalformedInput).

mod v0_v9;
mod v10_v19;
mod v20_v29;
mod v30_v39;
mod v40_v51;

pub use v0_v9::*;
pub use v10_v19::*;
pub use v20_v29::*;
pub use v30_v39::*;
pub use v40_v51::*;

use crate::{MigrationContext, PersistedState, Result};

/// Step for a version whose schema did not change
pub fn keep_unchanged(state: PersistedState, _ctx: &MigrationContext) -> Result<PersistedState> {
    Ok(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{MigrationContext, PersistedState};
    use serde_json::Value;

    pub const NOW_MS: i64 = 1_600_000_000_000;

    pub fn ctx() -> MigrationContext {
        MigrationContext::at(NOW_MS)
    }

    pub fn state(value: Value) -> PersistedState {
        PersistedState::from_value(value).unwrap()
    }
}
