//! Process exit codes.
//!
//! Library failures map through `SyncError::exit_code`:
//! 1 config/input, 3 lifecycle, 4 storage, 5 network.

use offline_sync::SyncError;

pub const SUCCESS: i32 = 0;
pub const INTERNAL_ERROR: i32 = 2; // Anything that is not a SyncError

pub fn for_error(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<SyncError>()
        .map_or(INTERNAL_ERROR, SyncError::exit_code)
}
