//! Daily usage history under `~/.gauge/history`.

pub mod errors;
pub mod storage;

pub use errors::HistoryError;
pub use storage::{
    CleanupResult, UsageRecord, cleanup_old_history, cleanup_old_history_in, load_history,
    load_history_from, save_record, save_record_to,
};
