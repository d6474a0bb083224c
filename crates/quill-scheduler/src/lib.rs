//! Time-based scheduling plumbing for Quill.
//!
//! Currently this is just the [`Debouncer`] used by the suggestion pipeline
//! to coalesce typing bursts into a single deferred action.

mod debouncer;

pub use debouncer::{DebounceHandle, Debouncer};
pub use tokio_util::sync::CancellationToken;
