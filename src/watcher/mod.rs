//! Live change detection for a single preferences file.
//!
//! # Architecture
//!
//! ```text
//! ChangeWatcher (one active Subscription at most)
//!   - notify::RecommendedWatcher on the parent directory
//!   - worker thread: filter by file name -> Debouncer
//!         |
//!   DeliveryContext
//!    +-----------+---------------+
//!    |                           |
//! Immediate (worker thread)  CallbackQueue (owner drains)
//! ```

mod change_watcher;
mod debouncer;
mod delivery;
mod error;

pub use change_watcher::ChangeWatcher;
pub use debouncer::Debouncer;
pub use delivery::{CallbackQueue, DeliveryContext, Immediate, Job};
pub use error::WatchError;
