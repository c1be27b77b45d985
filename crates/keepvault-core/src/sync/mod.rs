//! One full reconciliation cycle
//!
//! # Cycle
//!
//! 1. Fetch the remote snapshot and scan the vault
//! 2. **Pull**: create, rewrite or move local files per remote note
//! 3. Delete local notes and attachments the snapshot no longer knows
//! 4. **Push**: decide per local file, confirm, apply, commit once,
//!    write server ids into created files
//! 5. Write the sync log note
//!
//! Every step honours [`SyncOptions::dry_run`].

mod engine;
mod pull;
mod push;
mod report;
mod sync_log;

pub use engine::{SyncEngine, SyncOptions};
pub use push::PushPlan;
pub use report::{PullCounters, PushCounters, SyncReport};
pub use sync_log::SYNC_LOG_TAG;
