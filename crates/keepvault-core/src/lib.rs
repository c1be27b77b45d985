//! Reconciliation engine for keepvault
//!
//! Keeps a flat-file markdown vault and a remote note store consistent in
//! both directions:
//!
//! - **Content normalization**: canonical note text for equality testing
//! - **Change detection**: reasoned differences between a remote note and a local file
//! - **Decision policy**: one action per note from differences and run flags
//! - **Placement**: sanitized, collision-free file paths for notes
//! - **Orphan reconciliation**: removal of local artifacts whose remote note vanished
//! - **SyncEngine**: one full pull/push cycle against a [`RemoteStore`]
//!
//! # Architecture
//!
//! ```text
//!                  keepvault-cli
//!                        |
//!                 keepvault-core
//!          +------+------+------+------+
//!          |      |      |      |      |
//!        vault  detect policy placement remote
//!          |
//!     keepvault-fs
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod model;
pub mod normalize;
pub mod orphan;
pub mod placement;
pub mod policy;
pub mod remote;
pub mod sync;
pub mod vault;

pub use config::{ConfigResolver, SyncConfig};
pub use detect::{ChangeSet, Reason, TimestampOrder, detect};
pub use error::{Error, Result};
pub use model::{Attachment, Color, ListItem, NoteContent, NoteRecord, Timestamps};
pub use placement::{PlacementResolver, sanitize_filename};
pub use policy::{
    CherryPickRequest, Choice, DecisionProvider, PolicyFlags, ScriptedProvider, SkipReason,
    SyncAction,
};
pub use remote::{
    CommitOutcome, JsonFileStore, Label, MemoryStore, NoteHandle, PendingNote, RemoteStore,
    StoreSnapshot,
};
pub use sync::{PullCounters, PushCounters, PushPlan, SyncEngine, SyncOptions, SyncReport};
pub use vault::{Frontmatter, LocalNoteFile, VaultIndex};
