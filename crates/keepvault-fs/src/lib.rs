//! Filesystem layer for keepvault
//!
//! Provides normalized paths, atomic note writes, modification-time access
//! and the vault directory layout used by the reconciliation engine.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use constants::VaultDir;
pub use error::{Error, Result};
pub use layout::VaultLayout;
pub use path::NormalizedPath;
