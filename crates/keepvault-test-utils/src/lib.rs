//! Shared test utilities for the keepvault workspace.
//!
//! This crate provides standardised vault fixtures for the crate test
//! suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`vault`]: [`TestVault`](vault::TestVault) temporary vault builder

pub mod vault;

pub use vault::TestVault;
