//! # vaultsync store
//!
//! The boundary between vaultsync and the application's local vault store.
//!
//! ## Overview
//!
//! vaultsync never writes to disk itself. The application implements
//! [`LocalStore`] over its own persistence; [`MemoryLocalStore`] is a
//! non-durable implementation for tests and examples.
//!
//! ## Key Types
//!
//! - [`LocalStore`] - The async trait for local record access
//! - [`LocalStoreExt`] - Helpers built on top of it
//! - [`MemoryLocalStore`] - In-memory storage for tests
//!
//! ## Design Notes
//!
//! - **Bookkeeping is persisted verbatim**: baseline, schema version and
//!   error state are part of the stored record
//! - **Snapshots**: [`MemoryLocalStore`] can export and restore its state to
//!   simulate a restart

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryLocalStore;
pub use traits::{LocalStore, LocalStoreExt};
