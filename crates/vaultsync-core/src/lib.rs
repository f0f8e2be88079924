//! # vaultsync core
//!
//! Pure primitives for vaultsync: records, sync baselines, timestamps, and
//! retry policy.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`LocalView`] / [`RemoteView`] - What the reconciliation engine needs to
//!   know about a local or remote record
//! - [`RemoteRef`] - The baseline a local record last observed on remote
//! - [`ErrorState`] / [`RetryPolicy`] - Push failures and retry eligibility
//! - [`Timestamp`] / [`Granularity`] - Microsecond timestamps with coarse,
//!   bucketed comparison
//! - [`VaultItem`] / [`RemoteItem`] - Concrete record shapes
//!
//! ## Persistence
//!
//! Local records are encoded with CBOR. See the [`canonical`] module.

pub mod canonical;
pub mod error;
pub mod item;
pub mod record;
pub mod retry;
pub mod timestamp;
pub mod types;

pub use canonical::{decode_item, decode_items, encode_item, encode_items};
pub use error::{CoreError, Result};
pub use item::{payload_differs, RemoteItem, VaultItem};
pub use record::{LocalView, RemoteRef, RemoteView};
pub use retry::{AlwaysRetry, BackoffPolicy, ErrorState, NeverRetry, RetryPolicy};
pub use timestamp::{effective_date, Granularity, Timestamp};
pub use types::{Fingerprint, SchemaVersion, CURRENT_SCHEMA_VERSION};
