//! Proptest generators for property-based testing.
//!
//! Snapshots are generated from [`SnapshotParams`] rather than fully at
//! random: independent random dates almost never land in the same bucket,
//! so the parameters bias towards records whose baseline matches the
//! remote state and whose local edits are close to it.

use proptest::prelude::*;

use vaultsync_core::{
    ErrorState, RemoteItem, RemoteRef, SchemaVersion, Timestamp, VaultItem, CURRENT_SCHEMA_VERSION,
};

/// Generate a timestamp within the first ~16 minutes after the epoch.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0i64..=1_000_000_000i64).prop_map(Timestamp::from_micros)
}

/// Generate an offset in microseconds, biased towards sub-bucket noise.
pub fn offset_micros() -> impl Strategy<Value = i64> {
    prop_oneof![
        Just(0i64),
        -200_000i64..=200_000i64,
        -5_000_000i64..=5_000_000i64,
    ]
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a schema version around the current one.
pub fn schema_version() -> impl Strategy<Value = SchemaVersion> {
    prop_oneof![
        4 => Just(CURRENT_SCHEMA_VERSION),
        1 => Just(CURRENT_SCHEMA_VERSION - 1),
    ]
}

/// Parameters for one remote record.
#[derive(Debug, Clone)]
pub struct RemoteParams {
    pub revision_date: Timestamp,
    pub trashed: bool,
    pub payload: Vec<u8>,
}

/// Parameters for one local record.
///
/// Local record `i` can only link to remote slot `i`. If there is no
/// remote record in that slot, the link is orphaned.
#[derive(Debug, Clone)]
pub struct LocalParams {
    pub linked: bool,
    /// Baseline equals the current remote state (when there is one).
    pub baseline_current: bool,
    /// Used as baseline date when not current, or as revision when unlinked.
    pub base_date: Timestamp,
    /// Local revision relative to the baseline's effective date.
    pub offset_micros: i64,
    pub deleted: bool,
    pub schema_version: SchemaVersion,
    pub failed: bool,
    /// Payload equals the remote payload (when there is one).
    pub same_payload: bool,
    pub payload: Vec<u8>,
}

/// Parameters for a pair of snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotParams {
    pub remotes: Vec<RemoteParams>,
    pub locals: Vec<LocalParams>,
}

fn remote_params() -> impl Strategy<Value = RemoteParams> {
    (timestamp(), prop::bool::weighted(0.2), payload(8)).prop_map(|(revision_date, trashed, payload)| {
        RemoteParams {
            revision_date,
            trashed,
            payload,
        }
    })
}

fn local_params() -> impl Strategy<Value = LocalParams> {
    (
        prop::bool::weighted(0.7),
        prop::bool::weighted(0.6),
        timestamp(),
        offset_micros(),
        prop::bool::weighted(0.2),
        schema_version(),
        prop::bool::weighted(0.2),
        prop::bool::weighted(0.7),
        payload(8),
    )
        .prop_map(
            |(linked, baseline_current, base_date, offset_micros, deleted, schema_version, failed, same_payload, payload)| {
                LocalParams {
                    linked,
                    baseline_current,
                    base_date,
                    offset_micros,
                    deleted,
                    schema_version,
                    failed,
                    same_payload,
                    payload,
                }
            },
        )
}

impl Arbitrary for SnapshotParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::vec(remote_params(), 0..8),
            prop::collection::vec(local_params(), 0..8),
        )
            .prop_map(|(remotes, locals)| SnapshotParams { remotes, locals })
            .boxed()
    }
}

/// Remote id of slot `i`.
pub fn remote_id(slot: usize) -> String {
    format!("r-{slot}")
}

/// Local id of slot `i`.
pub fn local_id(slot: usize) -> String {
    format!("l-{slot}")
}

/// Build the snapshots described by `params`.
pub fn snapshots_from_params(params: &SnapshotParams) -> (Vec<VaultItem>, Vec<RemoteItem>) {
    let remote: Vec<RemoteItem> = params
        .remotes
        .iter()
        .enumerate()
        .map(|(slot, p)| {
            let item = RemoteItem::new(remote_id(slot), p.payload.clone(), p.revision_date);
            if p.trashed {
                item.deleted_at(p.revision_date)
            } else {
                item
            }
        })
        .collect();

    let local = params
        .locals
        .iter()
        .enumerate()
        .map(|(slot, p)| {
            let counterpart = remote.get(slot);
            let baseline = p.linked.then(|| match counterpart {
                Some(r) if p.baseline_current => RemoteRef::observe(r),
                _ => RemoteRef::new(remote_id(slot), p.base_date),
            });

            let anchor = baseline.as_ref().map_or(p.base_date, RemoteRef::effective_date);
            let revision_date = Timestamp::from_micros(anchor.as_micros().saturating_add(p.offset_micros));
            let payload = match counterpart {
                Some(r) if p.same_payload => r.payload.clone(),
                _ => p.payload.clone().into(),
            };

            let mut item = VaultItem::new(local_id(slot), payload, revision_date)
                .with_schema_version(p.schema_version);
            item.remote_ref = baseline;
            if p.deleted {
                item.delete(revision_date);
            }
            if p.failed {
                item.error = Some(ErrorState::new(503, revision_date, revision_date));
            }
            item
        })
        .collect();

    (local, remote)
}

/// Generate a pair of snapshots directly.
pub fn snapshots() -> impl Strategy<Value = (Vec<VaultItem>, Vec<RemoteItem>)> {
    any::<SnapshotParams>().prop_map(|params| snapshots_from_params(&params))
}
