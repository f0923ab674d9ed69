/// Maintenance tracker: Canonical Fingerprint
///
/// Deterministic serialization + SHA-256 of a whole state.
/// Used to confirm that a save/load cycle reproduced the same snapshot.
///
/// Rules:
///   - Fixed top-level field order (serde_json `preserve_order`)
///   - Records in store order, which is also their on-disk order
///   - No whitespace

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::domain::{Asset, Department, Material, Order, Technician};
use crate::state::{Counters, TrackerState};

/// Bumped whenever the canonical layout changes.
pub const FINGERPRINT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CanonicalView<'a> {
    fingerprint_version: u32,
    counters: &'a Counters,
    departments: &'a [Department],
    assets: &'a [Asset],
    technicians: &'a [Technician],
    orders: &'a [Order],
    materials: &'a [Material],
}

/// Canonical serialization of a state to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &TrackerState) -> Result<Vec<u8>, serde_json::Error> {
    let view = CanonicalView {
        fingerprint_version: FINGERPRINT_VERSION,
        counters: &state.counters,
        departments: state.departments.records(),
        assets: state.assets.records(),
        technicians: state.technicians.records(),
        orders: state.orders.records(),
        materials: state.materials.records(),
    };
    serde_json::to_vec(&view)
}

/// SHA-256 of the canonical serialization, lowercase hex.
pub fn canonical_hash(state: &TrackerState) -> Result<String, serde_json::Error> {
    let bytes = canonical_serialize(state)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
