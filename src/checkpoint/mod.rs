//! Snapshot and resume for machine instances.
//!
//! A snapshot captures the only mutable state an instance owns (the
//! current leaf vertex, its history slots, and its active submachine
//! references) so a long-lived reactive system can survive a restart.
//! Static tables are never serialized: a snapshot is only meaningful
//! against the same topology it was taken from, and `restore` validates
//! the fit before touching the machine.

use crate::core::{VertexId, VertexKind};
use crate::engine::Machine;
use crate::trace::Tracer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for the snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable capture of one instance's mutable state.
///
/// Does NOT include the topology, the context, or any action closures
/// (not serializable); only the engine-owned cells.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version
    pub version: u32,

    /// Identity of the captured instance
    pub id: Uuid,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// The stable leaf vertex the machine rested in
    pub current: VertexId,

    /// One cell per history vertex, in slot order
    pub history: Vec<Option<VertexId>>,

    /// One cell per submachine region, in slot order
    pub active_refs: Vec<Option<VertexId>>,
}

impl Snapshot {
    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        serde_json::from_str(json).map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }

    /// Encode as a compact binary blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Decode from a binary blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))
    }
}

impl<C, P, T: Tracer> Machine<C, P, T> {
    /// Capture the instance's mutable state.
    ///
    /// The machine must be initialized; between dispatches it always
    /// rests in a stable leaf, which is what gets captured.
    pub fn snapshot(&self) -> Result<Snapshot, CheckpointError> {
        let current = self.current.ok_or(CheckpointError::Uninitialized)?;
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            id: self.id,
            taken_at: Utc::now(),
            current,
            history: self.history.clone(),
            active_refs: self.active_refs.clone(),
        })
    }

    /// Replace the instance's mutable state with a validated snapshot.
    ///
    /// The snapshot must have been taken from a machine of the same
    /// topology: vertex ids are arena indices and carry no meaning
    /// across differing tables. Validation checks the format version,
    /// the slot-vector shapes, that the captured leaf is a stable
    /// (basic or final) vertex, that every history value is a strict
    /// descendant of its owner, and that every active reference is a
    /// submachine state of the matching region.
    ///
    /// On success the machine adopts the snapshot's identity and no
    /// init call is needed; entry actions do not re-run.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), CheckpointError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: snapshot.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        let topology = std::sync::Arc::clone(&self.topology);
        let vertex_count = topology.vertices.len();

        if snapshot.history.len() != topology.history_slots
            || snapshot.active_refs.len() != topology.region_slots
        {
            return Err(CheckpointError::ValidationFailed(
                "slot counts do not match the topology".to_string(),
            ));
        }
        if snapshot.current.index() >= vertex_count {
            return Err(CheckpointError::ValidationFailed(
                "current vertex is out of range".to_string(),
            ));
        }
        if !topology.kind(snapshot.current).is_stable() {
            return Err(CheckpointError::ValidationFailed(format!(
                "'{}' is not a stable leaf",
                topology.name_of(snapshot.current)
            )));
        }

        // Active references first: the history walk below follows them
        // out of submachine regions and relies on them being in range.
        for (slot, value) in snapshot.active_refs.iter().enumerate() {
            let Some(vertex) = *value else { continue };
            if vertex.index() >= vertex_count {
                return Err(CheckpointError::ValidationFailed(
                    "active reference is out of range".to_string(),
                ));
            }
            let fits = match topology.kind(vertex) {
                VertexKind::Submachine { region } => {
                    matches!(
                        topology.kind(region),
                        VertexKind::SubmachineRegion { slot: s, .. } if s == slot
                    )
                }
                _ => false,
            };
            if !fits {
                return Err(CheckpointError::ValidationFailed(format!(
                    "'{}' is not a reference of region slot {slot}",
                    topology.name_of(vertex)
                )));
            }
        }

        for (slot, value) in snapshot.history.iter().enumerate() {
            let Some(vertex) = *value else { continue };
            if vertex.index() >= vertex_count {
                return Err(CheckpointError::ValidationFailed(
                    "history value is out of range".to_string(),
                ));
            }
            let owner = topology
                .vertices
                .iter()
                .find_map(|v| match v.kind {
                    VertexKind::ShallowHistory { owner, slot: s, .. }
                    | VertexKind::DeepHistory { owner, slot: s, .. }
                        if s == slot =>
                    {
                        Some(owner)
                    }
                    _ => None,
                })
                .ok_or_else(|| {
                    CheckpointError::ValidationFailed("history slot has no owner".to_string())
                })?;
            if !is_strict_descendant(&topology, snapshot, vertex, owner) {
                return Err(CheckpointError::ValidationFailed(format!(
                    "history value '{}' is not a descendant of '{}'",
                    topology.name_of(vertex),
                    topology.name_of(owner)
                )));
            }
        }

        self.id = snapshot.id;
        self.current = Some(snapshot.current);
        self.history = snapshot.history.clone();
        self.active_refs = snapshot.active_refs.clone();
        Ok(())
    }
}

/// Ancestor walk that follows the snapshot's own active references out
/// of submachine regions, mirroring the resolver's run-time walk.
fn is_strict_descendant<C, P>(
    topology: &crate::core::Topology<C, P>,
    snapshot: &Snapshot,
    vertex: VertexId,
    ancestor: VertexId,
) -> bool {
    let step = |v: VertexId| -> Option<VertexId> {
        let parent = topology.parent_of(v)?;
        match topology.kind(parent) {
            VertexKind::SubmachineRegion { slot, .. } => {
                snapshot.active_refs.get(slot).copied().flatten()
            }
            _ => Some(parent),
        }
    };
    let mut depth = 0;
    let mut up = step(vertex);
    while let Some(parent) = up {
        if parent == ancestor {
            return true;
        }
        depth += 1;
        if depth > topology.max_depth() {
            return false;
        }
        up = step(parent);
    }
    false
}
