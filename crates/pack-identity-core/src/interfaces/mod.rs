// crates/pack-identity-core/src/interfaces/mod.rs
// ============================================================================
// Module: Pack Identity Interfaces
// Description: Document-model boundary consumed by the validation engine.
// Purpose: Define read-only access to pack metadata and entity collections,
//          plus a JSON snapshot implementation of that access.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The document model that owns entity collections is an external
//! collaborator. The engine sees it only through [`PackDocument`]: the pack
//! label, the declared allocation, and one slice of [`EntityRecord`] per
//! [`CollectionKind`]. [`PackSnapshot`] is a serialized export of that view
//! used by offline tooling.
//! Security posture: snapshots are untrusted input; parsing is size-limited.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::CollectionKind;
use crate::core::EntityRecord;
use crate::core::PackAllocation;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted snapshot size in bytes.
pub const MAX_SNAPSHOT_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Document Interface
// ============================================================================

/// Read-only view of a resource pack document.
pub trait PackDocument {
    /// Returns the pack label, if one is set.
    fn pack_label(&self) -> Option<&str>;

    /// Returns the declared allocation, if the pack has one.
    fn allocation(&self) -> Option<&PackAllocation>;

    /// Returns the entities of one collection in document order.
    fn collection(&self, kind: CollectionKind) -> &[EntityRecord];
}

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// Pack-level metadata carried by a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Pack label used for naming conventions and allocations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Declared identifier allocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<PackAllocation>,
}

/// Serialized export of a pack document.
///
/// # Invariants
/// - Collections missing from the snapshot read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSnapshot {
    /// Pack-level metadata.
    #[serde(default)]
    pub pack: PackMetadata,
    /// Entity collections keyed by kind.
    #[serde(default)]
    pub collections: BTreeMap<CollectionKind, Vec<EntityRecord>>,
}

impl PackSnapshot {
    /// Parses a snapshot from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] when the input is too large or malformed.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.len() > MAX_SNAPSHOT_BYTES {
            return Err(DocumentError::TooLarge {
                size: bytes.len(),
                limit: MAX_SNAPSHOT_BYTES,
            });
        }
        serde_json::from_slice(bytes).map_err(|err| DocumentError::Parse(err.to_string()))
    }
}

impl PackDocument for PackSnapshot {
    fn pack_label(&self) -> Option<&str> {
        self.pack.label.as_deref()
    }

    fn allocation(&self) -> Option<&PackAllocation> {
        self.pack.allocation.as_ref()
    }

    fn collection(&self, kind: CollectionKind) -> &[EntityRecord] {
        self.collections.get(&kind).map_or(&[], Vec::as_slice)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document loading failures.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Snapshot exceeds the size limit.
    #[error("snapshot too large: {size} bytes (limit {limit})")]
    TooLarge {
        /// Actual size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        limit: usize,
    },
    /// Snapshot JSON could not be parsed.
    #[error("invalid snapshot: {0}")]
    Parse(String),
}
