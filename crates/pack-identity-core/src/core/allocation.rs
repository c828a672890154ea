// crates/pack-identity-core/src/core/allocation.rs
// ============================================================================
// Module: Pack Allocations
// Description: Signed identifier range claims declared by resource packs.
// Purpose: Model allocation tuples, their canonical signed message, and
//          verification state.
// Dependencies: base64, serde
// ============================================================================

//! ## Overview
//! A [`PackAllocation`] is a pack's claimed sub-range of the managed tier plus
//! the signature that authenticates the claim. The full tuple
//! `(label, range_start, range_end, signature)` is the cache key for
//! verification; changing any field yields a different allocation.
//! Security posture: allocations are caller-owned, untrusted data. Shape
//! violations never raise; they make verification fail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::MANAGED_MAX;
use crate::core::identifiers::MANAGED_MIN;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Delimiter joining the fields of the canonical allocation message.
pub const ALLOCATION_MESSAGE_DELIMITER: char = ':';

// ============================================================================
// SECTION: Allocation
// ============================================================================

/// Identifier range claimed by a resource pack.
///
/// # Invariants
/// - Well-formed allocations satisfy `range_start <= range_end` with both ends
///   inside the managed tier. Malformed allocations are representable and
///   always fail verification.
/// - Equality and hashing cover every field, including signature bytes.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackAllocation {
    /// Pack label the allocation is issued to.
    pub label: String,
    /// First identifier in the allocation (inclusive).
    pub range_start: i64,
    /// Last identifier in the allocation (inclusive).
    pub range_end: i64,
    /// Opaque signature bytes issued by the allocation authority.
    #[serde(with = "signature_base64")]
    pub signature: Vec<u8>,
}

impl PackAllocation {
    /// Creates an allocation from already-decoded signature bytes.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        range_start: i64,
        range_end: i64,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            label: label.into(),
            range_start,
            range_end,
            signature,
        }
    }

    /// Creates an allocation from a base64-encoded signature.
    ///
    /// Undecodable text yields an empty signature, which never verifies.
    #[must_use]
    pub fn from_encoded(
        label: impl Into<String>,
        range_start: i64,
        range_end: i64,
        encoded_signature: &str,
    ) -> Self {
        let signature = Base64.decode(encoded_signature.trim()).unwrap_or_default();
        Self::new(label, range_start, range_end, signature)
    }

    /// Returns the canonical message covered by the signature.
    #[must_use]
    pub fn canonical_message(&self) -> String {
        canonical_allocation_message(&self.label, self.range_start, self.range_end)
    }

    /// Returns true when the range is ordered and inside the managed tier.
    #[must_use]
    pub const fn is_well_formed(&self) -> bool {
        self.range_start <= self.range_end
            && self.range_start >= MANAGED_MIN
            && self.range_end <= MANAGED_MAX
    }

    /// Returns true when `id` lies inside the range (inclusive on both ends).
    #[must_use]
    pub const fn contains(&self, id: i64) -> bool {
        id >= self.range_start && id <= self.range_end
    }

    /// Returns the signature encoded as base64.
    #[must_use]
    pub fn encoded_signature(&self) -> String {
        Base64.encode(&self.signature)
    }
}

impl fmt::Debug for PackAllocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackAllocation")
            .field("label", &self.label)
            .field("range_start", &self.range_start)
            .field("range_end", &self.range_end)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}

/// Builds the canonical `label:start:end` message for an allocation.
#[must_use]
pub fn canonical_allocation_message(label: &str, range_start: i64, range_end: i64) -> String {
    format!(
        "{label}{ALLOCATION_MESSAGE_DELIMITER}{range_start}{ALLOCATION_MESSAGE_DELIMITER}{range_end}"
    )
}

// ============================================================================
// SECTION: Verification State
// ============================================================================

/// Tri-state verification outcome for an allocation tuple.
///
/// # Invariants
/// - `Pending` is distinct from both resolved outcomes and is the interim
///   state while a verification is outstanding or not yet requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationState {
    /// Verification not yet resolved.
    Pending,
    /// Signature verified for the exact allocation tuple.
    Valid,
    /// Signature missing, malformed, mismatched, revoked, or timed out.
    Invalid,
}

impl VerificationState {
    /// Maps a resolved boolean verification result to a state.
    #[must_use]
    pub const fn from_outcome(valid: bool) -> Self {
        if valid { Self::Valid } else { Self::Invalid }
    }

    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Valid => "valid",
            Self::Invalid => "invalid",
        }
    }
}

// ============================================================================
// SECTION: Serde Helpers
// ============================================================================

/// Base64 wire form for signature bytes.
///
/// Undecodable text deserializes to an empty signature so that malformed
/// encodings surface as verification failures rather than parse errors.
mod signature_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as Base64;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    /// Serializes signature bytes as standard base64.
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64.encode(bytes))
    }

    /// Deserializes base64 text, mapping decode failures to empty bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Base64.decode(text.trim()).unwrap_or_default())
    }
}
