// crates/pack-identity-engine/src/verifier.rs
// ============================================================================
// Module: Allocation Verifier
// Description: Ed25519 verification of signed identifier allocations.
// Purpose: Decide whether a pack is authorized to use its claimed range.
// Dependencies: async-trait, ed25519-dalek, pack-identity-core
// ============================================================================

//! ## Overview
//! An allocation is trusted when its signature verifies against the canonical
//! `label:rangeStart:rangeEnd` message under the pinned allocation authority
//! key. Verification never errors on untrusted input: malformed ranges,
//! truncated signatures, and mismatches all return `false`.
//! Security posture: allocations are untrusted input; verification uses
//! `verify_strict` to reject malleable and small-order signatures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use ed25519_dalek::Signature;
use ed25519_dalek::VerifyingKey;
use pack_identity_core::PackAllocation;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Public half of the allocation authority's Ed25519 key.
pub const PINNED_ALLOCATION_KEY: [u8; 32] = [
    0xbc, 0xee, 0xed, 0x02, 0xc9, 0xa5, 0xde, 0xbd, 0xac, 0x04, 0x32, 0x65, 0x6b, 0x41, 0xda, 0x1a,
    0x6a, 0x6f, 0x48, 0xd2, 0x56, 0xc8, 0x3a, 0x8f, 0x34, 0x4c, 0xe6, 0x23, 0x68, 0xbd, 0x85, 0xd3,
];

// ============================================================================
// SECTION: Public Types
// ============================================================================

/// Allocation verification interface.
///
/// Implementations may suspend (for example to consult a remote revocation
/// list) but must resolve to a boolean for every input.
#[async_trait]
pub trait AllocationVerifier: Send + Sync {
    /// Returns true only when the allocation is authentic and trusted.
    async fn verify(&self, allocation: &PackAllocation) -> bool;
}

/// Ed25519 verifier bound to one authority key.
#[derive(Debug, Clone)]
pub struct Ed25519AllocationVerifier {
    /// Authority verification key.
    key: VerifyingKey,
}

impl Ed25519AllocationVerifier {
    /// Builds a verifier for the pinned allocation authority key.
    ///
    /// # Errors
    ///
    /// Returns [`VerifierError`] when the pinned key is not a valid point.
    pub fn pinned() -> Result<Self, VerifierError> {
        VerifyingKey::from_bytes(&PINNED_ALLOCATION_KEY)
            .map(Self::with_key)
            .map_err(|err| VerifierError::InvalidKey(err.to_string()))
    }

    /// Builds a verifier for an explicit authority key.
    #[must_use]
    pub const fn with_key(key: VerifyingKey) -> Self {
        Self {
            key,
        }
    }

    /// Returns the authority key bytes.
    #[must_use]
    pub fn key_bytes(&self) -> [u8; 32] {
        self.key.to_bytes()
    }

    /// Verifies an allocation synchronously.
    #[must_use]
    pub fn verify_now(&self, allocation: &PackAllocation) -> bool {
        if !allocation.is_well_formed() {
            return false;
        }
        let Ok(signature) = Signature::from_slice(&allocation.signature) else {
            return false;
        };
        let message = allocation.canonical_message();
        self.key.verify_strict(message.as_bytes(), &signature).is_ok()
    }
}

#[async_trait]
impl AllocationVerifier for Ed25519AllocationVerifier {
    async fn verify(&self, allocation: &PackAllocation) -> bool {
        self.verify_now(allocation)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Verifier construction failures.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Authority key bytes do not decode to a valid Ed25519 point.
    #[error("invalid allocation authority key: {0}")]
    InvalidKey(String),
}
