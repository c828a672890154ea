// crates/pack-identity-core/src/core/hashing.rs
// ============================================================================
// Module: Pack Identity Fingerprints
// Description: Canonical JSON hashing for allocation tuples.
// Purpose: Provide stable digests that identify allocations in audit logs
//          without disclosing signature bytes.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Allocation fingerprints hash the RFC 8785 (JCS) canonical JSON form of the
//! full allocation tuple. Two allocations share a fingerprint exactly when
//! they are the same cache key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::core::allocation::PackAllocation;

// ============================================================================
// SECTION: Hash Digest
// ============================================================================

/// Supported hash algorithms for fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashAlgorithm {
    /// SHA-256 hashing.
    Sha256,
}

/// Deterministic content hash representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hash algorithm identifier.
    pub algorithm: HashAlgorithm,
    /// Lowercase hex-encoded digest bytes.
    pub value: String,
}

impl HashDigest {
    /// Creates a new digest from raw bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: &[u8]) -> Self {
        Self {
            algorithm,
            value: hex_encode(bytes),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when computing canonical hashes.
#[derive(Debug, Error)]
pub enum HashError {
    /// JSON canonicalization failed.
    #[error("failed to canonicalize json: {0}")]
    Canonicalization(String),
}

// ============================================================================
// SECTION: Hashing Helpers
// ============================================================================

/// Returns canonical JSON bytes for a serializable value using RFC 8785.
///
/// # Errors
///
/// Returns [`HashError::Canonicalization`] when serialization fails.
pub fn canonical_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, HashError> {
    serde_jcs::to_vec(value).map_err(|err| HashError::Canonicalization(err.to_string()))
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    HashDigest::new(HashAlgorithm::Sha256, &digest)
}

/// Fingerprints an allocation tuple.
///
/// Canonicalization of an allocation cannot fail in practice; should it ever,
/// the fingerprint falls back to hashing the canonical message plus the raw
/// signature so the digest still covers every field.
#[must_use]
pub fn allocation_fingerprint(allocation: &PackAllocation) -> HashDigest {
    canonical_json_bytes(allocation).map_or_else(
        |_| {
            let mut bytes = allocation.canonical_message().into_bytes();
            bytes.extend_from_slice(&allocation.signature);
            hash_bytes(&bytes)
        },
        |bytes| hash_bytes(&bytes),
    )
}

// ============================================================================
// SECTION: Hex Encoding
// ============================================================================

/// Encodes bytes as a lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(HEX[(byte >> 4) as usize] as char);
        out.push(HEX[(byte & 0x0f) as usize] as char);
    }
    out
}
