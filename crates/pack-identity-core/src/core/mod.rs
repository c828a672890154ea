// crates/pack-identity-core/src/core/mod.rs
// ============================================================================
// Module: Pack Identity Core Types
// Description: Identifier tiers, allocations, collections, and fingerprints.
// Purpose: Provide stable, serializable types shared by every validator.
// Dependencies: base64, serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Core types describe what the validation engine reads (entity collections,
//! pack allocations) and what it reports (identifier statuses, verification
//! states). They carry no I/O and no shared state.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod allocation;
pub mod collections;
pub mod hashing;
pub mod identifiers;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use allocation::ALLOCATION_MESSAGE_DELIMITER;
pub use allocation::PackAllocation;
pub use allocation::VerificationState;
pub use allocation::canonical_allocation_message;
pub use collections::ALL_COLLECTION_KINDS;
pub use collections::CollectionKind;
pub use collections::CollectionRules;
pub use collections::DuplicatePolicy;
pub use collections::EntityKey;
pub use collections::EntityRecord;
pub use collections::IdentifierKeyed;
pub use collections::KeyField;
pub use collections::NameKeyed;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::allocation_fingerprint;
pub use identifiers::IDENTIFIER_MAX;
pub use identifiers::IdentifierInput;
pub use identifiers::IdentifierStatus;
pub use identifiers::MANAGED_MAX;
pub use identifiers::MANAGED_MIN;
pub use identifiers::NamespaceTier;
pub use identifiers::RESERVED_MAX;
pub use identifiers::UNMANAGED_MIN;
