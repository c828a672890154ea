// crates/pack-identity-core/src/lib.rs
// ============================================================================
// Module: Pack Identity Core Library
// Description: Public API surface for the pack identity core.
// Purpose: Expose identifier tiers, allocations, collections, and the pure
//          validators built on them.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Pack identity core classifies resource pack identifiers into trust tiers,
//! detects key collisions inside entity collections, and checks label naming
//! conventions. It is document-model agnostic and integrates through the
//! [`PackDocument`] interface.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::DocumentError;
pub use interfaces::MAX_SNAPSHOT_BYTES;
pub use interfaces::PackDocument;
pub use interfaces::PackMetadata;
pub use interfaces::PackSnapshot;
pub use runtime::AllocationContext;
pub use runtime::CollectionDuplicates;
pub use runtime::classify_parsed;
pub use runtime::PrefixCheck;
pub use runtime::check_prefix;
pub use runtime::classify;
pub use runtime::classify_input;
pub use runtime::detect_collection_duplicates;
pub use runtime::find_duplicates;
pub use runtime::is_duplicate;
