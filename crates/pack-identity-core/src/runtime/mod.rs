// crates/pack-identity-core/src/runtime/mod.rs
// ============================================================================
// Module: Pack Identity Runtime
// Description: Synchronous validators over caller-supplied data.
// Purpose: Group the classifier, duplicate detector, and prefix validator.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Every validator in this module is a pure function with no shared state.
//! Signature verification, the only step that may suspend, lives in the
//! engine crate.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod classifier;
pub mod duplicates;
pub mod prefix;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use classifier::AllocationContext;
pub use classifier::classify;
pub use classifier::classify_input;
pub use classifier::classify_parsed;
pub use duplicates::CollectionDuplicates;
pub use duplicates::detect_collection_duplicates;
pub use duplicates::duplicate_flags;
pub use duplicates::find_duplicates;
pub use duplicates::is_duplicate;
pub use prefix::PrefixCheck;
pub use prefix::check_prefix;
pub use prefix::expected_prefix;
