// crates/pack-identity-core/src/runtime/classifier.rs
// ============================================================================
// Module: Namespace Classifier
// Description: Pure decision table mapping identifiers to statuses.
// Purpose: Classify identifiers by namespace tier and allocation trust.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Classification is a pure function of the identifier, the declared
//! allocation, and the verification state cached for that allocation. It has
//! no side effects and is idempotent for identical inputs. Only the managed
//! tier consults the allocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::IdentifierInput;
use crate::core::IdentifierStatus;
use crate::core::NamespaceTier;
use crate::core::PackAllocation;
use crate::core::VerificationState;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Declared allocation paired with its current verification state.
#[derive(Debug, Clone, Copy)]
pub struct AllocationContext<'a> {
    /// Allocation declared by the pack.
    pub allocation: &'a PackAllocation,
    /// Verification state cached for the allocation tuple.
    pub state: VerificationState,
}

impl<'a> AllocationContext<'a> {
    /// Pairs an allocation with a verification state.
    #[must_use]
    pub const fn new(allocation: &'a PackAllocation, state: VerificationState) -> Self {
        Self {
            allocation,
            state,
        }
    }
}

// ============================================================================
// SECTION: Classification
// ============================================================================

/// Classifies an identifier.
///
/// Returns `None` for reserved-tier identifiers, which are judged elsewhere.
#[must_use]
pub fn classify(id: i64, context: Option<AllocationContext<'_>>) -> Option<IdentifierStatus> {
    match NamespaceTier::of(id) {
        NamespaceTier::OutOfBounds => Some(IdentifierStatus::OutOfBounds),
        NamespaceTier::Reserved => None,
        NamespaceTier::Unmanaged => Some(IdentifierStatus::Unmanaged),
        NamespaceTier::Managed => Some(classify_managed(id, context)),
    }
}

/// Classifies raw identifier text.
///
/// Non-numeric or empty text yields `None`; integers beyond the 64-bit range
/// are out-of-bounds.
#[must_use]
pub fn classify_input(raw: &str, context: Option<AllocationContext<'_>>) -> Option<IdentifierStatus> {
    classify_parsed(IdentifierInput::parse(raw), context)
}

/// Classifies an already-parsed identifier input.
#[must_use]
pub fn classify_parsed(
    input: IdentifierInput,
    context: Option<AllocationContext<'_>>,
) -> Option<IdentifierStatus> {
    match input {
        IdentifierInput::NotANumber => None,
        IdentifierInput::Overflow => Some(IdentifierStatus::OutOfBounds),
        IdentifierInput::Value(id) => classify(id, context),
    }
}

/// Applies the managed-tier rows of the decision table.
fn classify_managed(id: i64, context: Option<AllocationContext<'_>>) -> IdentifierStatus {
    let Some(context) = context else {
        return IdentifierStatus::NoSignature;
    };
    match context.state {
        VerificationState::Pending => IdentifierStatus::NoSignature,
        VerificationState::Invalid => IdentifierStatus::InvalidSignature,
        VerificationState::Valid if context.allocation.contains(id) => IdentifierStatus::Valid,
        VerificationState::Valid => IdentifierStatus::OutsideAllocation,
    }
}
