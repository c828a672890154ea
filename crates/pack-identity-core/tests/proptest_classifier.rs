// crates/pack-identity-core/tests/proptest_classifier.rs
// ============================================================================
// Module: Classifier Property-Based Tests
// Description: Property tests for namespace tier classification.
// Purpose: Pin tier boundaries and idempotence across the full i64 range.
// ============================================================================

//! Property-based tests for classifier invariants.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use pack_identity_core::AllocationContext;
use pack_identity_core::IDENTIFIER_MAX;
use pack_identity_core::IdentifierStatus;
use pack_identity_core::MANAGED_MAX;
use pack_identity_core::MANAGED_MIN;
use pack_identity_core::PackAllocation;
use pack_identity_core::UNMANAGED_MIN;
use pack_identity_core::VerificationState;
use pack_identity_core::classify;
use pack_identity_core::classify_input;
use proptest::prelude::*;

fn verification_state() -> impl Strategy<Value = VerificationState> {
    prop_oneof![
        Just(VerificationState::Pending),
        Just(VerificationState::Valid),
        Just(VerificationState::Invalid),
    ]
}

proptest! {
    #[test]
    fn tiers_without_allocation(id in any::<i64>()) {
        let status = classify(id, None);
        let unmanaged = (UNMANAGED_MIN ..= IDENTIFIER_MAX).contains(&id);
        let out_of_bounds = !(0 ..= IDENTIFIER_MAX).contains(&id);
        let reserved = (0 ..= 8_999).contains(&id);
        prop_assert_eq!(status == Some(IdentifierStatus::Unmanaged), unmanaged);
        prop_assert_eq!(status == Some(IdentifierStatus::OutOfBounds), out_of_bounds);
        prop_assert_eq!(status.is_none(), reserved);
        if (MANAGED_MIN ..= MANAGED_MAX).contains(&id) {
            prop_assert_eq!(status, Some(IdentifierStatus::NoSignature));
        }
    }

    #[test]
    fn classification_is_idempotent(
        id in -10_000i64 .. 2_200_000_000i64,
        start in MANAGED_MIN .. 500_000i64,
        span in 0i64 .. 500_000i64,
        state in verification_state(),
    ) {
        let allocation = PackAllocation::new("pack", start, start + span, vec![7; 64]);
        let context = Some(AllocationContext::new(&allocation, state));
        prop_assert_eq!(classify(id, context), classify(id, context));
    }

    #[test]
    fn valid_allocation_contains_exactly_its_range(
        id in MANAGED_MIN ..= MANAGED_MAX,
        start in MANAGED_MIN .. 1_000_000i64,
        span in 0i64 .. 1_000_000i64,
    ) {
        let allocation = PackAllocation::new("pack", start, start + span, vec![7; 64]);
        let context = Some(AllocationContext::new(&allocation, VerificationState::Valid));
        let expected = if id >= start && id <= start + span {
            IdentifierStatus::Valid
        } else {
            IdentifierStatus::OutsideAllocation
        };
        prop_assert_eq!(classify(id, context), Some(expected));
    }

    #[test]
    fn text_input_agrees_with_integer_input(id in any::<i64>()) {
        prop_assert_eq!(classify_input(&id.to_string(), None), classify(id, None));
    }

    #[test]
    fn non_numeric_text_has_no_opinion(text in "[a-zA-Z_ ]{0,12}") {
        prop_assert_eq!(classify_input(&text, None), None);
    }
}
