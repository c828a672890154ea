// crates/pack-identity-engine/src/lib.rs
// ============================================================================
// Module: Pack Identity Engine Library
// Description: Allocation verification and whole-pack validation.
// Purpose: Expose the verifier, verification cache, and validation facade.
// Dependencies: crate::{audit, cache, facade, revocation, telemetry, verifier}
// ============================================================================

//! ## Overview
//! The engine layers asynchronous allocation verification over the pure
//! validators in `pack-identity-core`. A [`VerificationCache`] runs at most
//! one verification per allocation tuple and drops results for superseded
//! tuples; the [`ValidationFacade`] composes the cache with identifier
//! classification, duplicate detection, and label prefix checks.
//!
//! Security posture: allocations are untrusted input; every failure to verify
//! resolves to an invalid or pending state, never to valid.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod cache;
pub mod facade;
pub mod revocation;
pub mod telemetry;
pub mod verifier;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use audit::VerificationAuditEvent;
pub use audit::VerificationEventKind;
pub use audit::audit_sink_from_config;
pub use cache::VerificationCache;
pub use facade::CollectionValidation;
pub use facade::EngineError;
pub use facade::EntityValidation;
pub use facade::PackValidation;
pub use facade::ValidationFacade;
pub use facade::ValidationSummary;
pub use revocation::HttpRevocationAuthority;
pub use revocation::NoopRevocationAuthority;
pub use revocation::RevocationAuthority;
pub use revocation::RevocationCheckedVerifier;
pub use revocation::RevocationError;
pub use revocation::RevocationStatus;
pub use telemetry::NoopMetrics;
pub use telemetry::VerificationMetrics;
pub use telemetry::VerificationOutcome;
pub use verifier::AllocationVerifier;
pub use verifier::Ed25519AllocationVerifier;
pub use verifier::PINNED_ALLOCATION_KEY;
pub use verifier::VerifierError;
