// crates/pack-identity-engine/src/telemetry.rs
// ============================================================================
// Module: Verification Telemetry
// Description: Metrics hooks for allocation verification.
// Purpose: Expose counter and latency observations without a metrics backend.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Deployments plug a [`VerificationMetrics`] implementation into the
//! verification cache to export counters and latency histograms. The default
//! [`NoopMetrics`] discards observations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Serialize;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Verification outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// Verification resolved to valid.
    Valid,
    /// Verification resolved to invalid.
    Invalid,
    /// Verification exceeded the timeout and resolved to invalid.
    TimedOut,
    /// Verification result arrived for a superseded tuple.
    Stale,
    /// Request joined an in-flight verification.
    Coalesced,
    /// Request was served from a resolved cache entry.
    CacheHit,
}

impl VerificationOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::TimedOut => "timed_out",
            Self::Stale => "stale",
            Self::Coalesced => "coalesced",
            Self::CacheHit => "cache_hit",
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for verification requests and latencies.
pub trait VerificationMetrics: Send + Sync {
    /// Records a verification request outcome.
    fn record_verification(&self, outcome: VerificationOutcome);
    /// Records the latency of a completed verification.
    fn record_latency(&self, outcome: VerificationOutcome, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl VerificationMetrics for NoopMetrics {
    fn record_verification(&self, _outcome: VerificationOutcome) {}

    fn record_latency(&self, _outcome: VerificationOutcome, _latency: Duration) {}
}
