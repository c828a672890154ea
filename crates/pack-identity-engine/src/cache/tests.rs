// crates/pack-identity-engine/src/cache/tests.rs
// ============================================================================
// Module: Verification Cache Tests
// Description: Unit tests for coalescing, staleness, and timeouts.
// Purpose: Pin the concurrency contract of the verification cache.
// Dependencies: pack-identity-engine, tokio
// ============================================================================

//! ## Overview
//! Uses a gated verifier to hold verifications in flight while the test
//! drives joins, tuple changes, cancellation, and timeouts.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use pack_identity_core::AllocationContext;
use pack_identity_core::IdentifierStatus;
use pack_identity_core::PackAllocation;
use pack_identity_core::VerificationState;
use pack_identity_core::classify;
use tokio::sync::Notify;
use tokio::sync::Semaphore;

use super::VerificationCache;
use crate::audit::AuditSink;
use crate::audit::VerificationAuditEvent;
use crate::audit::VerificationEventKind;
use crate::telemetry::VerificationMetrics;
use crate::telemetry::VerificationOutcome;
use crate::verifier::AllocationVerifier;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Verifier that blocks allocations with a gated label until released.
struct GatedVerifier {
    gated_label: &'static str,
    outcome: bool,
    other_outcome: bool,
    calls: AtomicUsize,
    started: Notify,
    gate: Semaphore,
}

impl GatedVerifier {
    fn new(gated_label: &'static str, outcome: bool) -> Arc<Self> {
        Self::split(gated_label, outcome, outcome)
    }

    /// Gated label resolves to `outcome`; every other label to `other_outcome`.
    fn split(gated_label: &'static str, outcome: bool, other_outcome: bool) -> Arc<Self> {
        Arc::new(Self {
            gated_label,
            outcome,
            other_outcome,
            calls: AtomicUsize::new(0),
            started: Notify::new(),
            gate: Semaphore::new(0),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AllocationVerifier for GatedVerifier {
    async fn verify(&self, allocation: &PackAllocation) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if allocation.label != self.gated_label {
            return self.other_outcome;
        }
        self.started.notify_one();
        let _permit = self.gate.acquire().await.expect("gate open");
        self.outcome
    }
}

/// Verifier that never completes.
struct HangingVerifier;

#[async_trait]
impl AllocationVerifier for HangingVerifier {
    async fn verify(&self, _allocation: &PackAllocation) -> bool {
        std::future::pending::<()>().await;
        true
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<VerificationEventKind>>,
}

impl RecordingSink {
    fn count(&self, kind: VerificationEventKind) -> usize {
        self.events.lock().unwrap().iter().filter(|event| **event == kind).count()
    }
}

impl AuditSink for RecordingSink {
    fn record(&self, event: &VerificationAuditEvent) {
        self.events.lock().unwrap().push(event.event);
    }
}

#[derive(Default)]
struct RecordingMetrics {
    outcomes: Mutex<Vec<VerificationOutcome>>,
    latencies: AtomicUsize,
}

impl VerificationMetrics for RecordingMetrics {
    fn record_verification(&self, outcome: VerificationOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }

    fn record_latency(&self, _outcome: VerificationOutcome, _latency: Duration) {
        self.latencies.fetch_add(1, Ordering::SeqCst);
    }
}

fn allocation(label: &str, start: i64, end: i64) -> PackAllocation {
    PackAllocation::new(label, start, end, vec![3; 64])
}

const LONG: Duration = Duration::from_secs(10);

// ============================================================================
// SECTION: Tests
// ============================================================================

#[tokio::test]
async fn unresolved_tuples_read_as_pending() {
    let cache = VerificationCache::new(GatedVerifier::new("none", true), LONG);
    let tuple = allocation("mod1", 10_000, 20_000);
    assert_eq!(cache.state(&tuple), VerificationState::Pending);
    assert_eq!(cache.resolve(&tuple).await, VerificationState::Valid);
    assert_eq!(cache.state(&tuple), VerificationState::Valid);
}

#[tokio::test]
async fn identical_tuple_is_verified_once() {
    let verifier = GatedVerifier::new("none", false);
    let cache = VerificationCache::new(verifier.clone(), LONG);
    let tuple = allocation("mod1", 10_000, 20_000);
    for _ in 0 .. 3 {
        assert_eq!(cache.resolve(&tuple).await, VerificationState::Invalid);
    }
    assert_eq!(verifier.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_coalesce() {
    let verifier = GatedVerifier::new("mod1", true);
    let sink = Arc::new(RecordingSink::default());
    let cache =
        Arc::new(VerificationCache::new(verifier.clone(), LONG).with_audit(sink.clone()));
    let tuple = allocation("mod1", 10_000, 20_000);

    let leader = {
        let cache = Arc::clone(&cache);
        let tuple = tuple.clone();
        tokio::spawn(async move { cache.resolve(&tuple).await })
    };
    verifier.started.notified().await;

    let joiners: Vec<_> = (0 .. 4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let tuple = tuple.clone();
            tokio::spawn(async move { cache.resolve(&tuple).await })
        })
        .collect();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.state(&tuple), VerificationState::Pending);

    verifier.release();
    assert_eq!(leader.await.unwrap(), VerificationState::Valid);
    for joiner in joiners {
        assert_eq!(joiner.await.unwrap(), VerificationState::Valid);
    }
    assert_eq!(verifier.calls(), 1);
    assert_eq!(sink.count(VerificationEventKind::VerificationStarted), 1);
    assert_eq!(sink.count(VerificationEventKind::VerificationCoalesced), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn superseded_result_is_discarded() {
    let verifier = GatedVerifier::split("slow", true, false);
    let sink = Arc::new(RecordingSink::default());
    let cache =
        Arc::new(VerificationCache::new(verifier.clone(), LONG).with_audit(sink.clone()));
    let tuple_a = allocation("slow", 10_000, 20_000);
    let tuple_b = allocation("fast", 10_000, 30_000);

    let task_a = {
        let cache = Arc::clone(&cache);
        let tuple = tuple_a.clone();
        tokio::spawn(async move { cache.resolve(&tuple).await })
    };
    verifier.started.notified().await;
    let generation_a = cache.generation();

    assert_eq!(cache.resolve(&tuple_b).await, VerificationState::Invalid);
    assert!(cache.generation() > generation_a);

    verifier.release();
    assert_eq!(task_a.await.unwrap(), VerificationState::Pending);
    assert_eq!(cache.state(&tuple_a), VerificationState::Pending);
    assert_eq!(cache.state(&tuple_b), VerificationState::Invalid);
    let context = AllocationContext::new(&tuple_b, cache.state(&tuple_b));
    assert_eq!(classify(15_000, Some(context)), Some(IdentifierStatus::InvalidSignature));
    assert_eq!(cache.current(), Some(tuple_b));
    assert_eq!(sink.count(VerificationEventKind::VerificationStaleDiscarded), 1);
    assert_eq!(sink.count(VerificationEventKind::VerificationResolved), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn returning_to_a_tuple_restarts_its_verification() {
    let verifier = GatedVerifier::new("slow", true);
    let cache = Arc::new(VerificationCache::new(verifier.clone(), LONG));
    let tuple_a = allocation("slow", 10_000, 20_000);

    let first = {
        let cache = Arc::clone(&cache);
        let tuple = tuple_a.clone();
        tokio::spawn(async move { cache.resolve(&tuple).await })
    };
    verifier.started.notified().await;
    cache.track(None);
    cache.track(Some(&tuple_a));

    let second = {
        let cache = Arc::clone(&cache);
        let tuple = tuple_a.clone();
        tokio::spawn(async move { cache.resolve(&tuple).await })
    };
    verifier.started.notified().await;
    verifier.release();
    verifier.release();

    assert_eq!(first.await.unwrap(), VerificationState::Pending);
    assert_eq!(second.await.unwrap(), VerificationState::Valid);
    assert_eq!(cache.state(&tuple_a), VerificationState::Valid);
    assert_eq!(verifier.calls(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_leader_releases_the_tuple() {
    let verifier = GatedVerifier::new("mod1", true);
    let cache = Arc::new(VerificationCache::new(verifier.clone(), LONG));
    let tuple = allocation("mod1", 10_000, 20_000);

    let leader = {
        let cache = Arc::clone(&cache);
        let tuple = tuple.clone();
        tokio::spawn(async move { cache.resolve(&tuple).await })
    };
    verifier.started.notified().await;
    leader.abort();
    assert!(leader.await.unwrap_err().is_cancelled());
    assert_eq!(cache.state(&tuple), VerificationState::Pending);

    verifier.release();
    assert_eq!(cache.resolve(&tuple).await, VerificationState::Valid);
    assert_eq!(verifier.calls(), 2);
}

#[tokio::test]
async fn timeout_resolves_to_invalid() {
    let sink = Arc::new(RecordingSink::default());
    let cache = VerificationCache::new(Arc::new(HangingVerifier), Duration::from_millis(20))
        .with_audit(sink.clone());
    let tuple = allocation("mod1", 10_000, 20_000);
    assert_eq!(cache.resolve(&tuple).await, VerificationState::Invalid);
    assert_eq!(cache.state(&tuple), VerificationState::Invalid);
    assert_eq!(sink.count(VerificationEventKind::VerificationTimedOut), 1);
}

#[tokio::test]
async fn resolved_outcomes_survive_tuple_changes() {
    let verifier = GatedVerifier::new("none", true);
    let sink = Arc::new(RecordingSink::default());
    let cache = VerificationCache::new(verifier.clone(), LONG).with_audit(sink.clone());
    let tuple_a = allocation("mod1", 10_000, 20_000);
    let tuple_b = allocation("mod1", 10_000, 20_001);

    cache.resolve(&tuple_a).await;
    cache.resolve(&tuple_b).await;
    cache.resolve(&tuple_a).await;
    cache.track(Some(&tuple_a));

    assert_eq!(verifier.calls(), 2);
    assert_eq!(cache.state(&tuple_a), VerificationState::Valid);
    assert_eq!(sink.count(VerificationEventKind::AllocationTracked), 3);
}

#[tokio::test]
async fn metrics_observe_outcomes_and_cache_hits() {
    let metrics = Arc::new(RecordingMetrics::default());
    let cache = VerificationCache::new(Arc::new(HangingVerifier), Duration::from_millis(20))
        .with_metrics(metrics.clone());
    let tuple = allocation("mod1", 10_000, 20_000);
    cache.resolve(&tuple).await;
    cache.resolve(&tuple).await;

    let outcomes = metrics.outcomes.lock().unwrap().clone();
    assert_eq!(
        outcomes,
        vec![
            VerificationOutcome::TimedOut,
            VerificationOutcome::Invalid,
            VerificationOutcome::CacheHit,
        ]
    );
    assert_eq!(metrics.latencies.load(Ordering::SeqCst), 1);
    let labels: Vec<&str> = outcomes.iter().map(|outcome| outcome.as_str()).collect();
    assert_eq!(labels, vec!["timed_out", "invalid", "cache_hit"]);
}
