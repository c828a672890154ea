// crates/pack-identity-engine/src/cache.rs
// ============================================================================
// Module: Verification Cache
// Description: Coalescing, generation-tracked cache of verification outcomes.
// Purpose: Run at most one verification per allocation tuple and drop results
//          that arrive after the tuple was superseded.
// Dependencies: tokio, pack-identity-core
// ============================================================================

//! ## Overview
//! The cache is the only shared mutable state in the engine. It maps each
//! allocation tuple to either an in-flight verification or a resolved
//! outcome, and tracks which tuple is current.
//!
//! - Resolving the current tuple while a verification is in flight joins that
//!   verification instead of starting another one.
//! - Tracking a different tuple bumps the generation and drops in-flight
//!   entries for every other tuple. Their late results are discarded on
//!   arrival; resolved outcomes stay cached for the session.
//! - A verification that exceeds the timeout resolves to invalid.
//!
//! The internal lock is never held across an await point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use pack_identity_core::PackAllocation;
use pack_identity_core::VerificationState;
use tokio::sync::watch;

use crate::audit::AuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::VerificationAuditEvent;
use crate::audit::VerificationEventKind;
use crate::telemetry::NoopMetrics;
use crate::telemetry::VerificationMetrics;
use crate::telemetry::VerificationOutcome;
use crate::verifier::AllocationVerifier;

// ============================================================================
// SECTION: Internal State
// ============================================================================

/// Channel carrying the state an in-flight verification publishes.
type Published = watch::Receiver<Option<VerificationState>>;

/// Cache entry for one allocation tuple.
struct CacheEntry {
    /// Generation the entry was created under.
    generation: u64,
    /// In-flight or resolved state.
    state: EntryState,
}

/// Lifecycle of a cache entry.
enum EntryState {
    /// Verification running; joiners wait on the channel.
    InFlight(Published),
    /// Verification finished with this outcome.
    Resolved(bool),
}

/// Lock-protected cache contents.
#[derive(Default)]
struct CacheInner {
    /// Allocation currently declared by the pack.
    current: Option<PackAllocation>,
    /// Incremented whenever the current tuple changes.
    generation: u64,
    /// Entries keyed by the full allocation tuple.
    entries: HashMap<PackAllocation, CacheEntry>,
}

/// Next action for a resolve request, decided under the lock.
enum Step {
    /// Tuple is no longer current.
    Superseded,
    /// Outcome already cached.
    Cached(bool),
    /// Join the in-flight verification at this generation.
    Join(Published, u64),
    /// Run the verification at this generation.
    Lead(watch::Sender<Option<VerificationState>>, u64),
}

// ============================================================================
// SECTION: Verification Cache
// ============================================================================

/// Coalescing verification cache keyed by allocation tuple.
///
/// # Invariants
/// - At most one verification is in flight per tuple and generation.
/// - A result is stored only if its entry still exists at the generation it
///   started under.
pub struct VerificationCache {
    /// Underlying allocation verifier.
    verifier: Arc<dyn AllocationVerifier>,
    /// Bound on a single verification.
    timeout: Duration,
    /// Audit sink for lifecycle events.
    audit: Arc<dyn AuditSink>,
    /// Metrics sink for outcomes and latency.
    metrics: Arc<dyn VerificationMetrics>,
    /// Shared cache contents.
    inner: Mutex<CacheInner>,
}

impl VerificationCache {
    /// Creates a cache with no-op audit and metrics sinks.
    #[must_use]
    pub fn new(verifier: Arc<dyn AllocationVerifier>, timeout: Duration) -> Self {
        Self {
            verifier,
            timeout,
            audit: Arc::new(NoopAuditSink),
            metrics: Arc::new(NoopMetrics),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn VerificationMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the verification timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the allocation currently tracked.
    #[must_use]
    pub fn current(&self) -> Option<PackAllocation> {
        self.lock().current.clone()
    }

    /// Returns the current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Makes `allocation` the current tuple.
    ///
    /// Changing the tuple drops in-flight entries for every other tuple so
    /// their late results are discarded. Tracking the current tuple again is
    /// a no-op.
    pub fn track(&self, allocation: Option<&PackAllocation>) {
        let generation = {
            let mut inner = self.lock();
            if inner.current.as_ref() == allocation {
                return;
            }
            inner.generation = inner.generation.wrapping_add(1);
            inner.current = allocation.cloned();
            inner.entries.retain(|_, entry| matches!(entry.state, EntryState::Resolved(_)));
            inner.generation
        };
        self.audit.record(&VerificationAuditEvent::new(
            VerificationEventKind::AllocationTracked,
            generation,
            allocation,
        ));
    }

    /// Returns the cached state for a tuple without starting verification.
    #[must_use]
    pub fn state(&self, allocation: &PackAllocation) -> VerificationState {
        match self.lock().entries.get(allocation) {
            Some(CacheEntry {
                state: EntryState::Resolved(valid),
                ..
            }) => VerificationState::from_outcome(*valid),
            _ => VerificationState::Pending,
        }
    }

    /// Tracks `allocation` and resolves its verification state.
    ///
    /// Returns [`VerificationState::Pending`] when the tuple is superseded
    /// before its verification completes.
    pub async fn resolve(&self, allocation: &PackAllocation) -> VerificationState {
        self.track(Some(allocation));
        loop {
            match self.next_step(allocation) {
                Step::Superseded => return VerificationState::Pending,
                Step::Cached(valid) => {
                    self.metrics.record_verification(VerificationOutcome::CacheHit);
                    return VerificationState::from_outcome(valid);
                }
                Step::Join(mut published, generation) => {
                    self.metrics.record_verification(VerificationOutcome::Coalesced);
                    self.audit.record(&VerificationAuditEvent::new(
                        VerificationEventKind::VerificationCoalesced,
                        generation,
                        Some(allocation),
                    ));
                    if let Ok(state) = published.wait_for(Option::is_some).await {
                        let state = *state;
                        return state.unwrap_or(VerificationState::Pending);
                    }
                    // Leader was cancelled; its entry is gone, so retry.
                }
                Step::Lead(sender, generation) => {
                    return self.lead(allocation, &sender, generation).await;
                }
            }
        }
    }

    /// Decides the next step for a resolve request.
    fn next_step(&self, allocation: &PackAllocation) -> Step {
        let mut inner = self.lock();
        if inner.current.as_ref() != Some(allocation) {
            return Step::Superseded;
        }
        if let Some(entry) = inner.entries.get(allocation) {
            return match &entry.state {
                EntryState::Resolved(valid) => Step::Cached(*valid),
                EntryState::InFlight(published) => Step::Join(published.clone(), entry.generation),
            };
        }
        let generation = inner.generation;
        let (sender, published) = watch::channel(None);
        inner.entries.insert(
            allocation.clone(),
            CacheEntry {
                generation,
                state: EntryState::InFlight(published),
            },
        );
        Step::Lead(sender, generation)
    }

    /// Runs a verification and publishes its state to joiners.
    async fn lead(
        &self,
        allocation: &PackAllocation,
        sender: &watch::Sender<Option<VerificationState>>,
        generation: u64,
    ) -> VerificationState {
        let guard = InFlightGuard {
            cache: self,
            allocation,
            generation,
            armed: true,
        };
        self.audit.record(&VerificationAuditEvent::new(
            VerificationEventKind::VerificationStarted,
            generation,
            Some(allocation),
        ));
        let started = Instant::now();
        let valid = if let Ok(valid) =
            tokio::time::timeout(self.timeout, self.verifier.verify(allocation)).await
        {
            valid
        } else {
            self.metrics.record_verification(VerificationOutcome::TimedOut);
            self.audit.record(&VerificationAuditEvent::new(
                VerificationEventKind::VerificationTimedOut,
                generation,
                Some(allocation),
            ));
            false
        };
        let elapsed = started.elapsed();
        let applied = self.store(allocation, generation, valid);
        guard.disarm();

        let state = if applied {
            VerificationState::from_outcome(valid)
        } else {
            VerificationState::Pending
        };
        sender.send_replace(Some(state));

        let (kind, outcome) = if applied {
            let outcome =
                if valid { VerificationOutcome::Valid } else { VerificationOutcome::Invalid };
            (VerificationEventKind::VerificationResolved, outcome)
        } else {
            (VerificationEventKind::VerificationStaleDiscarded, VerificationOutcome::Stale)
        };
        self.metrics.record_verification(outcome);
        self.metrics.record_latency(outcome, elapsed);
        self.audit.record(
            &VerificationAuditEvent::new(kind, generation, Some(allocation))
                .with_outcome(VerificationState::from_outcome(valid), elapsed.as_millis()),
        );
        state
    }

    /// Stores an outcome if the entry still belongs to `generation`.
    fn store(&self, allocation: &PackAllocation, generation: u64, valid: bool) -> bool {
        let mut inner = self.lock();
        match inner.entries.get_mut(allocation) {
            Some(entry)
                if entry.generation == generation
                    && matches!(entry.state, EntryState::InFlight(_)) =>
            {
                entry.state = EntryState::Resolved(valid);
                true
            }
            _ => false,
        }
    }

    /// Removes an in-flight entry owned by `generation`.
    fn abandon(&self, allocation: &PackAllocation, generation: u64) {
        let mut inner = self.lock();
        let owned = inner.entries.get(allocation).is_some_and(|entry| {
            entry.generation == generation && matches!(entry.state, EntryState::InFlight(_))
        });
        if owned {
            inner.entries.remove(allocation);
        }
    }

    /// Locks the cache, recovering the contents after a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: In-Flight Guard
// ============================================================================

/// Clears an in-flight entry when its leader is dropped before finishing.
struct InFlightGuard<'a> {
    /// Owning cache.
    cache: &'a VerificationCache,
    /// Tuple being verified.
    allocation: &'a PackAllocation,
    /// Generation the verification started under.
    generation: u64,
    /// False once the leader has stored or discarded its result.
    armed: bool,
}

impl InFlightGuard<'_> {
    /// Marks the verification as finished.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.cache.abandon(self.allocation, self.generation);
        }
    }
}

#[cfg(test)]
mod tests;
