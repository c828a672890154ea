// crates/pack-identity-engine/src/audit.rs
// ============================================================================
// Module: Verification Audit Logging
// Description: Structured audit events for allocation verification.
// Purpose: Emit redacted JSON-line audit logs without hard dependencies.
// Dependencies: pack-identity-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events describe the verification cache lifecycle: tuple tracking,
//! verification start, coalescing, resolution, timeout, and stale discard.
//! Events identify allocations by label, range, and a SHA-256 fingerprint;
//! signature bytes are never logged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use pack_identity_config::AuditConfig;
use pack_identity_config::AuditSinkKind;
use pack_identity_core::HashDigest;
use pack_identity_core::PackAllocation;
use pack_identity_core::VerificationState;
use pack_identity_core::allocation_fingerprint;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Verification lifecycle event kinds.
///
/// # Invariants
/// - Labels are stable for log consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationEventKind {
    /// The current allocation tuple changed.
    AllocationTracked,
    /// A verification was started for a tuple.
    VerificationStarted,
    /// A request joined an in-flight verification.
    VerificationCoalesced,
    /// A verification result was stored.
    VerificationResolved,
    /// A verification exceeded its timeout.
    VerificationTimedOut,
    /// A late verification result was dropped.
    VerificationStaleDiscarded,
}

impl VerificationEventKind {
    /// Returns a stable label for the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AllocationTracked => "allocation_tracked",
            Self::VerificationStarted => "verification_started",
            Self::VerificationCoalesced => "verification_coalesced",
            Self::VerificationResolved => "verification_resolved",
            Self::VerificationTimedOut => "verification_timed_out",
            Self::VerificationStaleDiscarded => "verification_stale_discarded",
        }
    }
}

/// Redacted allocation summary carried by audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationSummary {
    /// Pack label the allocation is issued to.
    pub label: String,
    /// First identifier in the allocation.
    pub range_start: i64,
    /// Last identifier in the allocation.
    pub range_end: i64,
    /// Fingerprint of the full allocation tuple, signature included.
    pub fingerprint: HashDigest,
}

impl AllocationSummary {
    /// Summarizes an allocation without its signature bytes.
    #[must_use]
    pub fn of(allocation: &PackAllocation) -> Self {
        Self {
            label: allocation.label.clone(),
            range_start: allocation.range_start,
            range_end: allocation.range_end,
            fingerprint: allocation_fingerprint(allocation),
        }
    }
}

/// Verification audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationAuditEvent {
    /// Event identifier.
    pub event: VerificationEventKind,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Cache generation the event belongs to.
    pub generation: u64,
    /// Allocation the event concerns; `None` when tracking was cleared.
    pub allocation: Option<AllocationSummary>,
    /// Resolved outcome, when the event carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<VerificationState>,
    /// Verification latency in milliseconds, when measured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u128>,
}

impl VerificationAuditEvent {
    /// Creates an event for an allocation at a cache generation.
    #[must_use]
    pub fn new(
        event: VerificationEventKind,
        generation: u64,
        allocation: Option<&PackAllocation>,
    ) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event,
            timestamp_ms,
            generation,
            allocation: allocation.map(AllocationSummary::of),
            outcome: None,
            elapsed_ms: None,
        }
    }

    /// Attaches an outcome and latency to the event.
    #[must_use]
    pub const fn with_outcome(mut self, outcome: VerificationState, elapsed_ms: u128) -> Self {
        self.outcome = Some(outcome);
        self.elapsed_ms = Some(elapsed_ms);
        self
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for verification events.
pub trait AuditSink: Send + Sync {
    /// Records an audit event.
    fn record(&self, event: &VerificationAuditEvent);
}

/// Audit sink that discards events.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &VerificationAuditEvent) {}
}

/// Audit sink writing JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Audit sink appending JSON lines to a file.
pub struct FileAuditSink {
    /// Append-only file handle.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens (or creates) an append-only audit log.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &VerificationAuditEvent) {
        let Ok(payload) = serde_json::to_string(event) else {
            return;
        };
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writeln!(file, "{payload}");
        let _ = file.flush();
    }
}

/// Builds the audit sink selected by config.
///
/// # Errors
///
/// Returns [`io::Error`] when a file sink cannot be opened.
pub fn audit_sink_from_config(config: &AuditConfig) -> io::Result<Arc<dyn AuditSink>> {
    match (config.sink, config.path.as_deref()) {
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::File, Some(path)) => Ok(Arc::new(FileAuditSink::new(Path::new(path.trim()))?)),
        (AuditSinkKind::File, None) => {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "audit file sink requires a path"))
        }
    }
}
