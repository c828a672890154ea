// crates/pack-identity-engine/src/facade.rs
// ============================================================================
// Module: Validation Facade
// Description: Per-entity composition of classification, duplicate, and
//              prefix checks.
// Purpose: Give presentation layers one status object per entity.
// Dependencies: pack-identity-core, pack-identity-config, serde
// ============================================================================

//! ## Overview
//! The facade composes the namespace classifier, the verification cache, the
//! duplicate detector, and the label prefix validator. Namespace tiers are
//! classified first; only managed identifiers with a declared allocation
//! reach the verification cache. Duplicate and prefix checks never depend on
//! verification.
//!
//! Synchronous methods read the cache without starting work, so they are
//! safe to call once per rendered row. Asynchronous methods resolve the
//! declared allocation through the cache, which coalesces repeated requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use pack_identity_config::PackIdentityConfig;
use pack_identity_core::ALL_COLLECTION_KINDS;
use pack_identity_core::AllocationContext;
use pack_identity_core::CollectionKind;
use pack_identity_core::DuplicatePolicy;
use pack_identity_core::EntityKey;
use pack_identity_core::EntityRecord;
use pack_identity_core::IdentifierInput;
use pack_identity_core::IdentifierStatus;
use pack_identity_core::NamespaceTier;
use pack_identity_core::PackAllocation;
use pack_identity_core::PackDocument;
use pack_identity_core::PrefixCheck;
use pack_identity_core::VerificationState;
use pack_identity_core::check_prefix;
use pack_identity_core::classify;
use pack_identity_core::classify_parsed;
use pack_identity_core::detect_collection_duplicates;
use pack_identity_core::is_duplicate;
use serde::Serialize;
use thiserror::Error;

use crate::audit::audit_sink_from_config;
use crate::cache::VerificationCache;
use crate::revocation::HttpRevocationAuthority;
use crate::revocation::RevocationCheckedVerifier;
use crate::revocation::RevocationError;
use crate::verifier::AllocationVerifier;
use crate::verifier::Ed25519AllocationVerifier;
use crate::verifier::VerifierError;

// ============================================================================
// SECTION: Results
// ============================================================================

/// Validation status for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityValidation {
    /// Owning collection.
    pub kind: CollectionKind,
    /// Position of the entity in its collection.
    pub position: usize,
    /// Duplicate-detection key, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<EntityKey>,
    /// Identifier classification; `None` when the engine has no opinion.
    pub id_status: Option<IdentifierStatus>,
    /// Whether another entity in the collection shares the key.
    pub is_duplicate: bool,
    /// Label prefix check, for label-bearing entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<PrefixCheck>,
}

impl EntityValidation {
    /// Returns true when the label should carry a prefix warning.
    #[must_use]
    pub fn prefix_warning(&self) -> bool {
        self.prefix.as_ref().is_some_and(PrefixCheck::is_warning)
    }

    /// Returns true when the identifier status is a violation.
    #[must_use]
    pub fn has_id_violation(&self) -> bool {
        self.id_status.is_some_and(IdentifierStatus::is_violation)
    }
}

/// Validation results for one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionValidation {
    /// Collection kind.
    pub kind: CollectionKind,
    /// Keys shared by more than one entity.
    pub duplicate_keys: Vec<EntityKey>,
    /// Per-entity results in collection order.
    pub entities: Vec<EntityValidation>,
}

/// Aggregate counts over a pack validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    /// Entities inspected.
    pub entities: usize,
    /// Entities with identifier violations.
    pub id_violations: usize,
    /// Entities flagged as duplicates.
    pub duplicates: usize,
    /// Entities with prefix warnings.
    pub prefix_warnings: usize,
}

impl ValidationSummary {
    /// Returns true when any blocking finding exists.
    ///
    /// Prefix warnings are advisory and never block.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.id_violations > 0 || self.duplicates > 0
    }
}

/// Validation results for a whole pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackValidation {
    /// Pack label, when set.
    pub pack_label: Option<String>,
    /// Verification state of the declared allocation, when one is declared.
    pub verification: Option<VerificationState>,
    /// Aggregate counts.
    pub summary: ValidationSummary,
    /// Per-collection results.
    pub collections: Vec<CollectionValidation>,
}

// ============================================================================
// SECTION: Facade
// ============================================================================

/// Composes the validators into per-entity statuses.
pub struct ValidationFacade {
    /// Shared verification cache.
    cache: Arc<VerificationCache>,
    /// Duplicate detection policy.
    policy: DuplicatePolicy,
}

impl ValidationFacade {
    /// Creates a facade over an existing cache.
    #[must_use]
    pub const fn new(cache: Arc<VerificationCache>, policy: DuplicatePolicy) -> Self {
        Self {
            cache,
            policy,
        }
    }

    /// Builds a facade from config using the pinned authority key.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the key, revocation authority, or audit
    /// sink cannot be built.
    pub fn from_config(config: &PackIdentityConfig) -> Result<Self, EngineError> {
        Self::with_verifier(config, Arc::new(Ed25519AllocationVerifier::pinned()?))
    }

    /// Builds a facade from config around an explicit signature verifier.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the revocation authority or audit sink
    /// cannot be built.
    pub fn with_verifier(
        config: &PackIdentityConfig,
        signature: Arc<dyn AllocationVerifier>,
    ) -> Result<Self, EngineError> {
        let verifier: Arc<dyn AllocationVerifier> =
            match HttpRevocationAuthority::from_config(&config.revocation)? {
                Some(authority) => {
                    Arc::new(RevocationCheckedVerifier::new(signature, Arc::new(authority)))
                }
                None => signature,
            };
        let audit = audit_sink_from_config(&config.audit)
            .map_err(|err| EngineError::Audit(err.to_string()))?;
        let cache = VerificationCache::new(verifier, config.verification.timeout()).with_audit(audit);
        Ok(Self::new(Arc::new(cache), config.duplicates.policy()))
    }

    /// Returns the shared verification cache.
    #[must_use]
    pub const fn cache(&self) -> &Arc<VerificationCache> {
        &self.cache
    }

    /// Returns the duplicate detection policy.
    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Records the allocation currently declared by the pack.
    pub fn set_allocation(&self, allocation: Option<&PackAllocation>) {
        self.cache.track(allocation);
    }

    /// Classifies an identifier, resolving the allocation when needed.
    pub async fn identifier_status(
        &self,
        id: i64,
        allocation: Option<&PackAllocation>,
    ) -> Option<IdentifierStatus> {
        self.set_allocation(allocation);
        let context = match (NamespaceTier::of(id), allocation) {
            (NamespaceTier::Managed, Some(allocation)) => {
                let state = self.cache.resolve(allocation).await;
                Some(AllocationContext::new(allocation, state))
            }
            _ => None,
        };
        classify(id, context)
    }

    /// Classifies raw identifier text, resolving the allocation when needed.
    pub async fn identifier_input_status(
        &self,
        raw: &str,
        allocation: Option<&PackAllocation>,
    ) -> Option<IdentifierStatus> {
        match IdentifierInput::parse(raw) {
            IdentifierInput::NotANumber => None,
            IdentifierInput::Overflow => Some(IdentifierStatus::OutOfBounds),
            IdentifierInput::Value(id) => self.identifier_status(id, allocation).await,
        }
    }

    /// Classifies an identifier from the cached verification state only.
    ///
    /// Never starts verification; an unresolved allocation reads as pending.
    #[must_use]
    pub fn identifier_status_now(
        &self,
        id: i64,
        allocation: Option<&PackAllocation>,
    ) -> Option<IdentifierStatus> {
        self.input_status_now(IdentifierInput::Value(id), allocation)
    }

    /// Classifies parsed identifier input from the cached verification state.
    fn input_status_now(
        &self,
        input: IdentifierInput,
        allocation: Option<&PackAllocation>,
    ) -> Option<IdentifierStatus> {
        let context = allocation
            .map(|allocation| AllocationContext::new(allocation, self.cache.state(allocation)));
        classify_parsed(input, context)
    }

    /// Validates one entity of a collection.
    ///
    /// Returns `None` when `position` is out of range.
    #[must_use]
    pub fn validate_entity(
        &self,
        kind: CollectionKind,
        position: usize,
        entities: &[EntityRecord],
        pack_label: Option<&str>,
        allocation: Option<&PackAllocation>,
    ) -> Option<EntityValidation> {
        let entity = entities.get(position)?;
        let rules = kind.rules();
        let duplicate = is_duplicate(position, entities, |other| rules.key_of(other, self.policy));
        Some(self.entity_validation(kind, position, entity, duplicate, pack_label, allocation))
    }

    /// Validates every entity of a collection in linear time.
    #[must_use]
    pub fn validate_collection(
        &self,
        kind: CollectionKind,
        entities: &[EntityRecord],
        pack_label: Option<&str>,
        allocation: Option<&PackAllocation>,
    ) -> CollectionValidation {
        let duplicates = detect_collection_duplicates(kind, entities, self.policy);
        let validations = entities
            .iter()
            .enumerate()
            .map(|(position, entity)| {
                self.entity_validation(
                    kind,
                    position,
                    entity,
                    duplicates.is_flagged(position),
                    pack_label,
                    allocation,
                )
            })
            .collect();
        CollectionValidation {
            kind,
            duplicate_keys: duplicates.keys.into_iter().collect(),
            entities: validations,
        }
    }

    /// Validates every collection of a pack document.
    ///
    /// The declared allocation is verified at most once, and only when some
    /// entity carries a managed-tier identifier.
    pub async fn validate_document<D>(&self, document: &D) -> PackValidation
    where
        D: PackDocument + ?Sized,
    {
        let allocation = document.allocation();
        self.set_allocation(allocation);
        let verification = match allocation {
            Some(allocation) if has_managed_identifier(document) => {
                Some(self.cache.resolve(allocation).await)
            }
            Some(allocation) => Some(self.cache.state(allocation)),
            None => None,
        };
        let pack_label = document.pack_label();
        let collections: Vec<CollectionValidation> = ALL_COLLECTION_KINDS
            .iter()
            .map(|kind| {
                self.validate_collection(*kind, document.collection(*kind), pack_label, allocation)
            })
            .collect();
        let summary = summarize(&collections);
        PackValidation {
            pack_label: pack_label.map(str::to_string),
            verification,
            summary,
            collections,
        }
    }

    /// Builds the validation for one entity given its duplicate flag.
    fn entity_validation(
        &self,
        kind: CollectionKind,
        position: usize,
        entity: &EntityRecord,
        is_duplicate: bool,
        pack_label: Option<&str>,
        allocation: Option<&PackAllocation>,
    ) -> EntityValidation {
        EntityValidation {
            kind,
            position,
            key: kind.rules().key_of(entity, self.policy),
            id_status: entity.identifier.and_then(|input| self.input_status_now(input, allocation)),
            is_duplicate,
            prefix: entity.label.as_deref().map(|label| check_prefix(label, pack_label)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Engine construction failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Signature verifier could not be built.
    #[error(transparent)]
    Verifier(#[from] VerifierError),
    /// Revocation authority could not be built.
    #[error(transparent)]
    Revocation(#[from] RevocationError),
    /// Audit sink could not be opened.
    #[error("audit sink unavailable: {0}")]
    Audit(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true when any entity carries a managed-tier identifier.
fn has_managed_identifier<D: PackDocument + ?Sized>(document: &D) -> bool {
    ALL_COLLECTION_KINDS.iter().any(|kind| {
        document.collection(*kind).iter().any(|entity| {
            entity
                .identifier
                .and_then(IdentifierInput::value)
                .is_some_and(|id| matches!(NamespaceTier::of(id), NamespaceTier::Managed))
        })
    })
}

/// Counts findings across collections.
fn summarize(collections: &[CollectionValidation]) -> ValidationSummary {
    let mut summary = ValidationSummary::default();
    for entity in collections.iter().flat_map(|collection| &collection.entities) {
        summary.entities += 1;
        summary.id_violations += usize::from(entity.has_id_violation());
        summary.duplicates += usize::from(entity.is_duplicate);
        summary.prefix_warnings += usize::from(entity.prefix_warning());
    }
    summary
}
