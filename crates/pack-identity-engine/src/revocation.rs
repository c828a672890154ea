// crates/pack-identity-engine/src/revocation.rs
// ============================================================================
// Module: Revocation Authority
// Description: Remote revoked-label checks layered over signature checks.
// Purpose: Let the allocation authority withdraw trust from a signed pack.
// Dependencies: async-trait, reqwest, pack-identity-config
// ============================================================================

//! ## Overview
//! A revocation authority answers whether an allocation issued to a pack
//! label has been withdrawn. The HTTP authority queries
//! `GET {base}/v1/allocations/revocations/{label}`: `200` means revoked,
//! `404` means active, anything else is treated as unavailable.
//! Security posture: revocation checks are a trust boundary; fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pack_identity_config::RevocationConfig;
use pack_identity_config::RevocationMode;
use pack_identity_core::PackAllocation;
use reqwest::Client;
use reqwest::StatusCode;
use reqwest::Url;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use thiserror::Error;

use crate::verifier::AllocationVerifier;

// ============================================================================
// SECTION: Public Types
// ============================================================================

/// Revocation status reported for a pack label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// Allocations for the label remain trusted.
    Active,
    /// Allocations for the label have been withdrawn.
    Revoked,
}

/// Revocation authority interface.
#[async_trait]
pub trait RevocationAuthority: Send + Sync {
    /// Returns the revocation status for a pack label.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError`] when the status cannot be determined.
    async fn status(&self, label: &str) -> Result<RevocationStatus, RevocationError>;
}

/// No-op authority for deployments without a revocation list.
pub struct NoopRevocationAuthority;

#[async_trait]
impl RevocationAuthority for NoopRevocationAuthority {
    async fn status(&self, _label: &str) -> Result<RevocationStatus, RevocationError> {
        Ok(RevocationStatus::Active)
    }
}

/// HTTP-backed revocation authority.
pub struct HttpRevocationAuthority {
    /// Authority base URL.
    base_url: Url,
    /// Prebuilt request headers (authorization when configured).
    headers: HeaderMap,
    /// HTTP client configured with timeouts.
    client: Client,
}

impl HttpRevocationAuthority {
    /// Builds a new HTTP revocation authority.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError`] when the base URL, token, or HTTP client is
    /// invalid.
    pub fn new(
        base_url: &str,
        auth_token: Option<&str>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, RevocationError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| RevocationError::InvalidConfig(format!("invalid base url: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RevocationError::InvalidConfig("base url cannot be a base".to_string()));
        }
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| RevocationError::InvalidConfig("invalid auth token".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|err| RevocationError::Unavailable(err.to_string()))?;
        Ok(Self {
            base_url,
            headers,
            client,
        })
    }

    /// Builds the authority described by config, or `None` when disabled.
    ///
    /// # Errors
    ///
    /// Returns [`RevocationError`] when the configured authority is invalid.
    pub fn from_config(config: &RevocationConfig) -> Result<Option<Self>, RevocationError> {
        if config.mode == RevocationMode::None {
            return Ok(None);
        }
        let base_url = config.base_url.as_deref().ok_or_else(|| {
            RevocationError::InvalidConfig("revocation base url missing".to_string())
        })?;
        Self::new(
            base_url,
            config.auth_token.as_deref(),
            Duration::from_millis(config.connect_timeout_ms),
            Duration::from_millis(config.request_timeout_ms),
        )
        .map(Some)
    }

    /// Returns the revocation URL for a label, percent-encoding the label.
    fn revocation_url(&self, label: &str) -> Result<Url, RevocationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RevocationError::InvalidConfig("base url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v1", "allocations", "revocations", label]);
        Ok(url)
    }
}

#[async_trait]
impl RevocationAuthority for HttpRevocationAuthority {
    async fn status(&self, label: &str) -> Result<RevocationStatus, RevocationError> {
        let url = self.revocation_url(label)?;
        let response = self
            .client
            .get(url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|err| RevocationError::Unavailable(err.to_string()))?;
        match response.status() {
            StatusCode::OK => Ok(RevocationStatus::Revoked),
            StatusCode::NOT_FOUND => Ok(RevocationStatus::Active),
            status => Err(RevocationError::Unavailable(format!(
                "revocation authority error: status {status}"
            ))),
        }
    }
}

/// Verifier that also requires the pack label to be unrevoked.
///
/// # Invariants
/// - The signature is checked first; the authority is only consulted for
///   allocations that already verify.
/// - Authority failures verify as `false`.
pub struct RevocationCheckedVerifier {
    /// Signature verifier.
    signature: Arc<dyn AllocationVerifier>,
    /// Revocation authority.
    authority: Arc<dyn RevocationAuthority>,
}

impl RevocationCheckedVerifier {
    /// Wraps a signature verifier with a revocation authority.
    #[must_use]
    pub fn new(
        signature: Arc<dyn AllocationVerifier>,
        authority: Arc<dyn RevocationAuthority>,
    ) -> Self {
        Self {
            signature,
            authority,
        }
    }
}

#[async_trait]
impl AllocationVerifier for RevocationCheckedVerifier {
    async fn verify(&self, allocation: &PackAllocation) -> bool {
        if !self.signature.verify(allocation).await {
            return false;
        }
        matches!(self.authority.status(&allocation.label).await, Ok(RevocationStatus::Active))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Revocation authority failures.
///
/// # Invariants
/// - Variants are stable for error classification.
#[derive(Debug, Error)]
pub enum RevocationError {
    /// Authority configuration is unusable.
    #[error("invalid revocation authority config: {0}")]
    InvalidConfig(String),
    /// Authority could not be reached or answered unexpectedly.
    #[error("revocation authority unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests;
