// crates/pack-identity-config/src/config.rs
// ============================================================================
// Module: Pack Identity Configuration
// Description: Configuration loading and validation for the pack identity engine.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: pack-identity-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The path comes from the caller, else `PACK_IDENTITY_CONFIG`, else
//! `pack-identity.toml` in the working directory. Only the default filename
//! may be absent; an absent default yields the built-in defaults.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use pack_identity_core::DuplicatePolicy;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "pack-identity.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PACK_IDENTITY_CONFIG";
/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default verification timeout in milliseconds.
pub const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 2_000;
/// Minimum verification timeout in milliseconds.
pub const MIN_VERIFICATION_TIMEOUT_MS: u64 = 10;
/// Maximum verification timeout in milliseconds.
pub const MAX_VERIFICATION_TIMEOUT_MS: u64 = 60_000;
/// Default revocation connect timeout in milliseconds.
const DEFAULT_REVOCATION_CONNECT_TIMEOUT_MS: u64 = 500;
/// Default revocation request timeout in milliseconds.
const DEFAULT_REVOCATION_REQUEST_TIMEOUT_MS: u64 = 1_500;
/// Maximum revocation connect timeout in milliseconds.
const MAX_REVOCATION_CONNECT_TIMEOUT_MS: u64 = 10_000;
/// Maximum revocation request timeout in milliseconds.
const MAX_REVOCATION_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Maximum revocation auth token length.
const MAX_AUTH_TOKEN_LENGTH: usize = 256;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Pack identity configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackIdentityConfig {
    /// Allocation verification settings.
    #[serde(default)]
    pub verification: VerificationConfig,
    /// Optional remote revocation check.
    #[serde(default)]
    pub revocation: RevocationConfig,
    /// Duplicate detection policy.
    #[serde(default)]
    pub duplicates: DuplicatesConfig,
    /// Audit event sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl PackIdentityConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_resolved(&resolve_path(path)?)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.verification.validate()?;
        self.revocation.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: Verification
// ============================================================================

/// Allocation verification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationConfig {
    /// Bound after which an outstanding verification resolves to invalid.
    #[serde(default = "default_verification_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_VERIFICATION_TIMEOUT_MS,
        }
    }
}

impl VerificationConfig {
    /// Returns the verification timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates verification settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_VERIFICATION_TIMEOUT_MS ..= MAX_VERIFICATION_TIMEOUT_MS).contains(&self.timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "verification.timeout_ms must be between {MIN_VERIFICATION_TIMEOUT_MS} and \
                 {MAX_VERIFICATION_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Revocation
// ============================================================================

/// Revocation check mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationMode {
    /// No revocation check; signatures alone decide.
    #[default]
    None,
    /// Query an HTTP revocation authority.
    Http,
}

/// Remote revoked-label check settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevocationConfig {
    /// Revocation mode.
    #[serde(default)]
    pub mode: RevocationMode,
    /// Base URL of the revocation authority.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Optional bearer token (never serialized).
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_revocation_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_revocation_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Allow `http://` base URLs (explicit opt-in).
    #[serde(default)]
    pub allow_insecure_http: bool,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            mode: RevocationMode::None,
            base_url: None,
            auth_token: None,
            connect_timeout_ms: DEFAULT_REVOCATION_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REVOCATION_REQUEST_TIMEOUT_MS,
            allow_insecure_http: false,
        }
    }
}

impl fmt::Debug for RevocationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationConfig")
            .field("mode", &self.mode)
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("allow_insecure_http", &self.allow_insecure_http)
            .finish()
    }
}

impl RevocationConfig {
    /// Validates revocation settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.mode {
            RevocationMode::None => {
                if self.base_url.is_some() {
                    return Err(ConfigError::Invalid(
                        "revocation.base_url only allowed when mode=http".to_string(),
                    ));
                }
            }
            RevocationMode::Http => {
                let Some(base_url) = &self.base_url else {
                    return Err(ConfigError::Invalid(
                        "revocation.mode=http requires revocation.base_url".to_string(),
                    ));
                };
                let trimmed = base_url.trim();
                if trimmed.starts_with("http://") {
                    if !self.allow_insecure_http {
                        return Err(ConfigError::Invalid(
                            "revocation.base_url uses http:// without allow_insecure_http"
                                .to_string(),
                        ));
                    }
                } else if !trimmed.starts_with("https://") {
                    return Err(ConfigError::Invalid(
                        "revocation.base_url must include http:// or https://".to_string(),
                    ));
                }
            }
        }
        if let Some(token) = &self.auth_token {
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "revocation.auth_token must be non-empty".to_string(),
                ));
            }
            if token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid(
                    "revocation.auth_token exceeds max length".to_string(),
                ));
            }
        }
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > MAX_REVOCATION_CONNECT_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid(format!(
                "revocation.connect_timeout_ms must be between 1 and \
                 {MAX_REVOCATION_CONNECT_TIMEOUT_MS}"
            )));
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REVOCATION_REQUEST_TIMEOUT_MS
        {
            return Err(ConfigError::Invalid(format!(
                "revocation.request_timeout_ms must be between 1 and \
                 {MAX_REVOCATION_REQUEST_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Duplicates
// ============================================================================

/// Duplicate detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DuplicatesConfig {
    /// Treat identifier `0` as unset and exempt it from collisions.
    #[serde(default = "default_zero_is_unset")]
    pub zero_is_unset: bool,
}

impl Default for DuplicatesConfig {
    fn default() -> Self {
        Self {
            zero_is_unset: true,
        }
    }
}

impl DuplicatesConfig {
    /// Returns the duplicate policy described by this section.
    #[must_use]
    pub const fn policy(&self) -> DuplicatePolicy {
        DuplicatePolicy {
            zero_is_unset: self.zero_is_unset,
        }
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Audit sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// Write JSON lines to stderr.
    Stderr,
    /// Append JSON lines to a file.
    File,
}

/// Audit event sink settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Output path for the file sink.
    #[serde(default)]
    pub path: Option<String>,
}

impl AuditConfig {
    /// Validates audit settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("audit.path", path),
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
            (_, Some(_)) => {
                Err(ConfigError::Invalid("audit.path only allowed when sink=file".to_string()))
            }
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config path plus whether the caller asked for it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedPath {
    /// Path to read.
    path: PathBuf,
    /// False only for the built-in default filename.
    required: bool,
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ResolvedPath, ConfigError> {
    if let Some(path) = path {
        return Ok(ResolvedPath {
            path: path.to_path_buf(),
            required: true,
        });
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ResolvedPath {
            path: PathBuf::from(env_path),
            required: true,
        });
    }
    Ok(ResolvedPath {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        required: false,
    })
}

/// Reads, parses, and validates a resolved config path.
fn load_resolved(resolved: &ResolvedPath) -> Result<PackIdentityConfig, ConfigError> {
    validate_path(&resolved.path)?;
    let bytes = match fs::read(&resolved.path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound && !resolved.required => {
            return Ok(PackIdentityConfig::default());
        }
        Err(err) => return Err(ConfigError::Io(err.to_string())),
    };
    if bytes.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let content = std::str::from_utf8(&bytes)
        .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
    PackIdentityConfig::from_toml_str(content)
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a configured path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Default verification timeout for serde.
const fn default_verification_timeout_ms() -> u64 {
    DEFAULT_VERIFICATION_TIMEOUT_MS
}

/// Default revocation connect timeout for serde.
const fn default_revocation_connect_timeout_ms() -> u64 {
    DEFAULT_REVOCATION_CONNECT_TIMEOUT_MS
}

/// Default revocation request timeout for serde.
const fn default_revocation_request_timeout_ms() -> u64 {
    DEFAULT_REVOCATION_REQUEST_TIMEOUT_MS
}

/// Default zero-identifier policy for serde.
const fn default_zero_is_unset() -> bool {
    true
}

// ============================================================================
// SECTION: Tests
// ============================================================================
