// crates/pack-identity-core/src/runtime/prefix.rs
// ============================================================================
// Module: Label Prefix Validator
// Description: Naming-convention check for pack-scoped entity labels.
// Purpose: Warn when a label does not start with `_<packLabel>_`.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Labels owned by a pack must start with `_` + pack label + `_`. The check
//! is warning-level only: it annotates entities and never invalidates them.
//! A label equal to the bare prefix (a freshly created, not yet named entity)
//! is conformant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Result of a label prefix check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixCheck {
    /// Prefix the label is expected to start with (empty when no pack label).
    pub expected_prefix: String,
    /// Whether the label conforms to the prefix.
    pub is_conformant: bool,
}

impl PrefixCheck {
    /// Returns true when a warning should be shown.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        !self.is_conformant
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Returns the expected prefix for a pack label, or an empty string.
#[must_use]
pub fn expected_prefix(pack_label: Option<&str>) -> String {
    match pack_label {
        Some(label) if !label.is_empty() => format!("_{label}_"),
        _ => String::new(),
    }
}

/// Checks a label against its pack's naming convention.
#[must_use]
pub fn check_prefix(label: &str, pack_label: Option<&str>) -> PrefixCheck {
    let expected_prefix = expected_prefix(pack_label);
    let is_conformant = label.starts_with(&expected_prefix);
    PrefixCheck {
        expected_prefix,
        is_conformant,
    }
}
