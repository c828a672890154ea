// crates/pack-identity-core/src/core/identifiers.rs
// ============================================================================
// Module: Pack Identity Identifiers
// Description: Identifier namespace tiers and caller-facing identifier statuses.
// Purpose: Provide the canonical tier boundaries and status labels for IDs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Entity identifiers are 32-bit signed integers read from resource pack
//! collections. The identifier space `0..=i32::MAX` is split into ordered,
//! non-overlapping namespace tiers. Anything outside that space is
//! out-of-bounds. The engine never owns identifiers; it only classifies them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::IntErrorKind;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::de::Visitor;

// ============================================================================
// SECTION: Tier Boundaries
// ============================================================================

/// Highest identifier reserved for the game itself.
pub const RESERVED_MAX: i64 = 8_999;
/// Lowest identifier in the managed tier.
pub const MANAGED_MIN: i64 = 9_000;
/// Highest identifier in the managed tier.
pub const MANAGED_MAX: i64 = 1_073_741_823;
/// Lowest identifier in the unmanaged tier.
pub const UNMANAGED_MIN: i64 = 1_073_741_824;
/// Highest valid identifier (`i32::MAX`).
pub const IDENTIFIER_MAX: i64 = 2_147_483_647;

// ============================================================================
// SECTION: Namespace Tiers
// ============================================================================

/// Namespace tier an identifier falls into.
///
/// # Invariants
/// - Tiers are ordered and disjoint; every `i64` maps to exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamespaceTier {
    /// Game-owned identifiers (`0..=8_999`).
    Reserved,
    /// Identifiers that must fall inside a signed allocation.
    Managed,
    /// Free-for-all identifiers with no signature requirement.
    Unmanaged,
    /// Negative identifiers or identifiers above `i32::MAX`.
    OutOfBounds,
}

impl NamespaceTier {
    /// Returns the tier for a raw identifier value.
    #[must_use]
    pub const fn of(id: i64) -> Self {
        if id < 0 || id > IDENTIFIER_MAX {
            Self::OutOfBounds
        } else if id <= RESERVED_MAX {
            Self::Reserved
        } else if id >= UNMANAGED_MIN {
            Self::Unmanaged
        } else {
            Self::Managed
        }
    }

    /// Returns a stable label for the tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reserved => "reserved",
            Self::Managed => "managed",
            Self::Unmanaged => "unmanaged",
            Self::OutOfBounds => "out-of-bounds",
        }
    }
}

impl fmt::Display for NamespaceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Identifier Status
// ============================================================================

/// Classification surfaced to callers for a single identifier.
///
/// Identifiers the engine declines to judge (reserved tier, non-numeric
/// input) are represented as `None` at call sites rather than as a variant.
///
/// # Invariants
/// - Variants and their labels are stable for presentation and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierStatus {
    /// Managed identifier inside a verified allocation.
    Valid,
    /// Managed identifier without a declared or resolved allocation.
    NoSignature,
    /// Managed identifier whose allocation failed verification.
    InvalidSignature,
    /// Managed identifier outside a verified allocation's range.
    OutsideAllocation,
    /// Identifier in the unmanaged tier.
    Unmanaged,
    /// Identifier outside the valid identifier space.
    OutOfBounds,
}

impl IdentifierStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::NoSignature => "no-signature",
            Self::InvalidSignature => "invalid-signature",
            Self::OutsideAllocation => "outside-allocation",
            Self::Unmanaged => "unmanaged",
            Self::OutOfBounds => "out-of-bounds",
        }
    }

    /// Returns true when the status should block the entity from shipping.
    #[must_use]
    pub const fn is_violation(self) -> bool {
        matches!(
            self,
            Self::NoSignature | Self::InvalidSignature | Self::OutsideAllocation | Self::OutOfBounds
        )
    }
}

impl fmt::Display for IdentifierStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Identifier Input
// ============================================================================

/// Text form of the smallest integer that no longer fits in `i64`.
const OVERFLOW_TEXT: &str = "9223372036854775808";
/// Magnitude at which a floating-point identifier can no longer be an `i64`.
///
/// Every finite `f64` at or above it is integral.
const I64_MAGNITUDE_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// Parsed form of raw identifier input.
///
/// # Invariants
/// - Parsing never fails: every input maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierInput {
    /// Input is not an integer; the engine has no opinion.
    NotANumber,
    /// Input is an integer too large in magnitude to represent.
    Overflow,
    /// Input parsed to an integer.
    Value(i64),
}

impl IdentifierInput {
    /// Parses raw text, trimming surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(value) => Self::Value(value),
            Err(err) => match err.kind() {
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => Self::Overflow,
                _ => Self::NotANumber,
            },
        }
    }

    /// Returns the parsed integer, if any.
    #[must_use]
    pub const fn value(self) -> Option<i64> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotANumber | Self::Overflow => None,
        }
    }
}

/// Serializes values as integers and unrepresentable input as text that
/// parses back to the same variant.
impl Serialize for IdentifierInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_i64(*value),
            Self::Overflow => serializer.serialize_str(OVERFLOW_TEXT),
            Self::NotANumber => serializer.serialize_str(""),
        }
    }
}

/// Accepts integers, integer text, and anything else as [`IdentifierInput::NotANumber`].
impl<'de> Deserialize<'de> for IdentifierInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdentifierInputVisitor)
    }
}

/// Lenient visitor mapping any scalar to an [`IdentifierInput`].
struct IdentifierInputVisitor;

impl Visitor<'_> for IdentifierInputVisitor {
    type Value = IdentifierInput;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer identifier or identifier text")
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<Self::Value, E> {
        Ok(IdentifierInput::NotANumber)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(IdentifierInput::Value(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(i64::try_from(value).map_or(IdentifierInput::Overflow, IdentifierInput::Value))
    }

    fn visit_i128<E: de::Error>(self, value: i128) -> Result<Self::Value, E> {
        Ok(i64::try_from(value).map_or(IdentifierInput::Overflow, IdentifierInput::Value))
    }

    fn visit_u128<E: de::Error>(self, value: u128) -> Result<Self::Value, E> {
        Ok(i64::try_from(value).map_or(IdentifierInput::Overflow, IdentifierInput::Value))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        if value.is_finite() && value.abs() >= I64_MAGNITUDE_LIMIT {
            Ok(IdentifierInput::Overflow)
        } else {
            Ok(IdentifierInput::NotANumber)
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(IdentifierInput::parse(value))
    }
}
