// crates/pack-identity-config/src/lib.rs
// ============================================================================
// Module: Pack Identity Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for pack-identity.toml semantics.
// Dependencies: pack-identity-core, serde, toml
// ============================================================================

//! ## Overview
//! `pack-identity-config` defines the configuration model for the pack
//! identity engine and CLI. Loading is strict and fail-closed: oversized,
//! non-UTF-8, unparsable, or inconsistent files are rejected.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
