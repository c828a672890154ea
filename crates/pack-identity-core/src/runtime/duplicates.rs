// crates/pack-identity-core/src/runtime/duplicates.rs
// ============================================================================
// Module: Duplicate Detector
// Description: Per-collection collision detection over identifiers and names.
// Purpose: Flag entities that share a key with another entity in the same
//          collection.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Two entities collide when their keys are equal, they occupy different
//! positions, and the key is set. Detection builds one frequency map per
//! collection and is linear in the collection size. The result depends only
//! on the multiset of keys, never on entity order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::hash::Hash;

use crate::core::CollectionKind;
use crate::core::DuplicatePolicy;
use crate::core::EntityKey;
use crate::core::EntityRecord;

// ============================================================================
// SECTION: Generic Detection
// ============================================================================

/// Counts how many entities carry each set key.
fn key_frequencies<T, K, F>(items: &[T], key_of: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let mut counts: HashMap<K, usize> = HashMap::with_capacity(items.len());
    for item in items {
        if let Some(key) = key_of(item) {
            *counts.entry(key).or_default() += 1;
        }
    }
    counts
}

/// Returns every key shared by two or more entities.
#[must_use]
pub fn find_duplicates<T, K, F>(items: &[T], key_of: F) -> BTreeSet<K>
where
    K: Eq + Hash + Ord,
    F: Fn(&T) -> Option<K>,
{
    key_frequencies(items, key_of)
        .into_iter()
        .filter_map(|(key, count)| (count > 1).then_some(key))
        .collect()
}

/// Returns one flag per entity, true when the entity collides with another.
#[must_use]
pub fn duplicate_flags<T, K, F>(items: &[T], key_of: F) -> Vec<bool>
where
    K: Eq + Hash,
    F: Fn(&T) -> Option<K>,
{
    let counts = key_frequencies(items, &key_of);
    items
        .iter()
        .map(|item| key_of(item).and_then(|key| counts.get(&key)).is_some_and(|count| *count > 1))
        .collect()
}

/// Returns true when the entity at `index` shares its key with another entity.
///
/// Scans the whole collection; prefer [`duplicate_flags`] when every entity
/// of a collection is checked.
#[must_use]
pub fn is_duplicate<T, K, F>(index: usize, items: &[T], key_of: F) -> bool
where
    K: Eq,
    F: Fn(&T) -> Option<K>,
{
    let Some(key) = items.get(index).and_then(&key_of) else {
        return false;
    };
    items
        .iter()
        .enumerate()
        .any(|(position, other)| position != index && key_of(other).as_ref() == Some(&key))
}

// ============================================================================
// SECTION: Collection Detection
// ============================================================================

/// Duplicate findings for one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionDuplicates {
    /// Collection the findings apply to.
    pub kind: CollectionKind,
    /// Keys shared by more than one entity.
    pub keys: BTreeSet<EntityKey>,
    /// Per-entity duplicate flags in collection order.
    pub flags: Vec<bool>,
}

impl CollectionDuplicates {
    /// Returns whether the entity at `index` is a duplicate.
    #[must_use]
    pub fn is_flagged(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }
}

/// Detects duplicates in one collection using the kind's keying rules.
#[must_use]
pub fn detect_collection_duplicates(
    kind: CollectionKind,
    entities: &[EntityRecord],
    policy: DuplicatePolicy,
) -> CollectionDuplicates {
    let rules = kind.rules();
    let key_of = |entity: &EntityRecord| rules.key_of(entity, policy);
    CollectionDuplicates {
        kind,
        keys: find_duplicates(entities, key_of),
        flags: duplicate_flags(entities, key_of),
    }
}
