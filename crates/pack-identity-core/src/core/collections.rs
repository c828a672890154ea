// crates/pack-identity-core/src/core/collections.rs
// ============================================================================
// Module: Entity Collections
// Description: Collection kinds, entity records, and per-kind keying rules.
// Purpose: Centralize how each resource pack collection is keyed for
//          duplicate detection.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Resource packs hold loosely coupled collections joined only by informal
//! integer identifiers and string names. Each [`CollectionKind`] selects one
//! [`CollectionRules`] implementation: identifier-keyed collections collide
//! on `identifier`, name-keyed collections collide on `name`. Collections are
//! always checked independently of one another.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::IdentifierInput;

// ============================================================================
// SECTION: Collection Kinds
// ============================================================================

/// Entity collection kinds carried by a resource pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    /// Character definitions.
    Characters,
    /// Food items.
    Foods,
    /// Beverage items.
    Beverages,
    /// Cooking ingredients.
    Ingredients,
    /// Cooking recipes.
    Recipes,
    /// Clothing items.
    Clothes,
    /// Dialogue packages, keyed by name.
    DialoguePackages,
}

/// Every collection kind, in document order.
pub const ALL_COLLECTION_KINDS: [CollectionKind; 7] = [
    CollectionKind::Characters,
    CollectionKind::Foods,
    CollectionKind::Beverages,
    CollectionKind::Ingredients,
    CollectionKind::Recipes,
    CollectionKind::Clothes,
    CollectionKind::DialoguePackages,
];

/// Identifier-keyed rules for characters.
static CHARACTER_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Characters);
/// Identifier-keyed rules for foods.
static FOOD_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Foods);
/// Identifier-keyed rules for beverages.
static BEVERAGE_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Beverages);
/// Identifier-keyed rules for ingredients.
static INGREDIENT_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Ingredients);
/// Identifier-keyed rules for recipes.
static RECIPE_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Recipes);
/// Identifier-keyed rules for clothes.
static CLOTHES_RULES: IdentifierKeyed = IdentifierKeyed::new(CollectionKind::Clothes);
/// Name-keyed rules for dialogue packages.
static DIALOGUE_RULES: NameKeyed = NameKeyed::new(CollectionKind::DialoguePackages);

impl CollectionKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Characters => "characters",
            Self::Foods => "foods",
            Self::Beverages => "beverages",
            Self::Ingredients => "ingredients",
            Self::Recipes => "recipes",
            Self::Clothes => "clothes",
            Self::DialoguePackages => "dialogue_packages",
        }
    }

    /// Returns the keying rules for this kind.
    #[must_use]
    pub fn rules(self) -> &'static dyn CollectionRules {
        match self {
            Self::Characters => &CHARACTER_RULES,
            Self::Foods => &FOOD_RULES,
            Self::Beverages => &BEVERAGE_RULES,
            Self::Ingredients => &INGREDIENT_RULES,
            Self::Recipes => &RECIPE_RULES,
            Self::Clothes => &CLOTHES_RULES,
            Self::DialoguePackages => &DIALOGUE_RULES,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Entities
// ============================================================================

/// Read-only view of one entity in a collection.
///
/// # Invariants
/// - Fields mirror the document model; absent fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Numeric identifier, when the collection carries one.
    ///
    /// Non-numeric or overflowing input is kept in parsed form so one bad
    /// entity cannot fail the whole snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<IdentifierInput>,
    /// Display or lookup name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pack-scoped label subject to the naming convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl EntityRecord {
    /// Creates an entity carrying only an identifier.
    #[must_use]
    pub const fn with_identifier(identifier: i64) -> Self {
        Self {
            identifier: Some(IdentifierInput::Value(identifier)),
            name: None,
            label: None,
        }
    }

    /// Creates an entity carrying only a name.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            identifier: None,
            name: Some(name.into()),
            label: None,
        }
    }

    /// Returns the entity with its label set.
    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Key used for duplicate detection within one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "key", rename_all = "snake_case")]
pub enum EntityKey {
    /// Identifier key for identifier-keyed collections.
    Identifier {
        /// Owning collection.
        kind: CollectionKind,
        /// Entity identifier.
        identifier: i64,
    },
    /// Name key for name-keyed collections.
    Name {
        /// Owning collection.
        kind: CollectionKind,
        /// Entity name.
        name: String,
    },
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier {
                kind,
                identifier,
            } => write!(f, "{kind}#{identifier}"),
            Self::Name {
                kind,
                name,
            } => write!(f, "{kind}:{name}"),
        }
    }
}

// ============================================================================
// SECTION: Duplicate Policy
// ============================================================================

/// Policy for which keys count as unset and are exempt from collisions.
///
/// # Invariants
/// - Empty (or whitespace-only) names are always exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePolicy {
    /// Treat identifier `0` as an unset placeholder.
    pub zero_is_unset: bool,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self {
            zero_is_unset: true,
        }
    }
}

// ============================================================================
// SECTION: Collection Rules
// ============================================================================

/// Field a collection is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    /// Entities collide on `identifier`.
    Identifier,
    /// Entities collide on `name`.
    Name,
}

/// Keying rules for one collection kind.
pub trait CollectionRules: Send + Sync {
    /// Returns the collection kind the rules apply to.
    fn kind(&self) -> CollectionKind;

    /// Returns the field entities are keyed by.
    fn key_field(&self) -> KeyField;

    /// Returns the duplicate-detection key, or `None` when the key is unset.
    fn key_of(&self, entity: &EntityRecord, policy: DuplicatePolicy) -> Option<EntityKey>;
}

/// Rules for collections keyed by numeric identifier.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierKeyed {
    /// Owning collection.
    kind: CollectionKind,
}

impl IdentifierKeyed {
    /// Creates identifier-keyed rules for a kind.
    #[must_use]
    pub const fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
        }
    }
}

impl CollectionRules for IdentifierKeyed {
    fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn key_field(&self) -> KeyField {
        KeyField::Identifier
    }

    fn key_of(&self, entity: &EntityRecord, policy: DuplicatePolicy) -> Option<EntityKey> {
        let identifier = entity.identifier?.value()?;
        if identifier == 0 && policy.zero_is_unset {
            return None;
        }
        Some(EntityKey::Identifier {
            kind: self.kind,
            identifier,
        })
    }
}

/// Rules for collections keyed by name.
#[derive(Debug, Clone, Copy)]
pub struct NameKeyed {
    /// Owning collection.
    kind: CollectionKind,
}

impl NameKeyed {
    /// Creates name-keyed rules for a kind.
    #[must_use]
    pub const fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
        }
    }
}

impl CollectionRules for NameKeyed {
    fn kind(&self) -> CollectionKind {
        self.kind
    }

    fn key_field(&self) -> KeyField {
        KeyField::Name
    }

    fn key_of(&self, entity: &EntityRecord, _policy: DuplicatePolicy) -> Option<EntityKey> {
        let name = entity.name.as_deref()?;
        if name.trim().is_empty() {
            return None;
        }
        Some(EntityKey::Name {
            kind: self.kind,
            name: name.to_string(),
        })
    }
}
