//! Relationship classification: cardinality, host side and storage pattern.
//!
//! DDL generation, fragment compilation and response formatting all branch on the
//! [`Storage`] computed here, so the three paths cannot disagree about where a
//! relationship lives.

use crate::config::{Cardinality, RelationshipConfig, ResourceConfig};
use crate::error::ConfigError;

/// Whether a relationship yields one related identifier or a list of them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    One,
    Many,
}

impl Arity {
    pub fn is_many(self) -> bool {
        matches!(self, Arity::Many)
    }
}

/// Where the data for a relationship is physically stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Storage {
    /// Foreign key column on the owning resource's table.
    OwnTable,
    /// Foreign key column on the related resource's table, pointing back at the owner.
    HostTable(Arity),
    /// Row pairs in an associative table (many-to-many).
    Associative(Arity),
}

impl Storage {
    pub fn is_own_table(&self) -> bool {
        matches!(self, Storage::OwnTable)
    }

    pub fn arity(&self) -> Arity {
        match self {
            Storage::OwnTable => Arity::One,
            Storage::HostTable(a) | Storage::Associative(a) => *a,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Classification {
    pub cardinality: Cardinality,
    pub host: bool,
    pub storage: Storage,
}

impl Classification {
    pub fn arity(&self) -> Arity {
        self.storage.arity()
    }
}

/// To-many from the point of view of the declaring side.
pub fn is_to_many(rel: &RelationshipConfig) -> bool {
    match rel.cardinality {
        Cardinality::OneToOne => false,
        Cardinality::OneToMany => !rel.host,
        Cardinality::ManyToMany => true,
    }
}

pub fn classify(rel: &RelationshipConfig) -> Classification {
    let arity = if is_to_many(rel) { Arity::Many } else { Arity::One };
    let storage = match (rel.cardinality, rel.host) {
        (Cardinality::ManyToMany, _) => Storage::Associative(arity),
        (_, true) => Storage::OwnTable,
        (_, false) => Storage::HostTable(arity),
    };
    Classification {
        cardinality: rel.cardinality,
        host: rel.host,
        storage,
    }
}

/// Relationships on `target` that could be the inverse of `rel` (declared on `resource`).
pub fn inverse_candidates<'a>(
    resource: &ResourceConfig,
    target: &'a ResourceConfig,
    rel: &RelationshipConfig,
) -> Vec<&'a RelationshipConfig> {
    let self_referential = resource.name == target.name;
    target
        .relationships
        .iter()
        .filter(|b| b.resource == resource.name && b.cardinality == rel.cardinality)
        .filter(|b| !(self_referential && b.name == rel.name))
        .collect()
}

/// Resolve the inverse of `rel` on `target`: the declared `inverse` if any, else the single candidate.
pub fn find_inverse<'a>(
    resource: &ResourceConfig,
    target: &'a ResourceConfig,
    rel: &RelationshipConfig,
) -> Result<&'a RelationshipConfig, ConfigError> {
    let ambiguous = |candidates: Vec<String>| ConfigError::AmbiguousRelationship {
        resource: resource.name.clone(),
        relationship: rel.name.clone(),
        candidates,
    };
    if let Some(name) = rel.inverse.as_deref() {
        return target
            .relationship(name)
            .filter(|b| b.resource == resource.name)
            .ok_or_else(|| ambiguous(Vec::new()));
    }
    match inverse_candidates(resource, target, rel).as_slice() {
        [one] => Ok(*one),
        many => Err(ambiguous(many.iter().map(|b| b.name.clone()).collect())),
    }
}
