//! Catalog validation: identifier safety, uniqueness, relationship targets and pairing.

use crate::classify::{classify, find_inverse, inverse_candidates, Storage};
use crate::config::ResourceConfig;
use crate::error::ConfigError;
use crate::sql::naming::{derived_identifiers, relationship_column, virtual_host_table, MAX_IDENTIFIER_BYTES};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("static regex"))
}

fn plural_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]{0,62}$").expect("static regex"))
}

fn sql_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]{0,62}(\(\s*\d+\s*(,\s*\d+\s*)?\))?(\[\])?$").expect("static regex")
    })
}

/// Column names every resource table gets; attributes may not reuse them.
pub const RESERVED_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

pub fn is_valid_name(s: &str) -> bool {
    name_re().is_match(s)
}

pub fn is_valid_sql_type(s: &str) -> bool {
    sql_type_re().is_match(s.trim())
}

/// Full validation, run when a catalog is built.
pub fn validate(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    validate_shape(resources)?;
    validate_targets(resources)?;
    validate_pairs(resources)?;
    Ok(())
}

/// Names, types and uniqueness within and across resources.
pub fn validate_shape(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    let mut plurals = HashSet::new();
    for r in resources {
        if !is_valid_name(&r.name) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "resource name",
                value: r.name.clone(),
            });
        }
        if !plural_re().is_match(&r.plural_form) {
            return Err(ConfigError::InvalidIdentifier {
                kind: "plural form",
                value: r.plural_form.clone(),
            });
        }
        if !names.insert(r.name.as_str()) {
            return Err(ConfigError::DuplicateResource(r.name.clone()));
        }
        if !plurals.insert(r.plural_form.as_str()) {
            return Err(ConfigError::Validation(format!(
                "plural form '{}' used by more than one resource",
                r.plural_form
            )));
        }

        let mut columns: HashSet<String> = RESERVED_COLUMNS.iter().map(|c| c.to_string()).collect();
        for a in &r.attributes {
            if !is_valid_name(&a.name) {
                return Err(ConfigError::InvalidIdentifier {
                    kind: "attribute name",
                    value: format!("{}.{}", r.name, a.name),
                });
            }
            if !is_valid_sql_type(&a.type_) {
                return Err(ConfigError::InvalidIdentifier {
                    kind: "attribute type",
                    value: format!("{}.{}: {}", r.name, a.name, a.type_),
                });
            }
            if !columns.insert(a.name.clone()) {
                return Err(ConfigError::Validation(format!(
                    "column '{}' declared more than once on resource '{}'",
                    a.name, r.name
                )));
            }
        }

        let mut rel_names = HashSet::new();
        let mut virtual_names = HashMap::new();
        for rel in &r.relationships {
            if !is_valid_name(&rel.name) {
                return Err(ConfigError::InvalidIdentifier {
                    kind: "relationship name",
                    value: format!("{}.{}", r.name, rel.name),
                });
            }
            if !rel_names.insert(rel.name.as_str()) {
                return Err(ConfigError::DuplicateRelationship {
                    resource: r.name.clone(),
                    relationship: rel.name.clone(),
                });
            }
            // Stored column or read-query alias, either way it shares the row with attributes.
            let column = relationship_column(rel).raw().to_string();
            if !columns.insert(column.clone()) {
                return Err(ConfigError::Validation(format!(
                    "relationship column '{}' collides with another column on resource '{}'",
                    column, r.name
                )));
            }
            if let Some(other) = virtual_names.insert(virtual_host_table(rel), rel.name.as_str()) {
                return Err(ConfigError::AmbiguousRelationship {
                    resource: r.name.clone(),
                    relationship: rel.name.clone(),
                    candidates: vec![other.to_string(), rel.name.clone()],
                });
            }
        }

        for (kind, ident) in derived_identifiers(r) {
            if ident.raw().len() > MAX_IDENTIFIER_BYTES {
                return Err(ConfigError::InvalidIdentifier {
                    kind,
                    value: format!("{} (from resource '{}', longer than {} bytes)", ident.raw(), r.name, MAX_IDENTIFIER_BYTES),
                });
            }
        }
    }
    Ok(())
}

/// Every relationship target must be a resource in the catalog.
pub fn validate_targets(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    let names: HashSet<&str> = resources.iter().map(|r| r.name.as_str()).collect();
    for r in resources {
        for rel in &r.relationships {
            if !names.contains(rel.resource.as_str()) {
                return Err(ConfigError::UnknownResource {
                    resource: r.name.clone(),
                    relationship: rel.name.clone(),
                    target: rel.resource.clone(),
                });
            }
        }
    }
    Ok(())
}

/// When both sides of a pair are declared, they must agree on cardinality and host exactly one side.
pub fn validate_pairs(resources: &[ResourceConfig]) -> Result<(), ConfigError> {
    let by_name: HashMap<&str, &ResourceConfig> = resources.iter().map(|r| (r.name.as_str(), r)).collect();
    for r in resources {
        for rel in &r.relationships {
            let Some(target) = by_name.get(rel.resource.as_str()) else {
                continue;
            };
            // Host-table storage reads the foreign key from the inverse, so it must exist and be hosted.
            let needs_inverse = matches!(classify(rel).storage, Storage::HostTable(_));
            if rel.inverse.is_some() || needs_inverse {
                let back = find_inverse(r, target, rel)?;
                if back.cardinality != rel.cardinality || back.host == rel.host {
                    return Err(host_conflict(r, &rel.name, &back.name));
                }
                continue;
            }
            // Own-table and associative storage work without an inverse; a lone one must still agree.
            let candidates = inverse_candidates(r, target, rel);
            if let [back] = candidates.as_slice() {
                if back.host == rel.host {
                    return Err(host_conflict(r, &rel.name, &back.name));
                }
            }
        }
    }
    Ok(())
}

fn host_conflict(r: &ResourceConfig, rel: &str, back: &str) -> ConfigError {
    ConfigError::Validation(format!(
        "relationship '{}.{}' and its inverse '{}' must have the same cardinality and exactly one host side",
        r.name, rel, back
    ))
}
