//! Resolved catalog: validated resources, indexed by name for runtime use.

use crate::config::{validate, ResourceConfig};
use crate::error::ConfigError;
use std::collections::HashMap;

/// Maps a resource name to the plural form used in `type` fields and links.
pub trait Pluralize {
    fn plural_name_of(&self, resource_name: &str) -> String;
}

/// Immutable in-memory resource catalog, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    resources: Vec<ResourceConfig>,
    by_name: HashMap<String, usize>,
    by_plural: HashMap<String, usize>,
}

impl Catalog {
    /// Validate and index resources. Declaration order is preserved.
    pub fn new(resources: Vec<ResourceConfig>) -> Result<Self, ConfigError> {
        validate(&resources)?;
        let by_name = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.clone(), i))
            .collect();
        let by_plural = resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.plural_form.clone(), i))
            .collect();
        Ok(Catalog {
            resources,
            by_name,
            by_plural,
        })
    }

    pub fn resources(&self) -> &[ResourceConfig] {
        &self.resources
    }

    pub fn resource(&self, name: &str) -> Option<&ResourceConfig> {
        self.by_name.get(name).map(|&i| &self.resources[i])
    }

    pub fn resource_by_plural(&self, plural: &str) -> Option<&ResourceConfig> {
        self.by_plural.get(plural).map(|&i| &self.resources[i])
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}

impl Pluralize for Catalog {
    fn plural_name_of(&self, resource_name: &str) -> String {
        self.resource(resource_name)
            .map(|r| r.plural_form.clone())
            .unwrap_or_else(|| format!("{}s", resource_name))
    }
}
