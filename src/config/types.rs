//! Raw resource definition types, as read from YAML/JSON resource files.

use serde::{Deserialize, Serialize};

/// Cardinality of a relationship pair. `many-to-one` is accepted as an alias of `one-to-many`;
/// direction comes from `host`, not from the spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    OneToOne,
    #[serde(alias = "many-to-one")]
    OneToMany,
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "one-to-one",
            Cardinality::OneToMany => "one-to-many",
            Cardinality::ManyToMany => "many-to-many",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeConfig {
    pub name: String,
    /// PostgreSQL column type, e.g. `text`, `varchar(30)`, `numeric(10, 2)`, `integer[]`.
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    /// Literal default. Always emitted as a quoted value, never as an expression.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    pub name: String,
    /// Name of the target resource.
    pub resource: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub host: bool,
    /// Name of the inverse relationship on the target. Only needed when the target declares
    /// more than one relationship back to this resource.
    #[serde(default)]
    pub inverse: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    pub plural_form: String,
    #[serde(default)]
    pub attributes: Vec<AttributeConfig>,
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, plural_form: impl Into<String>) -> Self {
        ResourceConfig {
            name: name.into(),
            plural_form: plural_form.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, type_: &str) -> Self {
        self.attributes.push(AttributeConfig {
            name: name.to_string(),
            type_: type_.to_string(),
            nullable: true,
            unique: false,
            default: None,
        });
        self
    }

    pub fn with_relationship(mut self, name: &str, resource: &str, cardinality: Cardinality, host: bool) -> Self {
        self.relationships.push(RelationshipConfig {
            name: name.to_string(),
            resource: resource.to_string(),
            cardinality,
            host,
            inverse: None,
        });
        self
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipConfig> {
        self.relationships.iter().find(|r| r.name == name)
    }
}
