//! Relationship objects for hypermedia responses.
//!
//! Values coming out of a read query are first normalized into [`Linkage`] (scalar or list),
//! so the formatting below never needs to know which storage pattern produced them.

use crate::classify::{classify, Arity};
use crate::config::{Pluralize, ResourceConfig};
use crate::sql::naming::relationship_column;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelationshipLinks {
    #[serde(rename = "self")]
    pub self_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceIdentifier),
    Many(Vec<ResourceIdentifier>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RelationshipObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,
    pub links: RelationshipLinks,
}

/// A relationship value reduced to its shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Linkage {
    One(Option<String>),
    Many(Vec<String>),
}

/// Canonical string form of an id. Null (and nested structures) have none.
pub fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Scalar or array, whatever the column held, into the shape the arity asks for.
pub fn normalize(value: Option<&Value>, arity: Arity) -> Linkage {
    let ids: Vec<String> = match value {
        None | Some(Value::Null) => Vec::new(),
        // array_agg over primary keys never yields NULL elements, so N ids in means N out.
        // A null here could only come from a hand-written row and is not an identifier.
        Some(Value::Array(items)) => items.iter().filter_map(id_string).collect(),
        Some(v) => id_string(v).into_iter().collect(),
    };
    match arity {
        Arity::One => Linkage::One(ids.into_iter().next()),
        Arity::Many => Linkage::Many(ids),
    }
}

/// Base path of a resource's relationship endpoints: `/v{version}/{plural}/{id}`.
fn owner_path(version: u32, owner_plural: &str, owner_id: &str) -> String {
    format!("/v{}/{}/{}", version, owner_plural, owner_id)
}

/// Format one relationship. `related` and `data` appear only when something is linked.
pub fn format_relationship(
    version: u32,
    owner_plural: &str,
    owner_id: &str,
    name: &str,
    related_type: &str,
    linkage: Linkage,
) -> RelationshipObject {
    let base = owner_path(version, owner_plural, owner_id);
    let self_ = format!("{}/relationships/{}", base, name);
    let identifier = |id: String| ResourceIdentifier {
        type_: related_type.to_string(),
        id,
    };
    let data = match linkage {
        Linkage::One(Some(id)) => Some(RelationshipData::One(identifier(id))),
        Linkage::Many(ids) if !ids.is_empty() => Some(RelationshipData::Many(ids.into_iter().map(identifier).collect())),
        Linkage::One(None) | Linkage::Many(_) => None,
    };
    let related = data.as_ref().map(|_| format!("{}/{}", base, name));
    RelationshipObject {
        data,
        links: RelationshipLinks { self_, related },
    }
}

/// One relationship object per relationship of `resource`, read from a row produced by the
/// composed read query.
pub fn build_relationships<P>(
    row: &Map<String, Value>,
    resource: &ResourceConfig,
    version: u32,
    pluralize: &P,
) -> BTreeMap<String, RelationshipObject>
where
    P: Pluralize + ?Sized,
{
    let owner_id = row.get("id").and_then(id_string).unwrap_or_default();
    resource
        .relationships
        .iter()
        .map(|rel| {
            let column = relationship_column(rel);
            let linkage = normalize(row.get(column.raw()), classify(rel).arity());
            let related_type = pluralize.plural_name_of(&rel.resource);
            let object = format_relationship(version, &resource.plural_form, &owner_id, &rel.name, &related_type, linkage);
            (rel.name.clone(), object)
        })
        .collect()
}
