//! Hypermedia document envelopes.

use crate::config::{Pluralize, ResourceConfig};
use crate::relationships::{build_relationships, id_string, RelationshipObject};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize)]
pub struct SelfLink {
    #[serde(rename = "self")]
    pub self_: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    pub attributes: Map<String, Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, RelationshipObject>,
    pub links: SelfLink,
}

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    pub links: SelfLink,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
    pub links: SelfLink,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Turn a row from the composed read query into a resource object. Relationship value columns
/// and the id are lifted out of `attributes`.
pub fn resource_object<P>(row: &Map<String, Value>, resource: &ResourceConfig, version: u32, pluralize: &P) -> ResourceObject
where
    P: Pluralize + ?Sized,
{
    let id = row.get("id").and_then(id_string).unwrap_or_default();
    let mut attributes = Map::new();
    for attr in &resource.attributes {
        attributes.insert(attr.name.clone(), row.get(&attr.name).cloned().unwrap_or(Value::Null));
    }
    for name in ["created_at", "updated_at"] {
        if let Some(v) = row.get(name) {
            attributes.insert(name.to_string(), v.clone());
        }
    }
    let relationships = build_relationships(row, resource, version, pluralize);
    ResourceObject {
        type_: resource.plural_form.clone(),
        links: SelfLink {
            self_: format!("/v{}/{}/{}", version, resource.plural_form, id),
        },
        id,
        attributes,
        relationships,
    }
}

pub fn collection_link(version: u32, resource: &ResourceConfig) -> SelfLink {
    SelfLink {
        self_: format!("/v{}/{}", version, resource.plural_form),
    }
}

pub fn success_one<T: Serialize>(data: T, links: SelfLink) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, links }))
}

pub fn success_many<T: Serialize>(data: Vec<T>, links: SelfLink) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
            links,
        }),
    )
}
