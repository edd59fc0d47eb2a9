//! Read handlers for declared resources and their relationships.

use crate::classify::classify;
use crate::config::ResourceConfig;
use crate::error::AppError;
use crate::relationships::RelationshipData;
use crate::response::{collection_link, success_many, success_one, ResourceObject, SelfLink};
use crate::service::ResourceReader;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Resource ids are SERIAL; anything else is rejected before a query is built.
fn parse_id(id_str: &str) -> Result<Value, AppError> {
    let n: i64 = id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))?;
    Ok(Value::Number(n.into()))
}

fn resource_for<'a>(state: &'a AppState, plural: &str) -> Result<&'a ResourceConfig, AppError> {
    state
        .catalog
        .resource_by_plural(plural)
        .ok_or_else(|| AppError::NotFound(format!("resource '{}'", plural)))
}

async fn read_one(state: &AppState, resource: &ResourceConfig, id_str: &str) -> Result<ResourceObject, AppError> {
    let id = parse_id(id_str)?;
    ResourceReader::read(state.executor.as_ref(), &state.catalog, resource, &id, state.version)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", resource.name, id_str)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(plural): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &plural)?;
    let docs = ResourceReader::list(state.executor.as_ref(), &state.catalog, resource, state.version).await?;
    Ok(success_many(docs, collection_link(state.version, resource)))
}

pub async fn read(
    State(state): State<AppState>,
    Path((plural, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &plural)?;
    let doc = read_one(&state, resource, &id_str).await?;
    let links = doc.links.clone();
    Ok(success_one(doc, links))
}

/// `GET /v{n}/{plural}/{id}/relationships/{name}`: the relationship object alone.
pub async fn relationship(
    State(state): State<AppState>,
    Path((plural, id_str, name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &plural)?;
    let mut doc = read_one(&state, resource, &id_str).await?;
    let object = doc
        .relationships
        .remove(&name)
        .ok_or_else(|| AppError::NotFound(format!("relationship '{}' on {}", name, resource.name)))?;
    Ok((axum::http::StatusCode::OK, Json(object)))
}

#[derive(Serialize)]
#[serde(untagged)]
enum Related {
    One(Option<ResourceObject>),
    Many(Vec<ResourceObject>),
}

/// `GET /v{n}/{plural}/{id}/{name}`: the related resources themselves.
pub async fn related(
    State(state): State<AppState>,
    Path((plural, id_str, name)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = resource_for(&state, &plural)?;
    let rel = resource
        .relationship(&name)
        .ok_or_else(|| AppError::NotFound(format!("relationship '{}' on {}", name, resource.name)))?;
    let target = state
        .catalog
        .resource(&rel.resource)
        .ok_or_else(|| AppError::NotFound(format!("resource '{}'", rel.resource)))?;
    let doc = read_one(&state, resource, &id_str).await?;
    let links = SelfLink {
        self_: format!("{}/{}", doc.links.self_, name),
    };
    let object = doc.relationships.get(&name);
    let data = match object.and_then(|o| o.data.as_ref()) {
        None if classify(rel).arity().is_many() => Related::Many(Vec::new()),
        None => Related::One(None),
        Some(RelationshipData::One(ident)) => Related::One(Some(read_one(&state, target, &ident.id).await?)),
        Some(RelationshipData::Many(idents)) => {
            let mut out = Vec::with_capacity(idents.len());
            for ident in idents {
                out.push(read_one(&state, target, &ident.id).await?);
            }
            Related::Many(out)
        }
    };
    Ok(success_one(data, links))
}

#[derive(Serialize)]
pub struct Endpoint {
    pub route: String,
    pub methods: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct RootBody {
    pub version: String,
    pub endpoints: Vec<Endpoint>,
}

/// `GET /v{n}`: the routes of every declared resource.
pub async fn root(State(state): State<AppState>) -> Json<RootBody> {
    let endpoints = state
        .catalog
        .resources()
        .iter()
        .map(|r| Endpoint {
            route: collection_link(state.version, r).self_,
            methods: vec!["GET"],
        })
        .collect();
    Json(RootBody {
        version: format!("v{}", state.version),
        endpoints,
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound("no route".into())
}
