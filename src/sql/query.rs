//! Read queries: the resource's own columns plus one joined fragment per relationship.

use crate::config::{Catalog, ResourceConfig};
use crate::error::ConfigError;
use crate::sql::fragment::{compile_fragment, Fragment};
use crate::sql::naming::{id_column, table_name};
use crate::sql::{Ident, SqlText};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct ReadQuery {
    pub sql: String,
    pub params: Vec<Value>,
    pub fragments: Vec<Fragment>,
}

/// Columns every resource row exposes besides relationship values.
fn base_columns(resource: &ResourceConfig) -> Vec<Ident> {
    let mut cols = vec![id_column()];
    cols.extend(resource.attributes.iter().map(|a| Ident::new(a.name.as_str())));
    cols.push(Ident::new("created_at"));
    cols.push(Ident::new("updated_at"));
    cols
}

/// Compose the read query for a collection (`id = None`) or a single resource. The id is bound
/// as `$1` on the main table and embedded as a quoted literal inside the fragments.
pub fn compose_read(resource: &ResourceConfig, catalog: &Catalog, id: Option<&Value>) -> Result<ReadQuery, ConfigError> {
    let table = table_name(resource);
    let mut fragments = Vec::with_capacity(resource.relationships.len());
    for rel in &resource.relationships {
        let related = catalog.resource(&rel.resource).ok_or_else(|| ConfigError::UnknownResource {
            resource: resource.name.clone(),
            relationship: rel.name.clone(),
            target: rel.resource.clone(),
        })?;
        fragments.push(compile_fragment(resource, related, rel, id)?);
    }

    let mut sql = SqlText::new();
    if !fragments.is_empty() {
        let entries: Vec<SqlText> = fragments.iter().map(Fragment::to_sql).collect();
        sql.kw("WITH ").join(&entries, ",\n  ").kw("\n");
    }

    let mut select: Vec<SqlText> = base_columns(resource)
        .iter()
        .map(|c| {
            let mut s = SqlText::new();
            s.qualified(&table, c);
            s
        })
        .collect();
    for f in &fragments {
        let mut s = SqlText::new();
        s.qualified(&f.name, &f.value_column);
        select.push(s);
    }
    sql.kw("SELECT ").join(&select, ", ").kw(" FROM ").ident(&table);

    for f in &fragments {
        sql.kw(" LEFT JOIN ")
            .ident(&f.name)
            .kw(" ON ")
            .qualified(&f.name, &f.key_column)
            .kw(" = ")
            .qualified(&table, &id_column());
    }

    let mut params = Vec::new();
    if let Some(id) = id {
        params.push(id.clone());
        sql.kw(" WHERE ").qualified(&table, &id_column()).kw(" = ").param(params.len());
    }
    sql.kw(" ORDER BY ").qualified(&table, &id_column());

    Ok(ReadQuery {
        sql: sql.finish(),
        params,
        fragments,
    })
}
