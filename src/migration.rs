//! Build DDL from the resource catalog and apply it as one atomic batch.
//! Order: shared functions, resource tables in dependency order, then associative tables.

use crate::classify::classify;
use crate::config::{validate, Cardinality, ResourceConfig};
use crate::error::{AppError, ConfigError};
use crate::graph::dependency_order;
use crate::service::SqlExecutor;
use crate::sql::naming::{
    associative_table, guest_column, host_column, id_column, index_name, relationship_column, table_name, trigger_name,
};
use crate::sql::{Ident, SqlLiteral, SqlText, SqlType};
use std::collections::BTreeMap;

/// Trigger function shared by every resource table.
pub const UPDATED_AT_FUNCTION: &str = "set_updated_at";

/// Prepended once to every migration batch.
pub const FUNCTIONS_MIGRATION: &str = r#"CREATE OR REPLACE FUNCTION "set_updated_at"() RETURNS TRIGGER AS $$
BEGIN
  NEW."updated_at" = NOW();
  RETURN NEW;
END;
$$ LANGUAGE plpgsql"#;

/// DDL for one resource table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceMigration {
    pub resource: String,
    pub statements: Vec<String>,
}

/// A many-to-many pair, keyed by its associative table name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociativePair {
    pub table: Ident,
    pub host: String,
    pub guest: String,
}

/// The full migration batch. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationPlan {
    pub functions: String,
    pub resources: Vec<ResourceMigration>,
    pub associative: Vec<String>,
}

impl MigrationPlan {
    /// All statements in apply order.
    pub fn statements(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(1 + self.associative.len() + self.resources.len() * 3);
        out.push(self.functions.clone());
        for r in &self.resources {
            out.extend(r.statements.iter().cloned());
        }
        out.extend(self.associative.iter().cloned());
        out
    }

    /// Statements joined for display.
    pub fn to_sql(&self) -> String {
        self.statements()
            .iter()
            .map(|s| format!("{};", s))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Validate, order and build the migration batch. Any configuration error is returned before
/// a single statement is produced.
pub fn build_migrations(resources: &[ResourceConfig]) -> Result<MigrationPlan, ConfigError> {
    validate(resources)?;
    let order = dependency_order(resources)?;

    let mut migrations = Vec::with_capacity(order.len());
    for resource in order {
        migrations.push(build_resource_migration(resource)?);
    }
    let associative = associative_pairs(resources)
        .iter()
        .map(build_associative_table)
        .collect();

    tracing::info!(
        resources = migrations.len(),
        "built migrations"
    );
    Ok(MigrationPlan {
        functions: FUNCTIONS_MIGRATION.to_string(),
        resources: migrations,
        associative,
    })
}

/// CREATE TABLE (id, attributes, hosted foreign keys, timestamps), FK indexes and the
/// `updated_at` trigger for one resource.
pub fn build_resource_migration(resource: &ResourceConfig) -> Result<ResourceMigration, ConfigError> {
    let table = table_name(resource);
    let mut columns: Vec<SqlText> = Vec::new();
    let mut statements = Vec::new();

    let mut id = SqlText::new();
    id.ident(&id_column()).kw(" SERIAL PRIMARY KEY");
    columns.push(id);

    for attr in &resource.attributes {
        let ty = SqlType::parse(&attr.type_)?;
        let mut def = SqlText::new();
        def.ident(&Ident::new(attr.name.as_str())).kw(" ").sql_type(&ty);
        if !attr.nullable {
            def.kw(" NOT NULL");
        }
        if attr.unique {
            def.kw(" UNIQUE");
        }
        if let Some(default) = &attr.default {
            def.kw(" DEFAULT ").literal(&SqlLiteral::from_json(default));
        }
        columns.push(def);
    }

    let mut indexes = Vec::new();
    for rel in &resource.relationships {
        if !classify(rel).storage.is_own_table() {
            continue;
        }
        let column = relationship_column(rel);
        let mut def = SqlText::new();
        def.ident(&column).kw(" INTEGER");
        if rel.cardinality == Cardinality::OneToOne {
            def.kw(" UNIQUE");
        } else {
            let mut idx = SqlText::new();
            idx.kw("CREATE INDEX ")
                .ident(&index_name(resource, &column))
                .kw(" ON ")
                .ident(&table)
                .kw(" (")
                .ident(&column)
                .kw(")");
            indexes.push(idx.finish());
        }
        def.kw(" REFERENCES ")
            .ident(&Ident::new(rel.resource.as_str()))
            .kw(" (")
            .ident(&id_column())
            .kw(") ON DELETE SET NULL");
        columns.push(def);
    }

    for name in ["created_at", "updated_at"] {
        let mut def = SqlText::new();
        def.ident(&Ident::new(name)).kw(" TIMESTAMPTZ NOT NULL DEFAULT NOW()");
        columns.push(def);
    }

    let mut create = SqlText::new();
    create
        .kw("CREATE TABLE ")
        .ident(&table)
        .kw(" (\n  ")
        .join(&columns, ",\n  ")
        .kw("\n)");
    statements.push(create.finish());
    statements.extend(indexes);

    let mut trigger = SqlText::new();
    trigger
        .kw("CREATE TRIGGER ")
        .ident(&trigger_name(resource))
        .kw(" BEFORE UPDATE ON ")
        .ident(&table)
        .kw(" FOR EACH ROW EXECUTE PROCEDURE ")
        .ident(&Ident::new(UPDATED_AT_FUNCTION))
        .kw("()");
    statements.push(trigger.finish());

    Ok(ResourceMigration {
        resource: resource.name.clone(),
        statements,
    })
}

/// Many-to-many pairs, deduplicated by associative table name and sorted by it. The first
/// declaration of a pair decides which side is the host for column naming.
pub fn associative_pairs(resources: &[ResourceConfig]) -> Vec<AssociativePair> {
    let mut pairs: BTreeMap<Ident, AssociativePair> = BTreeMap::new();
    for r in resources {
        for rel in r.relationships.iter().filter(|rel| rel.cardinality == Cardinality::ManyToMany) {
            let table = associative_table(&r.name, &rel.resource);
            let (host, guest) = if rel.host {
                (r.name.clone(), rel.resource.clone())
            } else {
                (rel.resource.clone(), r.name.clone())
            };
            pairs
                .entry(table.clone())
                .or_insert(AssociativePair { table, host, guest });
        }
    }
    pairs.into_values().collect()
}

pub fn build_associative_table(pair: &AssociativePair) -> String {
    let host = host_column(&pair.host);
    let guest = guest_column(&pair.guest);
    let mut sql = SqlText::new();
    sql.kw("CREATE TABLE ")
        .ident(&pair.table)
        .kw(" (\n  ")
        .ident(&id_column())
        .kw(" SERIAL PRIMARY KEY,\n  ");
    for (column, target) in [(&host, &pair.host), (&guest, &pair.guest)] {
        sql.ident(column)
            .kw(" INTEGER NOT NULL REFERENCES ")
            .ident(&Ident::new(target.as_str()))
            .kw(" (")
            .ident(&id_column())
            .kw(") ON DELETE CASCADE,\n  ");
    }
    sql.kw("UNIQUE (").ident(&host).kw(", ").ident(&guest).kw(")\n)");
    sql.finish()
}

/// Apply a built plan in one transaction. Failures are reported, not retried; the database's
/// transactional semantics decide what (if anything) persists.
pub async fn apply_migrations<E>(executor: &E, plan: &MigrationPlan) -> Result<(), AppError>
where
    E: SqlExecutor + ?Sized,
{
    let statements = plan.statements();
    tracing::info!(statements = statements.len(), "applying migrations");
    executor.apply(&statements).await?;
    tracing::info!("migrations applied");
    Ok(())
}
