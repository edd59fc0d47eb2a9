//! `WITH`-clause fragments that compute relationship data.
//!
//! Every fragment yields rows of `(key, value)`: `key` joins against the owning resource's
//! `id`, `value` is the related id (to-one) or the array of related ids (to-many), exposed
//! under the relationship's column name. The three storage patterns differ only in where
//! the rows come from.

use crate::classify::{classify, find_inverse, Arity, Storage};
use crate::config::{RelationshipConfig, ResourceConfig};
use crate::error::ConfigError;
use crate::sql::naming::{
    associative_columns, associative_table, id_column, relationship_column, table_name, virtual_host_table,
};
use crate::sql::{Ident, SqlLiteral, SqlText};
use serde_json::Value;

#[derive(Clone, Debug)]
pub struct Fragment {
    /// Virtual table name of the `WITH` entry.
    pub name: Ident,
    /// Table the rows are read from (own, related or associative table).
    pub source: Ident,
    /// Column matched against the owning resource's id.
    pub key_column: Ident,
    /// Column of `source` holding the related id, before any aggregation.
    pub related_column: Ident,
    /// Column carrying the related id or id array.
    pub value_column: Ident,
    pub storage: Storage,
    pub body: SqlText,
}

impl Fragment {
    /// `"name" AS (body)`, ready to be joined into a `WITH` clause.
    pub fn to_sql(&self) -> SqlText {
        let mut s = SqlText::new();
        s.ident(&self.name).kw(" AS (\n    ").append(&self.body).kw("\n  )");
        s
    }
}

/// Compile the fragment for `rel`, declared on `resource` and pointing at `related`.
/// With `id`, rows are narrowed to that owning resource; without it, every row is covered.
pub fn compile_fragment(
    resource: &ResourceConfig,
    related: &ResourceConfig,
    rel: &RelationshipConfig,
    id: Option<&Value>,
) -> Result<Fragment, ConfigError> {
    if related.name != rel.resource {
        return Err(ConfigError::UnknownResource {
            resource: resource.name.clone(),
            relationship: rel.name.clone(),
            target: related.name.clone(),
        });
    }
    let storage = classify(rel).storage;
    let value_column = relationship_column(rel);
    let id = id.map(SqlLiteral::from_json);

    let (source, key_column, related_column, body) = match storage {
        Storage::OwnTable => {
            let source = table_name(resource);
            let key = id_column();
            let mut body = SqlText::new();
            body.kw("SELECT ")
                .ident(&key)
                .kw(", ")
                .ident(&value_column)
                .kw(" FROM ")
                .ident(&source);
            if let Some(id) = &id {
                body.kw(" WHERE ").ident(&key).kw(" = ").literal(id);
            }
            (source, key, value_column.clone(), body)
        }
        Storage::HostTable(arity) => {
            let inverse = find_inverse(resource, related, rel)?;
            if !classify(inverse).storage.is_own_table() {
                return Err(ConfigError::AmbiguousRelationship {
                    resource: resource.name.clone(),
                    relationship: rel.name.clone(),
                    candidates: vec![inverse.name.clone()],
                });
            }
            let source = table_name(related);
            let key = relationship_column(inverse);
            let related_id = id_column();
            let body = select_related(&source, &key, &related_id, &value_column, arity, id.as_ref());
            (source, key, related_id, body)
        }
        Storage::Associative(arity) => {
            let source = associative_table(&resource.name, &rel.resource);
            let columns = associative_columns(resource, rel);
            let body = select_related(&source, &columns.own, &columns.other, &value_column, arity, id.as_ref());
            (source, columns.own, columns.other, body)
        }
    };

    Ok(Fragment {
        name: virtual_host_table(rel),
        source,
        key_column,
        related_column,
        value_column,
        storage,
        body,
    })
}

/// Rows from a table holding `key` (the owner's id) and `related` (the other side's id).
/// Many: related ids aggregated per key, ascending. One: related id passed through.
fn select_related(
    source: &Ident,
    key: &Ident,
    related: &Ident,
    alias: &Ident,
    arity: Arity,
    id: Option<&SqlLiteral>,
) -> SqlText {
    let mut body = SqlText::new();
    body.kw("SELECT ").ident(key).kw(", ");
    match arity {
        Arity::Many => {
            body.kw("array_agg(")
                .ident(related)
                .kw(" ORDER BY ")
                .ident(related)
                .kw(")");
        }
        Arity::One => {
            body.ident(related);
        }
    }
    body.kw(" AS ").ident(alias).kw(" FROM ").ident(source).kw(" WHERE ").ident(key);
    match id {
        Some(id) => body.kw(" = ").literal(id),
        None => body.kw(" IS NOT NULL"),
    };
    if arity.is_many() {
        body.kw(" GROUP BY ").ident(key);
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cardinality;
    use serde_json::json;

    fn person() -> ResourceConfig {
        ResourceConfig::new("person", "people").with_relationship("pets", "cat", Cardinality::OneToMany, false)
    }

    fn cat() -> ResourceConfig {
        ResourceConfig::new("cat", "cats").with_relationship("owner", "person", Cardinality::OneToMany, true)
    }

    #[test]
    fn own_table_is_a_projection() {
        let cat = cat();
        let f = compile_fragment(&cat, &person(), &cat.relationships[0], None).unwrap();
        assert_eq!(f.storage, Storage::OwnTable);
        assert_eq!(f.name.raw(), "related_person_id");
        assert_eq!(f.body.as_str(), "SELECT \"id\", \"owner_id\" FROM \"cat\"");

        let f = compile_fragment(&cat, &person(), &cat.relationships[0], Some(&json!(3))).unwrap();
        assert_eq!(f.body.as_str(), "SELECT \"id\", \"owner_id\" FROM \"cat\" WHERE \"id\" = 3");
    }

    #[test]
    fn host_table_many_aggregates() {
        let person = person();
        let f = compile_fragment(&person, &cat(), &person.relationships[0], None).unwrap();
        assert_eq!(f.storage, Storage::HostTable(Arity::Many));
        assert_eq!(f.key_column.raw(), "owner_id");
        assert_eq!(f.related_column.raw(), "id");
        assert_eq!(f.value_column.raw(), "pets_ids");
        assert_eq!(
            f.to_sql().as_str(),
            "\"related_cat_ids\" AS (\n    SELECT \"owner_id\", array_agg(\"id\" ORDER BY \"id\") AS \"pets_ids\" FROM \"cat\" WHERE \"owner_id\" IS NOT NULL GROUP BY \"owner_id\"\n  )"
        );

        let f = compile_fragment(&person, &cat(), &person.relationships[0], Some(&json!("2"))).unwrap();
        assert_eq!(
            f.body.as_str(),
            "SELECT \"owner_id\", array_agg(\"id\" ORDER BY \"id\") AS \"pets_ids\" FROM \"cat\" WHERE \"owner_id\" = '2' GROUP BY \"owner_id\""
        );
    }

    #[test]
    fn host_table_one_passes_through() {
        let user = ResourceConfig::new("user", "users").with_relationship("profile", "profile", Cardinality::OneToOne, false);
        let profile = ResourceConfig::new("profile", "profiles").with_relationship("user", "user", Cardinality::OneToOne, true);
        let f = compile_fragment(&user, &profile, &user.relationships[0], Some(&json!(9))).unwrap();
        assert_eq!(f.storage, Storage::HostTable(Arity::One));
        assert_eq!(
            f.body.as_str(),
            "SELECT \"user_id\", \"id\" AS \"profile_id\" FROM \"profile\" WHERE \"user_id\" = 9"
        );
    }

    #[test]
    fn associative_from_both_sides_shares_the_table() {
        let book = ResourceConfig::new("book", "books").with_relationship("authors", "author", Cardinality::ManyToMany, true);
        let author = ResourceConfig::new("author", "authors").with_relationship("books", "book", Cardinality::ManyToMany, false);
        let from_book = compile_fragment(&book, &author, &book.relationships[0], None).unwrap();
        let from_author = compile_fragment(&author, &book, &author.relationships[0], None).unwrap();

        assert_ne!(from_book.name, from_author.name);
        assert_eq!(from_book.source, from_author.source);
        assert_eq!(from_book.source.raw(), "author_book");
        assert_eq!(
            from_book.body.as_str(),
            "SELECT \"host_book_id\", array_agg(\"guest_author_id\" ORDER BY \"guest_author_id\") AS \"authors_ids\" FROM \"author_book\" WHERE \"host_book_id\" IS NOT NULL GROUP BY \"host_book_id\""
        );
        assert_eq!(from_author.key_column.raw(), "guest_author_id");
    }

    #[test]
    fn both_sides_of_host_pair_share_the_host_table() {
        let person = person();
        let cat = cat();
        let from_person = compile_fragment(&person, &cat, &person.relationships[0], None).unwrap();
        let from_cat = compile_fragment(&cat, &person, &cat.relationships[0], None).unwrap();
        assert_ne!(from_person.name, from_cat.name);
        assert_eq!(from_person.source, from_cat.source);
    }

    #[test]
    fn missing_inverse_is_ambiguous() {
        let person = person();
        let lonely_cat = ResourceConfig::new("cat", "cats");
        let err = compile_fragment(&person, &lonely_cat, &person.relationships[0], None).unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousRelationship { ref relationship, .. } if relationship == "pets"));
    }

    #[test]
    fn id_literal_is_quoted() {
        let person = person();
        let f = compile_fragment(&person, &cat(), &person.relationships[0], Some(&json!("1' OR '1'='1"))).unwrap();
        assert!(f.body.as_str().contains("= '1'' OR ''1''=''1'"));
    }
}
