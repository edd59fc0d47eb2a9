//! Table and column naming for resources and relationships.

use crate::classify::{classify, is_to_many, Storage};
use crate::config::{RelationshipConfig, ResourceConfig};
use crate::sql::Ident;

/// Table for a resource (its singular name).
pub fn table_name(resource: &ResourceConfig) -> Ident {
    Ident::new(resource.name.as_str())
}

/// `id` is the only supported primary key column.
pub fn id_column() -> Ident {
    Ident::new("id")
}

pub fn id_suffix(rel: &RelationshipConfig) -> &'static str {
    if is_to_many(rel) {
        "ids"
    } else {
        "id"
    }
}

/// `{name}_id` for to-one, `{name}_ids` for to-many. This is both the own-table foreign key column
/// and the value column every fragment exposes for the relationship.
pub fn relationship_column(rel: &RelationshipConfig) -> Ident {
    Ident::new(format!("{}_{}", rel.name, id_suffix(rel)))
}

/// Name given to the `WITH` entry computing a relationship: `related_{target}_id[s]`.
pub fn virtual_host_table(rel: &RelationshipConfig) -> Ident {
    Ident::new(format!("related_{}_{}", rel.resource, id_suffix(rel)))
}

/// Associative table for a many-to-many pair, lexically ordered so both sides agree.
pub fn associative_table(a: &str, b: &str) -> Ident {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    Ident::new(format!("{}_{}", first, second))
}

pub fn host_column(host_resource: &str) -> Ident {
    Ident::new(format!("host_{}_id", host_resource))
}

pub fn guest_column(guest_resource: &str) -> Ident {
    Ident::new(format!("guest_{}_id", guest_resource))
}

/// Index on an own-table foreign key column.
pub fn index_name(resource: &ResourceConfig, column: &Ident) -> Ident {
    Ident::new(format!("{}_{}_idx", resource.name, column.raw()))
}

/// `updated_at` trigger of a resource table.
pub fn trigger_name(resource: &ResourceConfig) -> Ident {
    Ident::new(format!("{}_set_updated_at", resource.name))
}

/// PostgreSQL truncates longer identifiers (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_BYTES: usize = 63;

/// Every identifier derived from `resource`, labelled by kind. Each one has to fit
/// [`MAX_IDENTIFIER_BYTES`] or two distinct names may collapse into one after truncation.
pub fn derived_identifiers(resource: &ResourceConfig) -> Vec<(&'static str, Ident)> {
    let mut out = vec![("trigger name", trigger_name(resource))];
    for rel in &resource.relationships {
        let column = relationship_column(rel);
        out.push(("relationship column", column.clone()));
        out.push(("virtual table name", virtual_host_table(rel)));
        match classify(rel).storage {
            Storage::OwnTable => out.push(("index name", index_name(resource, &column))),
            Storage::HostTable(_) => {}
            Storage::Associative(_) => {
                let columns = associative_columns(resource, rel);
                out.push(("associative table", associative_table(&resource.name, &rel.resource)));
                out.push(("associative column", columns.own));
                out.push(("associative column", columns.other));
            }
        }
    }
    out
}

/// Associative columns as seen from `resource` for `rel`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssociativeColumns {
    /// Column holding `resource`'s id.
    pub own: Ident,
    /// Column holding the related resource's id.
    pub other: Ident,
}

pub fn associative_columns(resource: &ResourceConfig, rel: &RelationshipConfig) -> AssociativeColumns {
    if rel.host {
        AssociativeColumns {
            own: host_column(&resource.name),
            other: guest_column(&rel.resource),
        }
    } else {
        AssociativeColumns {
            own: guest_column(&resource.name),
            other: host_column(&rel.resource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cardinality;

    #[test]
    fn column_suffix_follows_arity() {
        let cat = ResourceConfig::new("cat", "cats").with_relationship("owner", "person", Cardinality::OneToMany, true);
        let person = ResourceConfig::new("person", "people").with_relationship("pets", "cat", Cardinality::OneToMany, false);
        assert_eq!(relationship_column(&cat.relationships[0]).raw(), "owner_id");
        assert_eq!(relationship_column(&person.relationships[0]).raw(), "pets_ids");
        assert_eq!(virtual_host_table(&cat.relationships[0]).raw(), "related_person_id");
        assert_eq!(virtual_host_table(&person.relationships[0]).raw(), "related_cat_ids");
        assert_eq!(table_name(&cat).escaped(), "\"cat\"");
    }

    #[test]
    fn associative_name_is_symmetric() {
        let book = ResourceConfig::new("book", "books").with_relationship("authors", "author", Cardinality::ManyToMany, true);
        let author = ResourceConfig::new("author", "authors").with_relationship("books", "book", Cardinality::ManyToMany, false);
        let from_book = associative_table(&book.name, &book.relationships[0].resource);
        let from_author = associative_table(&author.name, &author.relationships[0].resource);
        assert_eq!(from_book, from_author);
        assert_eq!(from_book.raw(), "author_book");

        let b = associative_columns(&book, &book.relationships[0]);
        let a = associative_columns(&author, &author.relationships[0]);
        assert_eq!(b.own, a.other);
        assert_eq!(b.other, a.own);
        assert_eq!(b.own.raw(), "host_book_id");
        assert_eq!(a.own.raw(), "guest_author_id");
    }

    #[test]
    fn derived_identifiers_cover_every_generated_name() {
        let cat = ResourceConfig::new("cat", "cats")
            .with_relationship("owner", "person", Cardinality::OneToMany, true)
            .with_relationship("toys", "toy", Cardinality::ManyToMany, true);
        let names: Vec<(&str, String)> = derived_identifiers(&cat)
            .into_iter()
            .map(|(kind, id)| (kind, id.raw().to_string()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("trigger name", "cat_set_updated_at".to_string()),
                ("relationship column", "owner_id".to_string()),
                ("virtual table name", "related_person_id".to_string()),
                ("index name", "cat_owner_id_idx".to_string()),
                ("relationship column", "toys_ids".to_string()),
                ("virtual table name", "related_toy_ids".to_string()),
                ("associative table", "cat_toy".to_string()),
                ("associative column", "host_cat_id".to_string()),
                ("associative column", "guest_toy_id".to_string()),
            ]
        );
    }
}
