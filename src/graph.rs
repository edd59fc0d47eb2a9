//! Migration ordering: resources sorted so every foreign-key target is created first.

use crate::classify::classify;
use crate::config::ResourceConfig;
use crate::error::ConfigError;
use std::collections::{BTreeSet, HashMap};

/// Indices of the resources each resource must be created after (deduplicated, sorted).
/// Edge `a -> b` exists when `b` hosts a one-to-one/one-to-many foreign key to `a`.
fn dependencies(resources: &[ResourceConfig]) -> Result<Vec<BTreeSet<usize>>, ConfigError> {
    let index: HashMap<&str, usize> = resources.iter().enumerate().map(|(i, r)| (r.name.as_str(), i)).collect();
    let mut deps = vec![BTreeSet::new(); resources.len()];
    for (b, r) in resources.iter().enumerate() {
        for rel in &r.relationships {
            let &a = index.get(rel.resource.as_str()).ok_or_else(|| ConfigError::UnknownResource {
                resource: r.name.clone(),
                relationship: rel.name.clone(),
                target: rel.resource.clone(),
            })?;
            // A table may reference itself from its own CREATE TABLE.
            if classify(rel).storage.is_own_table() && a != b {
                deps[b].insert(a);
            }
        }
    }
    Ok(deps)
}

/// Topologically order resources (Kahn's algorithm). Among resources that are ready at the
/// same time, declaration order wins, so the result is deterministic.
pub fn dependency_order(resources: &[ResourceConfig]) -> Result<Vec<&ResourceConfig>, ConfigError> {
    let deps = dependencies(resources)?;
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); resources.len()];
    let mut in_degree: Vec<usize> = vec![0; resources.len()];
    for (b, ds) in deps.iter().enumerate() {
        in_degree[b] = ds.len();
        for &a in ds {
            dependents[a].push(b);
        }
    }

    let mut ready: BTreeSet<usize> = (0..resources.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(resources.len());
    while let Some(current) = ready.pop_first() {
        order.push(&resources[current]);
        for &d in &dependents[current] {
            in_degree[d] -= 1;
            if in_degree[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() != resources.len() {
        let cycle = find_cycle(&deps, &in_degree);
        let names: Vec<String> = cycle.into_iter().map(|i| resources[i].name.clone()).collect();
        tracing::warn!(resources = ?names, "cyclic resource dependency");
        return Err(ConfigError::CyclicDependency { resources: names });
    }

    tracing::debug!(
        order = ?order.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "resource migration order"
    );
    Ok(order)
}

/// Every node left with a non-zero in-degree has an unresolved dependency that is itself left
/// over, so walking dependencies from any of them must revisit a node. Returns that loop,
/// dependency first.
fn find_cycle(deps: &[BTreeSet<usize>], in_degree: &[usize]) -> Vec<usize> {
    let stuck = |i: usize| in_degree[i] > 0;
    let Some(start) = (0..deps.len()).find(|&i| stuck(i)) else {
        return Vec::new();
    };
    let mut path: Vec<usize> = Vec::new();
    let mut position: HashMap<usize, usize> = HashMap::new();
    let mut current = start;
    loop {
        if let Some(&pos) = position.get(&current) {
            let mut cycle = path[pos..].to_vec();
            cycle.reverse();
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);
        match deps[current].iter().copied().find(|&d| stuck(d)) {
            Some(next) => current = next,
            None => return path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cardinality;

    fn names(order: &[&ResourceConfig]) -> Vec<String> {
        order.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn host_comes_after_target() {
        let resources = vec![
            ResourceConfig::new("cat", "cats").with_relationship("owner", "person", Cardinality::OneToMany, true),
            ResourceConfig::new("person", "people").with_relationship("pets", "cat", Cardinality::OneToMany, false),
        ];
        assert_eq!(names(&dependency_order(&resources).unwrap()), vec!["person", "cat"]);
    }

    #[test]
    fn ties_follow_declaration_order() {
        let resources = vec![
            ResourceConfig::new("zebra", "zebras"),
            ResourceConfig::new("apple", "apples"),
            ResourceConfig::new("mango", "mangoes").with_relationship("zebra", "zebra", Cardinality::OneToOne, true),
        ];
        assert_eq!(names(&dependency_order(&resources).unwrap()), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn chain_is_ordered() {
        let resources = vec![
            ResourceConfig::new("comment", "comments").with_relationship("post", "post", Cardinality::OneToMany, true),
            ResourceConfig::new("post", "posts").with_relationship("author", "user", Cardinality::OneToMany, true),
            ResourceConfig::new("user", "users"),
        ];
        let order = names(&dependency_order(&resources).unwrap());
        assert_eq!(order, vec!["user", "post", "comment"]);
    }

    #[test]
    fn every_resource_follows_its_targets() {
        let resources = vec![
            ResourceConfig::new("d", "ds")
                .with_relationship("b", "b", Cardinality::OneToMany, true)
                .with_relationship("c", "c", Cardinality::OneToOne, true),
            ResourceConfig::new("c", "cs").with_relationship("a", "a", Cardinality::OneToMany, true),
            ResourceConfig::new("b", "bs").with_relationship("a", "a", Cardinality::OneToMany, true),
            ResourceConfig::new("a", "as").with_relationship("tags", "e", Cardinality::ManyToMany, true),
            ResourceConfig::new("e", "es").with_relationship("as", "a", Cardinality::ManyToMany, false),
        ];
        let order = dependency_order(&resources).unwrap();
        let pos: HashMap<&str, usize> = order.iter().enumerate().map(|(i, r)| (r.name.as_str(), i)).collect();
        assert_eq!(order.len(), resources.len());
        for r in &resources {
            for rel in r.relationships.iter().filter(|rel| classify(rel).storage.is_own_table()) {
                assert!(pos[rel.resource.as_str()] < pos[r.name.as_str()], "{} before {}", rel.resource, r.name);
            }
        }
    }

    #[test]
    fn many_to_many_adds_no_edge() {
        let resources = vec![
            ResourceConfig::new("book", "books").with_relationship("authors", "author", Cardinality::ManyToMany, true),
            ResourceConfig::new("author", "authors").with_relationship("books", "book", Cardinality::ManyToMany, false),
        ];
        assert_eq!(names(&dependency_order(&resources).unwrap()), vec!["book", "author"]);
    }

    #[test]
    fn mutual_hosting_is_a_cycle() {
        let resources = vec![
            ResourceConfig::new("root", "roots"),
            ResourceConfig::new("a", "as").with_relationship("b", "b", Cardinality::OneToOne, true),
            ResourceConfig::new("b", "bs").with_relationship("a", "a", Cardinality::OneToOne, true),
            ResourceConfig::new("c", "cs").with_relationship("a", "a", Cardinality::OneToMany, true),
        ];
        match dependency_order(&resources) {
            Err(ConfigError::CyclicDependency { resources }) => {
                let mut sorted = resources.clone();
                sorted.sort();
                assert_eq!(sorted, vec!["a", "b"]);
            }
            other => panic!("expected cycle, got {:?}", other.map(|o| names(&o))),
        }
    }

    #[test]
    fn self_reference_is_allowed() {
        let resources = vec![ResourceConfig::new("person", "people")
            .with_relationship("parent", "person", Cardinality::OneToMany, true)
            .with_relationship("children", "person", Cardinality::OneToMany, false)];
        assert_eq!(names(&dependency_order(&resources).unwrap()), vec!["person"]);
    }

    #[test]
    fn unknown_target_is_reported() {
        let resources = vec![ResourceConfig::new("cat", "cats").with_relationship("owner", "ghost", Cardinality::OneToMany, true)];
        assert!(matches!(
            dependency_order(&resources),
            Err(ConfigError::UnknownResource { ref target, .. }) if target == "ghost"
        ));
    }
}
