//! Per-entity composition graph: requirement closure, exclusion and cycle
//! checks, and the deterministic linearization every later stage follows.

#[cfg(test)]
mod tests;

use crate::error::ComposeError;
use derive_more::{Deref, IntoIterator};
use entcomp_schema::node::{ComponentDescriptor, EntityDefinition, Schema};
use std::collections::{BTreeMap, BTreeSet};

/// Rank shared by every universal component; requested components start at 1.
pub const UNIVERSAL_RANK: usize = 0;

///
/// Linearization
/// Included components, requirements before requirers.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct Linearization(Vec<String>);

impl Linearization {
    #[must_use]
    pub fn contains(&self, component: &str) -> bool {
        self.0.iter().any(|c| c == component)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

///
/// Node
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Node {
    /// Tie-break rank inherited from the requested root first reaching it.
    pub rank: usize,

    /// Direct requirements inside this graph, universal edges included.
    pub requires: Vec<String>,
}

///
/// CompositionGraph
///
/// Built for one entity and discarded after resolution.
///

#[derive(Clone, Debug)]
pub struct CompositionGraph<'a> {
    schema: &'a Schema,
    entity: &'a EntityDefinition,
    nodes: BTreeMap<String, Node>,
}

impl<'a> CompositionGraph<'a> {
    /// Compute the requirement closure of `entity`.
    ///
    /// Roots are walked in request order, so a component reachable from
    /// several roots keeps the rank of the first.
    pub fn build(schema: &'a Schema, entity: &'a EntityDefinition) -> Result<Self, ComposeError> {
        let universals: Vec<&ComponentDescriptor> = schema.universal_components().collect();
        let mut nodes = BTreeMap::<String, Node>::new();

        for (index, root) in entity.components.iter().enumerate() {
            let root_rank = index + 1;
            let mut stack = vec![root.clone()];

            while let Some(name) = stack.pop() {
                if nodes.contains_key(&name) {
                    continue;
                }

                let component = schema.get_component(&name).ok_or_else(|| {
                    ComposeError::UnknownComponent {
                        entity: entity.name.clone(),
                        component: name.clone(),
                    }
                })?;

                let requires = requirements(component, &universals);
                let rank = if component.universal {
                    UNIVERSAL_RANK
                } else {
                    root_rank
                };

                // reverse so the first requirement is visited first
                stack.extend(requires.iter().rev().cloned());
                nodes.insert(name, Node { rank, requires });
            }
        }

        Ok(Self {
            schema,
            entity,
            nodes,
        })
    }

    #[must_use]
    pub const fn entity(&self) -> &EntityDefinition {
        self.entity
    }

    #[must_use]
    pub fn node(&self, component: &str) -> Option<&Node> {
        self.nodes.get(component)
    }

    /// Included component names in name order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fail on the first included pair joined by an exclusion edge.
    ///
    /// Exclusion is symmetric; the pair is reported with the declaring
    /// component first.
    pub fn check_exclusions(&self) -> Result<(), ComposeError> {
        for name in self.nodes.keys() {
            let Some(component) = self.schema.get_component(name) else {
                continue;
            };

            if let Some(other) = component
                .excludes
                .iter()
                .find(|other| self.nodes.contains_key(other.as_str()))
            {
                return Err(ComposeError::ExcludedPair {
                    entity: self.entity.name.clone(),
                    first: name.clone(),
                    second: other.clone(),
                });
            }
        }

        Ok(())
    }

    /// Topological order, ties broken by (rank, name).
    pub fn linearize(&self) -> Result<Linearization, ComposeError> {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for (name, node) in &self.nodes {
            pending.insert(name, node.requires.len());
            for req in &node.requires {
                dependents.entry(req.as_str()).or_default().push(name);
            }
        }

        let mut ready: BTreeSet<(usize, &str)> = pending
            .iter()
            .filter(|&(_, count)| *count == 0)
            .map(|(&name, _)| (self.nodes[name].rank, name))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some((_, name)) = ready.pop_first() {
            order.push(name.to_string());
            pending.remove(name);

            for &dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert((self.nodes[dependent].rank, dependent));
                    }
                }
            }
        }

        if !pending.is_empty() {
            return Err(ComposeError::CyclicDependency {
                entity: self.entity.name.clone(),
                cycle: self.find_cycle(&pending),
            });
        }

        Ok(Linearization(order))
    }

    /// Walk requirement edges among the unsorted nodes until one repeats.
    ///
    /// Every unsorted node still waits on an unsorted requirement, so the
    /// walk cannot dead-end.
    fn find_cycle(&self, pending: &BTreeMap<&str, usize>) -> Vec<String> {
        let Some(&start) = pending.keys().next() else {
            return Vec::new();
        };

        let mut path: Vec<&str> = vec![start];
        let mut current = start;
        loop {
            let next = self.nodes[current]
                .requires
                .iter()
                .map(String::as_str)
                .find(|req| pending.contains_key(req));

            let Some(next) = next else {
                return path.iter().map(ToString::to_string).collect();
            };

            if let Some(pos) = path.iter().position(|&n| n == next) {
                let mut cycle: Vec<String> = path[pos..].iter().map(ToString::to_string).collect();
                cycle.push(next.to_string());
                return cycle;
            }

            path.push(next);
            current = next;
        }
    }
}

/// Build the graph, validate it, and linearize it.
pub fn linearize(
    schema: &Schema,
    entity: &EntityDefinition,
) -> Result<Linearization, ComposeError> {
    let graph = CompositionGraph::build(schema, entity)?;
    graph.check_exclusions()?;

    graph.linearize()
}

// Declared requirements plus the implicit universal edges, deduplicated.
fn requirements(
    component: &ComponentDescriptor,
    universals: &[&ComponentDescriptor],
) -> Vec<String> {
    let mut requires = component.requires.clone();

    if !component.universal {
        for universal in universals {
            if !requires.contains(&universal.name) {
                requires.push(universal.name.clone());
            }
        }
    }

    requires
}
