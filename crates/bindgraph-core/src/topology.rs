use crate::{Component, TypeKey};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Precomputed global topology for the current graph: the sorted key
/// order, the SCC decomposition, and the dependency adjacency map.
/// Supplied by the upstream graph validator and treated as read-only
/// for the duration of a pass. Its absence degrades partitioning to the
/// single-shard fallback.
#[derive(Debug, Clone, Default)]
pub struct TopologyInput {
    /// Every key in global topological order.
    pub sorted_keys: Vec<TypeKey>,
    /// SCC list with dense ids starting at zero.
    pub components: Vec<Component>,
    component_of: FxHashMap<TypeKey, usize>,
    dependencies: FxHashMap<TypeKey, BTreeSet<TypeKey>>,
}

impl TopologyInput {
    pub fn new(sorted_keys: Vec<TypeKey>, components: Vec<Component>) -> Self {
        let mut component_of = FxHashMap::default();
        for component in &components {
            for key in &component.keys {
                component_of.insert(key.clone(), component.id);
            }
        }
        Self {
            sorted_keys,
            components,
            component_of,
            dependencies: FxHashMap::default(),
        }
    }

    pub fn add_dependency(&mut self, from: impl Into<TypeKey>, to: impl Into<TypeKey>) {
        self.dependencies
            .entry(from.into())
            .or_default()
            .insert(to.into());
    }

    /// The owning component id, when the key is carried by one.
    pub fn component_of(&self, key: &TypeKey) -> Option<usize> {
        self.component_of.get(key).copied()
    }

    /// Dependency keys of `key` in canonical order.
    pub fn dependencies_of(&self, key: &TypeKey) -> impl Iterator<Item = &TypeKey> {
        self.dependencies.get(key).into_iter().flatten()
    }
}
