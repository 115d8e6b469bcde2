use crate::{BindGraphError, BindingKind, Result, TypeKey};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Read-only view of the upstream binding graph for one compilation
/// pass. The engine never mutates the graph and never recomputes what
/// the upstream validator already established.
pub trait BindingGraph {
    fn present(&self, key: &TypeKey) -> bool;

    /// Dependency keys of `key`, sorted. Empty when the key is absent.
    fn dependencies_of(&self, key: &TypeKey) -> Vec<TypeKey>;

    /// The redirection target when `key` is bound as a pure alias.
    fn alias_target(&self, key: &TypeKey) -> Option<TypeKey>;

    /// Asserts a binding the caller knows must exist. Absence here is a
    /// caller bug surfaced as a fatal error, not a recoverable condition.
    fn require_binding(&self, key: &TypeKey) -> Result<()> {
        if self.present(key) {
            Ok(())
        } else {
            Err(BindGraphError::BindingNotFound(key.clone()))
        }
    }
}

/// In-memory binding graph for tests and hosts that assemble the graph
/// directly rather than adapting an existing store.
#[derive(Debug, Default)]
pub struct MemoryBindingGraph {
    kinds: FxHashMap<TypeKey, BindingKind>,
    dependencies: FxHashMap<TypeKey, BTreeSet<TypeKey>>,
}

impl MemoryBindingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_concrete(&mut self, key: impl Into<TypeKey>) {
        self.kinds.insert(key.into(), BindingKind::Concrete);
    }

    pub fn insert_alias(&mut self, key: impl Into<TypeKey>, target: impl Into<TypeKey>) {
        self.kinds.insert(
            key.into(),
            BindingKind::Alias {
                target: target.into(),
            },
        );
    }

    pub fn add_dependency(&mut self, from: impl Into<TypeKey>, to: impl Into<TypeKey>) {
        self.dependencies
            .entry(from.into())
            .or_default()
            .insert(to.into());
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl BindingGraph for MemoryBindingGraph {
    fn present(&self, key: &TypeKey) -> bool {
        self.kinds.contains_key(key)
    }

    fn dependencies_of(&self, key: &TypeKey) -> Vec<TypeKey> {
        self.dependencies
            .get(key)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn alias_target(&self, key: &TypeKey) -> Option<TypeKey> {
        match self.kinds.get(key) {
            Some(BindingKind::Alias { target }) => Some(target.clone()),
            _ => None,
        }
    }
}
