use bindgraph_core::{BindingGraph, DiagnosticSink, TypeKey};
use rustc_hash::FxHashMap;

/// Resolves a key through chained alias bindings to its terminal
/// concrete key, memoizing every resolution with path compression. One
/// resolver is scoped to exactly one graph pass and discarded with it.
#[derive(Debug, Default)]
pub struct AliasResolver {
    memo: FxHashMap<TypeKey, TypeKey>,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks the alias chain starting at `key` until it reaches a key
    /// that is absent from the graph, not an alias, or already on the
    /// current walk's path (a cycle; resolution stops at the repeating
    /// key and one warning goes to the sink). Every visited key is then
    /// memoized directly to the terminal, so repeated and overlapping
    /// chains amortize to near-constant time within a pass.
    pub fn resolve(
        &mut self,
        graph: &dyn BindingGraph,
        key: &TypeKey,
        sink: &mut dyn DiagnosticSink,
    ) -> TypeKey {
        if let Some(terminal) = self.memo.get(key) {
            return terminal.clone();
        }

        let mut path: Vec<TypeKey> = Vec::new();
        let mut current = key.clone();
        let terminal = loop {
            // A memoized key mid-walk splices this path onto its tail.
            if let Some(hit) = self.memo.get(&current) {
                break hit.clone();
            }
            path.push(current.clone());

            if !graph.present(&current) {
                break current;
            }
            let next = match graph.alias_target(&current) {
                Some(next) => next,
                None => break current,
            };
            if path.contains(&next) {
                sink.warn(format!(
                    "alias cycle detected while resolving {}: chain repeats at {}",
                    key, next
                ));
                break next;
            }
            current = next;
        };

        for visited in path {
            self.memo.insert(visited, terminal.clone());
        }
        terminal
    }

    /// Whether a key already has a memoized terminal. Lets callers (and
    /// tests) distinguish an O(1) hit from a fresh walk.
    pub fn is_memoized(&self, key: &TypeKey) -> bool {
        self.memo.contains_key(key)
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }
}
