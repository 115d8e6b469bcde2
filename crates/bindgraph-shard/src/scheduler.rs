use crate::AliasResolver;
use bindgraph_core::{BindingGraph, DiagnosticSink, ShardGroup, TopologyInput, TypeKey};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use tracing::debug;

/// One cross-shard dependency edge, key to resolved terminal key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossShardEdge {
    pub from_shard: usize,
    pub from_key: TypeKey,
    pub to_shard: usize,
    pub to_key: TypeKey,
}

/// Shard-level scheduling result.
#[derive(Debug, Clone, Default)]
pub struct ShardSchedule {
    /// Initialization order: a permutation of shard indices, empty when
    /// there is at most one shard.
    pub order: Vec<usize>,
    /// Per shard, the distinct shards it depends on, sorted ascending.
    pub shard_deps: Vec<Vec<usize>>,
    /// Every key-level cross-shard edge in discovery order.
    pub cross_edges: Vec<CrossShardEdge>,
}

impl ShardSchedule {
    pub fn empty(shard_count: usize) -> Self {
        Self {
            order: Vec::new(),
            shard_deps: vec![Vec::new(); shard_count],
            cross_edges: Vec::new(),
        }
    }

    /// Cross-shard edges originating in `shard`.
    pub fn outgoing_edges(&self, shard: usize) -> usize {
        self.cross_edges
            .iter()
            .filter(|e| e.from_shard == shard)
            .count()
    }
}

/// Derives the shard-level dependency DAG from a partition and computes
/// a deterministic initialization order, falling back to declaration
/// order when partitioning induced a shard-level cycle.
pub struct ShardScheduler<'a> {
    graph: &'a dyn BindingGraph,
    topology: &'a TopologyInput,
}

impl<'a> ShardScheduler<'a> {
    pub fn new(graph: &'a dyn BindingGraph, topology: &'a TopologyInput) -> Self {
        Self { graph, topology }
    }

    pub fn schedule(
        &self,
        groups: &[ShardGroup],
        resolver: &mut AliasResolver,
        sink: &mut dyn DiagnosticSink,
    ) -> ShardSchedule {
        let shard_count = groups.len();
        if shard_count <= 1 {
            return ShardSchedule::empty(shard_count);
        }

        let mut shard_of: FxHashMap<TypeKey, usize> =
            FxHashMap::with_capacity_and_hasher(groups.iter().map(|g| g.len()).sum(), Default::default());
        for (index, group) in groups.iter().enumerate() {
            for key in group.keys() {
                shard_of.insert(key.clone(), index);
            }
        }

        let mut schedule = ShardSchedule::empty(shard_count);

        // Reusable marker array keeps per-source dedup at O(S + E)
        // across the whole pass.
        let mut marked = vec![false; shard_count];
        for (source, group) in groups.iter().enumerate() {
            let mut touched: Vec<usize> = Vec::new();
            for binding in &group.bindings {
                for dep in self.topology.dependencies_of(&binding.key) {
                    let terminal = resolver.resolve(self.graph, dep, sink);
                    let Some(&target) = shard_of.get(&terminal) else {
                        continue;
                    };
                    if target == source {
                        continue;
                    }
                    schedule.cross_edges.push(CrossShardEdge {
                        from_shard: source,
                        from_key: binding.key.clone(),
                        to_shard: target,
                        to_key: terminal,
                    });
                    if !marked[target] {
                        marked[target] = true;
                        touched.push(target);
                    }
                }
            }
            for &target in &touched {
                marked[target] = false;
            }
            touched.sort_unstable();
            schedule.shard_deps[source] = touched;
        }

        schedule.order = self.topo_order(&schedule.shard_deps, sink);
        debug!(
            shard_count,
            cross_edges = schedule.cross_edges.len(),
            "scheduled shard initialization"
        );
        schedule
    }

    /// Kahn's algorithm over the shard DAG. In-degree of shard A is the
    /// number of distinct shards A depends on; dependents lists are
    /// ascending, and the FIFO queue is seeded ascending, so identical
    /// inputs always produce the identical order.
    fn topo_order(&self, shard_deps: &[Vec<usize>], sink: &mut dyn DiagnosticSink) -> Vec<usize> {
        let shard_count = shard_deps.len();
        let mut in_degree: Vec<usize> = shard_deps.iter().map(|deps| deps.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); shard_count];
        for (dependent, deps) in shard_deps.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(dependent);
            }
        }

        let mut queue: VecDeque<usize> =
            (0..shard_count).filter(|&s| in_degree[s] == 0).collect();
        let mut order = Vec::with_capacity(shard_count);
        while let Some(shard) = queue.pop_front() {
            order.push(shard);
            for &dependent in &dependents[shard] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    queue.push_back(dependent);
                }
            }
        }

        if order.len() < shard_count {
            sink.warn(format!(
                "dependency cycle across shards ({} of {} orderable); \
                 falling back to declaration order",
                order.len(),
                shard_count
            ));
            return (0..shard_count).collect();
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bindgraph_core::{Component, MemoryBindingGraph, PropertyBinding, RecordingSink};

    fn group_of(keys: &[&str]) -> ShardGroup {
        ShardGroup::new(keys.iter().map(|k| PropertyBinding::concrete(*k)).collect())
    }

    /// Graph + topology where every key is concrete and dependencies
    /// are the given edges.
    fn graph_and_topology(
        keys: &[&str],
        edges: &[(&str, &str)],
    ) -> (MemoryBindingGraph, TopologyInput) {
        let mut graph = MemoryBindingGraph::new();
        for key in keys {
            graph.insert_concrete(*key);
        }
        let components = keys
            .iter()
            .enumerate()
            .map(|(id, k)| Component::new(id, vec![TypeKey::from(*k)]))
            .collect();
        let mut topology = TopologyInput::new(
            keys.iter().map(|k| TypeKey::from(*k)).collect(),
            components,
        );
        for (from, to) in edges {
            graph.add_dependency(*from, *to);
            topology.add_dependency(*from, *to);
        }
        (graph, topology)
    }

    #[test]
    fn single_shard_yields_empty_order() {
        let (graph, topology) = graph_and_topology(&["A"], &[]);
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule = ShardScheduler::new(&graph, &topology).schedule(
            &[group_of(&["A"])],
            &mut resolver,
            &mut sink,
        );
        assert!(schedule.order.is_empty());
        assert!(schedule.cross_edges.is_empty());
    }

    #[test]
    fn dependency_shards_initialize_first() {
        let (graph, topology) =
            graph_and_topology(&["A", "B", "C"], &[("C", "A"), ("C", "B"), ("B", "A")]);
        let groups = [group_of(&["A"]), group_of(&["B"]), group_of(&["C"])];
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule =
            ShardScheduler::new(&graph, &topology).schedule(&groups, &mut resolver, &mut sink);

        assert_eq!(schedule.order, vec![0, 1, 2]);
        assert_eq!(schedule.shard_deps[2], vec![0, 1]);
        assert_eq!(schedule.shard_deps[1], vec![0]);
        assert!(schedule.shard_deps[0].is_empty());
        assert!(sink.warnings.is_empty());
    }

    #[test]
    fn order_is_a_valid_topological_permutation() {
        let (graph, topology) = graph_and_topology(
            &["A", "B", "C", "D"],
            &[("A", "C"), ("B", "D"), ("A", "D")],
        );
        let groups = [
            group_of(&["A"]),
            group_of(&["B"]),
            group_of(&["C"]),
            group_of(&["D"]),
        ];
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule =
            ShardScheduler::new(&graph, &topology).schedule(&groups, &mut resolver, &mut sink);

        let mut sorted = schedule.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2, 3]);
        let position = |s: usize| schedule.order.iter().position(|&x| x == s).unwrap();
        for (dependent, deps) in schedule.shard_deps.iter().enumerate() {
            for &dep in deps {
                assert!(position(dep) < position(dependent));
            }
        }
    }

    #[test]
    fn cross_shard_edges_are_deduplicated_per_source() {
        let (graph, topology) = graph_and_topology(
            &["A", "B", "C"],
            &[("B", "A"), ("C", "A")],
        );
        // B and C share a shard that leans on shard 0 twice.
        let groups = [group_of(&["A"]), group_of(&["B", "C"])];
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule =
            ShardScheduler::new(&graph, &topology).schedule(&groups, &mut resolver, &mut sink);

        assert_eq!(schedule.shard_deps[1], vec![0]);
        assert_eq!(schedule.cross_edges.len(), 2);
        assert_eq!(schedule.outgoing_edges(1), 2);
        assert_eq!(schedule.order, vec![0, 1]);
    }

    #[test]
    fn alias_edges_resolve_to_the_owning_shard() {
        let mut graph = MemoryBindingGraph::new();
        graph.insert_concrete("Impl");
        graph.insert_alias("Api", "Impl");
        graph.insert_concrete("Client");
        let mut topology = TopologyInput::new(
            vec![
                TypeKey::from("Impl"),
                TypeKey::from("Api"),
                TypeKey::from("Client"),
            ],
            vec![
                Component::new(0, vec![TypeKey::from("Impl")]),
                Component::new(1, vec![TypeKey::from("Api")]),
                Component::new(2, vec![TypeKey::from("Client")]),
            ],
        );
        topology.add_dependency("Client", "Api");

        // The alias and its target live in shard 0; the client depends
        // on the alias but must wait for the target's shard.
        let groups = [group_of(&["Impl", "Api"]), group_of(&["Client"])];
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule =
            ShardScheduler::new(&graph, &topology).schedule(&groups, &mut resolver, &mut sink);

        assert_eq!(schedule.shard_deps[1], vec![0]);
        assert_eq!(schedule.cross_edges.len(), 1);
        assert_eq!(schedule.cross_edges[0].to_key, TypeKey::from("Impl"));
        assert_eq!(schedule.order, vec![0, 1]);
    }

    #[test]
    fn shard_cycle_falls_back_to_identity_with_one_warning() {
        let (graph, topology) = graph_and_topology(
            &["A", "B", "C"],
            &[("A", "C"), ("B", "A"), ("C", "B")],
        );
        // Shard 0 -> shard 2 -> shard 1 -> shard 0 at the shard level.
        let groups = [group_of(&["A"]), group_of(&["B"]), group_of(&["C"])];
        let mut resolver = AliasResolver::new();
        let mut sink = RecordingSink::new();
        let schedule =
            ShardScheduler::new(&graph, &topology).schedule(&groups, &mut resolver, &mut sink);

        assert_eq!(schedule.order, vec![0, 1, 2]);
        assert_eq!(sink.warnings.len(), 1);
        assert!(sink.warnings[0].contains("dependency cycle"));
    }
}
