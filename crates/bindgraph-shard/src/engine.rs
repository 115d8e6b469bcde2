use crate::{AliasResolver, ShardPartitioner, ShardSchedule, ShardScheduler};
use bindgraph_core::{
    BindingGraph, DiagnosticSink, PropertyBinding, Result, ShardInfo, ShardingConfig,
    TopologyInput, TypeKey,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the code generator consumes from one pass: the ordered
/// shards, the initialization schedule, and the per-key membership map
/// that routes same-shard-direct versus cross-shard-indirect access.
#[derive(Debug, Clone)]
pub struct ShardPlan {
    pub shards: Vec<ShardInfo>,
    pub schedule: ShardSchedule,
    /// Key to owning shard index. Ordered for deterministic iteration.
    pub membership: BTreeMap<TypeKey, usize>,
    pub total_bindings: usize,
    /// Snapshot of the configuration the plan was computed under.
    pub config: ShardingConfig,
}

impl ShardPlan {
    pub fn is_sharded(&self) -> bool {
        self.shards.len() > 1
    }

    pub fn shard_of(&self, key: &TypeKey) -> Option<usize> {
        self.membership.get(key).copied()
    }

    /// Shard indices in initialization order; identity when no
    /// scheduling was needed.
    pub fn init_order(&self) -> Vec<usize> {
        if self.schedule.order.is_empty() {
            (0..self.shards.len()).collect()
        } else {
            self.schedule.order.clone()
        }
    }
}

/// One-pass sharding engine. Owns the alias memo for the pass; borrows
/// the graph, topology, and configuration. Created per compilation pass
/// and discarded with it.
pub struct ShardEngine<'a> {
    graph: &'a dyn BindingGraph,
    topology: Option<&'a TopologyInput>,
    config: ShardingConfig,
    resolver: AliasResolver,
}

impl<'a> ShardEngine<'a> {
    pub fn new(
        graph: &'a dyn BindingGraph,
        topology: Option<&'a TopologyInput>,
        config: ShardingConfig,
    ) -> Self {
        Self {
            graph,
            topology,
            config,
            resolver: AliasResolver::new(),
        }
    }

    /// Partitions the bindings and schedules shard initialization.
    ///
    /// Every input binding must exist in the graph; an absent one is a
    /// contract violation and fails the pass. Recoverable conditions
    /// (alias cycles, shard-level cycles) go through the sink instead.
    pub fn plan(
        &mut self,
        bindings: Vec<PropertyBinding>,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ShardPlan> {
        self.config.validate()?;
        for binding in &bindings {
            self.graph.require_binding(&binding.key)?;
        }
        let total_bindings = bindings.len();

        let groups = ShardPartitioner::new(&self.config, self.topology).partition(bindings);
        let schedule = match self.topology {
            Some(topology) if groups.len() > 1 => ShardScheduler::new(self.graph, topology)
                .schedule(&groups, &mut self.resolver, sink),
            _ => ShardSchedule::empty(groups.len()),
        };

        let mut membership = BTreeMap::new();
        let shards: Vec<ShardInfo> = groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                for key in group.keys() {
                    membership.insert(key.clone(), index);
                }
                ShardInfo::new(index, group)
            })
            .collect();

        debug!(
            total_bindings,
            shard_count = shards.len(),
            sharded = shards.len() > 1,
            "computed shard plan"
        );
        Ok(ShardPlan {
            shards,
            schedule,
            membership,
            total_bindings,
            config: self.config.clone(),
        })
    }

    /// Resolves a key through the pass-scoped alias memo; exposed so
    /// the generator can route accessor lookups through the same cache.
    pub fn resolve_alias(&mut self, key: &TypeKey, sink: &mut dyn DiagnosticSink) -> TypeKey {
        self.resolver.resolve(self.graph, key, sink)
    }
}
