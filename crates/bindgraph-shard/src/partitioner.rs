use bindgraph_core::{PropertyBinding, ShardGroup, ShardingConfig, TopologyInput, TypeKey};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

/// Partitions property bindings into ordered, bounded-size shard
/// groups, keeping every strongly connected component whole.
pub struct ShardPartitioner<'a> {
    config: &'a ShardingConfig,
    topology: Option<&'a TopologyInput>,
}

impl<'a> ShardPartitioner<'a> {
    pub fn new(config: &'a ShardingConfig, topology: Option<&'a TopologyInput>) -> Self {
        Self { config, topology }
    }

    /// Produces the ordered shard groups. Every input binding lands in
    /// exactly one group. A single resulting group is the flat
    /// unsharded form.
    pub fn partition(&self, bindings: Vec<PropertyBinding>) -> Vec<ShardGroup> {
        if bindings.is_empty() {
            return Vec::new();
        }

        let cap = self.config.max_bindings_per_shard;
        let topology = match self.topology {
            Some(topology)
                if self.config.enable_sharding
                    && !self.config.is_extension_graph
                    && bindings.len() > cap =>
            {
                topology
            }
            _ => return vec![ShardGroup::new(bindings)],
        };

        let input_order: Vec<TypeKey> = bindings.iter().map(|b| b.key.clone()).collect();
        let mut by_key: FxHashMap<TypeKey, PropertyBinding> = bindings
            .into_iter()
            .map(|binding| (binding.key.clone(), binding))
            .collect();
        let topo_keys: FxHashSet<&TypeKey> = topology.sorted_keys.iter().collect();

        // One walk over the global topological order: whole components
        // in first-seen order, component-less keys deferred to the end
        // in their relative topo order.
        let mut component_seen = vec![false; topology.components.len()];
        let mut units: Vec<Vec<TypeKey>> = Vec::new();
        let mut isolated: Vec<TypeKey> = Vec::new();
        for key in &topology.sorted_keys {
            if !by_key.contains_key(key) {
                continue;
            }
            match topology.component_of(key) {
                Some(id) => {
                    if !component_seen[id] {
                        component_seen[id] = true;
                        let members: Vec<TypeKey> = topology.components[id]
                            .keys
                            .iter()
                            .filter(|k| by_key.contains_key(k))
                            .cloned()
                            .collect();
                        units.push(members);
                    }
                }
                None => isolated.push(key.clone()),
            }
        }
        // Totality backstop: bindings the topo order never mentions
        // still need a shard. The upstream validator normally makes
        // this set empty.
        let leftovers = input_order
            .into_iter()
            .filter(|key| !topo_keys.contains(key));

        let singleton_units = isolated.into_iter().chain(leftovers).map(|key| vec![key]);

        // Greedy fill with whole units. A new shard starts only when the
        // unit would overflow a non-empty shard, so an oversized
        // component occupies one shard alone.
        let mut groups: Vec<ShardGroup> = Vec::new();
        let mut current: Vec<PropertyBinding> = Vec::new();
        for unit in units.into_iter().chain(singleton_units) {
            let mut members: Vec<PropertyBinding> = unit
                .iter()
                .filter_map(|key| by_key.remove(key))
                .collect();
            if members.is_empty() {
                continue;
            }
            if !current.is_empty() && current.len() + members.len() > cap {
                groups.push(ShardGroup::new(std::mem::take(&mut current)));
            }
            current.append(&mut members);
        }
        if !current.is_empty() {
            groups.push(ShardGroup::new(current));
        }

        // One tail-merge attempt suppresses a pathological tiny trailer.
        if groups.len() >= 2 {
            let last = groups.len() - 1;
            if groups[last - 1].len() + groups[last].len() <= cap {
                let tail = groups.swap_remove(last);
                groups[last - 1].bindings.extend(tail.bindings);
            }
        }

        debug!(
            shard_count = groups.len(),
            cap, "partitioned binding graph"
        );
        groups
    }
}
