//! Builds a small binding graph, shards it, and prints the diagnostic
//! report. Run with `cargo run --example shard_report`.

use bindgraph_core::{
    Component, MemoryBindingGraph, PropertyBinding, ShardingConfig, TopologyInput, TracingSink,
    TypeKey,
};
use bindgraph_shard::{ShardEngine, ShardReporter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let layers = [
        ("Config", vec![]),
        ("Database", vec!["Config"]),
        ("Cache", vec!["Config"]),
        ("UserRepo", vec!["Database", "Cache"]),
        ("AuthService", vec!["UserRepo"]),
        ("ApiServer", vec!["AuthService", "UserRepo"]),
    ];

    let mut graph = MemoryBindingGraph::new();
    let mut sorted_keys = Vec::new();
    let mut components = Vec::new();
    for (id, (name, _)) in layers.iter().enumerate() {
        graph.insert_concrete(*name);
        sorted_keys.push(TypeKey::from(*name));
        components.push(Component::new(id, vec![TypeKey::from(*name)]));
    }
    // An alias the scheduler has to see through.
    graph.insert_alias("Sessions", "Cache");
    sorted_keys.push(TypeKey::from("Sessions"));
    components.push(Component::new(components.len(), vec![TypeKey::from("Sessions")]));

    let mut topology = TopologyInput::new(sorted_keys, components);
    for (name, deps) in &layers {
        for dep in deps {
            graph.add_dependency(*name, *dep);
            topology.add_dependency(*name, *dep);
        }
    }
    graph.add_dependency("AuthService", "Sessions");
    topology.add_dependency("AuthService", "Sessions");

    let config = ShardingConfig {
        enable_sharding: true,
        max_bindings_per_shard: 3,
        is_extension_graph: false,
    };
    let mut bindings: Vec<PropertyBinding> = layers
        .iter()
        .map(|(name, _)| PropertyBinding::concrete(*name))
        .collect();
    bindings.push(PropertyBinding::alias("Sessions", "Cache"));

    let mut engine = ShardEngine::new(&graph, Some(&topology), config);
    let mut sink = TracingSink;
    let plan = engine.plan(bindings, &mut sink)?;
    print!("{}", ShardReporter::render(&plan));
    Ok(())
}
