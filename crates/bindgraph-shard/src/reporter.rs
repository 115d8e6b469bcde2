use crate::ShardPlan;

/// Renders a shard plan as a stable, human-readable report. The text is
/// for diagnostics only; its structure is stable but it is not a
/// machine-parseable contract.
pub struct ShardReporter;

/// Member listings longer than this are elided to the first and last
/// five keys.
const MEMBER_LISTING_LIMIT: usize = 10;

impl ShardReporter {
    pub fn render(plan: &ShardPlan) -> String {
        let mut out = String::new();

        out.push_str("Binding graph shard report\n");
        out.push_str(&format!("  total bindings: {}\n", plan.total_bindings));
        out.push_str(&format!("  shards: {}\n", plan.shards.len()));
        out.push_str(&format!(
            "  max bindings per shard: {}\n",
            plan.config.max_bindings_per_shard
        ));
        out.push_str(&format!(
            "  sharding enabled: {}\n",
            plan.config.enable_sharding
        ));
        out.push('\n');

        let order_labels: Vec<&str> = plan
            .init_order()
            .into_iter()
            .map(|index| plan.shards[index].unit.name())
            .collect();
        if order_labels.is_empty() {
            out.push_str("Initialization order: (none)\n");
        } else {
            out.push_str(&format!(
                "Initialization order: {}\n",
                order_labels.join(", ")
            ));
        }
        out.push('\n');

        for shard in &plan.shards {
            out.push_str(&format!(
                "{}: {} bindings, {} outgoing cross-shard edges\n",
                shard.unit.name(),
                shard.group.len(),
                plan.schedule.outgoing_edges(shard.index)
            ));
            Self::render_members(&mut out, shard.group.keys().map(|k| k.as_str()));
            out.push('\n');
        }

        out.push_str("Cross-shard dependencies:\n");
        if plan.schedule.cross_edges.is_empty() {
            out.push_str("  (none)\n");
        } else {
            for edge in &plan.schedule.cross_edges {
                out.push_str(&format!(
                    "  {}.{} -> {}.{}\n",
                    plan.shards[edge.from_shard].unit.name(),
                    edge.from_key,
                    plan.shards[edge.to_shard].unit.name(),
                    edge.to_key
                ));
            }
        }
        out.push_str(&format!("  total: {}\n", plan.schedule.cross_edges.len()));

        out
    }

    fn render_members<'k>(out: &mut String, keys: impl Iterator<Item = &'k str>) {
        let keys: Vec<&str> = keys.collect();
        if keys.len() <= MEMBER_LISTING_LIMIT {
            for key in keys {
                out.push_str(&format!("  {}\n", key));
            }
            return;
        }
        for key in &keys[..5] {
            out.push_str(&format!("  {}\n", key));
        }
        out.push_str(&format!("  ... ({} more) ...\n", keys.len() - 10));
        for key in &keys[keys.len() - 5..] {
            out.push_str(&format!("  {}\n", key));
        }
    }
}
