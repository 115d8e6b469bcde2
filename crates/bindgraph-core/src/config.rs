use std::path::Path;

use crate::{BindGraphError, Result};
use ::config as cfg;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ShardingConfig {
    /// Split graphs above the cap into bounded shard units.
    #[serde(default)]
    pub enable_sharding: bool,
    /// Upper bound on bindings per shard. Soft for a single oversized
    /// component, hard otherwise.
    #[serde(default = "ShardingConfig::default_max_bindings_per_shard")]
    pub max_bindings_per_shard: usize,
    /// Extension graphs share a parent graph's live state and are never
    /// sharded.
    #[serde(default)]
    pub is_extension_graph: bool,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            enable_sharding: false,
            max_bindings_per_shard: Self::default_max_bindings_per_shard(),
            is_extension_graph: false,
        }
    }
}

impl ShardingConfig {
    fn default_max_bindings_per_shard() -> usize {
        3500
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bindings_per_shard == 0 {
            return Err(BindGraphError::Config(
                "max_bindings_per_shard must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Layered load: defaults, then an optional TOML file, then
    /// `BINDGRAPH_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = cfg::Config::builder()
            .set_default("enable_sharding", false)
            .and_then(|b| {
                b.set_default(
                    "max_bindings_per_shard",
                    Self::default_max_bindings_per_shard() as u64,
                )
            })
            .and_then(|b| b.set_default("is_extension_graph", false))
            .map_err(|e| BindGraphError::Config(e.to_string()))?;

        if let Some(path) = path {
            builder = builder.add_source(cfg::File::from(path));
        }
        builder =
            builder.add_source(cfg::Environment::with_prefix("BINDGRAPH").try_parsing(true));

        let settings = builder
            .build()
            .map_err(|e| BindGraphError::Config(e.to_string()))?;
        let config: Self = settings
            .try_deserialize()
            .map_err(|e| BindGraphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_conservative() {
        let config = ShardingConfig::default();
        assert!(!config.enable_sharding);
        assert!(!config.is_extension_graph);
        assert_eq!(config.max_bindings_per_shard, 3500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_cap_is_rejected() {
        let config = ShardingConfig {
            max_bindings_per_shard: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, BindGraphError::Config(_)));
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "enable_sharding = true").unwrap();
        writeln!(file, "max_bindings_per_shard = 12").unwrap();

        let config = ShardingConfig::load(Some(file.path())).unwrap();
        assert!(config.enable_sharding);
        assert_eq!(config.max_bindings_per_shard, 12);
        assert!(!config.is_extension_graph);
    }

    #[test]
    fn load_without_file_yields_defaults() {
        let config = ShardingConfig::load(None).unwrap();
        assert_eq!(config, ShardingConfig::default());
    }
}
