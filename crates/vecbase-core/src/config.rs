//! Configuration for the vecbase core.
//!
//! Configuration is loaded in layers: `config/default.toml` (optional), then
//! environment variables with the `VECBASE` prefix. Nothing here changes core
//! algorithm semantics except the per-index parameter defaults, which a
//! caller may also override per build via
//! [`BuildOptions`](crate::index::BuildOptions).

use serde::{Deserialize, Serialize};

use crate::error::{Result, VecbaseError};
use crate::index::{HnswParams, LshParams};

/// Named constants used as configuration defaults.
pub mod defaults {
    /// Upper bound on the neighbor count `k` accepted by a search.
    pub const MAX_K: usize = 100;

    /// Upper bound on embedding dimension.
    pub const MAX_DIMENSION: usize = 4096;

    /// Upper bound on chunk text length, in characters.
    pub const MAX_TEXT_LENGTH: usize = 10_000;

    /// Upper bound on chunks per library, so a misconfigured library cannot
    /// exhaust memory.
    pub const MAX_CHUNKS_PER_LIBRARY: usize = 1_000_000;

    /// Neighbor count when a query leaves `k` unspecified.
    pub const DEFAULT_K: usize = 10;

    /// Build seed when none is supplied.
    pub const BUILD_SEED: u64 = 42;

    /// RP-LSH defaults (see DESIGN.md for the recall-floor tuning argument).
    pub mod lsh {
        /// Number of hash tables (L).
        pub const NUM_TABLES: usize = 24;
        /// Signature bits per table (H).
        pub const NUM_BITS: u32 = 8;
        /// Candidate pool multiplier over k (P).
        pub const PROBE_FACTOR: usize = 4;
        /// Candidate pool floor as a fraction of the collection size.
        pub const POOL_FRACTION: f64 = 0.25;
        /// Orchestrator oversampling multiplier for LSH queries.
        pub const OVERSAMPLE: usize = 4;
    }

    /// Hierarchical graph defaults.
    pub mod hnsw {
        /// Max neighbors per node on upper layers.
        pub const M: usize = 16;
        /// Construction beam width.
        pub const EF_CONSTRUCTION: usize = 200;
        /// Search beam width floor.
        pub const EF_SEARCH: usize = 50;
        /// Hard cap on sampled node levels.
        pub const MAX_LEVEL: usize = 16;
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

impl Config {
    /// Load configuration from files and environment.
    ///
    /// Sources, in order: `config/default.toml` (optional), then environment
    /// variables with the `VECBASE` prefix (`VECBASE__LIMITS__MAX_K=50`).
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::Environment::with_prefix("VECBASE").separator("__"));

        let cfg: Config = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VecbaseError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        let cfg: Config = toml::from_str(&content)
            .map_err(|e| VecbaseError::Config(format!("failed to parse config file: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_k == 0 {
            return Err(VecbaseError::Config("limits.max_k must be at least 1".into()));
        }
        if self.limits.max_dimension == 0 {
            return Err(VecbaseError::Config(
                "limits.max_dimension must be at least 1".into(),
            ));
        }
        if self.limits.max_text_length == 0 {
            return Err(VecbaseError::Config(
                "limits.max_text_length must be at least 1".into(),
            ));
        }
        let lsh = &self.index.lsh;
        if lsh.num_tables == 0 {
            return Err(VecbaseError::Config(
                "index.lsh.num_tables must be at least 1".into(),
            ));
        }
        if lsh.num_bits == 0 || lsh.num_bits > 32 {
            return Err(VecbaseError::Config(
                "index.lsh.num_bits must be in 1..=32".into(),
            ));
        }
        if !(lsh.pool_fraction > 0.0 && lsh.pool_fraction <= 1.0) {
            return Err(VecbaseError::Config(
                "index.lsh.pool_fraction must be in (0, 1]".into(),
            ));
        }
        let hnsw = &self.index.hnsw;
        if hnsw.m < 2 {
            return Err(VecbaseError::Config("index.hnsw.m must be at least 2".into()));
        }
        if hnsw.ef_construction == 0 || hnsw.ef_search == 0 {
            return Err(VecbaseError::Config(
                "index.hnsw.ef_construction and ef_search must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing filter, e.g. "info" or "vecbase_core=debug".
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Resource limits guarding the store against misconfigured callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_k: usize,
    pub max_dimension: usize,
    pub max_text_length: usize,
    pub max_chunks_per_library: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_k: defaults::MAX_K,
            max_dimension: defaults::MAX_DIMENSION,
            max_text_length: defaults::MAX_TEXT_LENGTH,
            max_chunks_per_library: defaults::MAX_CHUNKS_PER_LIBRARY,
        }
    }
}

/// Index parameter defaults applied when a build does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Seed used by `index_library` when the caller does not pass one.
    pub seed: u64,
    #[serde(default)]
    pub lsh: LshParams,
    #[serde(default)]
    pub hnsw: HnswParams,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            seed: defaults::BUILD_SEED,
            lsh: LshParams::default(),
            hnsw: HnswParams::default(),
        }
    }
}
