//! Routing configuration
//!
//! One process-wide `RoutingConfig` is read at startup and injected into the
//! router. It can come from a `tessera.toml` section or from environment
//! variables (the deployment surface of most catalog installations). Invalid
//! numeric input falls back to the documented default with a logged warning
//! rather than failing startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Default maximum partition size in gigabytes before a forward split.
pub const DEFAULT_MAX_PARTITION_SIZE_GB: f64 = 25.0;

/// Default alias-cache time-to-live in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default prefix shared by every item index and alias.
pub const DEFAULT_INDEX_PREFIX: &str = "items_";

/// Process-wide routing configuration.
///
/// The partitioning mode is a single flag consumed by both the read and the
/// write factory, so the two paths can never disagree about whether a
/// collection is time-partitioned.
///
/// # Example
///
/// ```toml
/// # Route items into time-partitioned indices (false = one index per collection)
/// datetime_partitioning = true
///
/// # Track start_datetime/datetime/end_datetime boundaries independently
/// # (false = single "datetime" boundary per partition)
/// triple_fields = true
///
/// # Consult the nominal datetime boundary on reads as well
/// use_datetime = false
///
/// max_partition_size_gb = 25.0
/// cache_ttl_secs = 3600
/// index_prefix = "items_"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Time-partitioned indices on/off. Off selects the simple
    /// one-index-per-collection strategy.
    #[serde(default)]
    pub datetime_partitioning: bool,
    /// Track three boundary fields per partition instead of one.
    #[serde(default)]
    pub triple_fields: bool,
    /// In triple-field mode, also consult the nominal `datetime` boundary
    /// when selecting indices for a read.
    #[serde(default)]
    pub use_datetime: bool,
    /// Maximum partition size in gigabytes before a forward split.
    #[serde(default = "default_max_partition_size_gb")]
    pub max_partition_size_gb: f64,
    /// Alias-cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Prefix shared by every item index and alias.
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,
}

fn default_max_partition_size_gb() -> f64 {
    DEFAULT_MAX_PARTITION_SIZE_GB
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_index_prefix() -> String {
    DEFAULT_INDEX_PREFIX.to_string()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            datetime_partitioning: false,
            triple_fields: false,
            use_datetime: false,
            max_partition_size_gb: DEFAULT_MAX_PARTITION_SIZE_GB,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            index_prefix: DEFAULT_INDEX_PREFIX.to_string(),
        }
    }
}

impl RoutingConfig {
    /// Parse a config from TOML text.
    ///
    /// # Errors
    /// Returns `Error::Config` if the text is not valid TOML for this schema.
    pub fn from_toml_str(text: &str) -> crate::error::Result<Self> {
        let mut config: RoutingConfig =
            toml::from_str(text).map_err(|e| crate::error::Error::Config(e.to_string()))?;
        config.normalize();
        Ok(config)
    }

    /// Read the config from `TESSERA_*` environment variables.
    ///
    /// Unset variables keep their defaults. A non-numeric or non-positive
    /// size/TTL keeps the default and logs a warning.
    pub fn from_env() -> Self {
        let mut config = RoutingConfig {
            datetime_partitioning: env_flag("TESSERA_DATETIME_PARTITIONING"),
            triple_fields: env_flag("TESSERA_TRIPLE_FIELDS"),
            use_datetime: env_flag("TESSERA_USE_DATETIME"),
            ..Default::default()
        };
        if let Ok(raw) = std::env::var("TESSERA_MAX_PARTITION_SIZE_GB") {
            config.max_partition_size_gb = parse_size_gb(&raw);
        }
        if let Ok(raw) = std::env::var("TESSERA_CACHE_TTL_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.cache_ttl_secs = secs,
                _ => warn!(
                    target: "tessera::config",
                    value = %raw,
                    default = DEFAULT_CACHE_TTL_SECS,
                    "Invalid TESSERA_CACHE_TTL_SECS, using default"
                ),
            }
        }
        if let Ok(prefix) = std::env::var("TESSERA_INDEX_PREFIX") {
            if !prefix.is_empty() {
                config.index_prefix = prefix;
            }
        }
        config
    }

    /// Cache TTL as a `Duration`.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Clamp out-of-range values back to defaults, logging once per field.
    fn normalize(&mut self) {
        if !(self.max_partition_size_gb.is_finite() && self.max_partition_size_gb > 0.0) {
            warn!(
                target: "tessera::config",
                value = self.max_partition_size_gb,
                default = DEFAULT_MAX_PARTITION_SIZE_GB,
                "Non-positive max_partition_size_gb, using default"
            );
            self.max_partition_size_gb = DEFAULT_MAX_PARTITION_SIZE_GB;
        }
        if self.cache_ttl_secs == 0 {
            warn!(
                target: "tessera::config",
                default = DEFAULT_CACHE_TTL_SECS,
                "Zero cache_ttl_secs, using default"
            );
            self.cache_ttl_secs = DEFAULT_CACHE_TTL_SECS;
        }
    }
}

/// Parse a size-in-GB string, falling back to the default on bad input.
fn parse_size_gb(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(gb) if gb.is_finite() && gb > 0.0 => gb,
        _ => {
            warn!(
                target: "tessera::config",
                value = %raw,
                default = DEFAULT_MAX_PARTITION_SIZE_GB,
                "Invalid max partition size, using default"
            );
            DEFAULT_MAX_PARTITION_SIZE_GB
        }
    }
}

/// Truthy environment flag: "1", "true", "yes", "on" (case-insensitive).
fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
