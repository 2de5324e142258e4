// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::providers::bmkg::DEFAULT_FEED_URL;
use crate::merge::MergeKey;

pub const ENV_CONFIG_PATH: &str = "QUAKE_CONFIG_PATH";
pub const ENV_FEED_URL: &str = "QUAKE_FEED_URL";
pub const ENV_SNAPSHOT_PATH: &str = "QUAKE_SNAPSHOT_PATH";
pub const ENV_MERGE_KEY: &str = "QUAKE_MERGE_KEY";
pub const ENV_INTERVAL_SECS: &str = "QUAKE_INTERVAL_SECS";

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/gempa.json";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub feed_url: String,
    pub snapshot_path: PathBuf,
    pub merge_key: MergeKey,
    /// 0 = run a single cycle and exit.
    pub interval_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            merge_key: MergeKey::Id,
            interval_secs: 0,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
        }
    }
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }
}

/// On-disk shape; every key optional.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    feed_url: Option<String>,
    snapshot_path: Option<PathBuf>,
    merge_key: Option<String>,
    interval_secs: Option<u64>,
    fetch_timeout_secs: Option<u64>,
}

/// Load from an explicit TOML file, then apply env overrides.
pub fn load_config_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    let file: FileConfig = toml::from_str(&content)
        .with_context(|| format!("parsing pipeline config {}", path.display()))?;
    let cfg = apply_file(PipelineConfig::default(), file)?;
    apply_env(cfg)
}

/// Load using env var + fallbacks:
/// 1) $QUAKE_CONFIG_PATH
/// 2) config/pipeline.toml
/// 3) built-in defaults
///
/// Env overrides apply in every case.
pub fn load_config_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let p = PathBuf::from(DEFAULT_CONFIG_PATH);
    if p.exists() {
        return load_config_from(&p);
    }
    apply_env(PipelineConfig::default())
}

fn apply_file(mut cfg: PipelineConfig, file: FileConfig) -> Result<PipelineConfig> {
    if let Some(url) = file.feed_url {
        cfg.feed_url = url;
    }
    if let Some(p) = file.snapshot_path {
        cfg.snapshot_path = p;
    }
    if let Some(k) = file.merge_key {
        cfg.merge_key = k.parse().context("merge_key in pipeline config")?;
    }
    if let Some(s) = file.interval_secs {
        cfg.interval_secs = s;
    }
    if let Some(s) = file.fetch_timeout_secs {
        cfg.fetch_timeout_secs = s;
    }
    Ok(cfg)
}

fn apply_env(mut cfg: PipelineConfig) -> Result<PipelineConfig> {
    if let Some(url) = env_nonempty(ENV_FEED_URL) {
        cfg.feed_url = url;
    }
    if let Some(p) = env_nonempty(ENV_SNAPSHOT_PATH) {
        cfg.snapshot_path = PathBuf::from(p);
    }
    if let Some(k) = env_nonempty(ENV_MERGE_KEY) {
        cfg.merge_key = k.parse().context(ENV_MERGE_KEY)?;
    }
    if let Some(s) = env_nonempty(ENV_INTERVAL_SECS) {
        cfg.interval_secs = s
            .trim()
            .parse()
            .with_context(|| format!("{ENV_INTERVAL_SECS} must be whole seconds"))?;
    }
    Ok(cfg)
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let file: FileConfig = toml::from_str(
            r#"
snapshot_path = "out/history.json"
merge_key = "fingerprint"
interval_secs = 300
"#,
        )
        .unwrap();
        let cfg = apply_file(PipelineConfig::default(), file).unwrap();
        assert_eq!(cfg.snapshot_path, PathBuf::from("out/history.json"));
        assert_eq!(cfg.merge_key, MergeKey::Fingerprint);
        assert_eq!(cfg.interval_secs, 300);
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
    }

    #[test]
    fn unknown_merge_key_is_rejected() {
        let file: FileConfig = toml::from_str(r#"merge_key = "location""#).unwrap();
        let err = apply_file(PipelineConfig::default(), file).unwrap_err();
        assert!(
            err.chain().any(|c| c.to_string().contains("unknown merge key")),
            "{err:#}"
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(toml::from_str::<FileConfig>(r#"mergekey = "id""#).is_err());
    }
}
