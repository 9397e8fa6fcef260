//! Configuration loading and sync backend factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use stylerate_core::session::AnswerPolicy;
use stylerate_core::traits::RemoteSync;
use stylerate_export::ExportOptions;

use crate::http::{HttpSync, DEFAULT_TIMEOUT_SECS};

/// Environment variable that sets (or replaces) the sync endpoint.
pub const SYNC_URL_ENV: &str = "STYLERATE_SYNC_URL";

/// Remote endpoint results are forwarded to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Top-level stylerate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylerateConfig {
    /// Question bank CSV.
    #[serde(default)]
    pub questions: Option<PathBuf>,
    /// Directory result files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// How unanswered and duplicate selections are treated.
    #[serde(default)]
    pub policy: AnswerPolicy,
    /// Fixed shuffle seed, for reproducible layouts.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub export: ExportOptions,
    #[serde(default)]
    pub sync: Option<SyncConfig>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./results")
}

impl Default for StylerateConfig {
    fn default() -> Self {
        Self {
            questions: None,
            output_dir: default_output_dir(),
            policy: AnswerPolicy::default(),
            seed: None,
            export: ExportOptions::default(),
            sync: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(len) = result[start..].find('}') else {
            break;
        };
        let value = std::env::var(&result[start + 2..start + len]).unwrap_or_default();
        result.replace_range(start..start + len + 1, &value);
        from = start + value.len();
    }
    result
}

/// Apply the endpoint override and drop a sync section whose URL resolved
/// to nothing.
fn apply_sync_override(config: &mut StylerateConfig, override_url: Option<String>) {
    if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
        match &mut config.sync {
            Some(sync) => sync.url = url,
            None => {
                config.sync = Some(SyncConfig {
                    url,
                    timeout_secs: DEFAULT_TIMEOUT_SECS,
                })
            }
        }
    }

    if let Some(sync) = &mut config.sync {
        sync.url = resolve_env_vars(&sync.url).trim().to_string();
        if sync.url.is_empty() {
            tracing::debug!("sync URL is empty, remote sync disabled");
            config.sync = None;
        }
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `stylerate.toml` in the current directory
/// 2. `~/.config/stylerate/config.toml`
///
/// `STYLERATE_SYNC_URL` overrides the sync endpoint.
pub fn load_config() -> Result<StylerateConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<StylerateConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("stylerate.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<StylerateConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => StylerateConfig::default(),
    };

    apply_sync_override(&mut config, std::env::var(SYNC_URL_ENV).ok());
    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("stylerate"))
}

/// Create a sync backend from its configuration.
pub fn create_sync(config: &SyncConfig) -> Result<Arc<dyn RemoteSync>> {
    let sync = HttpSync::new(&config.url, config.timeout_secs)
        .context("failed to set up remote sync")?;
    Ok(Arc::new(sync))
}
