use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/medq/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedqConfig {
    /// Maximum number of download workers (one per session).
    pub max_threads: usize,
    /// Attempts per job before it is archived as failed (including the first).
    pub max_retries: u32,
    /// Seconds to wait between attempts after a recoverable failure.
    pub recoverable_fail_wait_delay: f64,
    /// Bytes read from the stream per chunk.
    pub chunk_size: usize,
    /// Seconds a worker waits after each download before taking the next job.
    pub download_delay: f64,
    /// Bytes short of the announced length that still count as a complete stream.
    pub dl_end_padding_bytes: u64,
    /// Cancellation requests at or above this percent are ignored.
    pub cancel_threshold_percent: u8,
    /// Root directory for finished downloads.
    pub download_root: PathBuf,
}

impl Default for MedqConfig {
    fn default() -> Self {
        Self {
            max_threads: 1,
            max_retries: 3,
            recoverable_fail_wait_delay: 10.0,
            chunk_size: 50_000,
            download_delay: 5.0,
            dl_end_padding_bytes: 167,
            cancel_threshold_percent: 95,
            download_root: PathBuf::from("downloads"),
        }
    }
}

impl MedqConfig {
    pub fn recoverable_fail_wait_delay(&self) -> Duration {
        secs(self.recoverable_fail_wait_delay)
    }

    pub fn download_delay(&self) -> Duration {
        secs(self.download_delay)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_threads == 0 {
            anyhow::bail!("max_threads must be at least 1");
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0");
        }
        if self.cancel_threshold_percent > 100 {
            anyhow::bail!(
                "cancel_threshold_percent must be at most 100 (got {})",
                self.cancel_threshold_percent
            );
        }
        Ok(())
    }
}

fn secs(v: f64) -> Duration {
    if v.is_finite() && v > 0.0 {
        Duration::from_secs_f64(v)
    } else {
        Duration::ZERO
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("medq")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MedqConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MedqConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: MedqConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
