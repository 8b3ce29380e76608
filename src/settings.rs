use std::{env, fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1bc0c42215582d5a085795f4badbac3ff36d1bcb";
pub const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3/simple/token_price/base";
pub const DEFAULT_TITLE: &str = "$CLANKER Price Tracker";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_CONTEXT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

const API_URL_ENV: &str = "CLANKER_FRAME_API_URL";
const POLL_INTERVAL_ENV: &str = "CLANKER_FRAME_POLL_INTERVAL_MS";

/// Static configuration for one frame view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameSettings {
    pub contract_address: String,
    pub api_url: String,
    pub title: String,
    pub poll_interval_ms: u64,
    /// `None` waits for the host context forever.
    pub context_timeout_ms: Option<u64>,
    pub request_timeout_ms: u64,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS.into(),
            api_url: DEFAULT_API_URL.into(),
            title: DEFAULT_TITLE.into(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            context_timeout_ms: Some(DEFAULT_CONTEXT_TIMEOUT_MS),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl FrameSettings {
    /// Reads settings from `path` when it exists, then applies environment
    /// overrides and validates the result.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse settings in {}", path.display()))?
        } else {
            info!("No settings at {}; using defaults", path.display());
            FrameSettings::default()
        };

        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(env::var(API_URL_ENV).ok(), env::var(POLL_INTERVAL_ENV).ok())
    }

    /// Applies already looked-up override values; `None` keeps the field.
    fn apply_overrides(
        &mut self,
        api_url: Option<String>,
        poll_interval: Option<String>,
    ) -> Result<()> {
        if let Some(url) = api_url {
            self.api_url = url;
        }

        if let Some(raw) = poll_interval {
            self.poll_interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{POLL_INTERVAL_ENV} must be milliseconds, got '{raw}'"))?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let address = self.contract_address.trim();
        if address.is_empty() {
            bail!("contractAddress must not be empty");
        }
        if !address.starts_with("0x") {
            bail!("contractAddress '{address}' must be 0x-prefixed");
        }
        if self.api_url.trim().is_empty() {
            bail!("apiUrl must not be empty");
        }
        if self.poll_interval_ms == 0 {
            bail!("pollIntervalMs must be greater than zero");
        }
        if self.context_timeout_ms == Some(0) {
            warn!("contextTimeoutMs is 0; initialization will time out immediately");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn context_timeout(&self) -> Option<Duration> {
        self.context_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
