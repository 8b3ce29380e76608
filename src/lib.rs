pub mod frame;
pub mod price;
pub mod providers;
pub mod sdk;
pub mod settings;
mod utils;

use std::{env, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use log::info;

use frame::{FrameController, LogPresenter};
use providers::AnnouncementStore;
use sdk::{HeadlessSdk, SessionContext};
use settings::FrameSettings;

const SETTINGS_ENV: &str = "CLANKER_FRAME_SETTINGS";
const CONTEXT_ENV: &str = "CLANKER_FRAME_CONTEXT";
const DEFAULT_SETTINGS_PATH: &str = "frame-settings.json";

/// Runs one frame view against the in-process host until Ctrl-C.
pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("clanker-frame starting up...");

    let settings_path = env::var(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = FrameSettings::load(&settings_path)?;
    let context = load_host_context()?;

    // The view model is single-threaded and cooperative.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(settings, context))
}

fn load_host_context() -> Result<Option<SessionContext>> {
    read_host_context(env::var(CONTEXT_ENV).ok().as_deref())
}

fn read_host_context(path: Option<&str>) -> Result<Option<SessionContext>> {
    let Some(path) = path else {
        info!("{CONTEXT_ENV} not set; using an empty, unregistered session");
        return Ok(Some(SessionContext::default()));
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read host context from {path}"))?;
    let context = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse host context in {path}"))?;
    Ok(Some(context))
}

async fn serve(settings: FrameSettings, context: Option<SessionContext>) -> Result<()> {
    let controller = FrameController::builder(
        settings,
        Arc::new(HeadlessSdk::new(context)),
        Arc::new(LogPresenter),
    )
    .providers(Arc::new(AnnouncementStore::new()))
    .build()?;

    controller.mount().await?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("clanker-frame shutting down");
    controller.unmount().await
}
