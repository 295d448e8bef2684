use anyhow::Result;
use load_profile_forecaster::{config, controller, telemetry};
use config::Config;
use telemetry::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;
    let app_state = controller::AppState::new(cfg.clone())?;

    info!(
        store = %cfg.sources.store_path,
        strategies = cfg.sources.strategies().len(),
        timezone = cfg.timezone.as_deref().unwrap_or("local"),
        "starting load profile forecaster"
    );

    let cancel = CancellationToken::new();
    let scheduler = controller::spawn_profile_tasks(&app_state, cancel.clone());

    telemetry::shutdown_signal().await;
    cancel.cancel();
    if let Err(e) = scheduler.await {
        warn!(error = %e, "scheduler task ended abnormally");
    }

    warn!("shutdown complete");
    Ok(())
}
