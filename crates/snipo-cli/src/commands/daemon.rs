use std::time::Duration;

use snipo_core::sync::{SyncScheduler, SyncService};

use crate::error::CliError;

/// Run scheduled sync passes until Ctrl-C
pub async fn run_daemon(service: SyncService, tick: Duration) -> Result<(), CliError> {
    let config = service.get_config().await?;
    if !config.enabled || !config.auto_sync {
        tracing::warn!(
            enabled = config.enabled,
            auto_sync = config.auto_sync,
            "Auto-sync is off; passes will be skipped until it is turned on"
        );
    }

    let scheduler = SyncScheduler::new(service, tick);
    scheduler.start();
    tracing::info!(tick_secs = tick.as_secs(), "Sync scheduler running; press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    scheduler.stop().await;
    signal?;

    tracing::info!("Sync scheduler stopped");
    Ok(())
}
