use snipo_core::models::SyncConfigUpdate;
use snipo_core::sync::SyncService;

use crate::cli::ConfigSetArgs;
use crate::commands::common::{config_to_view, format_config_lines};
use crate::error::CliError;

pub async fn run_show(service: &SyncService, as_json: bool) -> Result<(), CliError> {
    let view = config_to_view(&service.get_config().await?);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    for line in format_config_lines(&view) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_set(service: &SyncService, args: ConfigSetArgs) -> Result<(), CliError> {
    let update = config_update_from_args(args)?;
    let config = service.update_config(update).await?;

    println!("Sync settings updated");
    for line in format_config_lines(&config_to_view(&config)) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_clear(service: &SyncService) -> Result<(), CliError> {
    service.clear_config().await?;
    println!("Sync settings cleared; existing links were kept");
    Ok(())
}

pub async fn run_test_token(service: &SyncService, token: &str) -> Result<(), CliError> {
    let login = service.test_credential(token).await?;
    println!("Token is valid for GitHub user {login}");
    Ok(())
}

pub fn config_update_from_args(args: ConfigSetArgs) -> Result<SyncConfigUpdate, CliError> {
    let update = SyncConfigUpdate {
        enabled: args.enabled,
        github_token: args.token,
        auto_sync: args.auto_sync,
        sync_interval_minutes: args.interval,
        conflict_strategy: args.strategy.map(Into::into),
    };

    if update == SyncConfigUpdate::default() {
        return Err(CliError::EmptyUpdate);
    }
    Ok(update)
}
