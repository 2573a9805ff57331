use snipo_core::sync::SyncService;

use crate::commands::common::{format_log_lines, log_entry_to_item, LogItem};
use crate::error::CliError;

pub async fn run_log(service: &SyncService, limit: usize, as_json: bool) -> Result<(), CliError> {
    let items = service
        .list_log(limit)
        .await?
        .iter()
        .map(log_entry_to_item)
        .collect::<Vec<LogItem>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("Sync log is empty.");
        return Ok(());
    }

    for line in format_log_lines(&items) {
        println!("{line}");
    }
    Ok(())
}
