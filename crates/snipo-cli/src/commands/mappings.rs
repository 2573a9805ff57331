use snipo_core::sync::SyncService;

use crate::commands::common::{current_time_ms, format_mapping_lines, mapping_to_item, MappingItem};
use crate::error::CliError;

pub async fn run_mappings(service: &SyncService, as_json: bool) -> Result<(), CliError> {
    let now = current_time_ms();
    let items = service
        .list_mappings()
        .await?
        .iter()
        .map(|mapping| mapping_to_item(mapping, now))
        .collect::<Vec<MappingItem>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No snippets are linked to gists.");
        return Ok(());
    }

    for line in format_mapping_lines(&items) {
        println!("{line}");
    }
    Ok(())
}
