use snipo_core::sync::SyncService;

use crate::cli::KeepSide;
use crate::commands::common::{conflict_to_item, format_conflict_lines, ConflictItem};
use crate::error::CliError;

pub async fn run_conflicts(
    service: &SyncService,
    include_resolved: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let items = service
        .list_conflicts(include_resolved)
        .await?
        .iter()
        .map(conflict_to_item)
        .collect::<Vec<ConflictItem>>();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    for line in format_conflict_lines(&items) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_resolve(
    service: &SyncService,
    conflict_id: i64,
    keep: KeepSide,
) -> Result<(), CliError> {
    let mapping = service.resolve_conflict(conflict_id, keep.into()).await?;
    println!(
        "Resolved conflict #{conflict_id}; snippet {} is {}",
        mapping.snippet_id, mapping.status
    );
    Ok(())
}
