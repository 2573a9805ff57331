use snipo_core::sync::{EnableAllReport, SyncReport, SyncService};

use crate::commands::common::parse_snippet_id;
use crate::error::CliError;

pub async fn run_sync(service: &SyncService, snippet_id: Option<&str>) -> Result<(), CliError> {
    if let Some(raw_id) = snippet_id {
        let snippet_id = parse_snippet_id(raw_id)?;
        let outcome = service.sync_snippet(&snippet_id).await?;
        println!("{snippet_id}: {outcome}");
        return Ok(());
    }

    let report = service.sync_all().await?;
    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_enable(
    service: &SyncService,
    snippet_id: Option<&str>,
    all: bool,
) -> Result<(), CliError> {
    if all {
        let report = service.enable_sync_all().await?;
        for line in format_enable_report(&report) {
            println!("{line}");
        }
        return Ok(());
    }

    let raw_id = snippet_id.ok_or(CliError::MissingTarget)?;
    let mapping = service.enable_sync(&parse_snippet_id(raw_id)?).await?;
    println!(
        "Linked {} to gist {} ({})",
        mapping.snippet_id, mapping.gist_id, mapping.gist_url
    );
    Ok(())
}

pub async fn run_disable(
    service: &SyncService,
    snippet_id: &str,
    delete_remote: bool,
) -> Result<(), CliError> {
    let snippet_id = parse_snippet_id(snippet_id)?;
    service.disable_sync(&snippet_id, delete_remote).await?;

    if delete_remote {
        println!("Deleted gist and unlinked {snippet_id}");
    } else {
        println!("Sync disabled for {snippet_id}");
    }
    Ok(())
}

pub async fn run_unlink(service: &SyncService, snippet_id: &str) -> Result<(), CliError> {
    let snippet_id = parse_snippet_id(snippet_id)?;
    service.delete_mapping(&snippet_id).await?;
    println!("Unlinked {snippet_id}; the snippet and its gist were left in place");
    Ok(())
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Processed {}: {} synced, {} conflicts, {} errors",
        report.processed, report.synced, report.conflicts, report.errors
    )];
    lines.extend(report.messages.iter().map(|message| format!("  {message}")));
    lines
}

pub fn format_enable_report(report: &EnableAllReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Processed {}: {} linked, {} already linked, {} errors",
        report.processed, report.created, report.skipped, report.errors
    )];
    lines.extend(report.messages.iter().map(|message| format!("  {message}")));
    lines
}
