use std::path::{Path, PathBuf};

use chrono::Local;
use memo_core::snapshot::suggested_snapshot_file_name;
use memo_core::sync::ExportFilter;
use memo_core::{LogId, MemoService};

use crate::error::CliError;

pub async fn run_export(
    service: &MemoService,
    ids: Vec<LogId>,
    exclude: Vec<LogId>,
    focus: Option<LogId>,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let filter = build_filter(service, ids, exclude, focus).await?;
    let snapshot = service.export_snapshot(&filter).await?;
    let rendered = snapshot.to_json_pretty()?;

    if let Some(path) = output {
        let target = output_target(path, filter.is_partial(), Local::now().date_naive());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, rendered)?;
        tracing::info!("Exported {} logs", snapshot.logs.len());
        println!("{}", target.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// `--focus` narrows the export to the scope around one log
pub async fn build_filter(
    service: &MemoService,
    ids: Vec<LogId>,
    exclude: Vec<LogId>,
    focus: Option<LogId>,
) -> Result<ExportFilter, CliError> {
    let filter = if let Some(focus) = focus {
        if service.get_log(focus).await?.is_none() {
            return Err(CliError::LogNotFound(focus.get()));
        }
        service
            .resolve_sync_scope(Some(focus))
            .await?
            .map_or_else(ExportFilter::all, ExportFilter::only)
    } else if ids.is_empty() {
        ExportFilter::all()
    } else {
        ExportFilter::only(ids)
    };

    Ok(filter.excluding(exclude))
}

/// An existing directory receives a dated file name
pub fn output_target(path: &Path, partial: bool, date: chrono::NaiveDate) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_snapshot_file_name(partial, date))
    } else {
        path.to_path_buf()
    }
}
