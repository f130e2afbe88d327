use std::io::{self, BufRead, Write};
use std::path::Path;

use memo_core::snapshot::{Snapshot, SnapshotEnvelope};
use memo_core::sync::{ConflictResolver, FixedResolver, MergeOutcome};
use memo_core::{MemoService, SyncConflict, SyncResolution};

use crate::cli::ImportStrategy;
use crate::commands::common::{
    format_conflict_lines, format_outcome_lines, format_timestamp, truncate_chars,
};
use crate::error::CliError;

pub async fn run_import(
    service: &MemoService,
    path: &Path,
    strategy: ImportStrategy,
    dry_run: bool,
    as_json: bool,
) -> Result<(), CliError> {
    let payload = std::fs::read_to_string(path)?;
    let snapshot = read_snapshot(&payload)?;

    if dry_run {
        let conflicts = service.preview_conflicts(&snapshot).await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&conflicts)?);
        } else if conflicts.is_empty() {
            println!("No conflicts.");
        } else {
            for line in format_conflict_lines(&conflicts) {
                println!("{line}");
            }
        }
        return Ok(());
    }

    let outcome = merge_with_strategy(service, &snapshot, strategy).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        for line in format_outcome_lines(&outcome) {
            println!("{line}");
        }
    }

    Ok(())
}

/// Plain snapshots only; encrypted envelopes need a cipher this binary lacks
pub fn read_snapshot(payload: &str) -> Result<Snapshot, CliError> {
    match SnapshotEnvelope::from_json_str(payload)? {
        SnapshotEnvelope::Plain(snapshot) => Ok(snapshot),
        SnapshotEnvelope::Encrypted(_) => Err(CliError::EncryptedSnapshot),
    }
}

pub async fn merge_with_strategy(
    service: &MemoService,
    snapshot: &Snapshot,
    strategy: ImportStrategy,
) -> Result<MergeOutcome, CliError> {
    let outcome = match strategy {
        ImportStrategy::Auto => service.merge_snapshot(snapshot).await?,
        ImportStrategy::Local => {
            service
                .merge_snapshot_with(snapshot, &FixedResolver(SyncResolution::Local))
                .await?
        }
        ImportStrategy::Remote => {
            service
                .merge_snapshot_with(snapshot, &FixedResolver(SyncResolution::Remote))
                .await?
        }
        ImportStrategy::Both => {
            service
                .merge_snapshot_with(snapshot, &FixedResolver(SyncResolution::Both))
                .await?
        }
        ImportStrategy::Ask => service.merge_snapshot_with(snapshot, &StdinResolver).await?,
    };
    Ok(outcome)
}

/// Asks on the terminal about each conflict
pub struct StdinResolver;

impl ConflictResolver for StdinResolver {
    async fn resolve(&self, conflicts: &[SyncConflict]) -> memo_core::Result<Vec<SyncResolution>> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        Ok(prompt_resolutions(conflicts, &mut stdin.lock(), &mut stdout)?)
    }
}

pub fn prompt_resolutions<R: BufRead, W: Write>(
    conflicts: &[SyncConflict],
    input: &mut R,
    output: &mut W,
) -> io::Result<Vec<SyncResolution>> {
    let mut resolutions = Vec::with_capacity(conflicts.len());

    for (index, conflict) in conflicts.iter().enumerate() {
        writeln!(
            output,
            "\nConflict {}/{}: {}",
            index + 1,
            conflicts.len(),
            conflict.title
        )?;
        writeln!(
            output,
            "  local  ({}): {}",
            format_timestamp(conflict.local_updated_at),
            truncate_chars(&conflict.local_content, 60)
        )?;
        writeln!(
            output,
            "  remote ({}): {}",
            format_timestamp(conflict.remote_updated_at),
            truncate_chars(&conflict.remote_content, 60)
        )?;

        loop {
            write!(output, "Keep [l]ocal, take [r]emote, or keep [b]oth? ")?;
            output.flush()?;

            let mut answer = String::new();
            if input.read_line(&mut answer)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed before every conflict was answered",
                ));
            }
            match answer.parse::<SyncResolution>() {
                Ok(resolution) => {
                    resolutions.push(resolution);
                    break;
                }
                Err(message) => writeln!(output, "{message}")?,
            }
        }
    }

    Ok(resolutions)
}
