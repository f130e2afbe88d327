use memo_core::sync::{ScopeKind, SyncScope};
use memo_core::{LogId, MemoService};

use crate::error::CliError;

pub async fn run_scope(
    service: &MemoService,
    focus: Option<LogId>,
    as_json: bool,
) -> Result<(), CliError> {
    if let Some(id) = focus {
        if service.get_log(id).await?.is_none() {
            return Err(CliError::LogNotFound(id.get()));
        }
    }

    let scope = service.analyze_sync_scope(focus).await?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&scope)?);
    } else {
        println!("{}", describe_scope(&scope));
    }

    Ok(())
}

pub fn describe_scope(scope: &SyncScope) -> String {
    let noun = if scope.count == 1 { "log" } else { "logs" };
    match scope.kind {
        ScopeKind::Full => format!("{}: {} {noun}", scope.label, scope.count),
        ScopeKind::Thread => format!("Thread \"{}\": {} {noun}", scope.label, scope.count),
        ScopeKind::Single => format!("Log \"{}\"", scope.label),
    }
}
