use std::io::{self, Cursor};

use memo_core::models::{Log, NewLog};
use memo_core::sync::{MergeOutcome, ScopeKind, SyncScope};
use memo_core::{LogId, MemoService, SyncConflict, SyncResolution};
use pretty_assertions::assert_eq;

use crate::cli::ImportStrategy;
use crate::commands::common::{
    format_outcome_lines, format_relative_time, format_timestamp, log_preview, render_tags,
    truncate_chars,
};
use crate::commands::export::{build_filter, output_target};
use crate::commands::import::{merge_with_strategy, prompt_resolutions, read_snapshot};
use crate::commands::scope::describe_scope;
use crate::error::CliError;

fn log(title: &str, content: &str) -> Log {
    Log {
        id: LogId::new(1),
        title: title.to_string(),
        content: content.to_string(),
        tags: Vec::new(),
        model_id: None,
        folder_id: None,
        thread_id: None,
        thread_order: None,
        pinned_at: None,
        created_at: 0,
        updated_at: 0,
    }
}

fn conflict(title: &str) -> SyncConflict {
    SyncConflict {
        title: title.to_string(),
        local_id: LogId::new(1),
        local_updated_at: 1_000,
        remote_updated_at: 2_000,
        local_content: "mine".to_string(),
        remote_content: "theirs".to_string(),
    }
}

#[test]
fn relative_time_buckets() {
    let now = 1_000_000_000;
    assert_eq!(format_relative_time(now - 5_000, now), "just now");
    assert_eq!(format_relative_time(now - 3 * 60_000, now), "3m ago");
    assert_eq!(format_relative_time(now - 2 * 3_600_000, now), "2h ago");
    assert_eq!(format_relative_time(now - 3 * 86_400_000, now), "3d ago");
}

#[test]
fn timestamp_formats_as_utc() {
    assert_eq!(format_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn truncate_chars_adds_ellipsis() {
    assert_eq!(
        truncate_chars("This is a very long sentence that should be shortened", 20),
        "This is a very lo..."
    );
    assert_eq!(truncate_chars("  short   text ", 20), "short text");
}

#[test]
fn preview_falls_back_to_first_content_line() {
    assert_eq!(log_preview(&log("Groceries", "milk\neggs"), 40), "Groceries");
    assert_eq!(log_preview(&log("  ", "milk\neggs"), 40), "milk");
}

#[test]
fn tags_render_sorted_with_hash() {
    let tags = vec!["work".to_string(), "alpha".to_string()];
    assert_eq!(render_tags(&tags), "#alpha #work");
    assert_eq!(render_tags(&[]), "");
}

#[test]
fn outcome_lines_report_noop() {
    let lines = format_outcome_lines(&MergeOutcome::default());
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("Nothing to merge"));
}

#[test]
fn outcome_lines_list_mirror_ids() {
    let outcome = MergeOutcome {
        mirror_ids: vec![LogId::new(4), LogId::new(7)],
        logs_created: 1,
        logs_updated: 1,
        ..MergeOutcome::default()
    };
    let lines = format_outcome_lines(&outcome);
    assert_eq!(lines[0], "Logs: 1 created, 1 updated");
    assert_eq!(lines.last().map(String::as_str), Some("Mirror ids: 4, 7"));
}

#[test]
fn scope_descriptions() {
    let full = SyncScope {
        kind: ScopeKind::Full,
        count: 3,
        label: "All Data".to_string(),
    };
    let thread = SyncScope {
        kind: ScopeKind::Thread,
        count: 2,
        label: "Question".to_string(),
    };
    let single = SyncScope {
        kind: ScopeKind::Single,
        count: 1,
        label: "Loose".to_string(),
    };
    assert_eq!(describe_scope(&full), "All Data: 3 logs");
    assert_eq!(describe_scope(&thread), "Thread \"Question\": 2 logs");
    assert_eq!(describe_scope(&single), "Log \"Loose\"");
}

#[test]
fn prompt_reasks_until_answer_is_valid() {
    let conflicts = vec![conflict("First"), conflict("Second")];
    let mut input = Cursor::new("maybe\nr\nboth\n");
    let mut output = Vec::new();

    let resolutions = prompt_resolutions(&conflicts, &mut input, &mut output).unwrap();

    assert_eq!(resolutions, vec![SyncResolution::Remote, SyncResolution::Both]);
    let transcript = String::from_utf8(output).unwrap();
    assert!(transcript.contains("Conflict 1/2: First"));
    assert!(transcript.contains("unknown resolution 'maybe'"));
}

#[test]
fn prompt_fails_when_input_closes() {
    let conflicts = vec![conflict("First"), conflict("Second")];
    let mut input = Cursor::new("l\n");
    let mut output = Vec::new();

    let error = prompt_resolutions(&conflicts, &mut input, &mut output).unwrap_err();

    assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn encrypted_snapshot_is_refused() {
    let payload = r#"{"version":1,"isEncrypted":true,"encryptedContent":"c2VjcmV0"}"#;
    assert!(matches!(
        read_snapshot(payload),
        Err(CliError::EncryptedSnapshot)
    ));
}

#[test]
fn malformed_snapshot_is_a_core_error() {
    assert!(matches!(
        read_snapshot(r#"{"logs": {}}"#),
        Err(CliError::Core(memo_core::Error::InvalidFormat(_)))
    ));
}

#[test]
fn output_directory_gets_dated_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    assert_eq!(
        output_target(dir.path(), true, date),
        dir.path().join("memo-partial-2024-05-01.json")
    );
    let file = dir.path().join("mine.json");
    assert_eq!(output_target(&file, false, date), file);
}

#[tokio::test]
async fn focus_on_missing_log_is_reported() {
    let service = MemoService::open_in_memory().await.unwrap();

    let error = build_filter(&service, Vec::new(), Vec::new(), Some(LogId::new(42)))
        .await
        .unwrap_err();

    assert!(matches!(error, CliError::LogNotFound(42)));
}

#[tokio::test]
async fn focus_filter_covers_the_whole_thread() {
    let service = MemoService::open_in_memory().await.unwrap();
    let head = service
        .create_log(&NewLog::new("Question", "?").in_thread("t", 0))
        .await
        .unwrap();
    let reply = service
        .create_log(&NewLog::new("Answer", "!").in_thread("t", 1))
        .await
        .unwrap();
    service.create_log(&NewLog::new("Loose", "")).await.unwrap();

    let filter = build_filter(&service, Vec::new(), Vec::new(), Some(head.id))
        .await
        .unwrap();
    let snapshot = service.export_snapshot(&filter).await.unwrap();

    let mut titles = snapshot
        .logs
        .iter()
        .map(|log| log.title.as_str())
        .collect::<Vec<_>>();
    titles.sort_unstable();
    assert_eq!(titles, vec!["Answer", "Question"]);
    assert!(filter.is_partial());
    assert!(snapshot.logs.iter().any(|log| log.id == reply.id.get()));
}

#[tokio::test]
async fn auto_import_is_idempotent_across_stores() {
    let source = MemoService::open_in_memory().await.unwrap();
    source
        .create_log(&NewLog::new("One", "first").at(1_000, 1_000))
        .await
        .unwrap();
    source
        .create_log(&NewLog::new("Two", "second").at(90_000, 90_000))
        .await
        .unwrap();
    let payload = source
        .export_snapshot(&memo_core::sync::ExportFilter::all())
        .await
        .unwrap()
        .to_json_pretty()
        .unwrap();

    let target = MemoService::open_in_memory().await.unwrap();
    let snapshot = read_snapshot(&payload).unwrap();
    let first = merge_with_strategy(&target, &snapshot, ImportStrategy::Auto)
        .await
        .unwrap();
    let second = merge_with_strategy(&target, &snapshot, ImportStrategy::Auto)
        .await
        .unwrap();

    assert_eq!(first.logs_created, 2);
    assert_eq!(first.mirror_ids.len(), 2);
    assert!(second.is_noop());
}

#[tokio::test]
async fn fixed_strategies_settle_conflicts() {
    for (strategy, expected) in [
        (ImportStrategy::Local, "local edit"),
        (ImportStrategy::Remote, "remote edit"),
    ] {
        let source = MemoService::open_in_memory().await.unwrap();
        source
            .create_log(&NewLog::new("Plan", "remote edit").at(1_000, 2_000))
            .await
            .unwrap();
        let snapshot = source
            .export_snapshot(&memo_core::sync::ExportFilter::all())
            .await
            .unwrap();

        let target = MemoService::open_in_memory().await.unwrap();
        let local = target
            .create_log(&NewLog::new("Plan", "local edit").at(1_500, 9_000))
            .await
            .unwrap();

        assert_eq!(target.preview_conflicts(&snapshot).await.unwrap().len(), 1);
        merge_with_strategy(&target, &snapshot, strategy)
            .await
            .unwrap();

        let merged = target.get_log(local.id).await.unwrap().unwrap();
        assert_eq!(merged.content, expected, "{strategy:?}");
    }
}
