use memo_core::MemoService;

use crate::commands::common::{format_log_lines, log_to_list_item, LogListItem};
use crate::error::CliError;

pub async fn run_list(service: &MemoService, limit: usize, as_json: bool) -> Result<(), CliError> {
    let logs = service.list_logs(limit, 0).await?;

    if as_json {
        let json_items = logs
            .iter()
            .map(log_to_list_item)
            .collect::<Vec<LogListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_log_lines(&logs) {
            println!("{line}");
        }
    }

    Ok(())
}
