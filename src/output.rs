use crate::cli::OutputFormat;
use crate::executor::RequestSnapshot;
use crate::message::{CheckResult, MainResult};
use console::style;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// One line of the human-readable result table.
#[derive(Debug, PartialEq, Tabled)]
pub struct ResultRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl ResultRow {
    fn new(field: &'static str, value: impl ToString) -> Self {
        Self {
            field,
            value: value.to_string(),
        }
    }
}

/// Print a check result in the chosen format.
pub fn print_result(
    result: &CheckResult,
    request: Option<&RequestSnapshot>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            print_table(result_rows(result, request));
            Ok(())
        }
        OutputFormat::Json => print_json(&result_document(result, request)?),
        OutputFormat::Pretty => print_pretty_json(&result_document(result, request)?),
    }
}

/// The result as JSON, with the sent request under `request` when given.
pub fn result_document(
    result: &CheckResult,
    request: Option<&RequestSnapshot>,
) -> anyhow::Result<Value> {
    let mut document = serde_json::to_value(result)?;
    if let (Some(request), Value::Object(map)) = (request, &mut document) {
        map.insert("request".to_string(), serde_json::to_value(request)?);
    }
    Ok(document)
}

pub fn result_rows(result: &CheckResult, request: Option<&RequestSnapshot>) -> Vec<ResultRow> {
    let mut rows = vec![
        ResultRow::new("monitor", crate::error::object_id(&result.monitor_id)),
        ResultRow::new("result", outcome_label(result)),
        ResultRow::new("http code", result.http_code),
        ResultRow::new("content position", result.content_position),
        ResultRow::new("maintenance position", result.maintenance_position),
        ResultRow::new("total", format!("{} ms", result.total_time)),
        ResultRow::new("dns lookup", format!("{} ms", result.namelookup_time)),
        ResultRow::new("connect", format!("{} ms", result.connect_time)),
        ResultRow::new("pretransfer", format!("{} ms", result.pretransfer_time)),
        ResultRow::new("first byte", format!("{} ms", result.starttransfer_time)),
        ResultRow::new("date", &result.date),
    ];
    if !result.error.is_empty() {
        rows.push(ResultRow::new("error", style(&result.error).red()));
    }
    if let Some(request) = request {
        rows.push(ResultRow::new("request uri", &request.uri));
    }
    rows
}

fn outcome_label(result: &CheckResult) -> String {
    match result.main_result {
        MainResult::Up(ms) if result.error.is_empty() => {
            style(format!("up ({} ms)", ms)).green().to_string()
        }
        _ => style("down").red().bold().to_string(),
    }
}

/// Print rows as a table
pub fn print_table<T: Tabled>(data: Vec<T>) {
    if data.is_empty() {
        println!("{}", style("Nothing to show").dim());
        return;
    }
    let mut table = Table::new(data);
    table.with(Style::rounded());
    println!("{}", table);
}

/// Print data as compact JSON, one line
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string(data)?;
    let mut stdout = io::stdout();
    writeln!(stdout, "{}", json)?;
    stdout.flush()?;
    Ok(())
}

/// Print data as indented JSON
pub fn print_pretty_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::CheckRequest;
    use serde_json::json;

    fn sample() -> CheckResult {
        let mut result = CheckResult::from_request(CheckRequest {
            monitor_id: json!("m-7"),
            ..Default::default()
        });
        result.main_result = MainResult::Up(88);
        result.http_code = 200;
        result.total_time = 88;
        result
    }

    #[test]
    fn test_result_document_adds_request() {
        let request = RequestSnapshot {
            uri: "http://example.com/".to_string(),
            headers: vec![],
            body: String::new(),
        };
        let document = result_document(&sample(), Some(&request)).unwrap();

        assert_eq!(document["main_result"], json!(88));
        assert_eq!(document["request"]["uri"], json!("http://example.com/"));
    }

    #[test]
    fn test_result_document_without_request() {
        let document = result_document(&sample(), None).unwrap();
        assert!(document.get("request").is_none());
    }

    #[test]
    fn test_rows_include_error_only_when_set() {
        let rows = result_rows(&sample(), None);
        assert!(rows.iter().all(|row| row.field != "error"));
        assert_eq!(rows[0], ResultRow::new("monitor", "m-7"));

        let mut failed = sample();
        failed.error = "Error code: http-code-incorrect object_id: m-7".to_string();
        let rows = result_rows(&failed, None);
        assert!(rows.iter().any(|row| row.field == "error"));
        assert!(rows[1].value.contains("down"));
    }
}
