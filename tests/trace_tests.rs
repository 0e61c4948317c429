mod common;

use std::sync::Arc;

use report_issue_panel::{
    device::identity::SharedIdentification,
    router::router::EventRouter,
    submit::assembler::Submitter,
    trace::logger::TraceLogger,
    ui::events::UiEvent,
};

use crate::common::fakes::*;

#[test]
fn disabled_logger_writes_nothing() {
    let logger = TraceLogger::from_path(None).unwrap();
    assert!(!logger.is_enabled());
    assert_eq!(logger.lines_written(), 0);
}

#[test]
fn unwritable_trace_path_fails_on_open() {
    let result = TraceLogger::from_path(Some("/nonexistent-dir/trace.jsonl"));
    assert!(result.is_err());
}

#[tokio::test]
async fn router_appends_one_json_line_per_event() {
    let path = std::env::temp_dir().join(format!("report-issue-trace-{}.jsonl", std::process::id()));
    let _ = std::fs::remove_file(&path);
    let path_str = path.to_string_lossy().to_string();

    let display = Arc::new(RecordingDisplay::default());
    let submitter = Arc::new(Submitter::new(
        display.clone(),
        Arc::new(FakeStatus::idle()),
        Arc::new(FakeTransport::answering("{}")),
        SharedIdentification::new(),
        settings(true),
    ));
    let tracer = TraceLogger::open(&path_str).unwrap();
    assert!(tracer.is_enabled());
    let mut router = EventRouter::new(stock_form(), display, submitter, tracer);

    router.handle(UiEvent::panel_opened("feedback"));
    router.handle(UiEvent::clicked("option3"));
    router.handle(UiEvent::text_submitted("ghost", "boo"));
    assert_eq!(router.tracer().lines_written(), 3);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let _ = std::fs::remove_file(&path);

    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["step"], 0);
    assert_eq!(lines[0]["event"]["event"], "panel_opened");
    assert_eq!(lines[0]["dispatch"], "session_restarted");
    assert_eq!(lines[0]["render_mode"], "Start");
    assert_eq!(lines[0]["rows"], 6);

    assert_eq!(lines[1]["dispatch"], "category_selected:Request for a technician");
    assert_eq!(lines[1]["session_keys"], serde_json::json!(["category"]));
    assert_eq!(lines[1]["document_fingerprint"].as_str().map(str::len), Some(40));

    assert!(lines[2]["dispatch"].as_str().unwrap().starts_with("ignored:"));
    assert!(lines[2]["render_mode"].is_null(), "no render for an ignored event");
}
