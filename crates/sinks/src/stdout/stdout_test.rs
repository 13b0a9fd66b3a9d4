//! Tests for the stdout sink

use chrono::{TimeZone, Utc};
use evlog_protocol::EventRecord;

use super::{OutputFormat, StdoutConfig, StdoutSink};
use crate::EventSink;

fn record(id: u64) -> EventRecord {
    EventRecord {
        file_name: "20240315000000".into(),
        end_position: 100 * id,
        id,
        date_time: Utc.with_ymd_and_hms(2024, 3, 15, 10, 30, 0).unwrap(),
        severity: "Error".into(),
        event: "_$Data$_.Post".into(),
        user: "Bob".into(),
        computer: "WS-007".into(),
        application: "1CV8C".into(),
        comment: "posting failed".into(),
        data: "Item 1: a\nItem 2: b".into(),
        ..Default::default()
    }
}

#[test]
fn test_default_config() {
    let config = StdoutConfig::default();
    assert!(config.color);
    assert_eq!(config.format, OutputFormat::Text);

    assert!(!StdoutConfig::no_color().color);
    assert_eq!(StdoutConfig::json().format, OutputFormat::Json);
}

#[test]
fn test_render_text_without_color() {
    let sink = StdoutSink::with_config(StdoutConfig::no_color());
    let text = sink.render(&[record(1)]).unwrap();

    assert_eq!(
        text,
        "2024-03-15 10:30:00 #1     Error        _$Data$_.Post Bob@WS-007 1CV8C  posting failed  Item 1: a; Item 2: b\n"
    );
}

#[test]
fn test_render_text_with_color_adds_escapes() {
    let sink = StdoutSink::with_config(StdoutConfig::default());
    let text = sink.render(&[record(1)]).unwrap();
    assert!(text.contains("\u{1b}["));
    assert!(text.contains("posting failed"));
}

#[test]
fn test_render_json_lines() {
    let sink = StdoutSink::with_config(StdoutConfig::json());
    let text = sink.render(&[record(1), record(2)]).unwrap();

    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let parsed: EventRecord = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(parsed, record(2));
}

#[tokio::test]
async fn test_write_tracks_position() {
    let sink = StdoutSink::with_config(StdoutConfig::json());
    assert_eq!(sink.name(), "stdout");
    assert!(sink.read_position().await.unwrap().is_none());

    sink.write(&[record(1), record(2)]).await.unwrap();

    let position = sink.read_position().await.unwrap().unwrap();
    assert_eq!(position.id, 2);
    assert_eq!(position.end_position, 200);
    assert_eq!(sink.metrics().snapshot().records_written, 2);
}
