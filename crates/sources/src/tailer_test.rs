//! Tests for the tailing coordinator

use std::time::Duration;

use evlog_protocol::{Checkpoint, EventRecord};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::test::{EventLine, LogDir};
use crate::{SourceTimeZone, TailEvent, Tailer, TailerSettings};

fn settings(dir: &LogDir, live_mode: bool) -> TailerSettings {
    TailerSettings {
        log_folder: dir.path().to_path_buf(),
        live_mode,
        reading_timeout: Duration::from_millis(100),
        time_zone: SourceTimeZone::Utc,
        ..Default::default()
    }
}

fn line(session: u64) -> EventLine {
    EventLine::new("20240315103000").session(session)
}

fn setup() -> (TempDir, LogDir) {
    let tmp = TempDir::new().unwrap();
    let dir = LogDir::create(tmp.path()).unwrap();
    (tmp, dir)
}

async fn expect_record(tailer: &mut Tailer, cancel: &CancellationToken) -> EventRecord {
    match tailer.next(cancel).await.unwrap() {
        TailEvent::Record(record) => record,
        other => panic!("expected a record, got {other:?}"),
    }
}

/// Drain an archive-mode tailer, returning (file, session) pairs
async fn drain(tailer: &mut Tailer) -> Vec<(String, i64)> {
    let cancel = CancellationToken::new();
    let mut seen = Vec::new();
    loop {
        match tailer.next(&cancel).await.unwrap() {
            TailEvent::Record(record) => seen.push((record.file_name, record.session)),
            TailEvent::Drained => return seen,
            other => panic!("unexpected {other:?}"),
        }
    }
}

fn pairs(items: &[(&str, i64)]) -> Vec<(String, i64)> {
    items.iter().map(|(f, s)| (f.to_string(), *s)).collect()
}

#[tokio::test]
async fn test_archive_orders_files_by_mtime() {
    let (_tmp, dir) = setup();
    dir.write_data_file("b", &[line(1), line(2)], 0).unwrap();
    dir.write_data_file("a", &[line(3)], 10).unwrap();

    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    assert_eq!(
        drain(&mut tailer).await,
        pairs(&[("b", 1), ("b", 2), ("a", 3)])
    );
}

#[tokio::test]
async fn test_equal_mtime_breaks_tie_by_name() {
    let (_tmp, dir) = setup();
    dir.write_data_file("y", &[line(2)], 5).unwrap();
    dir.write_data_file("x", &[line(1)], 5).unwrap();

    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    assert_eq!(drain(&mut tailer).await, pairs(&[("x", 1), ("y", 2)]));
}

#[tokio::test]
async fn test_empty_directory_drains_immediately() {
    let (_tmp, dir) = setup();
    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    assert!(drain(&mut tailer).await.is_empty());
}

#[tokio::test]
async fn test_live_times_out_then_picks_up_appends() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();

    let cancel = CancellationToken::new();
    let mut tailer = Tailer::open(settings(&dir, true), None).await.unwrap();

    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 1);
    assert!(matches!(tailer.next(&cancel).await.unwrap(), TailEvent::TimedOut));

    dir.append_events("a", &[line(2)], 0).unwrap();
    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 2);
}

#[tokio::test]
async fn test_live_drains_older_file_before_switching() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();

    let cancel = CancellationToken::new();
    let mut tailer = Tailer::open(settings(&dir, true), None).await.unwrap();
    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 1);

    // A grows and B appears before the tailer looks again
    dir.append_events("a", &[line(2), line(3)], 0).unwrap();
    dir.write_data_file("b", &[line(4)], 10).unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        let record = expect_record(&mut tailer, &cancel).await;
        seen.push((record.file_name, record.session));
    }
    assert_eq!(seen, pairs(&[("a", 2), ("a", 3), ("b", 4)]));
    assert_eq!(tailer.current_file(), Some("b"));
    assert!(matches!(tailer.next(&cancel).await.unwrap(), TailEvent::TimedOut));
}

#[tokio::test]
async fn test_rotation_rereads_file_grown_after_end_of_data() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();

    let cancel = CancellationToken::new();
    let mut tailer = Tailer::open(settings(&dir, true), None).await.unwrap();
    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 1);
    assert!(matches!(tailer.next(&cancel).await.unwrap(), TailEvent::TimedOut));

    // A already returned end of data; it grows and B appears right before
    // the switch
    dir.append_events("a", &[line(2)], 0).unwrap();
    dir.write_data_file("b", &[line(3)], 10).unwrap();

    let record = tailer.rotate(dir.data_path("b")).await.unwrap().unwrap();
    assert_eq!((record.file_name.as_str(), record.session), ("a", 2));
    assert_eq!(tailer.current_file(), Some("a"));

    assert!(tailer.rotate(dir.data_path("b")).await.unwrap().is_none());
    assert_eq!(tailer.current_file(), Some("b"));

    let record = expect_record(&mut tailer, &cancel).await;
    assert_eq!((record.file_name.as_str(), record.session), ("b", 3));
}

#[tokio::test]
async fn test_live_switch_after_timeout_keeps_late_records() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();

    let cancel = CancellationToken::new();
    let mut tailer = Tailer::open(settings(&dir, true), None).await.unwrap();
    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 1);
    assert!(matches!(tailer.next(&cancel).await.unwrap(), TailEvent::TimedOut));

    dir.append_events("a", &[line(2)], 0).unwrap();
    dir.write_data_file("b", &[line(3)], 10).unwrap();

    let first = expect_record(&mut tailer, &cancel).await;
    let second = expect_record(&mut tailer, &cancel).await;
    assert_eq!(
        vec![(first.file_name, first.session), (second.file_name, second.session)],
        pairs(&[("a", 2), ("b", 3)])
    );
}

#[tokio::test]
async fn test_live_waits_when_directory_is_empty() {
    let (_tmp, dir) = setup();
    let cancel = CancellationToken::new();
    let mut tailer = Tailer::open(settings(&dir, true), None).await.unwrap();

    assert!(matches!(tailer.next(&cancel).await.unwrap(), TailEvent::TimedOut));

    dir.write_data_file("a", &[line(1)], 0).unwrap();
    assert_eq!(expect_record(&mut tailer, &cancel).await.session, 1);
}

#[tokio::test]
async fn test_cancel_interrupts_wait() {
    let (_tmp, dir) = setup();
    let mut tailer = Tailer::open(
        TailerSettings {
            reading_timeout: Duration::from_secs(60),
            ..settings(&dir, true)
        },
        None,
    )
    .await
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let event = tokio::time::timeout(Duration::from_secs(5), tailer.next(&cancel))
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(event, TailEvent::Cancelled));
}

#[tokio::test]
async fn test_resume_from_checkpoint() {
    let (_tmp, dir) = setup();
    dir.append_reference(&[LogDir::user(1, "Alice"), LogDir::user(2, "Bob")])
        .unwrap();
    dir.write_data_file("a", &[line(1).user(1), line(2).user(2)], 0).unwrap();
    dir.write_data_file("b", &[line(3).user(1)], 10).unwrap();

    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    let cancel = CancellationToken::new();
    let first = expect_record(&mut tailer, &cancel).await;

    let checkpoint = Checkpoint {
        id: 1,
        ..first.checkpoint()
    };
    let mut resumed = Tailer::open(settings(&dir, false), Some(&checkpoint))
        .await
        .unwrap();

    let next = expect_record(&mut resumed, &cancel).await;
    assert_eq!((next.file_name.as_str(), next.session), ("a", 2));
    assert_eq!(next.user, "Bob");
    assert!(next.lgf_end_position >= checkpoint.lgf_end_position);
    assert_eq!(drain(&mut resumed).await, pairs(&[("b", 3)]));
}

#[tokio::test]
async fn test_missing_checkpoint_file_restarts_from_earliest() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();
    dir.write_data_file("b", &[line(2)], 10).unwrap();

    let checkpoint = Checkpoint {
        file_name: "gone".to_string(),
        end_position: 500,
        lgf_end_position: 300,
        id: 9,
    };
    let mut tailer = Tailer::open(settings(&dir, false), Some(&checkpoint))
        .await
        .unwrap();

    assert_eq!(drain(&mut tailer).await, pairs(&[("a", 1), ("b", 2)]));
}

#[tokio::test]
async fn test_removed_file_moves_to_next() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();
    dir.write_data_file("b", &[line(2)], 10).unwrap();

    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    let cancel = CancellationToken::new();
    assert_eq!(expect_record(&mut tailer, &cancel).await.file_name, "a");

    std::fs::remove_file(dir.data_path("a")).unwrap();
    assert_eq!(drain(&mut tailer).await, pairs(&[("b", 2)]));
}

#[tokio::test]
async fn test_ignores_non_data_files() {
    let (_tmp, dir) = setup();
    dir.write_data_file("a", &[line(1)], 0).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "{1,2},").unwrap();
    std::fs::create_dir(dir.path().join("sub.lgp")).unwrap();

    let mut tailer = Tailer::open(settings(&dir, false), None).await.unwrap();
    assert_eq!(drain(&mut tailer).await, pairs(&[("a", 1)]));
}
