use super::testing::{FlakyFile, UNLIMITED};
use super::*;
use crate::logic::features::SensorRecord;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tempfile::tempdir;

fn reading(gas: i64) -> SensorRecord {
    SensorRecord::new(25.0, 60.0, gas)
}

#[test]
fn test_fresh_log_has_no_file_until_first_row() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sensorData.csv");
    let log = AppendLog::open(&path).unwrap();

    assert!(!path.exists());
    assert_eq!(log.read_raw().unwrap(), None);
    assert!(log.read_all().unwrap().is_empty());

    assert!(log.append(&reading(100), false).unwrap().is_appended());

    let text = String::from_utf8(log.read_raw().unwrap().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Timestamp,Temperature,Humidity,Gas,Anomaly");
    assert!(lines[1].ends_with(",25.0,60.0,100,0"));
}

#[test]
fn test_consecutive_duplicates_collapse() {
    let dir = tempdir().unwrap();
    let log = AppendLog::open(dir.path().join("log.csv")).unwrap();

    assert!(log.append(&reading(100), false).unwrap().is_appended());
    let outcome = log.append(&reading(100), false).unwrap();
    assert!(matches!(outcome, AppendOutcome::Skipped { .. }));

    // Same reading, different decision
    assert!(log.append(&reading(100), true).unwrap().is_appended());
    // Back to an earlier value: only the last row counts
    assert!(log.append(&reading(100), false).unwrap().is_appended());

    let entries = log.read_all().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.anomaly).collect::<Vec<_>>(),
        vec![false, true, false]
    );
}

#[test]
fn test_no_two_adjacent_rows_share_values() {
    let dir = tempdir().unwrap();
    let log = AppendLog::open(dir.path().join("log.csv")).unwrap();

    for gas in [1, 1, 2, 2, 2, 3, 1, 1] {
        log.append(&reading(gas), false).unwrap();
    }

    let entries = log.read_all().unwrap();
    assert_eq!(
        entries.iter().map(|e| e.reading.gas).collect::<Vec<_>>(),
        vec![1, 2, 3, 1]
    );
    for pair in entries.windows(2) {
        assert!(!pair[1].same_values(&pair[0].reading, pair[0].anomaly));
    }
}

#[test]
fn test_reopen_resumes_dedup_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");

    {
        let log = AppendLog::open(&path).unwrap();
        log.append(&reading(7), true).unwrap();
        log.flush().unwrap();
    }

    let log = AppendLog::open(&path).unwrap();
    assert_eq!(log.last_entry().unwrap().reading.gas, 7);
    assert!(!log.append(&reading(7), true).unwrap().is_appended());
    assert!(log.append(&reading(8), true).unwrap().is_appended());

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("Timestamp").count(), 1);
    assert_eq!(log.read_all().unwrap().len(), 2);
}

#[test]
fn test_torn_tail_is_cut_at_open() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "Timestamp,Temperature,Humidity,Gas,Anomaly\n\
         2026-01-01 10:00:00,25.0,60.0,100,0\n\
         2026-01-01 10:00:01,26.0,6",
    )
    .unwrap();

    let log = AppendLog::open(&path).unwrap();
    assert_eq!(log.read_all().unwrap().len(), 1);

    log.append(&reading(200), false).unwrap();
    let entries = log.read_all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].reading.gas, 200);
    assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[test]
fn test_header_with_spaces_is_accepted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "Timestamp, Temperature, Humidity, Gas, Anomaly\n\
         2026-01-01 10:00:00, 25.0, 60.0, 100, 1\n",
    )
    .unwrap();

    let log = AppendLog::open(&path).unwrap();
    let last = log.last_entry().unwrap();
    assert!(last.anomaly);
    assert_eq!(last.reading, reading(100));
}

#[test]
fn test_foreign_header_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(&path, "time,temp,hum\n1,2,3\n").unwrap();

    let err = AppendLog::open(&path).err().unwrap();
    assert!(matches!(err, LogError::HeaderMismatch { .. }));
}

#[test]
fn test_bad_rows_are_skipped_on_read() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    fs::write(
        &path,
        "Timestamp,Temperature,Humidity,Gas,Anomaly\n\
         2026-01-01 10:00:00,25.0,60.0,100,0\n\
         garbage\n\
         2026-01-01 10:00:02,27.0,55.0,120,1\n",
    )
    .unwrap();

    let log = AppendLog::open(&path).unwrap();
    let entries = log.read_all().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(log.last_entry().unwrap().reading.gas, 120);
}

#[test]
fn test_concurrent_appenders_write_one_row_per_value() {
    let dir = tempdir().unwrap();
    let log = Arc::new(AppendLog::open(dir.path().join("log.csv")).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let log = Arc::clone(&log);
            thread::spawn(move || {
                for _ in 0..50 {
                    log.append(&reading(42), false).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(log.read_all().unwrap().len(), 1);
}

fn gases(log: &AppendLog) -> Vec<i64> {
    log.read_all().unwrap().iter().map(|e| e.reading.gas).collect()
}

#[test]
fn test_failed_write_is_rolled_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let log = AppendLog::open(&path).unwrap();
    log.append(&reading(1), false).unwrap();
    let before = fs::read(&path).unwrap();

    // Room for part of the next row only
    let budget = Arc::new(AtomicUsize::new(10));
    log.replace_file(FlakyFile::open(&path, Arc::clone(&budget), true));

    assert!(matches!(log.append(&reading(2), false), Err(LogError::Io { .. })));
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(log.last_entry().unwrap().reading.gas, 1);

    budget.store(UNLIMITED, Ordering::SeqCst);
    assert!(log.append(&reading(3), false).unwrap().is_appended());
    assert_eq!(gases(&log), vec![1, 3]);

    let reopened = AppendLog::open(&path).unwrap();
    assert_eq!(reopened.last_entry().unwrap().reading.gas, 3);
}

#[test]
fn test_fragment_that_cannot_be_rolled_back_is_dropped_on_next_append() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let log = AppendLog::open(&path).unwrap();
    log.append(&reading(1), false).unwrap();

    let budget = Arc::new(AtomicUsize::new(10));
    log.replace_file(FlakyFile::open(&path, Arc::clone(&budget), false));

    assert!(log.append(&reading(2), false).is_err());
    assert!(!fs::read_to_string(&path).unwrap().ends_with('\n'));
    assert_eq!(gases(&log), vec![1]);

    budget.store(UNLIMITED, Ordering::SeqCst);
    assert!(log.append(&reading(3), false).unwrap().is_appended());
    assert_eq!(gases(&log), vec![1, 3]);
    assert!(fs::read_to_string(&path).unwrap().ends_with('\n'));
}

#[test]
fn test_failed_first_write_keeps_header_pending() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("log.csv");
    let log = AppendLog::open(&path).unwrap();

    let budget = Arc::new(AtomicUsize::new(5));
    log.replace_file(FlakyFile::open(&path, Arc::clone(&budget), false));
    assert!(log.append(&reading(1), false).is_err());

    budget.store(UNLIMITED, Ordering::SeqCst);
    log.append(&reading(1), false).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Timestamp,Temperature,Humidity,Gas,Anomaly\n"));
    assert_eq!(gases(&log), vec![1]);
}
