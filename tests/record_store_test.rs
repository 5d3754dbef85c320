mod helpers;

use chrono::{Duration, Utc};
use helpers::{record, temp_store};
use screenmem::records::types::cutoff_before;
use screenmem::records::{RecordStore, StoreError};

#[test]
fn search_finds_the_single_matching_record() {
    let (_dir, store) = temp_store();
    let now = Utc::now();
    store.insert(&record("Terminal", "cargo build finished", now - Duration::minutes(3))).unwrap();
    let id = store.insert(&record("Safari", "invoice number 4832", now)).unwrap();
    store.insert(&record("Slack", "lunch at noon?", now - Duration::minutes(1))).unwrap();

    let results = store.search("invoice", 20, None).unwrap();
    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.id, id);
    assert_eq!(hit.app_name, "Safari");
    assert_eq!(hit.window_title.as_deref(), Some("Safari window"));
    assert_eq!(hit.timestamp.timestamp_micros(), now.timestamp_micros());
    assert!(hit.snippet.contains("[invoice]"));
}

#[test]
fn purge_deletes_exactly_the_older_records() {
    let (_dir, store) = temp_store();
    let now = Utc::now();
    let ages_days = [30, 20, 15, 13, 2, 0];
    for (i, age) in ages_days.iter().enumerate() {
        store
            .insert(&record("Notes", &format!("entry {i} alpha"), now - Duration::days(*age)))
            .unwrap();
    }

    let before = store.status().unwrap().record_count;
    let deleted = store.purge(now - Duration::days(14)).unwrap();
    let after = store.status().unwrap();

    assert_eq!(deleted, 3);
    assert_eq!(after.record_count, before - deleted as u64);
    // The search index lost the purged rows too.
    assert_eq!(store.search("alpha", 200, None).unwrap().len(), 3);
    assert!(after.last_capture_at.is_some());
}

#[test]
fn purge_with_nothing_eligible_is_zero() {
    let (_dir, store) = temp_store();
    store.insert(&record("Notes", "fresh", Utc::now())).unwrap();
    assert_eq!(store.purge(Utc::now() - Duration::days(1)).unwrap(), 0);
    assert_eq!(store.status().unwrap().record_count, 1);
}

#[test]
fn reads_proceed_while_a_second_handle_writes() {
    let (dir, store) = temp_store();
    store.insert(&record("Terminal", "first observation", Utc::now())).unwrap();

    // Another process-style handle on the same file.
    let writer = RecordStore::open(dir.path().join("screenmem.db")).unwrap();
    writer.insert(&record("Terminal", "second observation", Utc::now())).unwrap();

    assert_eq!(store.search("observation", 10, None).unwrap().len(), 2);
    assert_eq!(store.status().unwrap().record_count, 2);
}

#[test]
fn malformed_query_is_a_query_error() {
    let (_dir, store) = temp_store();
    store.insert(&record("Terminal", "anything", Utc::now())).unwrap();
    let err = store.search("\"unbalanced", 10, None).unwrap_err();
    assert!(matches!(err, StoreError::Query { .. }));
}

#[test]
fn opening_an_unusable_path_is_an_initialization_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let err = RecordStore::open(blocker.join("screenmem.db")).err().unwrap();
    assert!(matches!(err, StoreError::Initialization { .. }));
}

#[test]
fn status_reflects_file_size_and_newest_capture() {
    let (_dir, store) = temp_store();
    let empty = store.status().unwrap();
    assert_eq!(empty.record_count, 0);
    assert!(empty.last_capture_at.is_none());
    assert!(empty.database_bytes > 0);

    let newest = Utc::now();
    store.insert(&record("Mail", "older", newest - Duration::hours(2))).unwrap();
    store.insert(&record("Mail", "newer", newest)).unwrap();
    let status = store.status().unwrap();
    assert_eq!(status.record_count, 2);
    assert_eq!(status.last_capture_at.unwrap().timestamp_micros(), newest.timestamp_micros());
}

#[test]
fn century_scale_retention_purges_nothing_and_does_not_panic() {
    let (_dir, store) = temp_store();
    store.insert(&record("Notes", "kept", Utc::now() - Duration::days(400))).unwrap();

    let cutoff = cutoff_before(Utc::now(), Duration::days(300_000_000));
    assert_eq!(store.purge(cutoff).unwrap(), 0);
    assert_eq!(store.status().unwrap().record_count, 1);
}
