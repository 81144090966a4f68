//! Profile storage tests
//!
//! Tests for `SQLite` profile storage: lookup, search ordering and filters.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;
use webprof_core::storage::{Database, FindQuery, ProfilerStorage, SqliteStorage};
use webprof_core::Profile;

fn create_test_profile(token: &str, ip: &str, method: &str, url: &str, minute: u32) -> Profile {
    let mut profile = Profile::new(token);
    profile.ip = ip.to_string();
    profile.method = method.to_string();
    profile.url = url.to_string();
    profile.status_code = Some(200);
    profile.time = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, minute, 0)
        .single()
        .expect("valid time");
    profile
}

fn seeded_storage() -> SqliteStorage {
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    for profile in [
        create_test_profile("aaa111", "127.0.0.1", "GET", "/", 1),
        create_test_profile("bbb222", "10.0.0.7", "POST", "/login", 2),
        create_test_profile("ccc333", "127.0.0.1", "GET", "/blog/posts", 3),
        create_test_profile("ddd444", "::1", "DELETE", "/blog/posts/4", 4),
    ] {
        assert!(storage.write(&profile).expect("Failed to write"));
    }
    storage
}

fn tokens(storage: &SqliteStorage, query: &FindQuery) -> Vec<String> {
    storage
        .find(query)
        .expect("Failed to search")
        .into_iter()
        .map(|s| s.token)
        .collect()
}

#[test]
fn test_write_and_read_profile() {
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    let mut profile = create_test_profile("abc123", "127.0.0.1", "GET", "/", 0);
    profile.add_collector("request", json!({ "method": "GET" }));

    assert!(storage.write(&profile).expect("Failed to write"));

    let loaded = storage
        .read("abc123")
        .expect("Failed to read")
        .expect("Profile not found");
    assert_eq!(loaded, profile);
}

#[test]
fn test_read_unknown_token_is_none() {
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    assert!(storage.read("nope").expect("Failed to read").is_none());
}

#[test]
fn test_write_existing_token_is_rejected() {
    let storage = SqliteStorage::in_memory().expect("Failed to create storage");
    let original = create_test_profile("abc123", "127.0.0.1", "GET", "/", 0);
    let duplicate = create_test_profile("abc123", "10.0.0.1", "POST", "/other", 5);

    assert!(storage.write(&original).expect("Failed to write"));
    assert!(!storage.write(&duplicate).expect("Failed to write"));

    let loaded = storage.read("abc123").unwrap().unwrap();
    assert_eq!(loaded.url, "/");
}

#[test]
fn test_find_returns_most_recent_first() {
    let storage = seeded_storage();
    assert_eq!(
        tokens(&storage, &FindQuery::new(10)),
        vec!["ddd444", "ccc333", "bbb222", "aaa111"]
    );
}

#[test]
fn test_find_breaks_time_ties_by_latest_insert() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage
        .write(&create_test_profile("first1", "127.0.0.1", "GET", "/", 0))
        .unwrap();
    storage
        .write(&create_test_profile("second", "127.0.0.1", "GET", "/", 0))
        .unwrap();

    assert_eq!(tokens(&storage, &FindQuery::new(10)), vec!["second", "first1"]);
}

#[test]
fn test_find_respects_limit() {
    let storage = seeded_storage();
    assert_eq!(tokens(&storage, &FindQuery::new(2)), vec!["ddd444", "ccc333"]);
}

#[test]
fn test_find_filters_by_substring() {
    let storage = seeded_storage();

    let by_ip = FindQuery {
        ip: Some("127.0".to_string()),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &by_ip), vec!["ccc333", "aaa111"]);

    let by_url = FindQuery {
        url: Some("/blog".to_string()),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &by_url), vec!["ddd444", "ccc333"]);

    let by_method = FindQuery {
        method: Some("POST".to_string()),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &by_method), vec!["bbb222"]);

    let combined = FindQuery {
        ip: Some("127.0.0.1".to_string()),
        url: Some("blog".to_string()),
        method: Some("GET".to_string()),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &combined), vec!["ccc333"]);
}

#[test]
fn test_find_ignores_empty_filters() {
    let storage = seeded_storage();
    let query = FindQuery {
        ip: Some(String::new()),
        url: Some(String::new()),
        method: Some(String::new()),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &query).len(), 4);
}

#[test]
fn test_find_filter_is_case_sensitive() {
    let storage = seeded_storage();
    let query = FindQuery {
        method: Some("get".to_string()),
        ..FindQuery::new(10)
    };
    assert!(tokens(&storage, &query).is_empty());
}

#[test]
fn test_find_by_time_window() {
    let storage = seeded_storage();
    let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let query = FindQuery {
        start: Some(base + Duration::minutes(2)),
        end: Some(base + Duration::minutes(3)),
        ..FindQuery::new(10)
    };
    assert_eq!(tokens(&storage, &query), vec!["ccc333", "bbb222"]);
}

#[test]
fn test_read_lists_stored_children() {
    let storage = SqliteStorage::in_memory().unwrap();
    let parent = create_test_profile("parent", "127.0.0.1", "GET", "/", 0);
    let mut child = create_test_profile("child1", "127.0.0.1", "GET", "/_fragment", 1);
    child.parent = Some("parent".to_string());

    storage.write(&parent).unwrap();
    storage.write(&child).unwrap();

    let loaded = storage.read("parent").unwrap().unwrap();
    assert_eq!(loaded.children, vec!["child1".to_string()]);
}

#[test]
fn test_purge_removes_everything() {
    let storage = seeded_storage();
    storage.purge().expect("Failed to purge");

    assert!(tokens(&storage, &FindQuery::new(10)).is_empty());
    assert!(storage.read("aaa111").unwrap().is_none());
}

#[test]
fn test_file_database_persists_across_opens() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("profiles.db");

    {
        let storage = SqliteStorage::new(Database::open(&path).expect("Failed to open"));
        storage
            .write(&create_test_profile("abc123", "127.0.0.1", "GET", "/", 0))
            .unwrap();
    }

    let storage = SqliteStorage::new(Database::open(&path).expect("Failed to reopen"));
    assert!(storage.read("abc123").unwrap().is_some());
}
