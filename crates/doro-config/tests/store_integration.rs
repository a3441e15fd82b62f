//! Integration tests for the file-backed configuration store.
//!
//! Every test builds a store with [`ConfigStore::open`] over a fresh temp
//! directory, so the real YAML/TOML repository, the legacy JSON importer, and
//! the INI exporter are all exercised together.
//!
//! ```text
//! <tmp>/
//!   config.yaml            backing document
//!   settings.json          legacy toggles
//!   numeric_settings.json  legacy numeric settings
//!   settings.ini           export written after each save
//! ```

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use doro_config::infrastructure::storage::schema_file::write_schema;
use doro_config::{ConfigStore, LoadError, StoreOptions, UpdateError};
use doro_core::{defaults, CURRENT_SCHEMA_VERSION};
use serde_yaml::Value;
use uuid::Uuid;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("doro_store_it_{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn open(dir: &PathBuf) -> (ConfigStore, StoreOptions) {
    let options = StoreOptions::rooted_at(dir);
    (ConfigStore::open(&options), options)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// With nothing on disk every default key is readable and no file is written.
#[test]
fn test_load_without_any_file_serves_every_default_key() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);

    // Act
    let report = store.load().unwrap();

    // Assert
    assert!(!report.file_found);
    assert_eq!(report.version, CURRENT_SCHEMA_VERSION);
    let reference = defaults();
    for key in reference.toggles.keys() {
        assert!(store.get(&["toggles", key]).is_some(), "missing toggle {key}");
    }
    for key in reference.numeric_settings.keys() {
        assert!(store.get(&["numeric_settings", key]).is_some(), "missing {key}");
    }
    for task in reference.tasks.keys() {
        assert!(store.get(&["tasks", task]).is_some(), "missing task {task}");
    }
    assert!(!options.config_path.exists());

    fs::remove_dir_all(&dir).ok();
}

/// A file holding a single toggle changes that toggle and nothing else.
#[test]
fn test_partial_file_overrides_only_its_own_keys() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(&options.config_path, "toggles:\n  ShopCash: 0\n").unwrap();

    // Act
    let report = store.load().unwrap();

    // Assert
    assert!(report.file_found);
    assert_eq!(store.get(&["toggles", "ShopCash"]), Some(Value::from(0)));
    assert_eq!(store.get(&["toggles", "ShopGeneral"]), Some(Value::from(1)));
    assert_eq!(
        store.get(&["numeric_settings", "UserGroup"]),
        Some(Value::from("Free"))
    );
    assert_eq!(
        store.get(&["vision", "default_confidence"]),
        Some(Value::from(0.8))
    );

    fs::remove_dir_all(&dir).ok();
}

/// A file without `meta.version` is treated as the oldest schema and upgraded.
#[test]
fn test_unversioned_file_is_migrated_to_current_version() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(&options.config_path, "tasks:\n  shop_task: true\n").unwrap();

    // Act
    let report = store.load().unwrap();

    // Assert
    assert_eq!(report.migrated_from, Some(1));
    assert_eq!(report.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(store.get(&["tasks", "shop_task"]), Some(Value::Bool(true)));
    assert_eq!(store.get(&["tasks", "arena_task"]), Some(Value::Bool(false)));

    fs::remove_dir_all(&dir).ok();
}

/// A declared version below the oldest schema never lowers the document's
/// version, and the built-in steps still run from the oldest schema.
#[test]
fn test_version_zero_file_is_raised_and_migrated() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(
        &options.config_path,
        "meta:\n  version: 0\ntasks:\n  shop_task: true\n",
    )
    .unwrap();

    // Act
    let report = store.load().unwrap();
    store.save().unwrap();
    let reopened = ConfigStore::open(&options);
    reopened.load().unwrap();

    // Assert
    assert_eq!(report.migrated_from, Some(1));
    assert_eq!(report.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(report.merge_warnings.len(), 1);
    assert_eq!(store.snapshot().meta.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(reopened.snapshot().meta.version, CURRENT_SCHEMA_VERSION);
    assert_eq!(store.get(&["tasks", "shop_task"]), Some(Value::Bool(true)));

    fs::remove_dir_all(&dir).ok();
}

/// A malformed file leaves the store on defaults and still notifies.
#[test]
fn test_malformed_file_falls_back_and_reports_parse_error() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(&options.config_path, "toggles: [unclosed\n").unwrap();
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    store.subscribe("counter", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    // Act
    let result = store.load();

    // Assert
    assert!(matches!(result, Err(LoadError::Parse(_))));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(store.get(&["toggles", "ShopCash"]), Some(Value::from(1)));

    fs::remove_dir_all(&dir).ok();
}

/// Legacy values override defaults; the backing file overrides legacy values.
#[test]
fn test_precedence_is_defaults_then_legacy_then_file() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(
        &options.legacy_toggles_path,
        r#"{"ShopCash": 0, "ShopGeneral": 0}"#,
    )
    .unwrap();
    fs::write(&options.legacy_numeric_path, r#"{"UserGroup": "Paid"}"#).unwrap();
    fs::write(&options.config_path, "toggles:\n  ShopGeneral: 1\n").unwrap();

    // Act
    let report = store.load().unwrap();

    // Assert
    assert_eq!(report.legacy.files_imported, 2);
    assert_eq!(store.get(&["toggles", "ShopCash"]), Some(Value::from(0)));
    assert_eq!(store.get(&["toggles", "ShopGeneral"]), Some(Value::from(1)));
    assert_eq!(
        store.get(&["numeric_settings", "UserGroup"]),
        Some(Value::from("Paid"))
    );

    fs::remove_dir_all(&dir).ok();
}

/// An out-of-range value loads as written and is reported.
#[test]
fn test_out_of_range_value_is_kept_and_reported() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    fs::write(&options.config_path, "vision:\n  default_confidence: 1.5\n").unwrap();

    // Act
    let report = store.load().unwrap();

    // Assert
    assert_eq!(report.validation.len(), 1);
    assert_eq!(
        store.get(&["vision", "default_confidence"]),
        Some(Value::from(1.5))
    );

    fs::remove_dir_all(&dir).ok();
}

// ── Save / Update ─────────────────────────────────────────────────────────────

/// Save then Load in a fresh store reproduces the document.
#[test]
fn test_save_then_load_round_trips_the_document() {
    // Arrange
    let dir = temp_dir();
    let (first, options) = open(&dir);
    first.load().unwrap();
    first.update("toggles", "ShopArena", 0).unwrap();
    first.update("numeric_settings", "UserLevel", 42).unwrap();
    first.update("task_runner", "break_on_failure", true).unwrap();

    // Act
    let second = ConfigStore::open(&options);
    second.load().unwrap();

    // Assert
    assert_eq!(*first.snapshot(), *second.snapshot());
    assert_eq!(
        second.get(&["task_runner", "break_on_failure"]),
        Some(Value::Bool(true))
    );

    fs::remove_dir_all(&dir).ok();
}

/// Every save also writes the INI export.
#[test]
fn test_save_writes_the_ini_export() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    store.load().unwrap();

    // Act
    store.update("toggles", "ShopCash", 0).unwrap();

    // Assert
    let ini = fs::read_to_string(&options.export_path).unwrap();
    assert!(ini.starts_with("[Toggles]\n"));
    assert!(ini.contains("ShopCash=0\n"));
    assert!(ini.contains("[Numbers]\nStartupPath=\n"));

    fs::remove_dir_all(&dir).ok();
}

/// A rejected update leaves both the file and the document untouched.
#[test]
fn test_invalid_update_changes_nothing() {
    // Arrange
    let dir = temp_dir();
    let (store, options) = open(&dir);
    store.load().unwrap();
    store.save().unwrap();
    let before = fs::read_to_string(&options.config_path).unwrap();

    // Act
    let result = store.update("toggles", "ShopCash", "sometimes");

    // Assert
    assert!(matches!(result, Err(UpdateError::Invalid(_))));
    assert_eq!(store.get(&["toggles", "ShopCash"]), Some(Value::from(1)));
    assert_eq!(fs::read_to_string(&options.config_path).unwrap(), before);

    fs::remove_dir_all(&dir).ok();
}

/// A `.toml` backing file is read and written as TOML.
#[test]
fn test_toml_backing_file_round_trips() {
    // Arrange
    let dir = temp_dir();
    let options = StoreOptions {
        config_path: dir.join("config.toml"),
        ..StoreOptions::rooted_at(&dir)
    };
    fs::write(&options.config_path, "[toggles]\nShopCash = 0\n").unwrap();
    let store = ConfigStore::open(&options);

    // Act
    store.load().unwrap();
    store.update("vision", "default_timeout", 20).unwrap();
    let reopened = ConfigStore::open(&options);
    reopened.load().unwrap();

    // Assert
    let text = fs::read_to_string(&options.config_path).unwrap();
    assert!(text.contains("[toggles]"));
    assert_eq!(reopened.get(&["toggles", "ShopCash"]), Some(Value::from(0)));
    assert_eq!(
        reopened.get(&["vision", "default_timeout"]),
        Some(Value::from(20))
    );

    fs::remove_dir_all(&dir).ok();
}

// ── Subscribe ─────────────────────────────────────────────────────────────────

/// A failing subscriber does not stop the others from seeing the change.
#[test]
fn test_every_subscriber_sees_update_despite_a_failing_one() {
    // Arrange
    let dir = temp_dir();
    let (store, _options) = open(&dir);
    store.load().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    store.subscribe("failing", |_| anyhow::bail!("not today"));
    let sink = Arc::clone(&seen);
    store.subscribe("recorder", move |doc| {
        sink.lock().unwrap().push(doc.toggles["ShopCash"]);
        Ok(())
    });

    // Act
    store.update("toggles", "ShopCash", 0).unwrap();

    // Assert
    assert_eq!(*seen.lock().unwrap(), vec![0]);

    fs::remove_dir_all(&dir).ok();
}

/// Subscribers removed with `unsubscribe` are no longer called.
#[test]
fn test_unsubscribed_callback_is_not_called() {
    // Arrange
    let dir = temp_dir();
    let (store, _options) = open(&dir);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let id = store.subscribe("counter", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    store.load().unwrap();

    // Act
    assert!(store.unsubscribe(id));
    store.load().unwrap();

    // Assert
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    fs::remove_dir_all(&dir).ok();
}

// ── Concurrency ───────────────────────────────────────────────────────────────

/// Updates, reloads, and reads from several threads never expose a partial
/// document, and the last committed document is the one on disk.
#[test]
fn test_concurrent_update_load_and_get_stay_consistent() {
    // Arrange
    const THREADS: usize = 4;
    const ROUNDS: usize = 25;
    let dir = temp_dir();
    let (store, options) = open(&dir);
    store.load().unwrap();
    let store = Arc::new(store);
    let reference = defaults();

    // Act
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = Arc::clone(&store);
            let reference = reference.clone();
            thread::spawn(move || {
                for round in 0..ROUNDS {
                    let key = format!("Thread{t}");
                    store
                        .update("toggles", &key, (round % 2) as i64)
                        .unwrap();
                    if round % 5 == 0 {
                        store.load().unwrap();
                    }
                    for name in reference.toggles.keys() {
                        assert!(store.get(&["toggles", name]).is_some(), "lost toggle {name}");
                    }
                    for name in reference.numeric_settings.keys() {
                        assert!(store.get(&["numeric_settings", name]).is_some(), "lost {name}");
                    }
                    assert!(store.get(&["vision", "default_confidence"]).is_some());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    // Assert
    for t in 0..THREADS {
        assert_eq!(
            store.get(&["toggles", &format!("Thread{t}")]),
            Some(Value::from(((ROUNDS - 1) % 2) as i64))
        );
    }
    let reopened = ConfigStore::open(&options);
    reopened.load().unwrap();
    assert_eq!(*reopened.snapshot(), *store.snapshot());

    fs::remove_dir_all(&dir).ok();
}

// ── Schema artifact ───────────────────────────────────────────────────────────

#[test]
fn test_schema_artifact_is_written_as_json() {
    // Arrange
    let dir = temp_dir();
    let options = StoreOptions::rooted_at(&dir);

    // Act
    write_schema(&options.schema_path).unwrap();

    // Assert
    let text = fs::read_to_string(&options.schema_path).unwrap();
    let schema: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(schema["type"], "object");
    assert!(schema["properties"]["toggles"].is_object());

    fs::remove_dir_all(&dir).ok();
}
