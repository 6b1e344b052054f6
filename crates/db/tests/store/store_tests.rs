use super::*;
use crate::{PERCENTAGE_KEY, SUBJECTS_KEY, TIMETABLE_KEY, USER_DATA_KEYS};
use std::path::PathBuf;

struct TempDbFile {
    path: PathBuf,
}

impl TempDbFile {
    fn new() -> Self {
        let path =
            std::env::temp_dir().join(format!("bunkmate-store-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }
}

impl Drop for TempDbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

#[tokio::test]
async fn libsql_store_should_round_trip_and_overwrite_values() {
    let file = TempDbFile::new();
    let store = LibsqlKeyValueStore::open(&file.path)
        .await
        .expect("open store");

    assert_eq!(store.get_string(TIMETABLE_KEY).await.expect("get"), None);

    store.set_string(PERCENTAGE_KEY, "80").await.expect("set");
    store.set_string(PERCENTAGE_KEY, "85").await.expect("overwrite");
    assert_eq!(
        store.get_string(PERCENTAGE_KEY).await.expect("get").as_deref(),
        Some("85")
    );
}

#[tokio::test]
async fn libsql_store_should_write_batches_together_and_remove_many() {
    let file = TempDbFile::new();
    let store = LibsqlKeyValueStore::open(&file.path)
        .await
        .expect("open store");

    store
        .set_many(&[(TIMETABLE_KEY, "{\"days\":[]}"), (SUBJECTS_KEY, "[]")])
        .await
        .expect("set many");
    store.set_string(PERCENTAGE_KEY, "60").await.expect("set");

    let values = store.get_many(&USER_DATA_KEYS).await.expect("get many");
    assert_eq!(values.len(), 3);
    assert_eq!(values.get(SUBJECTS_KEY).map(String::as_str), Some("[]"));

    store.remove_many(&USER_DATA_KEYS).await.expect("remove many");
    for key in USER_DATA_KEYS {
        assert_eq!(store.get_string(key).await.expect("get"), None);
    }
}

#[tokio::test]
async fn libsql_store_should_persist_across_reopen() {
    let file = TempDbFile::new();
    {
        let store = LibsqlKeyValueStore::open(&file.path)
            .await
            .expect("open store");
        store.set_string(SUBJECTS_KEY, "[1]").await.expect("set");
    }

    let reopened = LibsqlKeyValueStore::open(&file.path)
        .await
        .expect("reopen store");
    assert_eq!(
        reopened.get_string(SUBJECTS_KEY).await.expect("get").as_deref(),
        Some("[1]")
    );
}

#[tokio::test]
async fn memory_store_should_remove_single_and_many_keys() {
    let store = MemoryKeyValueStore::with_entries([
        (TIMETABLE_KEY, "t"),
        (SUBJECTS_KEY, "s"),
        (PERCENTAGE_KEY, "75"),
        ("unrelated", "keep"),
    ]);

    store.remove_string(TIMETABLE_KEY).await.expect("remove");
    assert_eq!(store.get_string(TIMETABLE_KEY).await.expect("get"), None);

    store.remove_many(&USER_DATA_KEYS).await.expect("remove many");
    assert_eq!(store.get_string(PERCENTAGE_KEY).await.expect("get"), None);
    assert_eq!(
        store.get_string("unrelated").await.expect("get").as_deref(),
        Some("keep")
    );
}

#[tokio::test]
async fn memory_store_should_apply_default_set_many() {
    let store = MemoryKeyValueStore::new();
    store
        .set_many(&[(TIMETABLE_KEY, "a"), (SUBJECTS_KEY, "b")])
        .await
        .expect("set many");

    assert_eq!(store.get_string(TIMETABLE_KEY).await.expect("get").as_deref(), Some("a"));
    assert_eq!(store.get_string(SUBJECTS_KEY).await.expect("get").as_deref(), Some("b"));
}

#[tokio::test]
async fn libsql_store_should_run_removals_on_spawned_tasks() {
    let file = TempDbFile::new();
    let store: std::sync::Arc<dyn KeyValueStore> = std::sync::Arc::new(
        LibsqlKeyValueStore::open(&file.path).await.expect("open store"),
    );
    store
        .set_many(&[(TIMETABLE_KEY, "{}"), (SUBJECTS_KEY, "[]"), (PERCENTAGE_KEY, "75")])
        .await
        .expect("seed");

    let remover = store.clone();
    tokio::spawn(async move { remover.remove_string(PERCENTAGE_KEY).await })
        .await
        .expect("join remove_string")
        .expect("remove_string");
    let remover = store.clone();
    tokio::spawn(async move { remover.remove_many(&[TIMETABLE_KEY, SUBJECTS_KEY]).await })
        .await
        .expect("join remove_many")
        .expect("remove_many");

    for key in USER_DATA_KEYS {
        assert_eq!(store.get_string(key).await.expect("get"), None);
    }
}
