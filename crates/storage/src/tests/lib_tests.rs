use super::*;

fn database_url_in(dir: &Path) -> String {
    let db_path = dir.join("nested").join("stories.db");
    format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"))
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let value = storage.load_value("search").await.expect("read");
    assert_eq!(value, None);
}

#[tokio::test]
async fn overwrites_value_for_same_key() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.store_value("search", "React").await.expect("write");
    storage.store_value("search", "Redux").await.expect("write");
    let value = storage.load_value("search").await.expect("read");
    assert_eq!(value.as_deref(), Some("Redux"));
}

#[tokio::test]
async fn stores_values_verbatim() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for raw in ["", "  padded  ", "\"quoted\"", "ünïcödé"] {
        storage.store_value("search", raw).await.expect("write");
        let value = storage.load_value("search").await.expect("read");
        assert_eq!(value.as_deref(), Some(raw));
    }
}

#[tokio::test]
async fn deletes_value_and_reports_presence() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.store_value("search", "React").await.expect("write");
    assert!(storage.delete_value("search").await.expect("delete"));
    assert!(!storage.delete_value("search").await.expect("delete again"));
    assert_eq!(storage.load_value("search").await.expect("read"), None);
}

#[tokio::test]
async fn value_survives_reopening_database_file() {
    let temp = tempfile::tempdir().expect("tempdir");
    let database_url = database_url_in(temp.path());

    let first = Storage::new(&database_url).await.expect("db");
    first.store_value("search", "rust").await.expect("write");
    first.pool().close().await;
    drop(first);

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let value = reopened.load_value("search").await.expect("read");
    assert_eq!(value.as_deref(), Some("rust"));
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let database_url = database_url_in(temp.path());

    let storage = Storage::new(&database_url).await.expect("db");
    storage.pool().close().await;

    let db_path = temp.path().join("nested").join("stories.db");
    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn memory_store_round_trips_through_trait() {
    let store: Box<dyn KeyValueStore> = Box::new(MemoryKeyValueStore::new());
    assert_eq!(store.get("search").await.expect("read"), None);
    store.set("search", "Redux").await.expect("write");
    assert_eq!(
        store.get("search").await.expect("read").as_deref(),
        Some("Redux")
    );
}

#[tokio::test]
async fn memory_store_can_be_seeded() {
    let store = MemoryKeyValueStore::with_value("search", "seeded");
    assert_eq!(
        store.get("search").await.expect("read").as_deref(),
        Some("seeded")
    );
}

#[test]
fn memory_urls_have_no_parent_dir() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/stories.db?mode=rwc"),
        Some(PathBuf::from("./data/stories.db"))
    );
}
