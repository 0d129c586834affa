use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn stores_overwrites_and_removes_values() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    assert_eq!(storage.get_value("crm_token").await.expect("read"), None);

    storage.set_value("crm_token", "abc").await.expect("write");
    assert_eq!(
        storage.get_value("crm_token").await.expect("read"),
        Some("abc".to_string())
    );

    storage.set_value("crm_token", "def").await.expect("overwrite");
    assert_eq!(
        storage.get_value("crm_token").await.expect("read"),
        Some("def".to_string())
    );

    assert!(storage.remove_value("crm_token").await.expect("delete"));
    assert!(!storage.remove_value("crm_token").await.expect("delete twice"));
    assert_eq!(storage.get_value("crm_token").await.expect("read"), None);
}

#[tokio::test]
async fn keys_are_independent() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set_value("a", "1").await.expect("write a");
    storage.set_value("b", "2").await.expect("write b");
    storage.remove_value("a").await.expect("delete a");
    assert_eq!(
        storage.get_value("b").await.expect("read b"),
        Some("2".to_string())
    );
}

#[tokio::test]
async fn values_survive_reopening_the_database_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("client.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.set_value("crm_token", "persisted").await.expect("write");
    storage.pool().close().await;
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get_value("crm_token").await.expect("read"),
        Some("persisted".to_string())
    );
}

#[test]
fn sqlite_path_ignores_memory_and_query_suffix() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/crm.db?mode=rwc"),
        Some(PathBuf::from("./data/crm.db"))
    );
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
}
