use anyhow::Result;
use async_trait::async_trait;
use storage::Storage;
use tokio::sync::Mutex;

/// Name of the persisted session entry.
pub const TOKEN_KEY: &str = "crm_token";

/// Persistent home of the session token. Absence means logged out.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>>;
    async fn save(&self, token: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.token.lock().await.take();
        Ok(())
    }
}

pub struct SqliteTokenStore {
    store: Storage,
}

impl SqliteTokenStore {
    pub fn new(store: Storage) -> Self {
        Self { store }
    }

    pub async fn open(database_url: &str) -> Result<Self> {
        Ok(Self::new(Storage::new(database_url).await?))
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn load(&self) -> Result<Option<String>> {
        self.store.get_value(TOKEN_KEY).await
    }

    async fn save(&self, token: &str) -> Result<()> {
        self.store.set_value(TOKEN_KEY, token).await
    }

    async fn clear(&self) -> Result<()> {
        self.store.remove_value(TOKEN_KEY).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_token() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().await.expect("load"), None);
        store.save("x").await.expect("save");
        assert_eq!(store.load().await.expect("load"), Some("x".to_string()));
        store.clear().await.expect("clear");
        assert_eq!(store.load().await.expect("load"), None);
    }

    #[tokio::test]
    async fn sqlite_store_uses_named_entry() {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        let store = SqliteTokenStore::new(storage.clone());

        store.save("persisted").await.expect("save");
        assert_eq!(
            storage.get_value(TOKEN_KEY).await.expect("raw read"),
            Some("persisted".to_string())
        );

        store.clear().await.expect("clear");
        store.clear().await.expect("clear is idempotent");
        assert_eq!(store.load().await.expect("load"), None);
    }
}
