use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::player_database::PlayerDatabase;
use crate::error::Result;
use crate::houses::House;
use crate::models::PlayerRecord;

/// Persisted per-user attributes
#[async_trait]
pub trait PlayerStore: Send + Sync {
    /// `None` when the user has no stored row
    async fn fetch(&self, user_id: UserId) -> Result<Option<PlayerRecord>>;

    async fn clear_premium(&self, user_id: UserId) -> Result<()>;

    async fn house_points(&self, house: House) -> Result<u32>;

    /// Write pending state before shutdown
    async fn flush(&self) -> Result<()>;
}

/// Shared player store type
pub type SharedPlayerStore = Arc<dyn PlayerStore>;

/// Player store kept in memory and mirrored to a JSON file
pub struct JsonPlayerStore {
    db: RwLock<PlayerDatabase>,
    path: String,
}

impl JsonPlayerStore {
    pub async fn open(path: &str) -> Result<Self> {
        let db = PlayerDatabase::load(path).await?;
        info!("Loaded {} players from {}", db.player_count(), path);
        Ok(Self {
            db: RwLock::new(db),
            path: path.to_string(),
        })
    }
}

#[async_trait]
impl PlayerStore for JsonPlayerStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<PlayerRecord>> {
        let db = self.db.read().await;
        Ok(db.record(&user_id.to_string()))
    }

    async fn clear_premium(&self, user_id: UserId) -> Result<()> {
        let mut db = self.db.write().await;
        if db.clear_premium(&user_id.to_string()) {
            db.save(&self.path).await?;
            info!("Cleared expired premium for {}", user_id);
        } else {
            debug!("No stored player {} to clear premium for", user_id);
        }
        Ok(())
    }

    async fn house_points(&self, house: House) -> Result<u32> {
        let db = self.db.read().await;
        Ok(db.points(house))
    }

    async fn flush(&self) -> Result<()> {
        let db = self.db.read().await;
        db.save(&self.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> String {
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        std::env::temp_dir()
            .join(format!("hagrid-{}-{}-{}.json", name, std::process::id(), nanos))
            .to_string_lossy()
            .into_owned()
    }

    #[tokio::test]
    async fn test_missing_file_opens_empty() {
        let store = JsonPlayerStore::open(&temp_path("missing")).await.unwrap();
        assert!(store.fetch(UserId::new(1)).await.unwrap().is_none());
        assert_eq!(store.house_points(House::Serdaigle).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_premium_is_persisted() {
        let path = temp_path("premium");
        tokio::fs::write(
            &path,
            r#"{
                "version": 1,
                "last_updated": 0,
                "players": { "10": { "house": "GRYFFONDOR", "premium_until": "1000", "locale": "fr" } }
            }"#,
        )
        .await
        .unwrap();

        let store = JsonPlayerStore::open(&path).await.unwrap();
        let record = store.fetch(UserId::new(10)).await.unwrap().unwrap();
        assert!(record.premium_until.is_some());

        store.clear_premium(UserId::new(10)).await.unwrap();

        let reopened = JsonPlayerStore::open(&path).await.unwrap();
        let record = reopened.fetch(UserId::new(10)).await.unwrap().unwrap();
        assert_eq!(record.premium_until, None);
        assert_eq!(record.house, Some(House::Gryffondor));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        assert!(JsonPlayerStore::open(&path).await.is_err());

        let _ = tokio::fs::remove_file(&path).await;
    }
}
