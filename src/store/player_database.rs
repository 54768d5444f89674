use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::houses::House;
use crate::models::{Locale, PlayerRecord};

/// On-disk player attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerDatabase {
    /// Schema version
    pub version: u32,

    /// Last update timestamp
    pub last_updated: u64,

    /// Map of Discord ID (as string) to stored attributes
    #[serde(default)]
    pub players: HashMap<String, StoredPlayer>,

    /// House key -> points
    #[serde(default)]
    pub house_points: HashMap<String, u32>,
}

impl Default for PlayerDatabase {
    fn default() -> Self {
        Self {
            version: 1,
            last_updated: current_timestamp(),
            players: HashMap::new(),
            house_points: HashMap::new(),
        }
    }
}

impl PlayerDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file, or create new if not exists
    pub async fn load(path: &str) -> crate::error::Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
                    path: path.to_string(),
                    source: e,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(crate::error::BotError::StateLoad {
                path: path.to_string(),
                source: e,
            }),
        }
    }

    /// Save to a JSON file atomically
    pub async fn save(&self, path: &str) -> crate::error::Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = format!("{}.tmp", path);
        tokio::fs::write(&temp_path, &content).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: path.to_string(),
                source: e,
            }
        })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            crate::error::BotError::StateSave {
                path: path.to_string(),
                source: e,
            }
        })?;

        Ok(())
    }

    pub fn record(&self, discord_id: &str) -> Option<PlayerRecord> {
        self.players.get(discord_id).map(|p| p.to_record(discord_id))
    }

    /// Returns false if the player was unknown
    pub fn clear_premium(&mut self, discord_id: &str) -> bool {
        match self.players.get_mut(discord_id) {
            Some(player) => {
                player.premium_until.clear();
                self.last_updated = current_timestamp();
                true
            }
            None => false,
        }
    }

    pub fn points(&self, house: House) -> u32 {
        self.house_points.get(house.key()).copied().unwrap_or(0)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

/// Stored attributes of one player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredPlayer {
    /// House name, or the numeric id used by old records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house: Option<HouseRef>,

    /// Premium expiry in epoch milliseconds, empty when none
    #[serde(default)]
    pub premium_until: String,

    #[serde(default)]
    pub locale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HouseRef {
    Name(String),
    LegacyId(u8),
}

impl StoredPlayer {
    fn to_record(&self, discord_id: &str) -> PlayerRecord {
        let house = match &self.house {
            Some(HouseRef::Name(name)) if name.trim().is_empty() => None,
            Some(HouseRef::Name(name)) => {
                let house = House::resolve_by_name(name);
                if house.is_none() {
                    warn!("Player {} has unknown house '{}'", discord_id, name);
                }
                house
            }
            Some(HouseRef::LegacyId(id)) => {
                let house = House::resolve_by_legacy_id(*id);
                if house.is_none() {
                    warn!("Player {} has unknown house id {}", discord_id, id);
                }
                house
            }
            None => None,
        };

        PlayerRecord {
            house,
            premium_until: parse_premium(&self.premium_until),
            locale: Locale::parse(&self.locale),
        }
    }
}

/// Empty, zero or unparsable values all mean "no premium"
pub fn parse_premium(raw: &str) -> Option<DateTime<Utc>> {
    let millis: i64 = raw.trim().parse().ok()?;
    if millis == 0 {
        return None;
    }
    Utc.timestamp_millis_opt(millis).single()
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
