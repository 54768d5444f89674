use poise::serenity_prelude::RoleId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Self-service roles: emoji key -> role
/// Loaded from data/assignable_roles.json, read-only afterwards
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignableRoleMap {
    roles: HashMap<String, RoleId>,
}

impl AssignableRoleMap {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
            path: path.to_string(),
            source: e,
        })
    }

    pub fn role_for(&self, emoji_key: &str) -> Option<RoleId> {
        self.roles.get(emoji_key).copied()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }
}

impl FromIterator<(String, RoleId)> for AssignableRoleMap {
    fn from_iter<I: IntoIterator<Item = (String, RoleId)>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_map() {
        let map: AssignableRoleMap = serde_json::from_str(
            r#"{
                "801000000000000001": "802000000000000001",
                "🎮": "802000000000000002"
            }"#,
        )
        .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(
            map.role_for("801000000000000001"),
            Some(RoleId::new(802000000000000001))
        );
        assert_eq!(map.role_for("🎮"), Some(RoleId::new(802000000000000002)));
        assert_eq!(map.role_for("nope"), None);
    }
}
