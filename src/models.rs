// src/models.rs
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{RoleId, UserId};
use std::fmt;

use crate::houses::House;
use crate::util::RoleSet;

/// Two-letter language code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale([u8; 2]);

impl Locale {
    pub const FALLBACK: Locale = Locale(*b"fr");

    /// Parse a stored locale. Anything that is not two ASCII letters is rejected.
    pub fn parse(code: &str) -> Option<Locale> {
        let bytes = code.trim().as_bytes();
        match bytes {
            [a, b] if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Some(Locale([a.to_ascii_lowercase(), b.to_ascii_lowercase()]))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        // Only ever built from ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("fr")
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::FALLBACK
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the store knows about a user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerRecord {
    pub house: Option<House>,
    pub premium_until: Option<DateTime<Utc>>,
    pub locale: Option<Locale>,
}

/// Live member state as seen by the gateway
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: UserId,
    pub username: String,
    pub tag: String,
    pub avatar_url: Option<String>,
    pub is_bot: bool,
    pub roles: RoleSet,
}

impl MemberSnapshot {
    pub fn has_role(&self, role_id: RoleId) -> bool {
        self.roles.contains(role_id)
    }
}

/// Request-scoped view of a user, rebuilt for every event that needs it
#[derive(Debug, Clone)]
pub struct Player {
    pub id: UserId,
    pub locale: Locale,
    pub house: Option<House>,
    /// `None` means no premium
    pub premium_until: Option<DateTime<Utc>>,
    pub roles: RoleSet,
}

impl Player {
    pub fn new(id: UserId, record: Option<PlayerRecord>, roles: RoleSet, fallback: Locale) -> Self {
        let record = record.unwrap_or_default();
        Self {
            id,
            locale: record.locale.unwrap_or(fallback),
            house: record.house,
            premium_until: record.premium_until,
            roles,
        }
    }
}
