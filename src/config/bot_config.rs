use poise::serenity_prelude::{ChannelId, GuildId, MessageId, RoleId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cooldown::CooldownDomain;
use crate::events::TICKET_SETTLE_DELAY;
use crate::models::Locale;

/// Main bot configuration
/// Loaded from data/config.json
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// The only guild the bot acts on
    pub guild_id: GuildId,

    /// Message whose reactions hand out the intro roles
    pub intro_message_id: MessageId,
    pub intro_roles: Vec<RoleId>,

    /// Message whose reactions open a support ticket
    pub ticket_message_id: MessageId,
    /// Emoji key (custom emoji id or unicode character) that opens a ticket
    pub ticket_emoji: String,
    pub ticket_category_id: ChannelId,
    /// Roles that can see every ticket channel
    #[serde(default)]
    pub ticket_staff_roles: Vec<RoleId>,

    pub premium_role_id: RoleId,

    /// Channel for join/leave messages
    pub traffic_channel_id: ChannelId,

    /// Channel where reactions hand out self-service roles
    pub assignable_roles_channel_id: ChannelId,

    /// Optional "on duty" role toggled by a reaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty: Option<DutyConfig>,

    #[serde(default = "default_locale")]
    pub default_locale: String,

    #[serde(default = "default_status_message")]
    pub status_message: String,

    #[serde(default)]
    pub cooldowns: CooldownConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DutyConfig {
    pub message_id: MessageId,
    pub emoji: String,
    pub role_id: RoleId,
}

/// Cooldown windows in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CooldownConfig {
    #[serde(default = "default_house_check_secs")]
    pub house_check_secs: u64,
    #[serde(default = "default_intro_firewall_secs")]
    pub intro_firewall_secs: u64,
    /// Must outlast channel creation and the settle delay
    #[serde(default = "default_ticket_request_secs")]
    pub ticket_request_secs: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            house_check_secs: default_house_check_secs(),
            intro_firewall_secs: default_intro_firewall_secs(),
            ticket_request_secs: default_ticket_request_secs(),
        }
    }
}

impl CooldownConfig {
    pub fn window(&self, domain: CooldownDomain) -> Duration {
        match domain {
            CooldownDomain::HouseCheck => Duration::from_secs(self.house_check_secs),
            CooldownDomain::IntroFirewall => Duration::from_secs(self.intro_firewall_secs),
            CooldownDomain::TicketRequest => Duration::from_secs(self.ticket_request_secs),
        }
    }
}

fn default_locale() -> String {
    Locale::FALLBACK.to_string()
}

fn default_status_message() -> String {
    "vous surveiller bande d'ingrats -_-".to_string()
}

fn default_house_check_secs() -> u64 {
    30
}

fn default_intro_firewall_secs() -> u64 {
    20
}

fn default_ticket_request_secs() -> u64 {
    10
}

impl BotConfig {
    /// Load from a JSON file
    pub fn load_from_file(path: &str) -> crate::error::Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| crate::error::BotError::ConfigLoad {
                path: path.to_string(),
                source: e,
            })?;

        let config: Self =
            serde_json::from_str(&content).map_err(|e| crate::error::BotError::ConfigParse {
                path: path.to_string(),
                source: e,
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if Locale::parse(&self.default_locale).is_none() {
            return Err(crate::error::BotError::ConfigValidation {
                message: format!(
                    "default_locale '{}' is not a two-letter code",
                    self.default_locale
                ),
            });
        }

        if self.ticket_emoji.trim().is_empty() {
            return Err(crate::error::BotError::ConfigValidation {
                message: "ticket_emoji must not be empty".to_string(),
            });
        }

        if self.cooldowns.house_check_secs == 0 || self.cooldowns.intro_firewall_secs == 0 {
            return Err(crate::error::BotError::ConfigValidation {
                message: "cooldown windows must be at least one second".to_string(),
            });
        }

        if self.cooldowns.window(CooldownDomain::TicketRequest) <= TICKET_SETTLE_DELAY {
            return Err(crate::error::BotError::ConfigValidation {
                message: format!(
                    "ticket_request_secs must be longer than the {}s ticket settle delay",
                    TICKET_SETTLE_DELAY.as_secs()
                ),
            });
        }

        Ok(())
    }

    pub fn default_locale(&self) -> Locale {
        Locale::parse(&self.default_locale).unwrap_or(Locale::FALLBACK)
    }
}
