pub mod assignable_roles;
pub mod bot_config;
pub mod lang;

pub use assignable_roles::AssignableRoleMap;
pub use bot_config::{BotConfig, CooldownConfig, DutyConfig};
pub use lang::LangTable;

use tracing::info;

/// Everything read from the data directory at startup
///
/// Structure:
/// data/
/// ├── config.json            # Guild, channel, message and role ids
/// ├── lang.json              # Localized strings
/// └── assignable_roles.json  # Emoji -> self-service role
#[derive(Debug, Clone)]
pub struct ConfigBundle {
    pub bot: BotConfig,
    pub lang: LangTable,
    pub assignable_roles: AssignableRoleMap,
}

impl ConfigBundle {
    /// Load every file. Any failure is fatal for the caller.
    pub fn load(data_path: &str) -> crate::error::Result<Self> {
        let bot = BotConfig::load_from_file(&format!("{}/config.json", data_path))?;
        let lang = LangTable::load_from_file(&format!("{}/lang.json", data_path))?;
        let assignable_roles =
            AssignableRoleMap::load_from_file(&format!("{}/assignable_roles.json", data_path))?;

        info!(
            "Config loaded: guild={}, {} lang strings, {} assignable roles, duty={}",
            bot.guild_id,
            lang.len(),
            assignable_roles.len(),
            bot.duty.is_some(),
        );

        Ok(Self {
            bot,
            lang,
            assignable_roles,
        })
    }
}
