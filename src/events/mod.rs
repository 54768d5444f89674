//! Gateway event handling.
//!
//! serenity events are converted into the small event structs below and
//! handed to the [`Dispatcher`], which owns every collaborator a handler
//! needs. Each event is handled on its own task; a failing handler only
//! loses its own event.

pub mod member;
pub mod message;
pub mod reaction;
pub mod ticket;

use poise::serenity_prelude::{
    self as serenity, ChannelId, GuildId, MessageId, ReactionType, RoleId, UserId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::{AssignableRoleMap, BotConfig, LangTable};
use crate::cooldown::{CooldownDomain, SharedCooldownRegistry};
use crate::gateway::SharedGateway;
use crate::models::{Locale, Player};
use crate::scheduler::SharedScheduler;
use crate::store::SharedPlayerStore;
use crate::util::RoleSet;

/// Pause between two role grants of the intro firewall
pub const ROLE_GRANT_PACING: Duration = Duration::from_secs(1);
/// Pause after creating a ticket channel, before posting in it
pub const TICKET_SETTLE_DELAY: Duration = Duration::from_secs(3);
/// Lifetime of the ticket error message
pub const TICKET_ERROR_TTL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// `None` for direct messages
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    /// Roles from the member attached to the message, when present
    pub member_roles: Option<Vec<RoleId>>,
}

impl From<&serenity::Message> for MessageEvent {
    fn from(msg: &serenity::Message) -> Self {
        Self {
            guild_id: msg.guild_id,
            channel_id: msg.channel_id,
            author_id: msg.author.id,
            author_is_bot: msg.author.bot,
            member_roles: msg.member.as_ref().map(|m| m.roles.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: Option<UserId>,
    pub emoji: ReactionType,
}

impl ReactionEvent {
    pub fn emoji_key(&self) -> String {
        emoji_key(&self.emoji)
    }
}

impl From<&serenity::Reaction> for ReactionEvent {
    fn from(reaction: &serenity::Reaction) -> Self {
        Self {
            guild_id: reaction.guild_id,
            channel_id: reaction.channel_id,
            message_id: reaction.message_id,
            user_id: reaction.user_id,
            emoji: reaction.emoji.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemberJoined {
    pub guild_id: GuildId,
    pub user_id: UserId,
}

#[derive(Debug, Clone)]
pub struct MemberLeft {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub tag: String,
}

/// Custom emojis are keyed by id, unicode emojis by their text
pub fn emoji_key(emoji: &ReactionType) -> String {
    match emoji {
        ReactionType::Custom { id, .. } => id.to_string(),
        ReactionType::Unicode(text) => text.clone(),
        #[allow(unreachable_patterns)]
        other => other.to_string(),
    }
}

/// Routes gateway events to the role, ticket and welcome handlers
pub struct Dispatcher {
    config: Arc<BotConfig>,
    lang: Arc<LangTable>,
    assignable_roles: Arc<AssignableRoleMap>,
    gateway: SharedGateway,
    store: SharedPlayerStore,
    cooldowns: SharedCooldownRegistry,
    scheduler: SharedScheduler,
}

impl Dispatcher {
    pub fn new(
        config: Arc<BotConfig>,
        lang: Arc<LangTable>,
        assignable_roles: Arc<AssignableRoleMap>,
        gateway: SharedGateway,
        store: SharedPlayerStore,
        cooldowns: SharedCooldownRegistry,
        scheduler: SharedScheduler,
    ) -> Self {
        Self {
            config,
            lang,
            assignable_roles,
            gateway,
            store,
            cooldowns,
            scheduler,
        }
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedPlayerStore {
        &self.store
    }

    fn is_our_guild(&self, guild_id: Option<GuildId>) -> bool {
        guild_id == Some(self.config.guild_id)
    }

    fn default_locale(&self) -> Locale {
        self.config.default_locale()
    }

    fn cooldown_window(&self, domain: CooldownDomain) -> Duration {
        self.config.cooldowns.window(domain)
    }

    /// Localized string with the default locale as fallback
    pub fn text(&self, name: &str, locale: Locale) -> String {
        self.lang.get(name, locale, self.default_locale())
    }

    /// Stored locale of a user. Store failures fall back to the default.
    pub async fn locale_of(&self, user_id: UserId) -> Locale {
        match self.store.fetch(user_id).await {
            Ok(record) => record
                .and_then(|r| r.locale)
                .unwrap_or_else(|| self.default_locale()),
            Err(e) => {
                warn!("Could not read locale of {}: {}", user_id, e);
                self.default_locale()
            }
        }
    }

    /// Build the request-scoped player from the store and live roles
    async fn load_player(&self, user_id: UserId, roles: RoleSet) -> crate::error::Result<Player> {
        let record = self.store.fetch(user_id).await?;
        Ok(Player::new(user_id, record, roles, self.default_locale()))
    }
}

/// Shared dispatcher type
pub type SharedDispatcher = Arc<Dispatcher>;
