pub mod serenity_gateway;

use async_trait::async_trait;
use poise::serenity_prelude::{
    ChannelId, MessageId, PermissionOverwrite, ReactionType, RoleId, UserId,
};
use std::sync::Arc;

use crate::error::Result;
use crate::models::MemberSnapshot;

pub use serenity_gateway::SerenityGateway;

/// A guild channel as far as ticket lookup cares
#[derive(Debug, Clone)]
pub struct ChannelSummary {
    pub id: ChannelId,
    pub topic: Option<String>,
}

/// Everything needed to open a private text channel
#[derive(Debug, Clone)]
pub struct ChannelRequest {
    pub name: String,
    pub topic: String,
    pub category: ChannelId,
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Embed posted at the top of a new ticket channel
#[derive(Debug, Clone)]
pub struct TicketWelcome {
    pub author_name: String,
    pub author_icon: Option<String>,
    pub description: String,
    pub content: String,
}

/// Discord operations the event handlers rely on, scoped to the bot's guild
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Cached member first, then a live fetch
    async fn fetch_member(&self, user_id: UserId) -> Result<MemberSnapshot>;

    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> Result<()>;

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<()>;

    async fn role_exists(&self, role_id: RoleId) -> Result<bool>;

    async fn member_count(&self) -> Result<u64>;

    async fn list_channels(&self) -> Result<Vec<ChannelSummary>>;

    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId>;

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<MessageId>;

    async fn send_ticket_welcome(
        &self,
        channel_id: ChannelId,
        welcome: TicketWelcome,
    ) -> Result<MessageId>;

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;

    async fn clear_reactions(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()>;

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: ReactionType,
    ) -> Result<()>;

    async fn send_direct_message(&self, user_id: UserId, content: &str) -> Result<()>;

    fn bot_name(&self) -> String;
}

/// Shared gateway type
pub type SharedGateway = Arc<dyn Gateway>;
