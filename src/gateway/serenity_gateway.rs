use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, Cache, ChannelId, GuildId, Http, MessageId, ReactionType, RoleId, UserId,
};
use std::sync::Arc;
use tracing::debug;

use super::{ChannelRequest, ChannelSummary, Gateway, TicketWelcome};
use crate::error::{BotError, Result};
use crate::models::MemberSnapshot;
use crate::util::RoleSet;

const AUDIT_REASON: &str = "hagrid: automatic role sync";

/// Gateway backed by serenity's HTTP client and cache
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
    guild_id: GuildId,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>, guild_id: GuildId) -> Self {
        Self {
            http,
            cache,
            guild_id,
        }
    }
}

fn snapshot(member: &serenity::Member) -> MemberSnapshot {
    MemberSnapshot {
        user_id: member.user.id,
        username: member.user.name.clone(),
        tag: member.user.tag(),
        avatar_url: member.user.avatar_url(),
        is_bot: member.user.bot,
        roles: member.roles.iter().copied().collect::<RoleSet>(),
    }
}

#[async_trait]
impl Gateway for SerenityGateway {
    async fn fetch_member(&self, user_id: UserId) -> Result<MemberSnapshot> {
        let cached = self
            .cache
            .guild(self.guild_id)
            .and_then(|g| g.members.get(&user_id).map(snapshot));
        if let Some(member) = cached {
            return Ok(member);
        }

        debug!("Member {} not cached, fetching", user_id);
        let member = self
            .guild_id
            .member(&*self.http, user_id)
            .await
            .map_err(|_| BotError::MemberNotFound {
                user_id: user_id.to_string(),
            })?;
        Ok(snapshot(&member))
    }

    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        self.http
            .add_member_role(self.guild_id, user_id, role_id, Some(AUDIT_REASON))
            .await?;
        Ok(())
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        self.http
            .remove_member_role(self.guild_id, user_id, role_id, Some(AUDIT_REASON))
            .await?;
        Ok(())
    }

    async fn role_exists(&self, role_id: RoleId) -> Result<bool> {
        let cached = self
            .cache
            .guild(self.guild_id)
            .map(|g| g.roles.contains_key(&role_id));
        if let Some(exists) = cached {
            return Ok(exists);
        }

        let roles = self.guild_id.roles(&*self.http).await?;
        Ok(roles.contains_key(&role_id))
    }

    async fn member_count(&self) -> Result<u64> {
        let cached = self.cache.guild(self.guild_id).map(|g| g.member_count);
        if let Some(count) = cached {
            return Ok(count);
        }

        let guild = self
            .guild_id
            .to_partial_guild_with_counts(&*self.http)
            .await?;
        Ok(guild.approximate_member_count.unwrap_or_default())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        let channels = self.guild_id.channels(&*self.http).await?;
        Ok(channels
            .into_values()
            .map(|c| ChannelSummary {
                id: c.id,
                topic: c.topic,
            })
            .collect())
    }

    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId> {
        let channel = self
            .guild_id
            .create_channel(
                &*self.http,
                serenity::CreateChannel::new(request.name)
                    .kind(serenity::ChannelType::Text)
                    .topic(request.topic)
                    .category(request.category)
                    .permissions(request.overwrites),
            )
            .await?;
        Ok(channel.id)
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<MessageId> {
        let message = channel_id
            .send_message(&*self.http, serenity::CreateMessage::new().content(content))
            .await?;
        Ok(message.id)
    }

    async fn send_ticket_welcome(
        &self,
        channel_id: ChannelId,
        welcome: TicketWelcome,
    ) -> Result<MessageId> {
        let mut author = serenity::CreateEmbedAuthor::new(welcome.author_name);
        if let Some(icon) = welcome.author_icon {
            author = author.icon_url(icon);
        }

        let embed = serenity::CreateEmbed::new()
            .author(author)
            .footer(serenity::CreateEmbedFooter::new(self.bot_name()))
            .description(welcome.description);

        let message = channel_id
            .send_message(
                &*self.http,
                serenity::CreateMessage::new()
                    .content(welcome.content)
                    .embed(embed),
            )
            .await?;
        Ok(message.id)
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        channel_id.delete_message(&*self.http, message_id).await?;
        Ok(())
    }

    async fn clear_reactions(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        channel_id.delete_reactions(&*self.http, message_id).await?;
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        emoji: ReactionType,
    ) -> Result<()> {
        channel_id
            .create_reaction(&*self.http, message_id, emoji)
            .await?;
        Ok(())
    }

    async fn send_direct_message(&self, user_id: UserId, content: &str) -> Result<()> {
        let dm = user_id.create_dm_channel(&*self.http).await?;
        dm.id
            .send_message(&*self.http, serenity::CreateMessage::new().content(content))
            .await?;
        Ok(())
    }

    fn bot_name(&self) -> String {
        self.cache.current_user().name.clone()
    }
}
