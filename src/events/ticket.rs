use poise::serenity_prelude::{
    ChannelId, GuildId, PermissionOverwrite, PermissionOverwriteType, Permissions, RoleId, UserId,
};
use tracing::{debug, error, info, warn};

use super::{Dispatcher, ReactionEvent, TICKET_ERROR_TTL, TICKET_SETTLE_DELAY};
use crate::cooldown::CooldownDomain;
use crate::error::Result;
use crate::gateway::{ChannelRequest, ChannelSummary, TicketWelcome};
use crate::messages;
use crate::models::MemberSnapshot;

/// What the requester and staff may do in a ticket channel
pub fn ticket_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::ATTACH_FILES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::USE_EXTERNAL_EMOJIS
        | Permissions::ADD_REACTIONS
}

/// Hidden from @everyone, open to the requester and each staff role
pub fn ticket_overwrites(
    guild_id: GuildId,
    requester: UserId,
    staff_roles: &[RoleId],
) -> Vec<PermissionOverwrite> {
    // The @everyone role shares the guild's id
    let everyone = RoleId::new(guild_id.get());

    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(everyone),
        },
        PermissionOverwrite {
            allow: ticket_permissions(),
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(requester),
        },
    ];

    overwrites.extend(staff_roles.iter().map(|role_id| PermissionOverwrite {
        allow: ticket_permissions(),
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Role(*role_id),
    }));

    overwrites
}

/// Ticket channels carry the requester's id at the start of their topic
pub fn find_ticket_channel(channels: &[ChannelSummary], user_id: UserId) -> Option<ChannelId> {
    let id = user_id.to_string();
    channels
        .iter()
        .find(|c| {
            c.topic.as_deref().is_some_and(|topic| {
                topic
                    .strip_prefix(id.as_str())
                    .is_some_and(|rest| !rest.starts_with(|ch: char| ch.is_ascii_digit()))
            })
        })
        .map(|c| c.id)
}

impl Dispatcher {
    pub(super) async fn handle_ticket_request(
        &self,
        event: &ReactionEvent,
        member: &MemberSnapshot,
    ) -> Result<()> {
        // The channel scan cannot see a channel that is still being created,
        // so a second request while one is in flight is dropped here
        let window = self.cooldown_window(CooldownDomain::TicketRequest);
        let outcome = if self
            .cooldowns
            .try_suppress(CooldownDomain::TicketRequest, member.user_id, window)
        {
            self.open_ticket(event, member).await
        } else {
            debug!("Ticket request from {} already in progress", member.tag);
            Ok(())
        };

        // Put the trigger emoji back so the next user can click it
        if let Err(e) = self
            .gateway
            .clear_reactions(event.channel_id, event.message_id)
            .await
        {
            warn!("Failed to clear ticket reactions: {}", e);
        }
        if let Err(e) = self
            .gateway
            .add_reaction(event.channel_id, event.message_id, event.emoji.clone())
            .await
        {
            warn!("Failed to re-add ticket reaction: {}", e);
        }

        outcome
    }

    async fn open_ticket(&self, event: &ReactionEvent, member: &MemberSnapshot) -> Result<()> {
        let locale = self.locale_of(member.user_id).await;
        let channels = self.gateway.list_channels().await?;

        if let Some(existing) = find_ticket_channel(&channels, member.user_id) {
            debug!("{} already has ticket channel {}", member.tag, existing);
            let notice = format!(
                "{} {}",
                messages::mention(member.user_id),
                self.text("ticketChannelAlreadyExists", locale)
            );
            self.gateway.send_message(existing, &notice).await?;
            return Ok(());
        }

        let request = ChannelRequest {
            name: member.username.clone(),
            topic: member.user_id.to_string(),
            category: self.config.ticket_category_id,
            overwrites: ticket_overwrites(
                self.config.guild_id,
                member.user_id,
                &self.config.ticket_staff_roles,
            ),
        };

        let created = self.gateway.create_channel(request).await;
        tokio::time::sleep(TICKET_SETTLE_DELAY).await;

        let channel_id = match created {
            Ok(channel_id) => channel_id,
            Err(e) => {
                error!("Failed to create ticket channel for {}: {}", member.tag, e);
                self.post_transient_error(event.channel_id, &self.text("ticketError", locale))
                    .await;
                return Ok(());
            }
        };

        let welcome = TicketWelcome {
            author_name: member.username.clone(),
            author_icon: member.avatar_url.clone(),
            description: self.text("ticketMessage", locale),
            content: messages::fill(
                &self.text("afterTicketMention", locale),
                &[("uid", &member.user_id.to_string())],
            ),
        };
        if let Err(e) = self.gateway.send_ticket_welcome(channel_id, welcome).await {
            error!("Failed to post ticket welcome in {}: {}", channel_id, e);
        }

        info!("Created ticket channel {} for {}", channel_id, member.tag);
        Ok(())
    }

    /// Post a message and delete it once `TICKET_ERROR_TTL` has passed
    async fn post_transient_error(&self, channel_id: ChannelId, text: &str) {
        let message_id = match self.gateway.send_message(channel_id, text).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to post ticket error message: {}", e);
                return;
            }
        };

        let gateway = self.gateway.clone();
        self.scheduler.schedule(TICKET_ERROR_TTL, async move {
            if let Err(e) = gateway.delete_message(channel_id, message_id).await {
                debug!("Ticket error message {} already gone: {}", message_id, e);
            }
        });
    }
}
