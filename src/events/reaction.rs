use poise::serenity_prelude::RoleId;
use tracing::{debug, error, info, warn};

use super::{Dispatcher, ReactionEvent, ROLE_GRANT_PACING};
use crate::cooldown::CooldownDomain;
use crate::error::Result;
use crate::messages;
use crate::models::MemberSnapshot;

/// What a reaction is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReactionTarget {
    Intro,
    Ticket,
    Duty(RoleId),
    AssignableRole,
    Other,
}

impl Dispatcher {
    fn reaction_target(&self, event: &ReactionEvent) -> ReactionTarget {
        let config = &self.config;
        let key = event.emoji_key();

        if event.message_id == config.intro_message_id {
            return ReactionTarget::Intro;
        }
        if event.message_id == config.ticket_message_id && key == config.ticket_emoji {
            return ReactionTarget::Ticket;
        }
        if let Some(duty) = &config.duty {
            if event.message_id == duty.message_id && key == duty.emoji {
                return ReactionTarget::Duty(duty.role_id);
            }
        }
        if event.channel_id == config.assignable_roles_channel_id {
            return ReactionTarget::AssignableRole;
        }
        ReactionTarget::Other
    }

    pub async fn handle_reaction_add(&self, event: ReactionEvent) -> Result<()> {
        if !self.is_our_guild(event.guild_id) {
            return Ok(());
        }
        let Some(user_id) = event.user_id else {
            return Ok(());
        };

        let target = self.reaction_target(&event);
        if target == ReactionTarget::Other {
            return Ok(());
        }

        let member = self.gateway.fetch_member(user_id).await?;
        if member.is_bot {
            return Ok(());
        }

        match target {
            ReactionTarget::Intro => self.handle_intro_firewall(&member).await,
            ReactionTarget::Ticket => self.handle_ticket_request(&event, &member).await,
            ReactionTarget::Duty(role_id) => self.grant_role(&member, role_id).await,
            ReactionTarget::AssignableRole => self.handle_assignable_role_add(&event, &member).await,
            ReactionTarget::Other => Ok(()),
        }
    }

    pub async fn handle_reaction_remove(&self, event: ReactionEvent) -> Result<()> {
        if !self.is_our_guild(event.guild_id) {
            return Ok(());
        }
        let Some(user_id) = event.user_id else {
            return Ok(());
        };

        let role_id = match self.reaction_target(&event) {
            ReactionTarget::Duty(role_id) => role_id,
            ReactionTarget::AssignableRole => {
                match self.assignable_roles.role_for(&event.emoji_key()) {
                    Some(role_id) => role_id,
                    None => return Ok(()),
                }
            }
            _ => return Ok(()),
        };

        let member = self.gateway.fetch_member(user_id).await?;
        if member.has_role(role_id) {
            self.gateway.remove_role(user_id, role_id).await?;
            info!("Removed role {} from {} on reaction removal", role_id, member.tag);
        }
        Ok(())
    }

    /// Hand out the intro roles, once per cooldown window
    async fn handle_intro_firewall(&self, member: &MemberSnapshot) -> Result<()> {
        let window = self.cooldown_window(CooldownDomain::IntroFirewall);
        if !self
            .cooldowns
            .try_suppress(CooldownDomain::IntroFirewall, member.user_id, window)
        {
            debug!("Intro reaction from {} still on cooldown", member.tag);
            return Ok(());
        }

        info!("Firewall reaction from {}", member.tag);

        let missing: Vec<RoleId> = member.roles.missing(&self.config.intro_roles).collect();
        for (i, role_id) in missing.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(ROLE_GRANT_PACING).await;
            }
            if let Err(e) = self.gateway.add_role(member.user_id, *role_id).await {
                error!("Failed to grant intro role {} to {}: {}", role_id, member.tag, e);
            }
        }
        Ok(())
    }

    async fn handle_assignable_role_add(
        &self,
        event: &ReactionEvent,
        member: &MemberSnapshot,
    ) -> Result<()> {
        let key = event.emoji_key();
        let Some(role_id) = self.assignable_roles.role_for(&key) else {
            info!(
                "Unknown emoji '{}' from {} in the assignable roles channel",
                key, member.tag
            );
            return Ok(());
        };

        if member.has_role(role_id) {
            return Ok(());
        }

        if !self.gateway.role_exists(role_id).await? {
            warn!("Assignable role {} no longer exists", role_id);
            let locale = self.locale_of(member.user_id).await;
            let text = messages::fill(
                &self.text("roleError", locale),
                &[("id", &role_id.to_string())],
            );
            if let Err(e) = self.gateway.send_direct_message(member.user_id, &text).await {
                warn!("Could not DM {} about missing role: {}", member.tag, e);
            }
            return Ok(());
        }

        self.grant_role(member, role_id).await
    }

    async fn grant_role(&self, member: &MemberSnapshot, role_id: RoleId) -> Result<()> {
        if member.has_role(role_id) {
            return Ok(());
        }
        self.gateway.add_role(member.user_id, role_id).await?;
        info!("Gave role {} to {} on reaction", role_id, member.tag);
        Ok(())
    }
}
