use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::{Dispatcher, MessageEvent};
use crate::cooldown::CooldownDomain;
use crate::error::Result;
use crate::models::Player;
use crate::reconcile::reconcile;
use crate::util::RoleSet;

impl Dispatcher {
    /// Messages trigger the house/premium role check, at most once per window
    pub async fn handle_message(&self, event: MessageEvent) -> Result<()> {
        // Direct messages carry no guild and fail the guild check
        if event.author_is_bot || !self.is_our_guild(event.guild_id) {
            return Ok(());
        }

        let user_id = event.author_id;
        let window = self.cooldown_window(CooldownDomain::HouseCheck);
        if !self
            .cooldowns
            .try_suppress(CooldownDomain::HouseCheck, user_id, window)
        {
            debug!("House check for {} still on cooldown", user_id);
            return Ok(());
        }

        let roles: RoleSet = match event.member_roles {
            Some(roles) => roles.into_iter().collect(),
            None => self.gateway.fetch_member(user_id).await?.roles,
        };

        let player = self.load_player(user_id, roles).await?;
        self.sync_player_roles(&player, Utc::now()).await;
        Ok(())
    }

    /// Apply the reconciliation diff. Each failed call is logged and skipped.
    pub async fn sync_player_roles(&self, player: &Player, now: DateTime<Utc>) {
        let result = reconcile(player, self.config.premium_role_id, now);
        if result.diff.is_empty() && !result.clear_premium {
            return;
        }

        for role_id in &result.diff.to_remove {
            match self.gateway.remove_role(player.id, *role_id).await {
                Ok(()) => info!("Removed role {} from {}", role_id, player.id),
                Err(e) => error!("Failed to remove role {} from {}: {}", role_id, player.id, e),
            }
        }

        for role_id in &result.diff.to_add {
            match self.gateway.add_role(player.id, *role_id).await {
                Ok(()) => info!("Added role {} to {}", role_id, player.id),
                Err(e) => error!("Failed to add role {} to {}: {}", role_id, player.id, e),
            }
        }

        if result.clear_premium {
            if let Err(e) = self.store.clear_premium(player.id).await {
                error!("Failed to clear premium of {}: {}", player.id, e);
            }
        }
    }
}
