use tracing::info;

use super::{Dispatcher, MemberJoined, MemberLeft};
use crate::error::Result;
use crate::messages;

impl Dispatcher {
    /// Welcome a new member in the traffic channel
    pub async fn handle_member_join(&self, event: MemberJoined) -> Result<()> {
        if !self.is_our_guild(Some(event.guild_id)) {
            return Ok(());
        }

        let locale = self.locale_of(event.user_id).await;
        let count = self.gateway.member_count().await?;
        let text = messages::welcome_message(
            &self.text("welcomeMessage", locale),
            event.user_id,
            count,
        );

        self.gateway
            .send_message(self.config.traffic_channel_id, &text)
            .await?;
        info!("Welcomed {} (member #{})", event.user_id, count);
        Ok(())
    }

    /// Say goodbye in the traffic channel
    pub async fn handle_member_leave(&self, event: MemberLeft) -> Result<()> {
        if !self.is_our_guild(Some(event.guild_id)) {
            return Ok(());
        }

        let text = messages::farewell_message(
            &self.text("byeMessage", self.default_locale()),
            event.user_id,
            &event.tag,
        );

        self.gateway
            .send_message(self.config.traffic_channel_id, &text)
            .await?;
        info!("{} ({}) left the guild", event.tag, event.user_id);
        Ok(())
    }
}
