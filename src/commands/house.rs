use poise::serenity_prelude::UserId;
use tracing::info;

use crate::error::Result;
use crate::events::Dispatcher;
use crate::messages;
use crate::{Context, Error};

/// Show your house and its points
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn house(ctx: Context<'_>) -> std::result::Result<(), Error> {
    let user_id = ctx.author().id;
    info!("House command called by {}", ctx.author().name);

    let text = describe_house(&ctx.data().dispatcher, user_id).await?;
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

pub async fn describe_house(dispatcher: &Dispatcher, user_id: UserId) -> Result<String> {
    let record = dispatcher.store().fetch(user_id).await?.unwrap_or_default();
    let locale = record
        .locale
        .unwrap_or_else(|| dispatcher.config().default_locale());
    let mention = messages::mention(user_id);

    let Some(house) = record.house else {
        return Ok(messages::fill(
            &dispatcher.text("noHouse", locale),
            &[("mention", &mention)],
        ));
    };

    let points = dispatcher.store().house_points(house).await?;
    Ok(messages::fill(
        &dispatcher.text("houseInfo", locale),
        &[
            ("mention", &mention),
            ("house", house.display_name()),
            ("points", &points.to_string()),
        ],
    ))
}
