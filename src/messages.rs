// src/messages.rs
use poise::serenity_prelude::UserId;

/// Replace every `{{key}}` placeholder with its value
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values.iter().fold(template.to_string(), |text, (key, value)| {
        text.replace(&format!("{{{{{}}}}}", key), value)
    })
}

pub fn mention(user_id: UserId) -> String {
    format!("<@{}>", user_id)
}

pub fn welcome_message(template: &str, user_id: UserId, member_count: u64) -> String {
    fill(
        template,
        &[
            ("mention", &mention(user_id)),
            ("count", &member_count.to_string()),
        ],
    )
}

pub fn farewell_message(template: &str, user_id: UserId, tag: &str) -> String {
    let username = format!("{}(`{}`)", mention(user_id), tag);
    fill(template, &[("username", &username)])
}
