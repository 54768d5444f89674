//! In-memory doubles for the gateway and the store, used by handler tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use poise::serenity_prelude::{
    ChannelId, GuildId, MessageId, ReactionType, RoleId, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{AssignableRoleMap, BotConfig, CooldownConfig, DutyConfig, LangTable};
use crate::cooldown::{create_shared_cooldown_registry, SharedCooldownRegistry};
use crate::error::{BotError, Result};
use crate::events::{Dispatcher, ReactionEvent};
use crate::gateway::{ChannelRequest, ChannelSummary, Gateway, TicketWelcome};
use crate::houses::House;
use crate::models::{MemberSnapshot, PlayerRecord};
use crate::scheduler::create_shared_scheduler;
use crate::store::PlayerStore;

pub const TICKET_CHANNEL: ChannelId = ChannelId::new(3004);
pub const SOME_MESSAGE: MessageId = MessageId::new(1009);
pub const GAMER_EMOJI: &str = "🎮";
pub const GAMER_ROLE: RoleId = RoleId::new(2040);

/// Side effects recorded by [`FakeGateway`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddRole(UserId, RoleId),
    RemoveRole(UserId, RoleId),
    CreateChannel { name: String, topic: String },
    SendMessage(ChannelId, String),
    /// (description, content)
    TicketWelcome(ChannelId, (String, String)),
    DeleteMessage(ChannelId, MessageId),
    ClearReactions(ChannelId, MessageId),
    AddReaction(ChannelId, MessageId),
    DirectMessage(UserId, String),
}

#[derive(Default)]
struct GatewayState {
    members: HashMap<UserId, MemberSnapshot>,
    channels: Vec<ChannelSummary>,
    guild_roles: HashSet<RoleId>,
    member_count: u64,
    fail_create: bool,
    create_delay: Option<Duration>,
    fail_roles: HashSet<RoleId>,
    fail_deletes: bool,
    calls: Vec<Call>,
    grant_times: Vec<Instant>,
    next_id: u64,
}

impl GatewayState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        500_000 + self.next_id
    }
}

fn rejected() -> BotError {
    BotError::Discord {
        message: "Missing Permissions".to_string(),
    }
}

#[derive(Default)]
pub struct FakeGateway {
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    pub fn add_member(&self, member: MemberSnapshot) {
        self.state.lock().members.insert(member.user_id, member);
    }

    pub fn add_guild_role(&self, role_id: RoleId) {
        self.state.lock().guild_roles.insert(role_id);
    }

    pub fn set_member_count(&self, count: u64) {
        self.state.lock().member_count = count;
    }

    pub fn fail_channel_creation(&self, fail: bool) {
        self.state.lock().fail_create = fail;
    }

    /// Delay `create_channel` like a slow HTTP call
    pub fn set_create_delay(&self, delay: Duration) {
        self.state.lock().create_delay = Some(delay);
    }

    /// Role additions and removals of `role_id` are rejected
    pub fn fail_roles(&self, role_id: RoleId) {
        self.state.lock().fail_roles.insert(role_id);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.state.lock().fail_deletes = fail;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn role_grant_times(&self) -> Vec<Instant> {
        self.state.lock().grant_times.clone()
    }
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_member(&self, user_id: UserId) -> Result<MemberSnapshot> {
        self.state
            .lock()
            .members
            .get(&user_id)
            .cloned()
            .ok_or_else(|| BotError::MemberNotFound {
                user_id: user_id.to_string(),
            })
    }

    async fn add_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::AddRole(user_id, role_id));
        state.grant_times.push(Instant::now());
        if state.fail_roles.contains(&role_id) {
            return Err(rejected());
        }
        if let Some(member) = state.members.get_mut(&user_id) {
            member.roles.insert(role_id);
        }
        Ok(())
    }

    async fn remove_role(&self, user_id: UserId, role_id: RoleId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::RemoveRole(user_id, role_id));
        if state.fail_roles.contains(&role_id) {
            return Err(rejected());
        }
        if let Some(member) = state.members.get_mut(&user_id) {
            member.roles.remove(role_id);
        }
        Ok(())
    }

    async fn role_exists(&self, role_id: RoleId) -> Result<bool> {
        Ok(self.state.lock().guild_roles.contains(&role_id))
    }

    async fn member_count(&self) -> Result<u64> {
        Ok(self.state.lock().member_count)
    }

    async fn list_channels(&self) -> Result<Vec<ChannelSummary>> {
        Ok(self.state.lock().channels.clone())
    }

    async fn create_channel(&self, request: ChannelRequest) -> Result<ChannelId> {
        let delay = self.state.lock().create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.calls.push(Call::CreateChannel {
            name: request.name.clone(),
            topic: request.topic.clone(),
        });
        if state.fail_create {
            return Err(rejected());
        }

        let id = ChannelId::new(state.next_id());
        state.channels.push(ChannelSummary {
            id,
            topic: Some(request.topic),
        });
        Ok(id)
    }

    async fn send_message(&self, channel_id: ChannelId, content: &str) -> Result<MessageId> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::SendMessage(channel_id, content.to_string()));
        Ok(MessageId::new(state.next_id()))
    }

    async fn send_ticket_welcome(
        &self,
        channel_id: ChannelId,
        welcome: TicketWelcome,
    ) -> Result<MessageId> {
        let mut state = self.state.lock();
        state.calls.push(Call::TicketWelcome(
            channel_id,
            (welcome.description, welcome.content),
        ));
        Ok(MessageId::new(state.next_id()))
    }

    async fn delete_message(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::DeleteMessage(channel_id, message_id));
        if state.fail_deletes {
            return Err(BotError::Discord {
                message: "Unknown Message".to_string(),
            });
        }
        Ok(())
    }

    async fn clear_reactions(&self, channel_id: ChannelId, message_id: MessageId) -> Result<()> {
        self.state
            .lock()
            .calls
            .push(Call::ClearReactions(channel_id, message_id));
        Ok(())
    }

    async fn add_reaction(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        _emoji: ReactionType,
    ) -> Result<()> {
        self.state
            .lock()
            .calls
            .push(Call::AddReaction(channel_id, message_id));
        Ok(())
    }

    async fn send_direct_message(&self, user_id: UserId, content: &str) -> Result<()> {
        self.state
            .lock()
            .calls
            .push(Call::DirectMessage(user_id, content.to_string()));
        Ok(())
    }

    fn bot_name(&self) -> String {
        "Hagrid".to_string()
    }
}

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<HashMap<UserId, PlayerRecord>>,
    cleared: Mutex<Vec<UserId>>,
    points: Mutex<HashMap<House, u32>>,
    fail: AtomicBool,
}

impl FakeStore {
    pub fn insert(&self, user_id: UserId, record: PlayerRecord) {
        self.records.lock().insert(user_id, record);
    }

    pub fn set_points(&self, house: House, points: u32) {
        self.points.lock().insert(house, points);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn cleared(&self) -> Vec<UserId> {
        self.cleared.lock().clone()
    }
}

#[async_trait]
impl PlayerStore for FakeStore {
    async fn fetch(&self, user_id: UserId) -> Result<Option<PlayerRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(BotError::Internal {
                message: "connection refused".to_string(),
            });
        }
        Ok(self.records.lock().get(&user_id).cloned())
    }

    async fn clear_premium(&self, user_id: UserId) -> Result<()> {
        if let Some(record) = self.records.lock().get_mut(&user_id) {
            record.premium_until = None;
        }
        self.cleared.lock().push(user_id);
        Ok(())
    }

    async fn house_points(&self, house: House) -> Result<u32> {
        Ok(self.points.lock().get(&house).copied().unwrap_or(0))
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub fn test_config() -> BotConfig {
    BotConfig {
        guild_id: GuildId::new(1000),
        intro_message_id: MessageId::new(1001),
        intro_roles: vec![RoleId::new(2001), RoleId::new(2002), RoleId::new(2003)],
        ticket_message_id: MessageId::new(1002),
        ticket_emoji: "🎫".to_string(),
        ticket_category_id: ChannelId::new(3001),
        ticket_staff_roles: vec![RoleId::new(2010)],
        premium_role_id: RoleId::new(2020),
        traffic_channel_id: ChannelId::new(3002),
        assignable_roles_channel_id: ChannelId::new(3003),
        duty: Some(DutyConfig {
            message_id: MessageId::new(1003),
            emoji: "🧹".to_string(),
            role_id: RoleId::new(2030),
        }),
        default_locale: "fr".to_string(),
        status_message: "testing".to_string(),
        cooldowns: CooldownConfig::default(),
    }
}

pub fn test_lang() -> LangTable {
    serde_json::from_str(
        r#"{
            "welcomeMessage": {
                "fr": "Bienvenue {{mention}}, nous sommes {{count}} !",
                "en": "Welcome {{mention}}, we are now {{count}}!"
            },
            "byeMessage": { "fr": "Au revoir {{username}}" },
            "ticketChannelAlreadyExists": { "fr": "Tu as déjà un ticket ouvert" },
            "ticketError": { "fr": "Impossible de créer le ticket" },
            "ticketMessage": { "fr": "Bienvenue dans ton ticket" },
            "afterTicketMention": { "fr": "<@{{uid}}> un membre du staff arrive" },
            "roleError": { "fr": "Le rôle {{id}} est introuvable" },
            "houseInfo": { "fr": "{{mention}} est à {{house}} ({{points}} points)" },
            "noHouse": { "fr": "{{mention}} n'a pas encore de maison" }
        }"#,
    )
    .expect("test lang table is valid JSON")
}

pub fn member(user_id: UserId, username: &str, roles: &[RoleId]) -> MemberSnapshot {
    MemberSnapshot {
        user_id,
        username: username.to_string(),
        tag: format!("{}#0001", username),
        avatar_url: None,
        is_bot: false,
        roles: roles.iter().copied().collect(),
    }
}

pub struct Harness {
    pub config: Arc<BotConfig>,
    pub dispatcher: Dispatcher,
    pub gateway: Arc<FakeGateway>,
    pub store: Arc<FakeStore>,
    pub cooldowns: SharedCooldownRegistry,
}

impl Harness {
    pub fn reaction(
        &self,
        message_id: MessageId,
        channel_id: ChannelId,
        user_id: UserId,
        emoji: ReactionType,
    ) -> ReactionEvent {
        ReactionEvent {
            guild_id: Some(self.config.guild_id),
            channel_id,
            message_id,
            user_id: Some(user_id),
            emoji,
        }
    }
}

pub fn harness() -> Harness {
    let config = Arc::new(test_config());
    let gateway = Arc::new(FakeGateway::default());
    let store = Arc::new(FakeStore::default());
    let scheduler = create_shared_scheduler();
    let cooldowns = create_shared_cooldown_registry(scheduler.clone());
    let assignable_roles: AssignableRoleMap = [(GAMER_EMOJI.to_string(), GAMER_ROLE)]
        .into_iter()
        .collect();

    let dispatcher = Dispatcher::new(
        config.clone(),
        Arc::new(test_lang()),
        Arc::new(assignable_roles),
        gateway.clone(),
        store.clone(),
        cooldowns.clone(),
        scheduler,
    );

    Harness {
        config,
        dispatcher,
        gateway,
        store,
        cooldowns,
    }
}
