use dashmap::DashMap;
use poise::serenity_prelude::UserId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::scheduler::SharedScheduler;

/// Independent buckets of suppressed users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownDomain {
    /// Reactions on the intro message
    IntroFirewall,
    /// House/premium role check triggered by messages
    HouseCheck,
    /// Ticket channel creation, one request in flight per user
    TicketRequest,
}

impl fmt::Display for CooldownDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CooldownDomain::IntroFirewall => write!(f, "intro-firewall"),
            CooldownDomain::HouseCheck => write!(f, "house-check"),
            CooldownDomain::TicketRequest => write!(f, "ticket-request"),
        }
    }
}

/// Tracks which users are currently suppressed, per domain
///
/// Each domain's set sits behind its own map shard lock, so a membership
/// check never sees a half-applied insert or removal. Entries are released
/// by the scheduler once their window has elapsed; nothing else removes them.
pub struct CooldownRegistry {
    entries: Arc<DashMap<CooldownDomain, HashSet<UserId>>>,
    scheduler: SharedScheduler,
}

impl CooldownRegistry {
    pub fn new(scheduler: SharedScheduler) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            scheduler,
        }
    }

    pub fn is_suppressed(&self, domain: CooldownDomain, user_id: UserId) -> bool {
        self.entries
            .get(&domain)
            .map(|users| users.contains(&user_id))
            .unwrap_or(false)
    }

    /// Mark the pair suppressed for `window`.
    ///
    /// Suppressing a pair that is already suppressed keeps the running
    /// window and schedules nothing new.
    pub fn suppress(&self, domain: CooldownDomain, user_id: UserId, window: Duration) {
        self.try_suppress(domain, user_id, window);
    }

    /// Check and suppress under a single lock.
    ///
    /// Returns true when the caller won the slot and may go ahead with the
    /// gated action, false when the user was already suppressed.
    pub fn try_suppress(&self, domain: CooldownDomain, user_id: UserId, window: Duration) -> bool {
        let inserted = self.entries.entry(domain).or_default().insert(user_id);
        if !inserted {
            return false;
        }

        debug!("Suppressed {} in {} for {:?}", user_id, domain, window);

        let entries = self.entries.clone();
        self.scheduler.schedule(window, async move {
            release_entry(&entries, domain, user_id);
        });
        true
    }

    /// Drop the pair immediately. Absent pairs are ignored.
    pub fn release(&self, domain: CooldownDomain, user_id: UserId) {
        release_entry(&self.entries, domain, user_id);
    }

    /// Number of users suppressed in a domain
    pub fn suppressed_count(&self, domain: CooldownDomain) -> usize {
        self.entries.get(&domain).map(|users| users.len()).unwrap_or(0)
    }
}

fn release_entry(
    entries: &DashMap<CooldownDomain, HashSet<UserId>>,
    domain: CooldownDomain,
    user_id: UserId,
) {
    if let Some(mut users) = entries.get_mut(&domain) {
        if users.remove(&user_id) {
            debug!("Released {} from {}", user_id, domain);
        }
    }
}

/// Shared cooldown registry type
pub type SharedCooldownRegistry = Arc<CooldownRegistry>;

pub fn create_shared_cooldown_registry(scheduler: SharedScheduler) -> SharedCooldownRegistry {
    Arc::new(CooldownRegistry::new(scheduler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::create_shared_scheduler;

    const WINDOW: Duration = Duration::from_secs(20);

    fn registry() -> CooldownRegistry {
        CooldownRegistry::new(create_shared_scheduler())
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppression_expires_on_its_own() {
        let cooldowns = registry();
        let user = UserId::new(42);

        cooldowns.suppress(CooldownDomain::HouseCheck, user, WINDOW);
        assert!(cooldowns.is_suppressed(CooldownDomain::HouseCheck, user));

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert!(cooldowns.is_suppressed(CooldownDomain::HouseCheck, user));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!cooldowns.is_suppressed(CooldownDomain::HouseCheck, user));
        assert_eq!(cooldowns.suppressed_count(CooldownDomain::HouseCheck), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_suppress_keeps_first_window() {
        let cooldowns = registry();
        let user = UserId::new(7);

        assert!(cooldowns.try_suppress(CooldownDomain::IntroFirewall, user, WINDOW));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(!cooldowns.try_suppress(CooldownDomain::IntroFirewall, user, WINDOW));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!cooldowns.is_suppressed(CooldownDomain::IntroFirewall, user));
    }

    #[tokio::test]
    async fn test_domains_are_independent() {
        let cooldowns = registry();
        let user = UserId::new(1);

        cooldowns.suppress(CooldownDomain::IntroFirewall, user, WINDOW);
        assert!(cooldowns.is_suppressed(CooldownDomain::IntroFirewall, user));
        assert!(!cooldowns.is_suppressed(CooldownDomain::HouseCheck, user));
        assert!(!cooldowns.is_suppressed(CooldownDomain::IntroFirewall, UserId::new(2)));
    }

    #[tokio::test]
    async fn test_release_unknown_user_is_noop() {
        let cooldowns = registry();

        cooldowns.release(CooldownDomain::HouseCheck, UserId::new(99));
        cooldowns.suppress(CooldownDomain::HouseCheck, UserId::new(1), WINDOW);
        cooldowns.release(CooldownDomain::HouseCheck, UserId::new(99));

        assert_eq!(cooldowns.suppressed_count(CooldownDomain::HouseCheck), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_try_suppress_has_one_winner() {
        let cooldowns = Arc::new(registry());
        let user = UserId::new(1234);

        let mut handles = Vec::new();
        for _ in 0..32 {
            let cooldowns = cooldowns.clone();
            handles.push(tokio::spawn(async move {
                cooldowns.try_suppress(CooldownDomain::IntroFirewall, user, WINDOW)
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
