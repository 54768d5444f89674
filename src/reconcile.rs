//! House and premium role reconciliation.
//!
//! Pure computation over an already-fetched [`Player`]: the caller applies
//! the returned diff and, when asked to, clears the premium expiry in the
//! store.

use chrono::{DateTime, Utc};
use poise::serenity_prelude::RoleId;
use std::collections::BTreeSet;

use crate::houses::House;
use crate::models::Player;
use crate::util::RoleSet;

/// Roles to add and remove to bring a member in line with the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDiff {
    pub to_add: BTreeSet<RoleId>,
    pub to_remove: BTreeSet<RoleId>,
}

impl RoleDiff {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Apply the diff to a role set in place
    pub fn apply_to(&self, roles: &mut RoleSet) {
        for role in &self.to_remove {
            roles.remove(*role);
        }
        for role in &self.to_add {
            roles.insert(*role);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub diff: RoleDiff,
    /// Premium has run out and the stored expiry must be cleared
    pub clear_premium: bool,
}

pub fn reconcile(player: &Player, premium_role: RoleId, now: DateTime<Utc>) -> Reconciliation {
    let mut result = Reconciliation::default();

    if let Some(house) = player.house {
        for candidate in House::list_all() {
            let role = candidate.role_id();
            let held = player.roles.contains(role);
            if *candidate == house {
                if !held {
                    result.diff.to_add.insert(role);
                }
            } else if held {
                result.diff.to_remove.insert(role);
            }
        }
    }

    if let Some(expiry) = player.premium_until {
        let held = player.roles.contains(premium_role);
        if now >= expiry {
            result.clear_premium = true;
            if held {
                result.diff.to_remove.insert(premium_role);
            }
        } else if !held {
            result.diff.to_add.insert(premium_role);
        }
    }

    result
}
