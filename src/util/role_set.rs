use poise::serenity_prelude::RoleId;
use std::collections::BTreeSet;

/// Set of role ids held by a member
///
/// Ordered so that diffs and log lines come out the same on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet {
    roles: BTreeSet<RoleId>,
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role_id: RoleId) -> bool {
        self.roles.contains(&role_id)
    }

    /// Returns true if the role was not present before
    pub fn insert(&mut self, role_id: RoleId) -> bool {
        self.roles.insert(role_id)
    }

    /// Remove a role by value. Removing an absent role is a no-op.
    pub fn remove(&mut self, role_id: RoleId) -> bool {
        self.roles.remove(&role_id)
    }

    /// Roles of `wanted` that this set does not hold, in order
    pub fn missing<'a>(&'a self, wanted: &'a [RoleId]) -> impl Iterator<Item = RoleId> + 'a {
        wanted.iter().copied().filter(move |r| !self.contains(*r))
    }
}

impl FromIterator<RoleId> for RoleSet {
    fn from_iter<I: IntoIterator<Item = RoleId>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}
