use poise::serenity_prelude::RoleId;
use std::fmt;

/// The four houses of the server. Each one is backed by its own guild role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum House {
    Gryffondor,
    Serpentard,
    Poufsouffle,
    Serdaigle,
}

impl House {
    pub const ALL: [House; 4] = [
        House::Gryffondor,
        House::Serpentard,
        House::Poufsouffle,
        House::Serdaigle,
    ];

    /// Upper-case key used in the store and in lookups
    pub fn key(&self) -> &'static str {
        match self {
            House::Gryffondor => "GRYFFONDOR",
            House::Serpentard => "SERPENTARD",
            House::Poufsouffle => "POUFSOUFFLE",
            House::Serdaigle => "SERDAIGLE",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            House::Gryffondor => "Gryffondor",
            House::Serpentard => "Serpentard",
            House::Poufsouffle => "Poufsouffle",
            House::Serdaigle => "Serdaigle",
        }
    }

    pub fn role_id(&self) -> RoleId {
        match self {
            House::Gryffondor => RoleId::new(796774549232287754),
            House::Serpentard => RoleId::new(796774926383972383),
            House::Poufsouffle => RoleId::new(796775145317859373),
            House::Serdaigle => RoleId::new(796775403707826227),
        }
    }

    /// Numeric id used by old store records
    pub fn legacy_id(&self) -> u8 {
        match self {
            House::Gryffondor => 1,
            House::Serpentard => 2,
            House::Poufsouffle => 3,
            House::Serdaigle => 4,
        }
    }

    /// Case-insensitive lookup by name
    pub fn resolve_by_name(name: &str) -> Option<House> {
        let key = name.trim().to_uppercase();
        House::ALL.into_iter().find(|h| h.key() == key)
    }

    pub fn resolve_by_legacy_id(id: u8) -> Option<House> {
        House::ALL.into_iter().find(|h| h.legacy_id() == id)
    }

    pub fn list_all() -> &'static [House] {
        &House::ALL
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
