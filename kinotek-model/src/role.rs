use serde::{Deserialize, Serialize};

/// The closed set of crew roles a person can hold in a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Actor,
    Director,
    Writer,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Actor, Role::Director, Role::Writer];

    /// Parses a role as stored in the source `person_film_work.role` column.
    /// Unknown values yield `None`; the producer ignores them silently.
    pub fn from_source(value: &str) -> Option<Self> {
        match value {
            "actor" => Some(Role::Actor),
            "director" => Some(Role::Director),
            "writer" => Some(Role::Writer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Actor => "actor",
            Role::Director => "director",
            Role::Writer => "writer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
