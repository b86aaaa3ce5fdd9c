use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A genre, both as a standalone document in the `genres` index and as an
/// embedded entry in film documents.
///
/// Identity-keyed like [`crate::Person`]: film documents hold genres in
/// sets, and two rows describing the same genre id must collapse to one
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Genre {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
        }
    }
}

impl PartialEq for Genre {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Genre {}

impl Hash for Genre {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
