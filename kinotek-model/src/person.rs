use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A crew member as embedded in film documents and stored in the `persons`
/// index.
///
/// Equality and hashing are keyed on `id` alone so that sets of persons
/// deduplicate by identity even when name spellings diverge between source
/// rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
}

impl Person {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn persons_dedupe_by_id() {
        let id = Uuid::new_v4();
        let mut set = HashSet::new();
        set.insert(Person::new(id, "Ann"));
        set.insert(Person::new(id, "Anne"));
        assert_eq!(set.len(), 1);

        set.insert(Person::new(Uuid::new_v4(), "Ann"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn person_round_trips_through_json() {
        let person = Person::new(Uuid::new_v4(), "Howard");
        let encoded = serde_json::to_string(&person).unwrap();
        let decoded: Person = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, person);
        assert_eq!(decoded.name, person.name);
    }
}
