use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Genre, Person, Role};

/// Denormalized film document as stored in the `movies` index.
///
/// The `*_names` sets are derived from their object-valued twins; they exist
/// only as flat text fields for relevance scoring in the search backend and
/// are maintained through [`Film::add_genre`] and [`Film::add_crew`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub imdb_rating: Option<f64>,

    #[serde(default)]
    pub genres: HashSet<Genre>,
    #[serde(default)]
    pub genres_names: HashSet<String>,

    #[serde(default)]
    pub actors: HashSet<Person>,
    #[serde(default)]
    pub actors_names: HashSet<String>,

    #[serde(default)]
    pub directors: HashSet<Person>,
    #[serde(default)]
    pub directors_names: HashSet<String>,

    #[serde(default)]
    pub writers: HashSet<Person>,
    #[serde(default)]
    pub writers_names: HashSet<String>,
}

impl Film {
    /// A film with the scalar columns filled in and every set empty, ready
    /// for the row-merge to accumulate crew and genres into.
    pub fn new(
        id: Uuid,
        title: impl Into<String>,
        description: Option<String>,
        imdb_rating: Option<f64>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description,
            imdb_rating,
            genres: HashSet::new(),
            genres_names: HashSet::new(),
            actors: HashSet::new(),
            actors_names: HashSet::new(),
            directors: HashSet::new(),
            directors_names: HashSet::new(),
            writers: HashSet::new(),
            writers_names: HashSet::new(),
        }
    }

    pub fn add_genre(&mut self, genre: Genre) {
        self.genres_names.insert(genre.name.clone());
        self.genres.insert(genre);
    }

    pub fn add_crew(&mut self, role: Role, person: Person) {
        let (members, names) = match role {
            Role::Actor => (&mut self.actors, &mut self.actors_names),
            Role::Director => (&mut self.directors, &mut self.directors_names),
            Role::Writer => (&mut self.writers, &mut self.writers_names),
        };
        names.insert(person.name.clone());
        members.insert(person);
    }

    pub fn crew(&self, role: Role) -> &HashSet<Person> {
        match role {
            Role::Actor => &self.actors,
            Role::Director => &self.directors,
            Role::Writer => &self.writers,
        }
    }

    /// The set of roles under which `person_id` appears in this film.
    pub fn roles_of(&self, person_id: Uuid) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.crew(*role).iter().any(|p| p.id == person_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_film() -> Film {
        let mut film = Film::new(
            Uuid::new_v4(),
            "The Star",
            Some("A film about a star".to_string()),
            Some(8.5),
        );
        film.add_genre(Genre::new(Uuid::new_v4(), "Drama"));
        film.add_crew(Role::Actor, Person::new(Uuid::new_v4(), "Ann"));
        film.add_crew(Role::Writer, Person::new(Uuid::new_v4(), "Howard"));
        film
    }

    #[test]
    fn add_crew_maintains_the_names_twin() {
        let mut film = sample_film();
        let id = Uuid::new_v4();
        film.add_crew(Role::Director, Person::new(id, "Stan"));
        film.add_crew(Role::Director, Person::new(id, "Stan"));

        assert_eq!(film.directors.len(), 1);
        assert!(film.directors_names.contains("Stan"));
    }

    #[test]
    fn roles_of_reports_every_membership() {
        let mut film = sample_film();
        let id = Uuid::new_v4();
        film.add_crew(Role::Actor, Person::new(id, "Stan"));
        film.add_crew(Role::Director, Person::new(id, "Stan"));

        assert_eq!(film.roles_of(id), vec![Role::Actor, Role::Director]);
        assert!(film.roles_of(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn film_round_trips_through_json() {
        let film = sample_film();
        let encoded = serde_json::to_string(&film).unwrap();
        let decoded: Film = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, film);
    }

    #[test]
    fn missing_sets_decode_as_empty() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"id":"{id}","title":"Bare","description":null,"imdb_rating":null}}"#
        );
        let film: Film = serde_json::from_str(&raw).unwrap();
        assert!(film.genres.is_empty());
        assert!(film.actors.is_empty());
    }
}
