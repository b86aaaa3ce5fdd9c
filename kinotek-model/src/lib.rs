//! Document models shared between the kinotek query API and the ETL.
//!
//! These are the denormalized shapes stored in the search index, not the
//! relational source rows. Crew members and genres are embedded by value;
//! cross-entity lookups go through the index, never through back-pointers.

pub mod film;
pub mod genre;
pub mod person;
pub mod role;

pub use film::Film;
pub use genre::Genre;
pub use person::Person;
pub use role::Role;
