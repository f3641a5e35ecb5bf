//! SQLite persistence for app preferences.

mod model;
mod repository;

pub use model::AppPreferencesDB;
pub use repository::AppPreferencesRepository;
