//! SQLite persistence for cached incidents.

mod model;
mod repository;

pub use model::IncidentDB;
pub use repository::IncidentRepository;
