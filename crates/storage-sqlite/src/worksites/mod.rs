//! SQLite persistence for cached and locally edited worksites.

mod model;
mod repository;

pub use model::WorksiteDB;
pub use repository::{ReconcileCounts, WorksiteRepository};
