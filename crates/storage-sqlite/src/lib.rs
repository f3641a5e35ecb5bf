//! SQLite persistence for the Crisis Cleanup sync engine.
//!
//! All writes flow through a single writer actor so SQLite never sees
//! concurrent write transactions; reads go straight to the pool.

pub mod db;
pub mod errors;
pub mod incidents;
pub mod preferences;
pub mod schema;
pub mod sync;
pub mod worksites;

pub use db::{create_pool, get_connection, init, run_migrations, DbPool, WriteHandle};
