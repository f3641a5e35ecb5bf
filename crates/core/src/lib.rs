//! Core domain models and sync decision logic for the Crisis Cleanup client.

pub mod device;
pub mod errors;
pub mod incidents;
pub mod preferences;
pub mod sync;
pub mod worksites;

pub use errors::{Error, Result};
