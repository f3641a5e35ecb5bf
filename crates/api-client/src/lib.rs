//! REST client for the Crisis Cleanup API.
//!
//! Exposes the [`NetworkDataSource`] seam the sync engine pulls and pushes
//! through, plus the reqwest-backed [`CrisisCleanupClient`] implementation.

mod client;
mod data_source;
mod error;
mod types;

pub use client::CrisisCleanupClient;
pub use data_source::NetworkDataSource;
pub use error::{ApiError, ApiRetryClass, Result};
pub use types::*;
