//! Offline-first sync engine orchestration.
//!
//! Plans what to pull, executes staged push/pull pipelines with cooperative
//! cancellation, and schedules passive background cycles gated by attempt
//! backoff.

mod background;
mod cache;
mod convert;
mod pipeline;
mod planner;
mod pusher;
mod reporter;
mod syncer;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheOutcome, IncidentWorksitesCacheRepository};
pub use pipeline::{SyncCancellation, SyncPipeline};
pub use planner::gather_sync_plan;
pub use pusher::{PushOutcome, WorksiteChangePusher};
pub use reporter::{LogSyncReporter, SyncReporter};
pub use syncer::{api_base_url_from_env, AppSyncer, SyncerConfig};
