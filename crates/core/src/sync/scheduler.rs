//! Core scheduler constants for app sync.

/// Passive background sync cadence in seconds.
pub const APP_SYNC_PERIODIC_INTERVAL_SECS: u64 = 300;

/// Maximum jitter (seconds) added to periodic cycle intervals.
pub const APP_SYNC_INTERVAL_JITTER_SECS: u64 = 15;

/// Window (seconds) within which a successful sync counts as recent.
pub const SYNC_RECENT_INTERVAL_SECS: i64 = 1_800;

/// Base interval (seconds) for exponential attempt backoff.
pub const SYNC_BACKOFF_BASE_INTERVAL_SECS: i64 = 15;

/// Floor (seconds) below which a backoff window never shrinks.
pub const SYNC_BACKOFF_MIN_INTERVAL_SECS: i64 = 30;

/// Exponent cap for attempt backoff.
pub const SYNC_BACKOFF_MAX_EXPONENT: i32 = 8;

/// Pending outbox changes shorten the background sleep to this bound (ms).
pub const PENDING_CHANGE_SLEEP_BOUND_MS: u64 = 2_000;

/// Push attempts after which a worksite change is marked dead.
pub const WORKSITE_CHANGE_MAX_SAVE_ATTEMPTS: i32 = 5;

/// Consecutive unmet-precondition cycles after which the background loop stops.
pub const BACKGROUND_UNMET_PRECONDITION_LIMIT: u32 = 5;
