//! Typed outcomes of a sync cycle.

use serde::{Deserialize, Serialize};

/// Outcome of a sync cycle or pipeline stage.
///
/// Callers branch on this instead of raw errors to decide whether to retry,
/// surface a message, or silently back off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncResult {
    Success { notes: String },
    Partial { notes: String },
    Error { message: String },
    NotAttempted { reason: String },
    PreconditionsNotMet,
}

impl SyncResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncResult::Success { .. })
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, SyncResult::Partial { .. })
    }

    /// Whether any remote data landed locally during the cycle.
    pub fn made_progress(&self) -> bool {
        matches!(self, SyncResult::Success { .. } | SyncResult::Partial { .. })
    }
}

impl std::fmt::Display for SyncResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncResult::Success { notes } => write!(f, "success: {notes}"),
            SyncResult::Partial { notes } => write!(f, "partial: {notes}"),
            SyncResult::Error { message } => write!(f, "error: {message}"),
            SyncResult::NotAttempted { reason } => write!(f, "not attempted: {reason}"),
            SyncResult::PreconditionsNotMet => write!(f, "preconditions not met"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SyncResult;

    #[test]
    fn progress_classification() {
        let success = SyncResult::Success {
            notes: "pulled 3 incidents".to_string(),
        };
        let partial = SyncResult::Partial {
            notes: "worksites interrupted".to_string(),
        };
        assert!(success.made_progress());
        assert!(partial.made_progress());
        assert!(!SyncResult::PreconditionsNotMet.made_progress());
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_string(&SyncResult::PreconditionsNotMet).expect("serialize");
        assert_eq!(json, r#"{"status":"preconditions_not_met"}"#);
    }
}
