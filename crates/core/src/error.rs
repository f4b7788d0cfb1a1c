//! Error types for installation runs

use thiserror::Error;

/// Result type alias using [`InstallError`]
pub type InstallResult<T> = std::result::Result<T, InstallError>;

/// Every fatal condition an installation run can surface.
///
/// The first four variants form the run-level failure taxonomy; the rest
/// wrap collaborator and configuration problems.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("No known UI variant matched at step '{step}' (probed: {})", candidates.join(", "))]
    VariantUnresolved {
        step: String,
        candidates: Vec<String>,
    },

    #[error("Step '{step}' timed out after {timeout_ms} ms waiting for: {}", pending.join(", "))]
    SyncTimeout {
        step: String,
        pending: Vec<String>,
        timeout_ms: u64,
    },

    #[error("Assertion failed at step '{step}': {detail}")]
    AssertionFailed { step: String, detail: String },

    #[error("{url} still reachable after {attempts} attempts (last status: {last_status})")]
    PollExhausted {
        url: String,
        attempts: u32,
        last_status: u16,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Browser driver error: {0}")]
    Driver(String),

    #[error("HTTP probe error: {0}")]
    Probe(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl InstallError {
    pub fn assertion(step: impl ToString, detail: impl Into<String>) -> Self {
        InstallError::AssertionFailed {
            step: step.to_string(),
            detail: detail.into(),
        }
    }

    /// Whether this is one of the run-level failures (as opposed to a
    /// collaborator or setup problem).
    pub fn is_run_failure(&self) -> bool {
        matches!(
            self,
            InstallError::VariantUnresolved { .. }
                | InstallError::SyncTimeout { .. }
                | InstallError::AssertionFailed { .. }
                | InstallError::PollExhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_step() {
        let err = InstallError::VariantUnresolved {
            step: "language-select".to_string(),
            candidates: vec!["button[data-joomla-dialog]".into(), "#jform_language".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("language-select"));
        assert!(msg.contains("#jform_language"));
        assert!(err.is_run_failure());
    }

    #[test]
    fn test_driver_errors_are_not_run_failures() {
        assert!(!InstallError::Driver("bridge closed".into()).is_run_failure());
    }
}
