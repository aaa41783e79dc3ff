//! Completion status and terminal event types.

use crate::error::RelayError;

/// Exit report for a remote command that ran to stream close.
///
/// Carries the raw values from the remote close notification. Policy
/// (such as treating non-zero codes as failures) is left to the caller;
/// see [`CompletionStatus::exceeds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionStatus {
    /// Remote process exit code. `None` when the server reported only a
    /// signal and no exit status.
    pub exit_code: Option<u32>,
    /// Name of the signal that terminated the process, if any.
    pub signal: Option<String>,
}

impl CompletionStatus {
    /// Status for a process that exited normally with the given code.
    pub fn exited(code: u32) -> Self {
        Self {
            exit_code: Some(code),
            signal: None,
        }
    }

    /// Status for a process terminated by a signal.
    pub fn signalled(signal: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            signal: Some(signal.into()),
        }
    }

    /// Check if the command exited cleanly with code 0 and no signal.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && self.signal.is_none()
    }

    /// Classify this status against a return-code threshold.
    ///
    /// Returns true when the exit code meets or exceeds `min_error`, or
    /// when the process died to a signal. The status itself always keeps
    /// the raw values; this is a convenience for policy layers.
    pub fn exceeds(&self, min_error: u32) -> bool {
        if self.signal.is_some() {
            return true;
        }
        matches!(self.exit_code, Some(code) if code >= min_error)
    }
}

/// The single terminal event that ends an execution's lifecycle.
///
/// Exactly one of these is delivered per `execute` call: either the
/// command ran to stream close, or some stage of the pipeline failed.
#[derive(Debug)]
pub enum TerminalEvent {
    /// The remote command completed and its stream closed.
    Completed(CompletionStatus),
    /// The pipeline failed at some stage; no completion will follow.
    Failed(RelayError),
}

impl TerminalEvent {
    /// Get the completion status, if this is a completion.
    pub fn completion(&self) -> Option<&CompletionStatus> {
        match self {
            Self::Completed(status) => Some(status),
            Self::Failed(_) => None,
        }
    }

    /// Get the failure cause, if this is a failure.
    pub fn failure(&self) -> Option<&RelayError> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}
