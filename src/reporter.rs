//! Status/progress collaborator interface.
//!
//! The pipeline reports human-readable phase text ("Connecting to
//! host...", "Executing cmd...") to whoever drives it. The reporter is
//! passed to [`RemoteExecutor`](crate::execution::RemoteExecutor)
//! explicitly at construction time rather than reached through any
//! ambient context, so tests can record phases and embedders can route
//! them to their own UI.

use std::sync::Arc;

use tracing::info;

/// Receives working-status phase text from a running pipeline.
///
/// The exact strings are part of the observable contract; see
/// [`RemoteExecutor`](crate::execution::RemoteExecutor).
pub trait StatusReporter: Send + Sync {
    /// Called once per pipeline phase with a short progress line.
    fn working(&self, text: &str);
}

/// Reporter that discards all status text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl StatusReporter for NullReporter {
    fn working(&self, _text: &str) {}
}

/// Reporter that routes status text through `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn working(&self, text: &str) {
        info!("{}", text);
    }
}

/// Convenience: a shareable no-op reporter.
pub fn null_reporter() -> Arc<dyn StatusReporter> {
    Arc::new(NullReporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    impl StatusReporter for Recorder {
        fn working(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn test_null_reporter_accepts_anything() {
        let reporter = NullReporter;
        reporter.working("Connecting to example.com...");
        reporter.working("");
    }

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        recorder.working("first");
        recorder.working("second");

        let seen = recorder.0.lock().unwrap();
        assert_eq!(*seen, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_log_reporter_does_not_panic() {
        let reporter = LogReporter;
        reporter.working("Launched, waiting for data...");
    }
}
