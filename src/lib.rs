//! # ssh-relay
//!
//! Connection-deferred SSH command execution.
//!
//! This crate runs a single command on a remote host over SSH and hands
//! the caller stream handles for the command's stdin, stdout, and stderr
//! *before* the connection is even established. Input written early is
//! buffered and replayed in order once the remote stream attaches, and
//! every execution ends with exactly one terminal event: a completion
//! status (exit code + signal) or a failure.
//!
//! ## Features
//!
//! - **Zero-latency handles**: `execute` returns synchronously; the
//!   connect/auth/exec pipeline runs in the background
//! - **FIFO input buffering**: writes made before the connection exists
//!   are queued unbounded and delivered in order
//! - **Single terminal event**: completion and failure are mutually
//!   exclusive and delivered at most once, via a oneshot slot
//! - **Pluggable transport**: the SSH layer sits behind a `Connector`
//!   port, so tests can drive the pipeline without a network
//!
//! ## Quick Start
//!
//! ```no_run
//! use ssh_relay::{
//!     CommandSpec, ConnectionParams, RemoteExecutor, SshConnector, TerminalEvent,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let executor = RemoteExecutor::new(SshConnector::new());
//!
//!     let params = ConnectionParams {
//!         host: "build.example.com".into(),
//!         port: 22,
//!         username: "deploy".into(),
//!         private_key_path: "/home/deploy/.ssh/id_ed25519".into(),
//!         connect_timeout_secs: 30,
//!     };
//!     let spec = CommandSpec::new("ls").arg("my dir");
//!
//!     // Handles are usable immediately, long before the SSH handshake
//!     // completes.
//!     let mut handles = executor.execute(spec, params);
//!     handles.input.write(b"queued before connect".to_vec()).ok();
//!
//!     while let Some(chunk) = handles.output.recv().await {
//!         print!("{}", String::from_utf8_lossy(&chunk));
//!     }
//!     match handles.terminal.wait().await {
//!         TerminalEvent::Completed(status) => println!("rc = {:?}", status.exit_code),
//!         TerminalEvent::Failed(e) => eprintln!("failed: {}", e),
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod reporter;
pub mod session;

// Re-export commonly used types
pub use config::{Config, ConnectionParams};
pub use error::{RelayError, Result};
pub use execution::{
    CommandSpec, CompletionStatus, ExecutionHandles, InputSink, OutputSource, RemoteExecutor,
    TerminalEvent, TerminalSlot,
};
pub use reporter::{LogReporter, NullReporter, StatusReporter};
pub use session::{Connector, ProcessStreams, RemoteSession, SshConnector, StreamClose};
