//! Error types for ssh-relay.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for ssh-relay operations.
///
/// Every pipeline failure is normalized into one of these variants and
/// delivered exactly once through the terminal event channel, so callers
/// need a single handler regardless of which stage failed.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Private key material could not be read or decoded.
    #[error("could not load private key {path}: {reason}")]
    CredentialLoad {
        /// Path the key was read from.
        path: PathBuf,
        /// What went wrong (I/O or decode detail).
        reason: String,
    },

    /// TCP, handshake, or authentication failure while connecting.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote side refused to start the command.
    #[error("exec launch failed: {0}")]
    ExecLaunch(String),

    /// Transport failure after the command was already running.
    #[error("stream transport error: {0}")]
    StreamTransport(String),

    /// Write to an input handle whose pipeline has already torn down.
    #[error("input channel closed")]
    ChannelClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for ssh-relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
