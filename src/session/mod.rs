//! Session factory: the secure remote session dependency.
//!
//! The executor talks to the transport through the [`Connector`] and
//! [`RemoteSession`] ports; [`SshConnector`] is the production
//! implementation on top of russh. Tests substitute their own connector
//! to drive the pipeline without a network.

mod factory;
mod handler;
mod remote;

pub use factory::SshConnector;
pub use handler::ClientHandler;
pub use remote::SshSession;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::config::ConnectionParams;
use crate::error::{RelayError, Result};
use crate::execution::CompletionStatus;

/// Opens exactly one secure remote session per call.
///
/// One connection attempt per execution; no retry, no reconnect, no
/// pooling. Key material is passed in raw so the caller controls when
/// (and how often) it is read from storage.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// The session type this connector produces.
    type Session: RemoteSession;

    /// Establish a session, or fail with `CredentialLoad` (bad key
    /// material) or `Connection` (network/handshake/auth).
    async fn connect(&self, params: &ConnectionParams, key_material: &[u8])
        -> Result<Self::Session>;
}

/// A live session capable of running one command.
#[async_trait]
pub trait RemoteSession: Send + 'static {
    /// Start `command` on the remote side and return its process
    /// streams. Consumes the session: one command per session.
    async fn exec(self, command: &str) -> Result<ProcessStreams>;
}

/// The three I/O channels of a running remote process, plus its close
/// notification.
///
/// Stdout and stderr are kept strictly separate; the close notification
/// arrives only after the remote process has actually terminated.
pub struct ProcessStreams {
    /// Frames sent here reach the remote stdin; dropping the sender
    /// sends EOF.
    pub stdin: mpsc::UnboundedSender<Vec<u8>>,
    /// Remote stdout chunks.
    pub stdout: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Remote stderr chunks.
    pub stderr: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Resolves once, when the stream closes or the transport fails.
    pub closed: oneshot::Receiver<StreamClose>,
}

/// How a process stream ended.
#[derive(Debug)]
pub enum StreamClose {
    /// Normal close carrying the exit report.
    Exited(CompletionStatus),
    /// Transport failure after the command was running.
    Error(RelayError),
}
