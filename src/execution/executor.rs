//! The connection-deferred execution pipeline.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::command::CommandSpec;
use super::handles::{ExecutionHandles, PipelineEnds};
use super::result::{CompletionStatus, TerminalEvent};
use crate::config::ConnectionParams;
use crate::error::{RelayError, Result};
use crate::reporter::{null_reporter, StatusReporter};
use crate::session::{Connector, RemoteSession, StreamClose};

/// Runs remote commands, handing back usable stream handles before the
/// connection exists.
///
/// `execute` returns synchronously; a background task then connects,
/// launches the command, and splices the remote process streams onto the
/// handles. Concurrent executions are fully independent: each owns its
/// session, buffers, and terminal event.
pub struct RemoteExecutor<C: Connector> {
    connector: Arc<C>,
    reporter: Arc<dyn StatusReporter>,
}

impl<C: Connector> RemoteExecutor<C> {
    /// Create an executor with no status reporting.
    pub fn new(connector: C) -> Self {
        Self {
            connector: Arc::new(connector),
            reporter: null_reporter(),
        }
    }

    /// Create an executor that reports working-status phases to
    /// `reporter`.
    pub fn with_reporter(connector: C, reporter: Arc<dyn StatusReporter>) -> Self {
        Self {
            connector: Arc::new(connector),
            reporter,
        }
    }

    /// Start a remote command and return its stream handles immediately.
    ///
    /// Never fails and never blocks: every failure, including unreadable
    /// key material, is delivered later through the terminal slot so the
    /// caller always holds a uniform set of handles. Must be called from
    /// within a tokio runtime.
    pub fn execute(&self, spec: CommandSpec, params: ConnectionParams) -> ExecutionHandles {
        let (handles, ends) = ExecutionHandles::allocate();
        let connector = Arc::clone(&self.connector);
        let reporter = Arc::clone(&self.reporter);

        tokio::spawn(async move {
            let PipelineEnds {
                input_rx,
                output_tx,
                error_tx,
                terminal_tx,
            } = ends;

            let event =
                match run_pipeline(connector, reporter, spec, params, input_rx, output_tx, error_tx)
                    .await
                {
                    Ok(status) => TerminalEvent::Completed(status),
                    Err(e) => TerminalEvent::Failed(e),
                };
            let _ = terminal_tx.send(event);
        });

        handles
    }
}

/// connect -> exec -> splice -> close, reporting one status line per
/// phase. Returning early at any stage becomes the single failure event.
async fn run_pipeline<C: Connector>(
    connector: Arc<C>,
    reporter: Arc<dyn StatusReporter>,
    spec: CommandSpec,
    params: ConnectionParams,
    mut input_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    output_tx: mpsc::UnboundedSender<Vec<u8>>,
    error_tx: mpsc::UnboundedSender<Vec<u8>>,
) -> Result<CompletionStatus> {
    reporter.working(&format!("Connecting to {}...", params.host));

    // Re-read the key on every run so a corrected credential file takes
    // effect without restarting the owning process.
    let key_material = tokio::fs::read(&params.private_key_path)
        .await
        .map_err(|e| RelayError::CredentialLoad {
            path: params.private_key_path.clone(),
            reason: e.to_string(),
        })?;

    let session = connector.connect(&params, &key_material).await?;

    let command = spec.command_string();
    reporter.working(&format!("Executing {}...", spec.preview()));

    let streams = session.exec(&command).await?;
    reporter.working("Launched, waiting for data...");
    debug!(host = %params.host, "remote streams attached");

    // Splice: replay the buffered input queue into the remote stdin and
    // fan the remote output channels out to the caller's handles.
    let stdin_tx = streams.stdin;
    tokio::spawn(async move {
        while let Some(chunk) = input_rx.recv().await {
            if stdin_tx.send(chunk).is_err() {
                break;
            }
        }
        // Dropping stdin_tx here propagates EOF to the remote stdin.
    });
    tokio::spawn(forward(streams.stdout, output_tx));
    tokio::spawn(forward(streams.stderr, error_tx));

    match streams.closed.await {
        Ok(StreamClose::Exited(status)) => Ok(status),
        Ok(StreamClose::Error(e)) => Err(e),
        Err(_) => Err(RelayError::StreamTransport(
            "remote stream ended without a close notification".into(),
        )),
    }
}

async fn forward(mut rx: mpsc::UnboundedReceiver<Vec<u8>>, tx: mpsc::UnboundedSender<Vec<u8>>) {
    while let Some(chunk) = rx.recv().await {
        if tx.send(chunk).is_err() {
            break;
        }
    }
}
