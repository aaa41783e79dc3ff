//! Caller-facing stream handles.
//!
//! All handles are created synchronously by
//! [`RemoteExecutor::execute`](super::RemoteExecutor::execute), before the
//! connection exists. The input side is an unbounded FIFO queue: writes
//! made while the pipeline is still connecting are held and replayed in
//! order once the remote stream attaches. Callers needing backpressure
//! must apply it upstream.

use tokio::sync::{mpsc, oneshot};

use super::result::TerminalEvent;
use crate::error::{RelayError, Result};

/// Write side of the remote command's stdin.
///
/// Usable immediately after `execute` returns; data queues until the
/// remote stream attaches. Dropping all clones (or calling
/// [`close`](InputSink::close)) signals EOF to the remote stdin.
#[derive(Debug, Clone)]
pub struct InputSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl InputSink {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }

    /// Queue a chunk of bytes for the remote stdin.
    ///
    /// Never blocks. Fails only after the pipeline has torn down.
    pub fn write(&self, data: impl Into<Vec<u8>>) -> Result<()> {
        self.tx
            .send(data.into())
            .map_err(|_| RelayError::ChannelClosed)
    }

    /// Signal end of input. Equivalent to dropping the last clone.
    pub fn close(self) {}

    /// Check whether the pipeline side is still accepting input.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Read side of one remote output channel (stdout or stderr).
#[derive(Debug)]
pub struct OutputSource {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl OutputSource {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    /// Receive the next chunk. Returns `None` once the stream is done
    /// and all buffered chunks have been drained.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }

    /// Non-blocking receive.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        self.rx.try_recv().ok()
    }

    /// Drain everything remaining into one buffer.
    pub async fn collect(mut self) -> Vec<u8> {
        let mut all = Vec::new();
        while let Some(chunk) = self.rx.recv().await {
            all.extend(chunk);
        }
        all
    }
}

/// Receiver for the execution's single terminal event.
///
/// Backed by a oneshot channel, so at most one event can ever be
/// observed for a given execution.
#[derive(Debug)]
pub struct TerminalSlot {
    rx: oneshot::Receiver<TerminalEvent>,
}

impl TerminalSlot {
    pub(crate) fn new(rx: oneshot::Receiver<TerminalEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the terminal event.
    ///
    /// A pipeline that disappears without reporting (which would take a
    /// panic in the pipeline task) surfaces as a `StreamTransport`
    /// failure rather than hanging the caller.
    pub async fn wait(self) -> TerminalEvent {
        match self.rx.await {
            Ok(event) => event,
            Err(_) => TerminalEvent::Failed(RelayError::StreamTransport(
                "pipeline ended without a terminal event".into(),
            )),
        }
    }
}

/// The full set of handles returned by one `execute` call.
///
/// Owned exclusively by the caller; the pipeline holds only the
/// producer/consumer counterparts. Nothing here outlives the execution.
#[derive(Debug)]
pub struct ExecutionHandles {
    /// Remote stdin. Buffers until connected.
    pub input: InputSink,
    /// Remote stdout.
    pub output: OutputSource,
    /// Remote stderr, isolated from `output`.
    pub error_output: OutputSource,
    /// The single completion-or-failure event.
    pub terminal: TerminalSlot,
}

/// Producer ends retained by the pipeline task.
pub(crate) struct PipelineEnds {
    pub input_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pub output_tx: mpsc::UnboundedSender<Vec<u8>>,
    pub error_tx: mpsc::UnboundedSender<Vec<u8>>,
    pub terminal_tx: oneshot::Sender<TerminalEvent>,
}

impl ExecutionHandles {
    /// Allocate a fresh handle set plus the pipeline-side ends.
    pub(crate) fn allocate() -> (Self, PipelineEnds) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let (terminal_tx, terminal_rx) = oneshot::channel();

        let handles = Self {
            input: InputSink::new(input_tx),
            output: OutputSource::new(output_rx),
            error_output: OutputSource::new(error_rx),
            terminal: TerminalSlot::new(terminal_rx),
        };
        let ends = PipelineEnds {
            input_rx,
            output_tx,
            error_tx,
            terminal_tx,
        };
        (handles, ends)
    }
}
