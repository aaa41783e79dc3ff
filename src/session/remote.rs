//! Live SSH session and the channel driver loop.

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Sig};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

use super::handler::ClientHandler;
use super::{ProcessStreams, RemoteSession, StreamClose};
use crate::error::{RelayError, Result};
use crate::execution::CompletionStatus;

/// A connected SSH session, good for exactly one `exec`.
pub struct SshSession {
    handle: Handle<ClientHandler>,
}

impl SshSession {
    pub(crate) fn new(handle: Handle<ClientHandler>) -> Self {
        Self { handle }
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(self, command: &str) -> Result<ProcessStreams> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| RelayError::ExecLaunch(format!("channel open failed: {}", e)))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| RelayError::ExecLaunch(format!("exec request failed: {}", e)))?;

        let (stdin_tx, stdin_rx) = mpsc::unbounded_channel();
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        tokio::spawn(drive_channel(
            channel, stdin_rx, stdout_tx, stderr_tx, closed_tx,
        ));

        Ok(ProcessStreams {
            stdin: stdin_tx,
            stdout: stdout_rx,
            stderr: stderr_rx,
            closed: closed_rx,
        })
    }
}

enum Step {
    Remote(Option<ChannelMsg>),
    Input(Option<Vec<u8>>),
}

/// Bridge one russh channel to plain byte channels until it closes.
///
/// Reads and writes share a single task: the channel is mutably borrowed
/// only inside `wait()`, and writes run between waits, which sidesteps
/// the wait/data borrow conflict on `Channel`.
async fn drive_channel(
    mut channel: Channel<Msg>,
    mut stdin_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    stdout_tx: mpsc::UnboundedSender<Vec<u8>>,
    stderr_tx: mpsc::UnboundedSender<Vec<u8>>,
    closed_tx: oneshot::Sender<StreamClose>,
) {
    let mut exit_code: Option<u32> = None;
    let mut signal: Option<String> = None;
    let mut input_open = true;

    let close = loop {
        let step = if input_open {
            tokio::select! {
                msg = channel.wait() => Step::Remote(msg),
                chunk = stdin_rx.recv() => Step::Input(chunk),
            }
        } else {
            Step::Remote(channel.wait().await)
        };

        match step {
            Step::Input(Some(data)) => {
                trace!("forwarding {} bytes to remote stdin", data.len());
                if let Err(e) = channel.data(&data[..]).await {
                    break StreamClose::Error(RelayError::StreamTransport(format!(
                        "stdin write failed: {}",
                        e
                    )));
                }
            }
            Step::Input(None) => {
                // Caller closed the input sink; tell the remote side.
                input_open = false;
                if let Err(e) = channel.eof().await {
                    break StreamClose::Error(RelayError::StreamTransport(format!(
                        "stdin EOF failed: {}",
                        e
                    )));
                }
            }
            Step::Remote(Some(msg)) => match msg {
                ChannelMsg::Data { data } => {
                    let _ = stdout_tx.send(data.to_vec());
                }
                ChannelMsg::ExtendedData { data, ext } if ext == 1 => {
                    let _ = stderr_tx.send(data.to_vec());
                }
                ChannelMsg::ExitStatus { exit_status } => {
                    exit_code = Some(exit_status);
                }
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    signal = Some(sig_name(signal_name));
                }
                // Exit status can still arrive between Eof and Close,
                // so only Close ends the loop.
                ChannelMsg::Eof => {
                    debug!("remote output finished");
                }
                ChannelMsg::Close => {
                    break StreamClose::Exited(CompletionStatus { exit_code, signal });
                }
                _ => {}
            },
            Step::Remote(None) => {
                break silent_end(exit_code, signal);
            }
        }
    };

    debug!(?close, "channel driver finished");
    let _ = closed_tx.send(close);
}

/// Classify a channel that vanished without a `Close` message.
///
/// The session task dying (TCP reset, inactivity timeout) also ends the
/// message stream, so a bare end is a dead transport unless the exit
/// report already arrived.
fn silent_end(exit_code: Option<u32>, signal: Option<String>) -> StreamClose {
    if exit_code.is_some() || signal.is_some() {
        StreamClose::Exited(CompletionStatus { exit_code, signal })
    } else {
        StreamClose::Error(RelayError::StreamTransport(
            "session ended before the remote reported an exit".into(),
        ))
    }
}

fn sig_name(sig: Sig) -> String {
    match sig {
        Sig::Custom(name) => name,
        other => format!("{:?}", other),
    }
}
