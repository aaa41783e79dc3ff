//! Pipeline behavior tests against a scripted in-memory connector.
//!
//! These cover the deferred-handle contract without any network: handles
//! usable before connect, FIFO input replay, single terminal event,
//! status phase strings, and channel isolation.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Semaphore};
use tokio::time::timeout;

use ssh_relay::{
    CommandSpec, CompletionStatus, ConnectionParams, Connector, ProcessStreams, RelayError,
    RemoteExecutor, RemoteSession, Result, StatusReporter, StreamClose, TerminalEvent,
};

const WAIT: Duration = Duration::from_secs(2);

fn key_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"dummy key material").unwrap();
    file
}

fn params_for(key_path: &Path) -> ConnectionParams {
    ConnectionParams {
        host: "build.example.com".into(),
        port: 22,
        username: "deploy".into(),
        private_key_path: key_path.to_path_buf(),
        connect_timeout_secs: 30,
    }
}

/// Reporter that records phase strings in order.
#[derive(Default)]
struct Recorder(Mutex<Vec<String>>);

impl StatusReporter for Recorder {
    fn working(&self, text: &str) {
        self.0.lock().unwrap().push(text.to_string());
    }
}

/// What the scripted session should do once exec is reached.
#[derive(Clone)]
enum Script {
    /// connect() itself fails.
    FailConnect,
    /// exec() fails.
    FailExec,
    /// Collect stdin frames until EOF, then close with exit code 0.
    CollectStdin(Arc<Mutex<Vec<Vec<u8>>>>),
    /// Emit canned output, then close.
    Emit {
        stdout: Vec<&'static [u8]>,
        stderr: Vec<&'static [u8]>,
        close: CloseKind,
    },
}

#[derive(Clone, Copy)]
enum CloseKind {
    Exit(u32),
    Signal(&'static str),
    TransportError,
}

/// Connector whose sessions run a canned script, recording everything
/// it is given along the way.
struct ScriptConnector {
    script: Script,
    calls: Arc<AtomicUsize>,
    commands: Arc<Mutex<Vec<String>>>,
    keys: Arc<Mutex<Vec<Vec<u8>>>>,
    /// When set, connect() blocks until a permit is released.
    gate: Option<Arc<Semaphore>>,
}

impl ScriptConnector {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(AtomicUsize::new(0)),
            commands: Arc::new(Mutex::new(Vec::new())),
            keys: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }
}

struct ScriptSession {
    script: Script,
    commands: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Connector for ScriptConnector {
    type Session = ScriptSession;

    async fn connect(
        &self,
        _params: &ConnectionParams,
        key_material: &[u8],
    ) -> Result<Self::Session> {
        if let Some(ref gate) = self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key_material.to_vec());

        match self.script {
            Script::FailConnect => Err(RelayError::Connection("auth rejected".into())),
            ref script => Ok(ScriptSession {
                script: script.clone(),
                commands: Arc::clone(&self.commands),
            }),
        }
    }
}

#[async_trait]
impl RemoteSession for ScriptSession {
    async fn exec(self, command: &str) -> Result<ProcessStreams> {
        self.commands.lock().unwrap().push(command.to_string());

        let (stdin_tx, mut stdin_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let (stdout_tx, stdout_rx) = mpsc::unbounded_channel();
        let (stderr_tx, stderr_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = oneshot::channel();

        match self.script {
            Script::FailConnect => unreachable!("connect would have failed first"),
            Script::FailExec => return Err(RelayError::ExecLaunch("remote refused".into())),
            Script::CollectStdin(frames) => {
                tokio::spawn(async move {
                    while let Some(frame) = stdin_rx.recv().await {
                        frames.lock().unwrap().push(frame);
                    }
                    let _ = closed_tx.send(StreamClose::Exited(CompletionStatus::exited(0)));
                });
            }
            Script::Emit {
                stdout,
                stderr,
                close,
            } => {
                tokio::spawn(async move {
                    for chunk in stdout {
                        let _ = stdout_tx.send(chunk.to_vec());
                    }
                    for chunk in stderr {
                        let _ = stderr_tx.send(chunk.to_vec());
                    }
                    let close = match close {
                        CloseKind::Exit(code) => {
                            StreamClose::Exited(CompletionStatus::exited(code))
                        }
                        CloseKind::Signal(name) => {
                            StreamClose::Exited(CompletionStatus::signalled(name))
                        }
                        CloseKind::TransportError => StreamClose::Error(
                            RelayError::StreamTransport("connection reset".into()),
                        ),
                    };
                    let _ = closed_tx.send(close);
                });
            }
        }

        Ok(ProcessStreams {
            stdin: stdin_tx,
            stdout: stdout_rx,
            stderr: stderr_rx,
            closed: closed_rx,
        })
    }
}

#[tokio::test]
async fn test_input_written_before_connect_replays_in_order() {
    let key = key_file();
    let frames = Arc::new(Mutex::new(Vec::new()));
    let gate = Arc::new(Semaphore::new(0));
    let connector =
        ScriptConnector::new(Script::CollectStdin(Arc::clone(&frames))).gated(Arc::clone(&gate));

    let executor = RemoteExecutor::new(connector);
    let handles = executor.execute(CommandSpec::new("cat"), params_for(key.path()));

    // The connection is gated shut; these writes can only be buffered.
    handles.input.write(b"one".to_vec()).unwrap();
    handles.input.write(b"two".to_vec()).unwrap();
    handles.input.write(b"three".to_vec()).unwrap();
    handles.input.close();

    gate.add_permits(1);

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert!(event.completion().unwrap().success());
    assert_eq!(
        *frames.lock().unwrap(),
        vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]
    );
}

#[tokio::test]
async fn test_status_phases_reported_in_order() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Exit(0),
    });
    let reporter = Arc::new(Recorder::default());

    let executor =
        RemoteExecutor::with_reporter(connector, reporter.clone() as Arc<dyn StatusReporter>);
    let handles = executor.execute(CommandSpec::new("uptime"), params_for(key.path()));

    timeout(WAIT, handles.terminal.wait()).await.unwrap();

    let phases = reporter.0.lock().unwrap().clone();
    assert_eq!(
        phases,
        vec![
            "Connecting to build.example.com...".to_string(),
            "Executing uptime ...".to_string(),
            "Launched, waiting for data...".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_status_preview_truncated_to_twenty_chars() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Exit(0),
    });
    let reporter = Arc::new(Recorder::default());

    let executor =
        RemoteExecutor::with_reporter(connector, reporter.clone() as Arc<dyn StatusReporter>);
    let spec = CommandSpec::new("find / -name '*.log' -mtime +30 -delete");
    let handles = executor.execute(spec, params_for(key.path()));

    timeout(WAIT, handles.terminal.wait()).await.unwrap();

    let phases = reporter.0.lock().unwrap().clone();
    let executing = &phases[1];
    let preview = executing
        .strip_prefix("Executing ")
        .and_then(|s| s.strip_suffix("..."))
        .unwrap();
    assert_eq!(preview.chars().count(), 20);
}

#[tokio::test]
async fn test_connect_failure_is_single_failure_event() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::FailConnect);
    let calls = Arc::clone(&connector.calls);
    let reporter = Arc::new(Recorder::default());

    let executor =
        RemoteExecutor::with_reporter(connector, reporter.clone() as Arc<dyn StatusReporter>);
    let handles = executor.execute(CommandSpec::new("true"), params_for(key.path()));

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert!(matches!(
        event,
        TerminalEvent::Failed(RelayError::Connection(_))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Only the connect phase was ever reached.
    let phases = reporter.0.lock().unwrap().clone();
    assert_eq!(phases, vec!["Connecting to build.example.com...".to_string()]);
}

#[tokio::test]
async fn test_exec_failure_stops_pipeline() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::FailExec);
    let reporter = Arc::new(Recorder::default());

    let executor =
        RemoteExecutor::with_reporter(connector, reporter.clone() as Arc<dyn StatusReporter>);
    let handles = executor.execute(CommandSpec::new("true"), params_for(key.path()));

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert!(matches!(
        event,
        TerminalEvent::Failed(RelayError::ExecLaunch(_))
    ));

    // "Launched, waiting for data..." must never appear.
    let phases = reporter.0.lock().unwrap().clone();
    assert_eq!(phases.len(), 2);
    assert!(phases[1].starts_with("Executing "));
}

#[tokio::test]
async fn test_exec_receives_escaped_command_string() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Exit(0),
    });
    let commands = Arc::clone(&connector.commands);

    let executor = RemoteExecutor::new(connector);
    let spec = CommandSpec::new("ls").args(["a b", "c"]);
    let handles = executor.execute(spec, params_for(key.path()));

    timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert_eq!(*commands.lock().unwrap(), vec!["ls a\\ b c".to_string()]);
}

#[tokio::test]
async fn test_exit_code_reported_raw() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Exit(2),
    });

    let executor = RemoteExecutor::new(connector);
    let handles = executor.execute(CommandSpec::new("false"), params_for(key.path()));

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    let status = event.completion().unwrap();
    assert_eq!(status.exit_code, Some(2));
    assert_eq!(status.signal, None);
    // A policy layer would classify this; the status itself stays raw.
    assert!(status.exceeds(1));
}

#[tokio::test]
async fn test_signal_termination_reported() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Signal("KILL"),
    });

    let executor = RemoteExecutor::new(connector);
    let handles = executor.execute(CommandSpec::new("sleep").arg("60"), params_for(key.path()));

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    let status = event.completion().unwrap();
    assert_eq!(status.exit_code, None);
    assert_eq!(status.signal.as_deref(), Some("KILL"));
}

#[tokio::test]
async fn test_stderr_isolated_from_stdout() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![b"to stdout"],
        stderr: vec![b"to stderr"],
        close: CloseKind::Exit(0),
    });

    let executor = RemoteExecutor::new(connector);
    let handles = executor.execute(CommandSpec::new("sh"), params_for(key.path()));

    timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert_eq!(handles.output.collect().await, b"to stdout");
    assert_eq!(handles.error_output.collect().await, b"to stderr");
}

#[tokio::test]
async fn test_mid_stream_error_keeps_partial_output() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![b"partial "],
        stderr: vec![],
        close: CloseKind::TransportError,
    });

    let executor = RemoteExecutor::new(connector);
    let handles = executor.execute(CommandSpec::new("tail").arg("-f"), params_for(key.path()));

    let event = timeout(WAIT, handles.terminal.wait()).await.unwrap();
    assert!(matches!(
        event,
        TerminalEvent::Failed(RelayError::StreamTransport(_))
    ));
    // Output that flowed before the failure is not discarded.
    assert_eq!(handles.output.collect().await, b"partial ");
}

#[tokio::test]
async fn test_key_material_read_fresh_per_execution() {
    let key = key_file();
    let connector = ScriptConnector::new(Script::Emit {
        stdout: vec![],
        stderr: vec![],
        close: CloseKind::Exit(0),
    });
    let keys = Arc::clone(&connector.keys);
    let executor = RemoteExecutor::new(connector);

    let handles = executor.execute(CommandSpec::new("true"), params_for(key.path()));
    timeout(WAIT, handles.terminal.wait()).await.unwrap();

    // Rotate the key on disk between runs; the next execution must see
    // the new material without any restart.
    std::fs::write(key.path(), b"rotated key material").unwrap();

    let handles = executor.execute(CommandSpec::new("true"), params_for(key.path()));
    timeout(WAIT, handles.terminal.wait()).await.unwrap();

    let seen = keys.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0], b"dummy key material");
    assert_eq!(seen[1], b"rotated key material");
}

#[tokio::test]
async fn test_concurrent_executions_are_independent() {
    let key = key_file();
    let frames_a = Arc::new(Mutex::new(Vec::new()));
    let frames_b = Arc::new(Mutex::new(Vec::new()));

    let exec_a = RemoteExecutor::new(ScriptConnector::new(Script::CollectStdin(Arc::clone(
        &frames_a,
    ))));
    let exec_b = RemoteExecutor::new(ScriptConnector::new(Script::CollectStdin(Arc::clone(
        &frames_b,
    ))));

    let handles_a = exec_a.execute(CommandSpec::new("cat"), params_for(key.path()));
    let handles_b = exec_b.execute(CommandSpec::new("cat"), params_for(key.path()));

    handles_a.input.write(b"for a".to_vec()).unwrap();
    handles_b.input.write(b"for b".to_vec()).unwrap();
    handles_a.input.close();
    handles_b.input.close();

    timeout(WAIT, handles_a.terminal.wait()).await.unwrap();
    timeout(WAIT, handles_b.terminal.wait()).await.unwrap();

    assert_eq!(*frames_a.lock().unwrap(), vec![b"for a".to_vec()]);
    assert_eq!(*frames_b.lock().unwrap(), vec![b"for b".to_vec()]);
}
