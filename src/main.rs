//! ssh-relay binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{error, info};

use ssh_relay::{
    cli, logging, CommandSpec, Config, LogReporter, RemoteExecutor, SshConnector, TerminalEvent,
};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("ssh-relay: {}", e);
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ssh-relay: {}", e);
            return ExitCode::from(2);
        }
    };

    std::env::set_var("RUST_LOG", config.log_filter());
    logging::try_init().ok();

    let params = match config.to_connection_params() {
        Ok(params) => params,
        Err(e) => {
            eprintln!("ssh-relay: {}", e);
            return ExitCode::from(2);
        }
    };

    let mut command = args.command.iter();
    let spec = match command.next() {
        Some(line) => CommandSpec::new(line).args(command.cloned()),
        None => {
            eprintln!("ssh-relay: no command given (see --help)");
            return ExitCode::from(2);
        }
    };

    let executor = RemoteExecutor::with_reporter(SshConnector::new(), Arc::new(LogReporter));
    let handles = executor.execute(spec, params);
    let input = handles.input;
    let mut output = handles.output;
    let mut error_output = handles.error_output;
    let terminal = handles.terminal;

    // Local stdin feeds the remote command; it queues until connected.
    tokio::spawn(async move {
        let mut stdin = tokio::io::stdin();
        let mut buf = vec![0u8; 8192];
        loop {
            match stdin.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if input.write(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    });

    let stdout_pump = tokio::spawn(async move {
        use std::io::Write;
        while let Some(chunk) = output.recv().await {
            let _ = std::io::stdout().write_all(&chunk);
            let _ = std::io::stdout().flush();
        }
    });
    let stderr_pump = tokio::spawn(async move {
        use std::io::Write;
        while let Some(chunk) = error_output.recv().await {
            let _ = std::io::stderr().write_all(&chunk);
            let _ = std::io::stderr().flush();
        }
    });

    let event = terminal.wait().await;
    let _ = stdout_pump.await;
    let _ = stderr_pump.await;

    match event {
        TerminalEvent::Completed(status) => {
            info!(
                exit_code = ?status.exit_code,
                signal = ?status.signal,
                "remote command completed"
            );
            if status.exceeds(config.policy.min_error) {
                ExitCode::from(status.exit_code.unwrap_or(1).min(255) as u8)
            } else {
                ExitCode::SUCCESS
            }
        }
        TerminalEvent::Failed(e) => {
            error!("execution failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
