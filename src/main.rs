//! ptyctl binary entry point.

use std::io::{Read, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ptyctl::cli::{self, Args};
use ptyctl::config::Config;
use ptyctl::{logging, AsyncPtyReader, PtySession, SessionOptions, NO_EXIT_CODE};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// How long to wait for an exit status after the output stream ended.
const EXIT_WAIT: Duration = Duration::from_secs(5);

/// Exit status used when interrupted, as shells report SIGINT.
const INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
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
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    let _ = logging::init_with_filter(config.log_filter());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let code = match runtime.block_on(run(&args, &config)) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    };

    // The stdin relay thread may still be blocked in a read; don't wait for it.
    runtime.shutdown_background();
    code
}

async fn run(args: &Args, config: &Config) -> Result<ExitCode, Box<dyn std::error::Error>> {
    info!("ptyctl v{}", env!("CARGO_PKG_VERSION"));

    let spec = config.launch_spec(args)?;
    let session = Arc::new(PtySession::open_with(
        &spec,
        SessionOptions::with_size(config.window_size()),
    )?);
    info!(
        "session {} running pid {:?}",
        session.id(),
        session.process_id()
    );

    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
    let reader = AsyncPtyReader::new(session.reader(), tx)
        .with_buffer_size(config.io.read_buffer_size);
    let reader_task = tokio::spawn(reader.run());

    spawn_stdin_relay(Arc::clone(&session));

    let mut stdout = tokio::io::stdout();
    let mut interrupted = false;
    loop {
        tokio::select! {
            chunk = rx.recv() => match chunk {
                Some(data) => {
                    stdout.write_all(&data).await?;
                    stdout.flush().await?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, closing session {}", session.id());
                interrupted = true;
                session.close();
            }
        }
    }
    let _ = reader_task.await;

    if interrupted {
        return Ok(ExitCode::from(INTERRUPTED));
    }

    let code = wait_for_exit(&session, config.exit_poll_interval()).await;
    session.close();
    info!("child exited with {}", code);

    Ok(match u8::try_from(code) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    })
}

/// Poll until the child reports an exit code or `EXIT_WAIT` elapses.
async fn wait_for_exit(session: &PtySession, poll: Duration) -> i32 {
    let deadline = Instant::now() + EXIT_WAIT;
    loop {
        let code = session.exit_code();
        if code != NO_EXIT_CODE || Instant::now() >= deadline {
            return code;
        }
        tokio::time::sleep(poll).await;
    }
}

/// Copy our stdin into the session on a plain thread.
fn spawn_stdin_relay(session: Arc<PtySession>) {
    let mut writer = session.writer();
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin().lock();
        let mut buf = [0u8; 1024];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => {
                    debug!("stdin closed");
                    break;
                }
                Ok(n) => {
                    if let Err(e) = writer.write_all(&buf[..n]) {
                        debug!("stdin relay stopped: {}", e);
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    });
}
