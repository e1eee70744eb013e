//! Process supervisor for the tracking services.
//!
//! Runs named long-lived processes (queue consumers, demo producers) side by side,
//! cancels all of them when one fails or when SIGINT/SIGTERM arrives, and then runs
//! the registered closers under a timeout.
//!
//! # Example
//!
//! ```no_run
//! use tracking_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     Runner::new()
//!         .with_named_process("heartbeat", |ctx| async move {
//!             while !ctx.is_cancelled() {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {}
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("still alive");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move { Ok(()) })
//!         .with_closer_timeout(Duration::from_secs(5))
//!         .run()
//!         .await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

pub type ProcessFuture = Pin<Box<dyn Future<Output = Result<(), anyhow::Error>> + Send>>;

/// A long-running process. Receives the shared cancellation token.
pub type AppProcess = Box<dyn FnOnce(CancellationToken) -> ProcessFuture + Send>;

/// A cleanup step executed once every process has stopped.
pub type Closer = Box<dyn FnOnce() -> ProcessFuture + Send>;

struct NamedProcess {
    name: String,
    process: AppProcess,
}

pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
    handle_signals: bool,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Closer timeout defaults to 10 seconds; OS signals are observed.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
            handle_signals: true,
        }
    }

    /// Adds an unnamed process; it is reported as `process-<n>`.
    pub fn with_app_process<F, Fut>(self, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        let name = format!("process-{}", self.processes.len());
        self.with_named_process(name, process)
    }

    /// Adds a process whose name is attached to its tracing span and to
    /// the log lines emitted when it stops.
    pub fn with_named_process<N, F, Fut>(mut self, name: N, process: F) -> Self
    where
        N: Into<String>,
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name: name.into(),
            process: Box::new(|token| Box::pin(process(token))),
        });
        self
    }

    /// Closers run concurrently after all processes stop, whatever the outcome.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), anyhow::Error>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Use an externally owned token, e.g. to stop the runner from a test.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Disable SIGINT/SIGTERM handling.
    pub fn without_signal_handlers(mut self) -> Self {
        self.handle_signals = false;
        self
    }

    /// Runs until stopped, then exits the process with the resulting code.
    pub async fn run(self) {
        let code = self.run_until_stopped().await;
        if code == 0 {
            info!("Application exiting normally");
        } else {
            error!(exit_code = code, "Application exiting with error");
        }
        std::process::exit(code);
    }

    /// Runs all processes until one fails, all finish, or the token is cancelled.
    /// Returns 1 if a process failed or panicked, 0 otherwise.
    pub async fn run_until_stopped(self) -> i32 {
        let token = self.cancellation_token;
        let mut join_set = JoinSet::new();

        for NamedProcess { name, process } in self.processes {
            let process_token = token.clone();
            let span = tracing::info_span!("process", name = %name);
            join_set.spawn(
                async move {
                    debug!("process starting");
                    (name, process(process_token).await)
                }
                .instrument(span),
            );
        }

        if self.handle_signals {
            spawn_signal_handlers(token.clone());
        }

        let mut failed = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    debug!(process = %name, "process completed");
                }
                Ok((name, Err(err))) => {
                    if token.is_cancelled() {
                        warn!(process = %name, error = %format!("{:#}", err), "process failed during shutdown");
                    } else {
                        error!(process = %name, error = %format!("{:#}", err), "process failed");
                        failed = true;
                        token.cancel();
                    }
                }
                Err(err) => {
                    error!(error = %err, "process panicked");
                    failed = true;
                    token.cancel();
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        join_set.shutdown().await;

        run_closers(self.closers, self.closer_timeout).await;

        if failed {
            1
        } else {
            0
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGINT");
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM");
                token.cancel();
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
            }
        }
    });
}

async fn run_closers(closers: Vec<Closer>, timeout: Duration) {
    if closers.is_empty() {
        return;
    }

    info!(timeout_ms = timeout.as_millis(), "Running closers");

    let mut closer_set = JoinSet::new();
    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    let drained = tokio::time::timeout(timeout, async {
        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => debug!("closer completed"),
                Ok(Err(err)) => error!(error = %format!("{:#}", err), "closer failed"),
                Err(err) => error!(error = %err, "closer panicked"),
            }
        }
    })
    .await;

    match drained {
        Ok(()) => info!("All closers completed"),
        Err(_) => {
            error!(timeout_ms = timeout.as_millis(), "Closers timed out");
            closer_set.abort_all();
        }
    }
}
