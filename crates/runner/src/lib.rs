//! Process lifecycle for the SaaS services.
//!
//! The runner owns every long-running process of a binary (HTTP servers, bus
//! consumers) and drives them to a common end:
//! - processes run concurrently, each with a [`CancellationToken`]
//! - SIGTERM/SIGINT cancel every process
//! - a process error or panic cancels the rest
//! - a [`ShutdownSignal`] triggered from anywhere (integrity failures) cancels
//!   the rest and makes the process exit non-zero
//! - closers run afterwards under a timeout
//!
//! # Example
//!
//! ```no_run
//! use saas_runner::{Runner, ShutdownSignal};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let shutdown = ShutdownSignal::new();
//!     let runner = Runner::new()
//!         .with_shutdown_signal(shutdown.clone())
//!         .with_named_process("ticker", |ctx| async move {
//!             ctx.cancelled().await;
//!             Ok(())
//!         })
//!         .with_closer(|| async move { Ok(()) })
//!         .with_closer_timeout(Duration::from_secs(5));
//!
//!     runner.run().await;
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Boxed app process: takes the shared cancellation token and runs until it
/// is cancelled or fails.
pub type AppProcess = Box<
    dyn FnOnce(CancellationToken) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
        + Send,
>;

/// Boxed cleanup function executed after all processes stopped.
pub type Closer =
    Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>> + Send>;

/// Integrity shutdown channel.
///
/// Components that detect state they can no longer trust call
/// [`ShutdownSignal::trigger`]. The first reason wins; the runner cancels every
/// process and exits with a non-zero code.
#[derive(Clone, Debug, Default)]
pub struct ShutdownSignal {
    token: CancellationToken,
    reason: Arc<Mutex<Option<String>>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if let Ok(mut slot) = self.reason.lock() {
            if slot.is_none() {
                tracing::error!(reason = %reason, "integrity shutdown requested");
                *slot = Some(reason);
            }
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().ok().and_then(|slot| slot.clone())
    }

    /// Resolves once the signal has been triggered.
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }
}

struct NamedProcess {
    name: String,
    process: AppProcess,
}

pub struct Runner {
    processes: Vec<NamedProcess>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
    shutdown_signal: ShutdownSignal,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a runner with a 10 second closer timeout.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
            shutdown_signal: ShutdownSignal::new(),
        }
    }

    /// Adds a named app process. The name shows up in lifecycle logs.
    pub fn with_named_process<F, Fut>(mut self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.processes.push(NamedProcess {
            name: name.into(),
            process: Box::new(|token| Box::pin(process(token))),
        });
        self
    }

    /// Adds a closer. Closers run concurrently once every process stopped,
    /// whatever the reason.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Shares an integrity shutdown signal with the runner.
    pub fn with_shutdown_signal(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown_signal = signal;
        self
    }

    /// Runs every process, then the closers, then exits the process.
    ///
    /// Exit code is 0 for a signal-driven shutdown and 1 when a process failed
    /// or an integrity shutdown was requested.
    pub async fn run(self) {
        let closers = self.closers;
        let closer_timeout = self.closer_timeout;
        let shutdown_signal = self.shutdown_signal.clone();

        let failed = Self::run_processes(
            self.processes,
            self.cancellation_token,
            self.shutdown_signal,
        )
        .await;

        if !closers.is_empty() {
            tracing::info!(timeout = ?closer_timeout, "running closers");
            match tokio::time::timeout(closer_timeout, Self::run_closers(closers)).await {
                Ok(()) => tracing::info!("all closers completed"),
                Err(_) => tracing::error!(timeout = ?closer_timeout, "closers timed out"),
            }
        }

        if let Some(reason) = shutdown_signal.reason() {
            tracing::error!(reason = %reason, "application exiting after integrity shutdown");
            std::process::exit(1);
        }
        if failed {
            tracing::error!("application exiting with error");
            std::process::exit(1);
        }
        tracing::info!("application exiting normally");
        std::process::exit(0);
    }

    /// Drives processes until all finished or one of them ends the run.
    /// Returns true when the run ended because of a failure.
    async fn run_processes(
        processes: Vec<NamedProcess>,
        token: CancellationToken,
        shutdown_signal: ShutdownSignal,
    ) -> bool {
        let mut join_set = JoinSet::new();

        for NamedProcess { name, process } in processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                tracing::debug!(process = %name, "starting app process");
                let result = process(process_token).await;
                (name, result)
            });
        }

        spawn_signal_handlers(token.clone());

        // Integrity shutdowns cancel every process.
        {
            let token = token.clone();
            let shutdown_signal = shutdown_signal.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = shutdown_signal.triggered() => token.cancel(),
                    _ = token.cancelled() => {}
                }
            });
        }

        let mut failed = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(()))) => {
                    tracing::debug!(process = %name, "app process completed");
                }
                Ok((name, Err(err))) => {
                    if !token.is_cancelled() {
                        tracing::error!(process = %name, error = format!("{:#}", err), "app process failed");
                        failed = true;
                        token.cancel();
                    }
                }
                Err(err) => {
                    tracing::error!(error = %err, "app process panicked");
                    failed = true;
                    token.cancel();
                }
            }

            if token.is_cancelled() {
                break;
            }
        }

        join_set.shutdown().await;
        failed
    }

    async fn run_closers(closers: Vec<Closer>) {
        let mut closer_set = JoinSet::new();
        for closer in closers {
            closer_set.spawn(async move { closer().await });
        }

        while let Some(result) = closer_set.join_next().await {
            match result {
                Ok(Ok(())) => tracing::debug!("closer completed"),
                Ok(Err(err)) => tracing::error!(error = format!("{:#}", err), "closer failed"),
                Err(err) => tracing::error!(error = %err, "closer panicked"),
            }
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received interrupt signal");
                ctrl_c_token.cancel();
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for interrupt signal"),
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("received SIGTERM signal");
                token.cancel();
            }
            Err(err) => tracing::error!(error = %err, "failed to install SIGTERM handler"),
        }
    });
}
