//! A concurrent application runner that manages long-running processes with graceful shutdown.
//!
//! The runner owns the shutdown sequence: a termination signal cancels a
//! shared token, every process winds down cooperatively and is joined (never
//! aborted), and only then do the cleanup closers run. This preserves
//! in-flight work at the cost of shutdown latency.
//!
//! # Example
//!
//! ```no_run
//! use orderflow_runner::Runner;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let runner = Runner::new()
//!         .with_process("ticker", |ctx| async move {
//!             loop {
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => {
//!                         tracing::info!("Process stopping gracefully");
//!                         break;
//!                     }
//!                     _ = tokio::time::sleep(Duration::from_secs(1)) => {
//!                         tracing::info!("Process working...");
//!                     }
//!                 }
//!             }
//!             Ok(())
//!         })
//!         .with_closer(|| async move {
//!             tracing::info!("Cleaning up resources");
//!             Ok(())
//!         })
//!         .with_closer_timeout(Duration::from_secs(5));
//!
//!     runner.run().await;
//! }
//! ```

use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// A long-running process driven by the runner.
///
/// Takes the shared cancellation token and runs until it resolves or fails.
pub type Process = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// A cleanup function executed after every process has stopped.
pub type Closer = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<()>> + Send>;

/// Orchestrates named processes and cleanup closers.
///
/// - Processes run concurrently until completion, a failure, or a shutdown
///   signal (SIGTERM/SIGINT).
/// - A failing process cancels its peers, but they are joined, not aborted.
/// - Closers run afterwards under a timeout, regardless of outcome.
pub struct Runner {
    processes: Vec<(String, Process)>,
    closers: Vec<Closer>,
    closer_timeout: Duration,
    cancellation_token: CancellationToken,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    /// Creates a new Runner with a 10 second closer timeout and no
    /// processes or closers.
    pub fn new() -> Self {
        Self {
            processes: Vec::new(),
            closers: Vec::new(),
            closer_timeout: Duration::from_secs(10),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Adds a named process from a closure.
    pub fn with_process<F, Fut>(self, name: impl Into<String>, process: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.with_named_process(name, Box::new(|token| Box::pin(process(token))))
    }

    /// Adds an already-boxed named process.
    ///
    /// Useful for modules that hand out their main loop as a boxed closure.
    pub fn with_named_process(mut self, name: impl Into<String>, process: Process) -> Self {
        self.processes.push((name.into(), process));
        self
    }

    /// Adds a closer.
    ///
    /// Closers execute after all processes have stopped, regardless of
    /// whether they stopped due to error or cancellation. All closers are
    /// attempted even if some fail.
    pub fn with_closer<F, Fut>(mut self, closer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.closers.push(Box::new(|| Box::pin(closer())));
        self
    }

    /// Sets the timeout for executing closers. Default is 10 seconds.
    pub fn with_closer_timeout(mut self, timeout: Duration) -> Self {
        self.closer_timeout = timeout;
        self
    }

    /// Sets a custom cancellation token, allowing external shutdown control.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Runs all processes until completion or shutdown, then exits the
    /// process with the resulting code.
    pub async fn run(self) {
        let code = self.execute().await;
        std::process::exit(code);
    }

    /// Drives processes and closers to completion and returns the exit code.
    pub async fn execute(self) -> i32 {
        let Runner {
            processes,
            closers,
            closer_timeout,
            cancellation_token: token,
        } = self;

        let mut join_set: JoinSet<(String, anyhow::Result<()>)> = JoinSet::new();
        for (name, process) in processes {
            let process_token = token.clone();
            join_set.spawn(async move {
                let result = process(process_token).await;
                (name, result)
            });
        }

        spawn_signal_handlers(token.clone());

        // Every process is joined. A failure cancels the others, but they
        // wind down on their own; in-flight work is never aborted.
        let mut first_error = None;
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((name, Ok(()))) => {
                    tracing::debug!(process = %name, "Process completed");
                }
                Ok((name, Err(err))) => {
                    tracing::error!(process = %name, "Process failed: {:#}", err);
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                    token.cancel();
                }
                Err(err) => {
                    tracing::error!("Process panicked: {}", err);
                    token.cancel();
                }
            }
        }

        if !closers.is_empty() {
            tracing::info!(
                timeout_secs = closer_timeout.as_secs(),
                "Running closers"
            );

            match tokio::time::timeout(closer_timeout, run_closers(closers)).await {
                Ok(()) => tracing::info!("All closers completed"),
                Err(_) => tracing::error!("Closers timed out after {:?}", closer_timeout),
            }
        }

        if let Some(err) = first_error {
            tracing::error!("Application exiting with error: {:#}", err);
            1
        } else {
            tracing::info!("Application exiting normally");
            0
        }
    }
}

fn spawn_signal_handlers(token: CancellationToken) {
    let interrupt_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal");
                interrupt_token.cancel();
            }
            Err(err) => {
                tracing::error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
        sigterm.recv().await;
        tracing::info!("Received SIGTERM signal");
        token.cancel();
    });
}

/// Runs all closers concurrently, logging failures.
async fn run_closers(closers: Vec<Closer>) {
    let mut closer_set = JoinSet::new();

    for closer in closers {
        closer_set.spawn(async move { closer().await });
    }

    while let Some(result) = closer_set.join_next().await {
        match result {
            Ok(Ok(())) => tracing::debug!("Closer completed"),
            Ok(Err(err)) => tracing::error!("Closer error: {:#}", err),
            Err(err) => tracing::error!("Closer panicked: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_execute_joins_processes_and_runs_closers() {
        let closer_called = Arc::new(AtomicBool::new(false));
        let closer_flag = Arc::clone(&closer_called);

        let token = CancellationToken::new();
        let external = token.clone();

        let runner = Runner::new()
            .with_process("worker", |ctx| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .with_closer(move || {
                let flag = Arc::clone(&closer_flag);
                async move {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token)
            .with_closer_timeout(Duration::from_secs(5));

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            external.cancel();
        });

        let code = runner.execute().await;

        assert_eq!(code, 0);
        assert!(closer_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_process_error_cancels_peers_and_sets_exit_code() {
        let peer_stopped = Arc::new(AtomicBool::new(false));
        let peer_flag = Arc::clone(&peer_stopped);

        let runner = Runner::new()
            .with_process("failing", |_ctx| async move {
                Err(anyhow::anyhow!("boom"))
            })
            .with_process("peer", move |ctx| {
                let flag = Arc::clone(&peer_flag);
                async move {
                    ctx.cancelled().await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            });

        let code = runner.execute().await;

        assert_eq!(code, 1);
        assert!(peer_stopped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_process_is_not_aborted_while_winding_down() {
        let wind_down_finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&wind_down_finished);

        let token = CancellationToken::new();
        token.cancel();

        let runner = Runner::new()
            .with_process("draining", move |ctx| {
                let flag = Arc::clone(&flag);
                async move {
                    ctx.cancelled().await;
                    // Simulates draining in-flight work after the signal.
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                }
            })
            .with_cancellation_token(token);

        let code = runner.execute().await;

        assert_eq!(code, 0);
        assert!(wind_down_finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_closers_executes_all() {
        let counter = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&counter);

        let closers: Vec<Closer> = vec![Box::new(move || {
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
        })];

        run_closers(closers).await;
        assert!(counter.load(Ordering::SeqCst));
    }
}
