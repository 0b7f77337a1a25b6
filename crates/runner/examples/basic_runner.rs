//! Basic example of using the runner
//!
//! Demonstrates concurrent processes, graceful shutdown on SIGTERM/SIGINT
//! (Ctrl+C) and cleanup with closers.
//!
//! Run with: cargo run --example basic_runner

use orderflow_runner::Runner;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting runner example");

    let runner = Runner::new()
        // Counter that increments every second
        .with_process("counter", |ctx| async move {
            let mut counter = 0;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!("Counter stopping gracefully at count: {}", counter);
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(1)) => {
                        counter += 1;
                        tracing::info!("Counter: {}", counter);
                    }
                }
            }
            Ok(())
        })
        // Heartbeat every 2 seconds
        .with_process("heartbeat", |ctx| async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => {
                        tracing::info!("Heartbeat stopping gracefully");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_secs(2)) => {
                        tracing::info!("Heartbeat: still running");
                    }
                }
            }
            Ok(())
        })
        .with_closer(|| async move {
            tracing::info!("Flushing buffers...");
            tokio::time::sleep(Duration::from_millis(300)).await;
            tracing::info!("Flush done");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(5));

    tracing::info!("Press Ctrl+C to trigger graceful shutdown");
    runner.run().await;
}
