//! # tzshapefilegen
//!
//! Generates a Go source file embedding a compressed, simplified copy of the
//! timezone-boundary-builder world timezone shapes.
//!
//! A run downloads one release archive, checks that its first entry is the
//! combined GeoJSON, simplifies it with an external tool, gzips the result and
//! writes it out as an escaped-hex byte literal.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tzshapefilegen::{Config, ConsoleSink, Generator};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.release = "2018g".to_string();
//!
//!     let generator = Generator::new(config)?;
//!     let report = generator
//!         .run(Box::new(ConsoleSink::stdout("2018g")), &CancellationToken::new())
//!         .await?;
//!
//!     println!("wrote {}", report.output_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Release archive validation and extraction
pub mod archive;
/// Configuration types
pub mod config;
/// Gzip compression and Go source rendering
pub mod encode;
/// Error types
pub mod error;
/// Release download
pub mod fetch;
/// The generation pipeline
pub mod generator;
/// Download progress tracking and display
pub mod progress;
/// External geometry simplification
pub mod simplifier;
/// Scratch directory management
pub mod workspace;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, FormatError, Result, Stage, ToExitCode, TransferError};
pub use generator::{GenerationReport, Generator};
pub use progress::{ConsoleSink, ProgressSink, TracingSink};
pub use simplifier::{MapshaperSimplifier, Simplifier};

use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process receives a termination signal.
///
/// Returns the spawned watcher so callers can abort it once the run is over.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub fn cancel_on_signal(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = wait_for_signal() => {
                tracing::warn!("cancelling generation");
                token.cancel();
            }
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
