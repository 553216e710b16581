//! Release archive download with progress reporting

use crate::config::{Config, ProgressConfig};
use crate::error::{Error, Result, Stage, TransferError};
use crate::progress::{
    ProgressReader, ProgressReporter, ProgressSink, ReporterParams, TransferSession,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on the buffer reserved up front from Content-Length
const MAX_PREALLOCATION: u64 = 256 * 1024 * 1024;

/// Downloads a URL into memory while a [`ProgressReporter`] renders progress
pub struct Fetcher {
    client: reqwest::Client,
    progress: ProgressConfig,
}

impl Fetcher {
    /// Create a fetcher from the run configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.download.user_agent.clone())
            .build()
            .map_err(TransferError::Client)?;

        Ok(Self {
            client,
            progress: config.progress.clone(),
        })
    }

    /// GET `url` and buffer the whole body
    ///
    /// The reporter task is always joined before this returns. On success it
    /// is allowed to emit its final sample and drain; on failure or external
    /// cancellation it is cancelled first.
    pub async fn fetch(
        &self,
        url: &url::Url,
        sink: Box<dyn ProgressSink>,
        cancel_token: &CancellationToken,
    ) -> Result<Vec<u8>> {
        info!(%url, "downloading release archive");

        let response = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return Err(Error::Cancelled(Stage::Download)),
            response = self.client.get(url.clone()).send() => response,
        }
        .map_err(|source| TransferError::Request {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(TransferError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let total = response.content_length();
        debug!(?total, "response headers received");

        let session = TransferSession::new(total);
        let reporter = self.progress.enabled.then(|| {
            ProgressReporter::spawn(ReporterParams {
                session: session.clone(),
                sink,
                tick_interval: self.progress.tick_interval,
                channel_capacity: self.progress.channel_capacity,
                cancel_token: cancel_token.clone(),
            })
        });

        let body = response.bytes_stream().map_err(std::io::Error::other);
        let mut reader = ProgressReader::new(StreamReader::new(Box::pin(body)), session.clone());
        let mut buffer = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOCATION) as usize);

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => Err(Error::Cancelled(Stage::Download)),
            copied = tokio::io::copy(&mut reader, &mut buffer) => match copied {
                Ok(_) => check_length(&session),
                Err(source) => Err(TransferError::Body {
                    received: session.observed(),
                    source,
                }
                .into()),
            },
        };

        if let Some(reporter) = reporter {
            let joined = if outcome.is_ok() {
                reporter.join().await
            } else {
                reporter.cancel_and_join().await
            };
            if let Err(e) = joined {
                warn!(error = %e, "progress reporter ended abnormally");
            }
        }
        outcome?;

        info!(
            bytes = buffer.len(),
            elapsed_ms = session.elapsed().as_millis() as u64,
            "download complete"
        );
        Ok(buffer)
    }
}

fn check_length(session: &TransferSession) -> Result<()> {
    match session.total() {
        Some(expected) if expected != session.observed() => Err(TransferError::LengthMismatch {
            expected,
            received: session.observed(),
        }
        .into()),
        _ => Ok(()),
    }
}
