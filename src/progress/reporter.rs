//! Periodic progress reporting task

use super::{ProgressSample, ProgressSink, TransferSession};
use crate::error::{Error, Result, Stage};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Parameters for spawning a progress reporter
pub struct ReporterParams {
    /// Session to sample
    pub session: TransferSession,
    /// Where samples are delivered
    pub sink: Box<dyn ProgressSink>,
    /// Time between samples
    pub tick_interval: Duration,
    /// Capacity of the sample channel
    pub channel_capacity: usize,
    /// Parent token; cancelling it stops the reporter too
    pub cancel_token: CancellationToken,
}

/// Handle to a running progress reporter task
///
/// The task ends on its own once the session reaches end-of-input, or when it
/// is cancelled. Either way the owner must [`join`](Self::join) it.
#[must_use = "the reporter task must be joined"]
pub struct ProgressReporter {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressReporter {
    /// Spawn the reporter task on the current tokio runtime
    pub fn spawn(params: ReporterParams) -> Self {
        let ReporterParams {
            session,
            sink,
            tick_interval,
            channel_capacity,
            cancel_token,
        } = params;
        let cancel_token = cancel_token.child_token();
        let task_token = cancel_token.clone();

        let handle = tokio::spawn(async move {
            run_reporter(
                session,
                sink,
                tick_interval,
                channel_capacity.max(1),
                task_token,
            )
            .await;
        });

        Self {
            cancel_token,
            handle,
        }
    }

    /// Wait for the task to exit on its own
    pub async fn join(self) -> Result<()> {
        self.handle.await.map_err(Error::task(Stage::Download))?;
        Ok(())
    }

    /// Stop the task and wait for it to exit
    pub async fn cancel_and_join(self) -> Result<()> {
        self.cancel_token.cancel();
        self.join().await
    }
}

async fn run_reporter(
    session: TransferSession,
    mut sink: Box<dyn ProgressSink>,
    tick_interval: Duration,
    channel_capacity: usize,
    cancel_token: CancellationToken,
) {
    let (sample_tx, mut sample_rx) = mpsc::channel::<ProgressSample>(channel_capacity);
    sink.start(session.total());

    let ticker = tick_samples(session, tick_interval, sample_tx, cancel_token.clone());
    let drain = async {
        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    debug!("progress reporter cancelled");
                    break;
                }
                sample = sample_rx.recv() => {
                    let Some(sample) = sample else {
                        // Ticker saw end-of-input and closed the channel
                        debug!("progress reporter drained");
                        break;
                    };
                    sink.sample(&sample);
                }
            }
        }
    };

    tokio::join!(ticker, drain);
    sink.finish();
}

/// First tick one period from now. A late tick (a slow sink backing up the
/// channel) pushes the schedule back instead of dropping or bursting ticks.
fn sample_interval(tick_interval: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval_at(Instant::now() + tick_interval, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

/// Produce one sample per tick until end-of-input or cancellation.
///
/// Dropping `sample_tx` on return is what closes the channel.
async fn tick_samples(
    session: TransferSession,
    tick_interval: Duration,
    sample_tx: mpsc::Sender<ProgressSample>,
    cancel_token: CancellationToken,
) {
    let mut interval = sample_interval(tick_interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            _ = interval.tick() => {}
        }

        // Read the flag first: once it is set no more bytes will be recorded
        let done = session.is_finished();
        let sample = ProgressSample::new(session.observed(), session.total(), session.elapsed());

        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return,
            sent = sample_tx.send(sample) => {
                if sent.is_err() {
                    return;
                }
            }
        }

        if done {
            return;
        }
    }
}
