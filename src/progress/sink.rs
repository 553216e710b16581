//! Display targets for progress samples

use super::{ProgressSample, format_remaining};
use std::io::Write;

/// Receives progress samples from a [`ProgressReporter`](super::ProgressReporter)
///
/// All methods run on the reporter task. `finish` is called exactly once,
/// whether the download drained naturally or the reporter was cancelled.
pub trait ProgressSink: Send {
    /// Called once before the first sample
    fn start(&mut self, _total: Option<u64>) {}

    /// Called once per tick
    fn sample(&mut self, sample: &ProgressSample);

    /// Called once when the reporter stops
    fn finish(&mut self) {}
}

/// Rewrites a single terminal line with the remaining-time estimate
pub struct ConsoleSink<W: Write + Send = std::io::Stdout> {
    label: String,
    out: W,
    wrote_line: bool,
}

impl ConsoleSink {
    /// Console sink writing to stdout
    pub fn stdout(release: &str) -> Self {
        Self::new(release, std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleSink<W> {
    /// Console sink writing to `out`
    pub fn new(release: &str, out: W) -> Self {
        Self {
            label: format!("Downloading timezone shape file {release}"),
            out,
            wrote_line: false,
        }
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> ProgressSink for ConsoleSink<W> {
    fn start(&mut self, _total: Option<u64>) {
        // Display output only; a closed stdout must not fail the download
        writeln!(self.out, "{}", self.label).ok();
    }

    fn sample(&mut self, sample: &ProgressSample) {
        let line = match (sample.estimated_remaining, sample.total) {
            (Some(eta), _) => format!("{}  Remaining...", format_remaining(eta)),
            (None, None) => format!("{} bytes received...", sample.observed),
            (None, Some(_)) => "waiting for data...".to_string(),
        };
        write!(self.out, "\r{line}").ok();
        self.out.flush().ok();
        self.wrote_line = true;
    }

    fn finish(&mut self) {
        if self.wrote_line {
            writeln!(self.out).ok();
        }
        self.out.flush().ok();
    }
}

/// Logs each sample through `tracing` at debug level
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn start(&mut self, total: Option<u64>) {
        tracing::debug!(?total, "download started");
    }

    fn sample(&mut self, sample: &ProgressSample) {
        tracing::debug!(
            observed = sample.observed,
            total = ?sample.total,
            speed_bps = sample.bytes_per_sec(),
            eta_secs = ?sample.estimated_remaining.map(|d| d.as_secs()),
            "download progress"
        );
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn console_sink_rewrites_one_line() {
        let mut sink = ConsoleSink::new("2018g", Vec::new());

        sink.start(Some(1000));
        sink.sample(&ProgressSample::new(0, Some(1000), Duration::from_secs(1)));
        sink.sample(&ProgressSample::new(250, Some(1000), Duration::from_secs(2)));
        sink.finish();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            text,
            "Downloading timezone shape file 2018g\n\rwaiting for data...\r6s  Remaining...\n"
        );
    }

    #[test]
    fn console_sink_without_total_reports_bytes() {
        let mut sink = ConsoleSink::new("2020a", Vec::new());

        sink.start(None);
        sink.sample(&ProgressSample::new(4096, None, Duration::from_secs(1)));
        sink.finish();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert!(text.ends_with("\r4096 bytes received...\n"));
    }

    #[test]
    fn console_sink_finish_without_samples_adds_no_blank_line() {
        let mut sink = ConsoleSink::new("2018g", Vec::new());

        sink.start(None);
        sink.finish();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "Downloading timezone shape file 2018g\n");
    }
}
