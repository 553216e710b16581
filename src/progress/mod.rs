//! Download progress tracking
//!
//! Byte counting and progress display are decoupled: a [`ProgressReader`]
//! counts bytes into a shared [`TransferSession`] as the download reads
//! through it, and a [`ProgressReporter`] task samples that session on a fixed
//! interval and hands [`ProgressSample`]s to a [`ProgressSink`].

mod reader;
mod reporter;
mod sample;
mod session;
mod sink;

pub use reader::ProgressReader;
pub use reporter::{ProgressReporter, ReporterParams};
pub use sample::{ProgressSample, estimate_remaining, format_remaining};
pub use session::TransferSession;
pub use sink::{ConsoleSink, ProgressSink, TracingSink};
