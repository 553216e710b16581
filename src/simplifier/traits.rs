//! Traits and types for geometry simplification

use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Parameters forwarded to the simplification tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimplifyOptions {
    /// Simplification method (e.g. "visvalingam", "dp")
    pub algorithm: String,
    /// Percentage of removable vertices to retain
    pub percentage: u8,
}

impl From<&ToolsConfig> for SimplifyOptions {
    fn from(tools: &ToolsConfig) -> Self {
        Self {
            algorithm: tools.algorithm.clone(),
            percentage: tools.percentage,
        }
    }
}

/// Reduces a GeoJSON file to a smaller one
///
/// Implementations treat the geometry as opaque; they are only responsible
/// for turning `input` into `output`. Relative paths are resolved against
/// `workdir`.
#[async_trait]
pub trait Simplifier: Send + Sync {
    /// Produce `output` from `input`
    ///
    /// Must return [`Error::Cancelled`](crate::Error::Cancelled) with
    /// [`Stage::Simplify`](crate::Stage::Simplify) promptly once
    /// `cancel_token` fires.
    async fn simplify(
        &self,
        workdir: &Path,
        input: &Path,
        output: &Path,
        cancel_token: &CancellationToken,
    ) -> crate::Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
