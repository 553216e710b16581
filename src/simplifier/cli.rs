//! mapshaper command line handler

use super::traits::{SimplifyOptions, Simplifier};
use crate::config::ToolsConfig;
use crate::error::{Error, Stage};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const MAPSHAPER: &str = "mapshaper";

/// Runs the external `mapshaper` binary
///
/// stdout and stderr are inherited so the tool's own diagnostics reach the
/// terminal unchanged.
#[derive(Debug, Clone)]
pub struct MapshaperSimplifier {
    binary_path: PathBuf,
    options: SimplifyOptions,
}

impl MapshaperSimplifier {
    /// Create a handler with an explicit binary path
    pub fn new(binary_path: PathBuf, options: SimplifyOptions) -> Self {
        Self {
            binary_path,
            options,
        }
    }

    /// Resolve the binary from configuration, falling back to PATH
    ///
    /// This is the environment precondition check; it runs before any network
    /// activity.
    pub fn locate(tools: &ToolsConfig) -> crate::Result<Self> {
        let options = SimplifyOptions::from(tools);

        if let Some(path) = &tools.mapshaper_path {
            if !path.is_file() {
                return Err(Error::MissingExecutable {
                    tool: MAPSHAPER.to_string(),
                    reason: format!("configured path {} is not a file", path.display()),
                });
            }
            return Ok(Self::new(path.clone(), options));
        }

        if !tools.search_path {
            return Err(Error::MissingExecutable {
                tool: MAPSHAPER.to_string(),
                reason: "no path configured and PATH search disabled".to_string(),
            });
        }

        let path = which::which(MAPSHAPER).map_err(|e| Error::MissingExecutable {
            tool: MAPSHAPER.to_string(),
            reason: format!("not found in $PATH ({e})"),
        })?;
        debug!(?path, "resolved mapshaper from PATH");
        Ok(Self::new(path, options))
    }

    /// Arguments for `mapshaper -i <input> -simplify <algorithm> <pct>% -o <output>`
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-i".into(),
            input.as_os_str().to_owned(),
            "-simplify".into(),
            self.options.algorithm.clone().into(),
            format!("{}%", self.options.percentage).into(),
            "-o".into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl Simplifier for MapshaperSimplifier {
    async fn simplify(
        &self,
        workdir: &Path,
        input: &Path,
        output: &Path,
        cancel_token: &CancellationToken,
    ) -> crate::Result<()> {
        info!(
            algorithm = %self.options.algorithm,
            percentage = self.options.percentage,
            "running mapshaper"
        );

        let mut child = Command::new(&self.binary_path)
            .args(self.args(input, output))
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::ToolLaunch {
                tool: MAPSHAPER.to_string(),
                source,
            })?;

        let waited = tokio::select! {
            status = child.wait() => Some(status),
            _ = cancel_token.cancelled() => None,
        };
        let Some(status) = waited else {
            child.kill().await.ok();
            return Err(Error::Cancelled(Stage::Simplify));
        };
        let status = status.map_err(|source| Error::ToolLaunch {
            tool: MAPSHAPER.to_string(),
            source,
        })?;

        if !status.success() {
            return Err(Error::ToolFailed {
                tool: MAPSHAPER.to_string(),
                status,
            });
        }

        info!("mapshaper finished");
        Ok(())
    }

    fn name(&self) -> &'static str {
        MAPSHAPER
    }
}
