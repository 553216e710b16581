//! End-to-end generation: download, extract, simplify, encode, write

use crate::archive::{ArchiveExtractor, EXTRACTED_FILE_NAME};
use crate::config::Config;
use crate::encode::encode_file;
use crate::error::{Error, Result, Stage};
use crate::fetch::Fetcher;
use crate::progress::ProgressSink;
use crate::simplifier::{MapshaperSimplifier, Simplifier};
use crate::workspace::Workspace;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// File name the simplifier writes inside the workspace
pub const REDUCED_FILE_NAME: &str = "reduced.json";

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Release that was downloaded
    pub release: String,
    /// Path of the generated source file
    pub output_path: PathBuf,
    /// Size of the downloaded archive
    pub downloaded_bytes: u64,
    /// Size of the simplified GeoJSON
    pub simplified_bytes: u64,
    /// Size of the gzip payload embedded in the output
    pub compressed_bytes: u64,
}

/// Runs the generation pipeline for one release
///
/// Construction performs the environment checks (configuration, simplifier
/// binary, HTTP client), so a `Generator` that exists is ready to touch the
/// network.
pub struct Generator {
    config: Config,
    fetcher: Fetcher,
    simplifier: Arc<dyn Simplifier>,
}

impl Generator {
    /// Create a generator using `mapshaper` resolved from the configuration or PATH
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let simplifier = MapshaperSimplifier::locate(&config.tools)?;
        Self::with_simplifier(config, Arc::new(simplifier))
    }

    /// Create a generator with a caller-provided simplifier
    pub fn with_simplifier(config: Config, simplifier: Arc<dyn Simplifier>) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            simplifier,
        })
    }

    /// Configuration this generator runs with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the whole pipeline
    ///
    /// The workspace is created before any network activity and released on
    /// every exit path; see [`WorkspaceConfig`](crate::config::WorkspaceConfig)
    /// for the failure policy.
    pub async fn run(
        &self,
        sink: Box<dyn ProgressSink>,
        cancel_token: &CancellationToken,
    ) -> Result<GenerationReport> {
        let url = self.config.download_url()?;
        let workspace = Workspace::create(&self.config.workspace)?;

        match self.run_in(&workspace, &url, sink, cancel_token).await {
            Ok(report) => {
                workspace.close();
                Ok(report)
            }
            Err(e) => {
                debug!(stage = %e.stage(), "generation failed, releasing workspace");
                workspace.release_after_failure();
                Err(e)
            }
        }
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        url: &url::Url,
        sink: Box<dyn ProgressSink>,
        cancel_token: &CancellationToken,
    ) -> Result<GenerationReport> {
        let release = self.config.download.release.clone();
        info!(stage = %Stage::Download, %release, "fetching timezone boundaries");
        let archive = self.fetcher.fetch(url, sink, cancel_token).await?;
        let downloaded_bytes = archive.len() as u64;

        info!(stage = %Stage::Extract, "validating release archive");
        let dest_dir = workspace.path().to_path_buf();
        let combined =
            spawn_blocking(move || ArchiveExtractor::extract_combined(&archive, &dest_dir))
                .await
                .map_err(Error::task(Stage::Extract))??;

        info!(stage = %Stage::Simplify, simplifier = self.simplifier.name(), ?combined, "simplifying");
        self.simplifier
            .simplify(
                workspace.path(),
                Path::new(EXTRACTED_FILE_NAME),
                Path::new(REDUCED_FILE_NAME),
                cancel_token,
            )
            .await?;

        info!(stage = %Stage::Encode, "generating source");
        let reduced = workspace.join(REDUCED_FILE_NAME);
        let simplified_bytes = std::fs::metadata(&reduced)
            .map_err(|source| Error::Compress {
                path: reduced.clone(),
                source,
            })?
            .len();
        let output = self.config.output.clone();
        let source = spawn_blocking(move || encode_file(&reduced, &output))
            .await
            .map_err(Error::task(Stage::Encode))??;

        let output_path = self.config.output.path();
        info!(stage = %Stage::Write, ?output_path, "writing generated file");
        let rendered = source.render();
        let target = output_path.clone();
        spawn_blocking(move || write_atomically(&target, rendered.as_bytes()))
            .await
            .map_err(Error::task(Stage::Write))??;

        Ok(GenerationReport {
            release,
            output_path,
            downloaded_bytes,
            simplified_bytes,
            compressed_bytes: source.compressed_len as u64,
        })
    }
}

/// Write `content` next to `path` and rename it into place
///
/// Readers of `path` never see a half-written file. A file that already
/// exists keeps its permissions; a new one gets the same mode a plain create
/// would (0o666 filtered by the umask).
fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".tzshapefilegen-");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut file = builder.tempfile_in(dir)?;
    if let Ok(existing) = std::fs::metadata(path) {
        file.as_file().set_permissions(existing.permissions())?;
    }

    file.write_all(content)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
