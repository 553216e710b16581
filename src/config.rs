//! Configuration types for tzshapefilegen

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Dataset download settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base URL releases are published under (default: timezone-boundary-builder on GitHub)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Release tag to download (default: "2018g")
    #[serde(default = "default_release")]
    pub release: String,

    /// User-Agent header sent with the request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            release: default_release(),
            user_agent: default_user_agent(),
        }
    }
}

/// External simplifier settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to mapshaper executable (auto-detected if None)
    #[serde(default)]
    pub mapshaper_path: Option<PathBuf>,

    /// Whether to search PATH for mapshaper if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Simplification method passed to `-simplify` (default: "visvalingam")
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// Percentage of removable vertices to retain (default: 20)
    #[serde(default = "default_percentage")]
    pub percentage: u8,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mapshaper_path: None,
            search_path: true,
            algorithm: default_algorithm(),
            percentage: default_percentage(),
        }
    }
}

/// Download progress display settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Render progress while downloading (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Interval between progress samples, in milliseconds (default: 1000)
    #[serde(default = "default_tick_interval", with = "duration_millis_serde")]
    pub tick_interval: Duration,

    /// Capacity of the sample channel between ticker and display (default: 16)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval: default_tick_interval(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Generated source settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory the generated file is written to (default: ".")
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Generated file name (default: "tzshapefile.go")
    #[serde(default = "default_file_name")]
    pub file_name: String,

    /// Package clause of the generated file (default: "gotz")
    #[serde(default = "default_package")]
    pub package: String,

    /// Variable holding the literal (default: "tzShapeFile")
    #[serde(default = "default_var_name")]
    pub var_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_name: default_file_name(),
            package: default_package(),
            var_name: default_var_name(),
        }
    }
}

impl OutputConfig {
    /// Full path of the generated file
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Temporary working directory settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Parent directory for the workspace (system temp dir if None)
    #[serde(default)]
    pub parent_dir: Option<PathBuf>,

    /// Keep the workspace on disk when a run fails, for diagnosis (default: false)
    #[serde(default)]
    pub keep_on_failure: bool,
}

/// Main configuration for a generator run
///
/// Fields are organized into sub-configs:
/// - [`download`](DownloadConfig): where the dataset comes from
/// - [`tools`](ToolsConfig): the external simplifier
/// - [`progress`](ProgressConfig): download progress display
/// - [`output`](OutputConfig): the generated file
/// - [`workspace`](WorkspaceConfig): the scratch directory
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Dataset download settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// External simplifier settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Progress display settings
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Generated source settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Scratch directory settings
    #[serde(default)]
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(
                "config_file",
                format!("could not read {}: {}", path.display(), e),
            )
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check values that would otherwise fail late in the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.download.release.trim().is_empty() {
            return Err(Error::config("release", "release must not be empty"));
        }
        if self.download.release.contains('/') {
            return Err(Error::config(
                "release",
                format!("release {:?} must not contain '/'", self.download.release),
            ));
        }
        url::Url::parse(&self.download.base_url).map_err(|e| {
            Error::config(
                "base_url",
                format!("invalid base URL {:?}: {}", self.download.base_url, e),
            )
        })?;
        if self.tools.percentage == 0 || self.tools.percentage > 100 {
            return Err(Error::config(
                "percentage",
                format!(
                    "percentage must be within 1..=100, got {}",
                    self.tools.percentage
                ),
            ));
        }
        if self.tools.mapshaper_path.is_none() && !self.tools.search_path {
            return Err(Error::config(
                "mapshaper_path",
                "mapshaper_path is unset and PATH search is disabled",
            ));
        }
        if self.progress.tick_interval.is_zero() {
            return Err(Error::config(
                "tick_interval",
                "tick interval must be greater than zero",
            ));
        }
        if self.progress.channel_capacity == 0 {
            return Err(Error::config(
                "channel_capacity",
                "channel capacity must be greater than zero",
            ));
        }
        if self.output.var_name.is_empty() || self.output.package.is_empty() {
            return Err(Error::config(
                "output",
                "package and var_name must not be empty",
            ));
        }
        Ok(())
    }

    /// URL of the release archive: `<base_url>/<release>/timezones.geojson.zip`
    pub fn download_url(&self) -> Result<url::Url> {
        let base = self.download.base_url.trim_end_matches('/');
        let raw = format!(
            "{}/{}/{}",
            base, self.download.release, RELEASE_ARCHIVE_NAME
        );
        url::Url::parse(&raw)
            .map_err(|e| Error::config("base_url", format!("invalid download URL {raw:?}: {e}")))
    }
}

/// File name every release publishes its archive under
pub const RELEASE_ARCHIVE_NAME: &str = "timezones.geojson.zip";

fn default_base_url() -> String {
    "https://github.com/evansiroky/timezone-boundary-builder/releases/download".to_string()
}

fn default_release() -> String {
    "2018g".to_string()
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_true() -> bool {
    true
}

fn default_algorithm() -> String {
    "visvalingam".to_string()
}

fn default_percentage() -> u8 {
    20
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_channel_capacity() -> usize {
    16
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_file_name() -> String {
    "tzshapefile.go".to_string()
}

fn default_package() -> String {
    "gotz".to_string()
}

fn default_var_name() -> String {
    "tzShapeFile".to_string()
}

// Duration serialization helper (milliseconds)
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
