//! Archives, a mock release server and a fake simplifier

use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tzshapefilegen::{Config, Error, Simplifier, Stage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;

pub const RELEASE: &str = "2018g";
pub const ARCHIVE_PATH: &str = "/2018g/timezones.geojson.zip";

pub const COMBINED_GEOJSON: &[u8] =
    br#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"tzid":"Europe/Berlin"},"geometry":null}]}"#;

/// Build an in-memory zip with `entries` in order
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A well-formed release archive
pub fn release_zip() -> Vec<u8> {
    build_zip(&[
        ("dist/combined.json", COMBINED_GEOJSON),
        ("dist/README.md", b"timezone boundaries"),
    ])
}

/// Start a mock server serving `body` at [`ARCHIVE_PATH`]
pub async fn release_server(body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ARCHIVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(&server)
        .await;
    server
}

/// Configuration pointing at `server`, writing into `output_dir`
pub fn test_config(server: &MockServer, output_dir: &Path, workspace_parent: &Path) -> Config {
    let mut config = Config::default();
    config.download.base_url = server.uri();
    config.download.release = RELEASE.to_string();
    config.progress.tick_interval = Duration::from_millis(10);
    config.output.dir = output_dir.to_path_buf();
    config.workspace.parent_dir = Some(workspace_parent.to_path_buf());
    config
}

/// Simplifier that keeps every other byte of its input and counts invocations
#[derive(Default)]
pub struct FakeSimplifier {
    pub calls: AtomicUsize,
}

impl FakeSimplifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reduce(input: &[u8]) -> Vec<u8> {
        input.iter().step_by(2).copied().collect()
    }
}

#[async_trait]
impl Simplifier for FakeSimplifier {
    async fn simplify(
        &self,
        workdir: &Path,
        input: &Path,
        output: &Path,
        cancel_token: &CancellationToken,
    ) -> tzshapefilegen::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if cancel_token.is_cancelled() {
            return Err(Error::Cancelled(Stage::Simplify));
        }
        let data = tokio::fs::read(workdir.join(input)).await?;
        tokio::fs::write(workdir.join(output), Self::reduce(&data)).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Decode the byte literal of a generated Go file back into the original payload
pub fn decode_generated(source: &str) -> Vec<u8> {
    let start = source.find("[]byte(\"").expect("literal start") + "[]byte(\"".len();
    let end = source[start..].find("\")").expect("literal end") + start;
    let literal = &source[start..end];

    let compressed: Vec<u8> = literal
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            assert_eq!(&chunk[..2], b"\\x");
            u8::from_str_radix(std::str::from_utf8(&chunk[2..]).unwrap(), 16).unwrap()
        })
        .collect();

    let mut out = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut out)
        .unwrap();
    out
}

/// Number of entries directly under `dir`
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
