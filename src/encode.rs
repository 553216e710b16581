//! Compression and rendering of the generated source file
//!
//! The simplified GeoJSON is gzip-compressed at the best compression level and
//! every compressed byte is written as a `\xHH` escape inside a Go string
//! literal. `flate2` writes a zero mtime in the gzip header, so identical input
//! always renders to identical output.

use crate::config::OutputConfig;
use crate::error::{Error, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Name written into the do-not-edit header
pub const GENERATOR_NAME: &str = "tzshapefilegen";

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Gzip everything `reader` yields at [`Compression::best`]
///
/// The encoder is finished before its buffer is returned; skipping that loses
/// the trailing deflate block and the gzip footer.
pub fn compress<R: Read>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()
}

/// Render each byte as `\xHH` (uppercase, zero-padded), without separators
pub fn escape_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for &b in bytes {
        out.push_str("\\x");
        out.push(HEX_DIGITS[usize::from(b >> 4)] as char);
        out.push(HEX_DIGITS[usize::from(b & 0x0F)] as char);
    }
    out
}

/// Generated Go source embedding the compressed shape file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    /// Package clause
    pub package: String,
    /// Variable the literal is assigned to
    pub var_name: String,
    /// Escaped-hex literal, without quotes
    pub literal: String,
    /// Length of the compressed payload in bytes
    pub compressed_len: usize,
}

impl GeneratedSource {
    /// Compress `data` and wrap it for `output`
    pub fn from_bytes(data: &[u8], output: &OutputConfig) -> io::Result<Self> {
        let compressed = compress(data)?;
        Ok(Self::from_compressed(&compressed, output))
    }

    /// Wrap already-compressed bytes
    pub fn from_compressed(compressed: &[u8], output: &OutputConfig) -> Self {
        Self {
            package: output.package.clone(),
            var_name: output.var_name.clone(),
            literal: escape_hex(compressed),
            compressed_len: compressed.len(),
        }
    }

    /// Full text of the generated file
    pub fn render(&self) -> String {
        format!(
            "// generated by {GENERATOR_NAME}; DO NOT EDIT\npackage {}\n\nvar {} = []byte(\"{}\")\n",
            self.package, self.var_name, self.literal
        )
    }
}

impl std::fmt::Display for GeneratedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Compress the file at `path` and build the generated source for it
pub fn encode_file(path: &Path, output: &OutputConfig) -> Result<GeneratedSource> {
    let compress_error = |source: io::Error| Error::Compress {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(compress_error)?;
    let compressed = compress(BufReader::new(file)).map_err(compress_error)?;

    tracing::info!(
        ?path,
        compressed_bytes = compressed.len(),
        "compressed simplified shapes"
    );
    Ok(GeneratedSource::from_compressed(&compressed, output))
}
