//! Release archive validation and extraction

use crate::error::{Error, FormatError, Result};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name the combined GeoJSON must have as the archive's first entry
pub const EXPECTED_ENTRY: &str = "dist/combined.json";

/// File name the extracted entry is written under inside the workspace
pub const EXTRACTED_FILE_NAME: &str = "combined.json";

/// Extracts the combined GeoJSON from a timezone-boundary-builder release zip
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Open an in-memory zip and check that its first entry is [`EXPECTED_ENTRY`]
    ///
    /// Nothing is written to disk; use this to reject a bad download before
    /// any other work happens.
    pub fn validate(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| FormatError::InvalidArchive(e.to_string()))?;

        if archive.is_empty() {
            return Err(FormatError::EmptyArchive.into());
        }

        let name = archive
            .by_index(0)
            .map_err(|e| FormatError::InvalidArchive(format!("failed to read first entry: {e}")))?
            .name()
            .to_string();
        if name != EXPECTED_ENTRY {
            return Err(FormatError::UnexpectedEntry {
                expected: EXPECTED_ENTRY,
                found: name,
            }
            .into());
        }

        debug!(entries = archive.len(), "release archive layout ok");
        Ok(archive)
    }

    /// Validate `bytes` and write the first entry to `dest_dir`/[`EXTRACTED_FILE_NAME`]
    pub fn extract_combined(bytes: &[u8], dest_dir: &Path) -> Result<PathBuf> {
        let mut archive = Self::validate(bytes)?;
        let dest_path = dest_dir.join(EXTRACTED_FILE_NAME);

        let mut entry = archive
            .by_index(0)
            .map_err(|e| FormatError::InvalidArchive(format!("failed to read first entry: {e}")))?;

        let mut outfile = std::fs::File::create(&dest_path).map_err(|source| Error::Extract {
            path: dest_path.clone(),
            source,
        })?;

        // Decompression and CRC failures surface as I/O errors from the entry reader
        let written = std::io::copy(&mut entry, &mut outfile).map_err(|source| Error::Extract {
            path: dest_path.clone(),
            source,
        })?;

        info!(
            entry = EXPECTED_ENTRY,
            ?dest_path,
            bytes = written,
            "extracted combined GeoJSON"
        );
        Ok(dest_path)
    }
}
