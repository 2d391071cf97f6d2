use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::QueryMatcher;
use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::ScanMetrics;
use crate::results::Occurrence;

// Constants for file processing
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Decodes file bytes according to the encoding mode
fn decode_bytes<'a>(
    bytes: &'a [u8],
    path: &Path,
    encoding_mode: EncodingMode,
) -> SearchResult<Cow<'a, str>> {
    match encoding_mode {
        EncodingMode::FailFast => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| SearchError::encoding_error(path, e)),
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            // Owned means at least one invalid sequence was replaced
            if let Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in file: {}", path.display());
            }
            Ok(cow)
        }
    }
}

/// Splits text into lines on `\n`, `\r\n` or a lone `\r`, dropping the
/// terminators. A trailing terminator does not start an extra empty line.
fn split_lines(contents: &str) -> impl Iterator<Item = &str> {
    let mut rest = contents;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(end) => {
                let line = &rest[..end];
                let terminator = if rest[end..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[end + terminator..];
                Some(line)
            }
            None => Some(std::mem::take(&mut rest)),
        }
    })
}

/// Scans single files for occurrences of a query
#[derive(Debug, Clone)]
pub struct FileProcessor {
    matcher: QueryMatcher,
    encoding_mode: EncodingMode,
    metrics: ScanMetrics,
}

impl FileProcessor {
    /// Creates a new FileProcessor with the given matcher
    pub fn new(matcher: QueryMatcher, encoding_mode: EncodingMode) -> Self {
        Self::with_metrics(matcher, encoding_mode, ScanMetrics::new())
    }

    /// Creates a new FileProcessor that reports into `metrics`
    pub fn with_metrics(
        matcher: QueryMatcher,
        encoding_mode: EncodingMode,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            matcher,
            encoding_mode,
            metrics,
        }
    }

    /// Gets the scan metrics this processor reports into
    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }

    pub fn matcher(&self) -> &QueryMatcher {
        &self.matcher
    }

    /// Scans decoded contents line by line.
    ///
    /// Results are ordered by line, then by offset within the line.
    pub fn scan_contents(&self, path: &Path, contents: &str) -> Vec<Occurrence> {
        split_lines(contents)
            .enumerate()
            .flat_map(|(index, line)| {
                self.matcher
                    .find_in_line(line)
                    .into_iter()
                    .map(move |offset| Occurrence::new(path, index + 1, offset))
            })
            .collect()
    }

    /// Read a small file in one call
    fn scan_small_file(&self, path: &Path) -> SearchResult<Vec<Occurrence>> {
        trace!("Using simple file processing for: {}", path.display());
        let bytes = std::fs::read(path).map_err(|e| SearchError::from_io(path, e))?;
        let contents = decode_bytes(&bytes, path, self.encoding_mode)?;
        Ok(self.scan_contents(path, &contents))
    }

    /// Read a file through a buffered reader
    fn scan_file_buffered(&self, path: &Path) -> SearchResult<Vec<Occurrence>> {
        trace!("Using buffered file processing for: {}", path.display());
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;

        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| SearchError::from_io(path, e))?;

        let contents = decode_bytes(&bytes, path, self.encoding_mode)?;
        Ok(self.scan_contents(path, &contents))
    }

    /// Read a file through a memory map
    fn scan_mmap_file(&self, path: &Path) -> SearchResult<Vec<Occurrence>> {
        trace!("Using memory-mapped file processing for: {}", path.display());
        let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;

        // The map is read-only and dropped before this function returns
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SearchError::from_io(path, e))?;

        let contents = decode_bytes(&mmap, path, self.encoding_mode)?;
        Ok(self.scan_contents(path, &contents))
    }

    /// Scans one file and returns its occurrences in line, then offset, order
    pub fn scan_file(&self, path: &Path) -> SearchResult<Vec<Occurrence>> {
        trace!("Processing file: {}", path.display());

        // Choose processing strategy based on file size
        match path.metadata() {
            Ok(metadata) => {
                let size = metadata.len();
                self.metrics.record_file_processing(size);

                if size < SMALL_FILE_THRESHOLD {
                    self.scan_small_file(path)
                } else if size >= LARGE_FILE_THRESHOLD {
                    self.scan_mmap_file(path)
                } else {
                    self.scan_file_buffered(path)
                }
            }
            Err(e) => {
                warn!("Failed to get metadata for {}: {}", path.display(), e);
                self.scan_file_buffered(path)
            }
        }
    }
}
