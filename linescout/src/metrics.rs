use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::search::processor::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Tracks scan progress across all workers of one search
#[derive(Debug, Clone, Default)]
pub struct ScanMetrics {
    inner: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    files_enumerated: AtomicU64,
    files_scanned: AtomicU64,
    files_failed: AtomicU64,
    files_with_matches: AtomicU64,
    occurrences: AtomicU64,

    // Read strategy per file
    small_files: AtomicU64,
    buffered_files: AtomicU64,
    mmap_files: AtomicU64,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a file handed to the worker pool
    pub fn record_enumerated(&self) {
        self.inner.files_enumerated.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful scan that produced `occurrences` matches
    pub fn record_scanned(&self, occurrences: usize) {
        self.inner.files_scanned.fetch_add(1, Ordering::Relaxed);
        if occurrences > 0 {
            self.inner.files_with_matches.fetch_add(1, Ordering::Relaxed);
            self.inner
                .occurrences
                .fetch_add(occurrences as u64, Ordering::Relaxed);
        }
    }

    /// Records a file whose scan failed and was skipped
    pub fn record_failed(&self) {
        self.inner.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records file processing type
    pub fn record_file_processing(&self, size: u64) {
        if size < SMALL_FILE_THRESHOLD {
            self.inner.small_files.fetch_add(1, Ordering::Relaxed);
        } else if size >= LARGE_FILE_THRESHOLD {
            self.inner.mmap_files.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.buffered_files.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Gets a snapshot of the counters
    pub fn get_stats(&self) -> ScanStats {
        let c = &self.inner;
        ScanStats {
            files_enumerated: c.files_enumerated.load(Ordering::Relaxed),
            files_scanned: c.files_scanned.load(Ordering::Relaxed),
            files_failed: c.files_failed.load(Ordering::Relaxed),
            files_with_matches: c.files_with_matches.load(Ordering::Relaxed),
            occurrences: c.occurrences.load(Ordering::Relaxed),
            small_files: c.small_files.load(Ordering::Relaxed),
            buffered_files: c.buffered_files.load(Ordering::Relaxed),
            mmap_files: c.mmap_files.load(Ordering::Relaxed),
        }
    }

    /// Logs current scan statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Files enumerated: {}\n\
             Files scanned/failed: {}/{}\n\
             Files with matches: {}\n\
             Occurrences: {}\n\
             Files processed (small/buffered/mmap): {}/{}/{}",
            stats.files_enumerated,
            stats.files_scanned,
            stats.files_failed,
            stats.files_with_matches,
            stats.occurrences,
            stats.small_files,
            stats.buffered_files,
            stats.mmap_files
        );
    }
}

/// Point-in-time scan statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub files_enumerated: u64,
    pub files_scanned: u64,
    pub files_failed: u64,
    pub files_with_matches: u64,
    pub occurrences: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}
