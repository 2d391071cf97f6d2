use crossbeam::channel::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::metrics::{ScanMetrics, ScanStats};
use crate::results::Occurrence;

/// Stops a running search from scheduling more files.
///
/// Files already being scanned finish normally. Cloning shares the flag, so a
/// canceller can be handed to a deadline thread while the stream is drained
/// elsewhere.
#[derive(Debug, Clone, Default)]
pub struct Canceller {
    flag: Arc<AtomicBool>,
}

impl Canceller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A lazy stream of occurrences produced by a running search.
///
/// Each file's occurrences arrive as one contiguous run, in line then offset
/// order. Runs from different files arrive in completion order. Pulling blocks
/// until the next completed file is available; dropping the stream cancels the
/// search.
#[derive(Debug)]
pub struct SearchStream {
    receiver: Option<Receiver<Vec<Occurrence>>>,
    current: std::vec::IntoIter<Occurrence>,
    canceller: Canceller,
    metrics: ScanMetrics,
}

impl SearchStream {
    pub(crate) fn new(
        receiver: Receiver<Vec<Occurrence>>,
        canceller: Canceller,
        metrics: ScanMetrics,
    ) -> Self {
        Self {
            receiver: Some(receiver),
            current: Vec::new().into_iter(),
            canceller,
            metrics,
        }
    }

    /// A stream that yields nothing and never touched the filesystem
    pub fn empty() -> Self {
        Self {
            receiver: None,
            current: Vec::new().into_iter(),
            canceller: Canceller::new(),
            metrics: ScanMetrics::new(),
        }
    }

    /// Returns a handle that cancels this search from another thread
    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Stops dispatching new files; already queued results can still be read
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Snapshot of the scan counters so far
    pub fn stats(&self) -> ScanStats {
        self.metrics.get_stats()
    }

    /// Returns the rest of the current file's occurrences, or the next
    /// completed file's occurrences as a whole.
    pub fn next_batch(&mut self) -> Option<Vec<Occurrence>> {
        let rest: Vec<Occurrence> = self.current.by_ref().collect();
        if !rest.is_empty() {
            return Some(rest);
        }
        self.recv_batch()
    }

    fn recv_batch(&mut self) -> Option<Vec<Occurrence>> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(batch) => Some(batch),
            Err(_) => {
                // All workers have exited and the channel is drained
                self.receiver = None;
                self.metrics.log_stats();
                None
            }
        }
    }
}

impl Iterator for SearchStream {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        loop {
            if let Some(occurrence) = self.current.next() {
                return Some(occurrence);
            }
            let batch = self.recv_batch()?;
            self.current = batch.into_iter();
        }
    }
}

impl Drop for SearchStream {
    fn drop(&mut self) {
        if self.receiver.is_some() {
            debug!("Search stream dropped before exhaustion, cancelling");
            self.canceller.cancel();
        }
    }
}
