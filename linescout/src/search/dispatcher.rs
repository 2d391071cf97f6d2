use crossbeam::channel::{self, Receiver, Sender};
use rayon::ThreadPoolBuilder;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{debug, error, warn};

use super::processor::FileProcessor;
use super::stream::{Canceller, SearchStream};
use crate::config::SearchConfig;
use crate::metrics::ScanMetrics;
use crate::results::Occurrence;

/// Sizing for one dispatch
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Maximum number of files scanned at once
    pub workers: NonZeroUsize,
    /// Completed file batches buffered before workers block
    pub channel_capacity: NonZeroUsize,
}

impl From<&SearchConfig> for DispatchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            workers: config.thread_count,
            channel_capacity: config.channel_capacity,
        }
    }
}

/// Scans files on a bounded worker pool and merges the results into one stream.
///
/// `enumerate` runs on a feeder thread and its paths go through a shared
/// bounded work queue, so enumeration proceeds only as fast as workers take
/// files. Each worker scans one file at a time and sends the whole occurrence
/// list as a single batch; a full output channel blocks the worker until the
/// consumer catches up.
///
/// A file that cannot be scanned is skipped with a warning and counted in the
/// stream's stats. It does not affect other files.
pub fn dispatch<F, I>(enumerate: F, processor: FileProcessor, options: DispatchOptions) -> SearchStream
where
    F: FnOnce() -> I + Send + 'static,
    I: IntoIterator<Item = PathBuf>,
{
    let workers = options.workers.get();
    let metrics = processor.metrics().clone();
    let canceller = Canceller::new();

    // One extra thread for the feeder so it never takes a scan slot
    let pool = match ThreadPoolBuilder::new()
        .num_threads(workers + 1)
        .thread_name(|i| format!("linescout-{}", i))
        .panic_handler(|_| error!("Search worker panicked"))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to build search worker pool: {}", e);
            return SearchStream::empty();
        }
    };

    let (work_tx, work_rx) = channel::bounded::<PathBuf>(workers);
    let (batch_tx, batch_rx) = channel::bounded::<Vec<Occurrence>>(options.channel_capacity.get());

    debug!(
        "Dispatching with {} workers, output capacity {}",
        workers, options.channel_capacity
    );

    for id in 0..workers {
        let work_rx = work_rx.clone();
        let batch_tx = batch_tx.clone();
        let processor = processor.clone();
        let canceller = canceller.clone();
        pool.spawn(move || run_worker(id, work_rx, batch_tx, processor, canceller));
    }
    // Workers own the remaining ends; the stream sees disconnection once all exit
    drop(work_rx);
    drop(batch_tx);

    let feeder_canceller = canceller.clone();
    let feeder_metrics = metrics.clone();
    pool.spawn(move || feed(enumerate(), work_tx, feeder_canceller, feeder_metrics));

    SearchStream::new(batch_rx, canceller, metrics)
}

fn feed<I>(files: I, work_tx: Sender<PathBuf>, canceller: Canceller, metrics: ScanMetrics)
where
    I: IntoIterator<Item = PathBuf>,
{
    for path in files {
        if canceller.is_cancelled() {
            debug!("Search cancelled, stopping enumeration");
            break;
        }
        if work_tx.send(path).is_err() {
            // Every worker has exited
            break;
        }
        metrics.record_enumerated();
    }
    debug!(
        "Enumeration finished after {} files",
        metrics.get_stats().files_enumerated
    );
}

fn run_worker(
    id: usize,
    work_rx: Receiver<PathBuf>,
    batch_tx: Sender<Vec<Occurrence>>,
    processor: FileProcessor,
    canceller: Canceller,
) {
    for path in work_rx.iter() {
        if canceller.is_cancelled() {
            break;
        }

        let batch = match processor.scan_file(&path) {
            Ok(batch) => batch,
            Err(e) => {
                processor.metrics().record_failed();
                warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        processor.metrics().record_scanned(batch.len());

        if batch.is_empty() {
            continue;
        }
        if batch_tx.send(batch).is_err() {
            debug!("Worker {} stopping, stream was dropped", id);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EncodingMode;
    use crate::search::matcher::QueryMatcher;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tempfile::tempdir;

    fn options(workers: usize, capacity: usize) -> DispatchOptions {
        DispatchOptions {
            workers: NonZeroUsize::new(workers).unwrap(),
            channel_capacity: NonZeroUsize::new(capacity).unwrap(),
        }
    }

    fn processor(query: &str) -> FileProcessor {
        FileProcessor::new(QueryMatcher::new(query).unwrap(), EncodingMode::FailFast)
    }

    #[test]
    fn test_every_file_scanned_once() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..50)
            .map(|i| {
                let path = dir.path().join(format!("f{}.txt", i));
                fs::write(&path, "one needle here").unwrap();
                path
            })
            .collect();

        let stream = dispatch(move || files, processor("needle"), options(3, 2));
        let occurrences: Vec<Occurrence> = stream.collect();
        assert_eq!(occurrences.len(), 50);

        let distinct: HashSet<&PathBuf> = occurrences.iter().map(|o| &o.file).collect();
        assert_eq!(distinct.len(), 50);
    }

    #[test]
    fn test_file_runs_are_contiguous() {
        let dir = tempdir().unwrap();
        let content = "xx xx\nxx\nxx xx xx\n";
        let files: Vec<PathBuf> = (0..20)
            .map(|i| {
                let path = dir.path().join(format!("f{}.txt", i));
                fs::write(&path, content).unwrap();
                path
            })
            .collect();

        let stream = dispatch(move || files, processor("xx"), options(4, 1));
        let occurrences: Vec<Occurrence> = stream.collect();
        assert_eq!(occurrences.len(), 20 * 6);

        // Each file appears as one unbroken run in line/offset order
        let mut seen = HashSet::new();
        let mut runs: HashMap<PathBuf, Vec<(usize, usize)>> = HashMap::new();
        let mut previous: Option<&PathBuf> = None;
        for occ in &occurrences {
            if previous != Some(&occ.file) {
                assert!(seen.insert(occ.file.clone()), "file run was interleaved");
            }
            runs.entry(occ.file.clone())
                .or_default()
                .push((occ.line, occ.offset));
            previous = Some(&occ.file);
        }
        for positions in runs.values() {
            assert_eq!(
                positions,
                &vec![(1, 0), (1, 3), (2, 0), (3, 0), (3, 3), (3, 6)]
            );
        }
    }

    #[test]
    fn test_failed_file_does_not_stop_others() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.bin");
        let missing = dir.path().join("vanished.txt");
        fs::write(&good, "match").unwrap();
        fs::write(&bad, [0xff, 0xfe, b'm']).unwrap();

        let files = vec![bad, missing, good.clone()];
        let mut stream = dispatch(move || files, processor("match"), options(2, 4));
        let occurrences: Vec<Occurrence> = stream.by_ref().collect();

        assert_eq!(occurrences, vec![Occurrence::new(good, 1, 0)]);
        let stats = stream.stats();
        assert_eq!(stats.files_failed, 2);
        assert_eq!(stats.files_scanned, 1);
    }

    #[test]
    fn test_files_without_matches_send_nothing() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                let path = dir.path().join(format!("f{}.txt", i));
                fs::write(&path, "nothing to see").unwrap();
                path
            })
            .collect();

        let mut stream = dispatch(move || files, processor("needle"), options(2, 1));
        assert!(stream.next_batch().is_none());
        assert_eq!(stream.stats().files_scanned, 5);
        assert_eq!(stream.stats().files_with_matches, 0);
    }

    fn write_files(dir: &std::path::Path, count: usize, content: &str) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("f{}.txt", i));
                fs::write(&path, content).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_slow_consumer_bounds_scanning() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 500, "hit\n");
        let (workers, capacity) = (2, 3);

        let processor = processor("hit");
        let metrics = processor.metrics().clone();
        let mut stream = dispatch(move || files, processor, options(workers, capacity));
        assert!(stream.next().is_some());
        thread::sleep(Duration::from_millis(200));

        // One file taken by the consumer, `capacity` queued, one blocked per worker
        let stats = metrics.get_stats();
        assert!(
            stats.files_scanned as usize <= workers + capacity + 1,
            "scanned {} files with a stalled consumer",
            stats.files_scanned
        );
        // The feeder is held back by the full work queue as well
        assert!(stats.files_enumerated as usize <= 2 * workers + capacity + 1);
    }

    #[test]
    fn test_dropping_stream_stops_dispatch() {
        let dir = tempdir().unwrap();
        let files = write_files(dir.path(), 200, "hit\nhit\n");

        let processor = processor("hit");
        let metrics = processor.metrics().clone();
        let mut stream = dispatch(move || files, processor, options(2, 1));
        let first = stream.next_batch().unwrap();
        assert_eq!(first.len(), 2);

        let canceller = stream.canceller();
        drop(stream);
        assert!(canceller.is_cancelled());

        // Let blocked workers observe the dropped receiver, then check that
        // nothing further gets scanned
        thread::sleep(Duration::from_millis(100));
        let settled = metrics.get_stats().files_scanned;
        thread::sleep(Duration::from_millis(100));
        assert_eq!(metrics.get_stats().files_scanned, settled);
        assert!(settled < 200);
    }

    #[test]
    fn test_cancel_stops_new_files() {
        let dir = tempdir().unwrap();
        let files: Vec<PathBuf> = (0..200)
            .map(|i| {
                let path = dir.path().join(format!("f{}.txt", i));
                fs::write(&path, "hit").unwrap();
                path
            })
            .collect();

        let mut stream = dispatch(move || files, processor("hit"), options(2, 1));
        assert!(stream.next().is_some());
        stream.cancel();

        // Whatever was in flight drains, then the stream ends
        let rest = stream.by_ref().count();
        assert!(rest < 199);
        assert!(stream.stats().files_scanned < 200);
    }
}
