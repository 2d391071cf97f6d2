use std::path::Path;
use tracing::{debug, info};

use super::dispatcher::{dispatch, DispatchOptions};
use super::matcher::QueryMatcher;
use super::processor::FileProcessor;
use super::stream::SearchStream;
use super::walker::list_regular_files;
use crate::config::SearchConfig;

/// Searches every regular file under `root` for `query`.
///
/// Returns immediately; files are enumerated and scanned in the background
/// while the stream is consumed. An empty query or a missing root yields an
/// empty stream.
pub fn search(query: &str, root: impl AsRef<Path>) -> SearchStream {
    search_with_config(&SearchConfig::new(query, root.as_ref()))
}

/// Like [`search`], with worker count, channel capacity and encoding mode
/// taken from `config`
pub fn search_with_config(config: &SearchConfig) -> SearchStream {
    let matcher = match QueryMatcher::new(config.query.as_str()) {
        Ok(matcher) => matcher,
        Err(_) => {
            debug!("No search query provided, returning empty stream");
            return SearchStream::empty();
        }
    };

    info!(
        "Starting search for {:?} in {}",
        config.query,
        config.root_path.display()
    );

    let processor = FileProcessor::new(matcher, config.encoding_mode);
    let root = config.root_path.clone();
    dispatch(
        move || list_regular_files(&root),
        processor,
        DispatchOptions::from(config),
    )
}
