pub mod config;
pub mod errors;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::{CliOverrides, EncodingMode, SearchConfig};
pub use errors::{SearchError, SearchResult};
pub use metrics::ScanStats;
pub use results::Occurrence;
pub use search::{search, search_with_config, Canceller, SearchStream};
