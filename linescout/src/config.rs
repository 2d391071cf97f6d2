use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::SearchResult;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// How file contents that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Invalid UTF-8 fails the scan of that file; the file is skipped
    #[default]
    FailFast,
    /// Invalid sequences are replaced with U+FFFD and the file is scanned
    Lossy,
}

impl std::str::FromStr for EncodingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "failfast" | "fail-fast" => Ok(Self::FailFast),
            "lossy" => Ok(Self::Lossy),
            other => Err(format!("unknown encoding mode '{}'", other)),
        }
    }
}

/// Configuration for a search.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later entries
/// overriding earlier ones:
/// 1. Global `$HOME/.config/linescout/config.yaml`
/// 2. Local `.linescout.yaml` in the current directory
/// 3. Custom config file passed to [`SearchConfig::load_from`]
///
/// # Configuration Format
///
/// ```yaml
/// # Literal text to look for
/// query: "TODO"
///
/// # Root directory to search in
/// root_path: "."
///
/// # Number of concurrent scan workers (default: CPU cores)
/// thread_count: 4
///
/// # Completed file batches buffered before workers block
/// channel_capacity: 64
///
/// # failfast | lossy
/// encoding_mode: "failfast"
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
///
/// When using the CLI, command-line arguments take precedence over config
/// file values, see [`SearchConfig::merge_with_cli`] and [`CliOverrides`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// The literal text to search for
    #[serde(default)]
    pub query: String,

    /// Root directory to start search from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    /// Number of files scanned concurrently
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Capacity of the output channel, counted in per-file batches
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: NonZeroUsize,

    /// Handling of invalid UTF-8 in scanned files
    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_channel_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CHANNEL_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            root_path: default_root_path(),
            thread_count: default_thread_count(),
            channel_capacity: default_channel_capacity(),
            encoding_mode: EncodingMode::default(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Creates a configuration for `query` under `root` with default settings
    pub fn new(query: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            query: query.into(),
            root_path: root.into(),
            ..Self::default()
        }
    }

    /// Sets the number of concurrent scan workers
    pub fn with_thread_count(mut self, thread_count: NonZeroUsize) -> Self {
        self.thread_count = thread_count;
        self
    }

    /// Sets the output channel capacity
    pub fn with_channel_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_encoding_mode(mut self, mode: EncodingMode) -> Self {
        self.encoding_mode = mode;
        self
    }

    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("linescout/config.yaml")),
            Some(PathBuf::from(".linescout.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Applies command-line values on top of configuration file values.
    ///
    /// Only fields the user actually passed are `Some`, so an explicit value
    /// wins even when it equals the built-in default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(query) = cli.query {
            self.query = query;
        }
        if let Some(root_path) = cli.root_path {
            self.root_path = root_path;
        }
        if let Some(thread_count) = cli.thread_count {
            self.thread_count = thread_count;
        }
        if let Some(channel_capacity) = cli.channel_capacity {
            self.channel_capacity = channel_capacity;
        }
        if let Some(encoding_mode) = cli.encoding_mode {
            self.encoding_mode = encoding_mode;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}

/// Values given on the command line; `None` means "not passed"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub query: Option<String>,
    pub root_path: Option<PathBuf>,
    pub thread_count: Option<NonZeroUsize>,
    pub channel_capacity: Option<NonZeroUsize>,
    pub encoding_mode: Option<EncodingMode>,
    pub log_level: Option<String>,
}
