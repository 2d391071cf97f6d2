//! Search result types.
//!
//! An [`Occurrence`] is a freestanding value: it names its file by path and
//! holds no handle to the file's contents. Once a worker hands an occurrence
//! batch to the output channel, ownership passes to whoever pulls it from the
//! stream.
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A single match of the query inside a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Occurrence {
    /// The file the match was found in
    pub file: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// 0-based character offset of the match start within the line
    pub offset: usize,
}

impl Occurrence {
    pub fn new(file: impl Into<PathBuf>, line: usize, offset: usize) -> Self {
        Self {
            file: file.into(),
            line,
            offset,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.offset)
    }
}
