use ignore::{Walk, WalkBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lazily enumerates every regular file under a root.
///
/// No ignore rules apply: hidden files and files excluded by `.gitignore` are
/// yielded like any other. Symlinks are not followed, and directories,
/// symlinks and special files are skipped. A root that is itself a regular
/// file yields just that file.
pub struct RegularFiles {
    walk: Option<Walk>,
}

impl Iterator for RegularFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        let walk = self.walk.as_mut()?;
        for entry in walk.by_ref() {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file()) {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => warn!("Skipping unreadable entry: {}", e),
            }
        }
        self.walk = None;
        None
    }
}

/// Lists all regular files under `root`.
///
/// A root that does not exist or cannot be accessed yields nothing.
pub fn list_regular_files(root: &Path) -> RegularFiles {
    if let Err(e) = root.metadata() {
        debug!("Search root {} is not accessible: {}", root.display(), e);
        return RegularFiles { walk: None };
    }

    debug!("Scanning directory: {}", root.display());
    let walk = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .build();

    RegularFiles { walk: Some(walk) }
}
