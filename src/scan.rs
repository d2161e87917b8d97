use crate::error::{Error, Result};
use crate::filter::IgnoreFilter;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

/// The newest modification seen by a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Outcome of one walk over the watch roots.
///
/// `latest` is `None` when the walk met no entries at all, which happens
/// only when every root is excluded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub latest: Option<Change>,
}

impl ScanResult {
    /// Timestamp of the newest entry; `None` sorts before every timestamp.
    pub fn modified(&self) -> Option<SystemTime> {
        self.latest.as_ref().map(|change| change.modified)
    }

    pub fn path(&self) -> Option<&Path> {
        self.latest.as_ref().map(|change| change.path.as_path())
    }

    /// Records `path` only when it is strictly newer than what we have, so
    /// the first file met wins a tie.
    fn offer(&mut self, path: &Path, modified: SystemTime) {
        if self.modified().map_or(true, |latest| modified > latest) {
            self.latest = Some(Change {
                path: path.to_path_buf(),
                modified,
            });
        }
    }
}

/// Walks the watch roots looking for the most recently modified entry.
#[derive(Clone, Debug)]
pub struct Scanner {
    paths: Vec<PathBuf>,
    filter: IgnoreFilter,
}

impl Scanner {
    pub fn new(paths: Vec<PathBuf>, filter: IgnoreFilter) -> Self {
        Self { paths, filter }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Scans every root in order.
    ///
    /// Files and directories are timed alike, roots included, so removing
    /// or moving an entry shows up through its parent directory. Excluded
    /// entries are pruned before they are read, so an ignored directory is
    /// never descended into. Entries inside a directory are visited by file
    /// name. The first filesystem error ends the scan.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut result = ScanResult::default();

        for root in &self.paths {
            let walker = WalkDir::new(root)
                .sort_by(|a, b| a.file_name().cmp(b.file_name()))
                .into_iter()
                .filter_entry(|entry| !self.filter.is_excluded(entry.path()));

            for entry in walker {
                let entry = entry?;
                let modified = entry
                    .metadata()?
                    .modified()
                    .map_err(|err| Error::Scan(entry.path().to_path_buf(), err))?;
                result.offer(entry.path(), modified);
            }
        }

        if let Some(change) = &result.latest {
            trace!("Latest change: {:?} at {:?}", change.path, change.modified);
        }

        Ok(result)
    }
}
