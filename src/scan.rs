//! Discovery of dataset directories inside an extracted archive.
//!
//! Archives unpack into trees like `.../hinode/SP3D/20230615120000/*.fits`:
//! a *container* directory whose name ends with [`CONTAINER_SUFFIX`] holds
//! one *dataset* directory per observation, named by its start time.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Name suffix of directories that hold dataset directories.
pub const CONTAINER_SUFFIX: &str = "SP3D";

/// `YYYYMMDDhhmmss` for the years 2000-2299.
static DATASET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^20[0-2]\d{11}$").expect("dataset name pattern is valid"));

/// Result of scanning an extracted tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetScan {
    pub containers: Vec<PathBuf>,
    pub datasets: Vec<PathBuf>,
}

impl DatasetScan {
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty() && self.datasets.is_empty()
    }
}

pub fn is_container_name(name: &str) -> bool {
    name.ends_with(CONTAINER_SUFFIX)
}

pub fn is_dataset_name(name: &str) -> bool {
    DATASET_NAME.is_match(name)
}

/// Walk `root` and collect containers and their dataset subdirectories.
///
/// Traversal is sorted by file name, so the result does not depend on the
/// filesystem's directory order. A missing or empty root yields an empty
/// scan; unreadable entries are skipped.
pub fn scan_tree(root: &Path) -> DatasetScan {
    let mut scan = DatasetScan::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        if !entry.file_type().is_dir() || !is_container_name(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let container = entry.path();
        scan.containers.push(container.to_path_buf());
        scan.datasets.extend(dataset_dirs(container));
    }

    debug!(
        root = %root.display(),
        containers = scan.containers.len(),
        datasets = scan.datasets.len(),
        "scanned extracted tree"
    );
    scan
}

/// Immediate subdirectories of `container` named like a dataset.
fn dataset_dirs(container: &Path) -> Vec<PathBuf> {
    WalkDir::new(container)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("Skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|e| e.file_type().is_dir() && is_dataset_name(&e.file_name().to_string_lossy()))
        .map(|e| e.into_path())
        .collect()
}
