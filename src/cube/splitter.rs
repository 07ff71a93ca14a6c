use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use ndarray::Ix5;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fits::{FORMAT, read_fits, write_fits};
use crate::io::fs::ensure_dir;

use super::ops;

/// What [`split_time_series`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitOutcome {
    /// The stacked artifact does not exist; nothing was written.
    SourceMissing(PathBuf),
    /// `segments` files were written to `directory`.
    Split { directory: PathBuf, segments: usize },
}

impl SplitOutcome {
    pub fn segments(&self) -> usize {
        match self {
            SplitOutcome::SourceMissing(_) => 0,
            SplitOutcome::Split { segments, .. } => *segments,
        }
    }
}

/// `<stem>_unstacked`, where the segments of `source` are written.
pub fn unstacked_dir_name(source: &Path) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}_unstacked")
}

pub fn segment_file_name(index: usize) -> String {
    format!("stack_{index}.fits")
}

/// Write each scan of the stacked cube at `source` as its own file under
/// `output_root/<stem>_unstacked/`, stopping after `limit` scans if given.
///
/// A missing `source` is reported as [`SplitOutcome::SourceMissing`] so batch
/// callers can move on. A cube without exactly five axes is an error.
pub async fn split_time_series(
    source: &Path,
    output_root: &Path,
    limit: Option<usize>,
) -> Result<SplitOutcome> {
    let image = match read_fits(source).await {
        Err(Error::Io { source: err, .. }) if err.kind() == ErrorKind::NotFound => {
            warn!(source = %source.display(), "stacked cube not found");
            return Ok(SplitOutcome::SourceMissing(source.to_path_buf()));
        }
        other => other?,
    };

    let ndim = image.data.ndim();
    let stacked = image.data.into_dimensionality::<Ix5>().map_err(|_| {
        Error::format(
            FORMAT,
            format!("{}: expected a stacked cube with 5 axes, found {ndim}", source.display()),
        )
    })?;

    let directory = output_root.join(unstacked_dir_name(source));
    ensure_dir(&directory).await?;

    let available = stacked.dim().4;
    let count = limit.map_or(available, |n| n.min(available));
    let view = stacked.view();
    for t in 0..count {
        let segment = ops::segment(&view, t).into_dyn();
        write_fits(&directory.join(segment_file_name(t)), &image.header, &segment).await?;
    }

    info!(directory = %directory.display(), segments = count, "unstacked time series");
    Ok(SplitOutcome::Split {
        directory,
        segments: count,
    })
}
