//! # slitcube
//!
//! Assembles raw spectro-polarimeter slit scans into calibrated Stokes cubes.
//!
//! Observations arrive as ZIP bundles of single-slit FITS exposures. This
//! crate unpacks a bundle, finds each observation's directory, and writes one
//! cube per observation in the `(stokes, wavelength, y, x)` layout expected by
//! inversion codes, optionally repartitioned into a time series.
//!
//! ## Pipeline
//!
//! 1. [`crate::zip::extract_archive`] unpacks the bundle into a staging directory
//! 2. [`scan::scan_tree`] finds the dataset directories inside it
//! 3. [`SlitAssembler`] builds, corrects, normalizes and stacks each dataset
//! 4. [`split_time_series`] later splits a stacked cube into single scans
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use slitcube::{AssembleOptions, SlitAssembler, scan::scan_tree, zip::extract_archive};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     extract_archive(Path::new("obs.zip"), Path::new("staging")).await?;
//!
//!     let assembler = SlitAssembler::new(AssembleOptions::default());
//!     for dataset in scan_tree(Path::new("staging")).datasets {
//!         let name = format!("{}.fits", dataset.file_name().unwrap().to_string_lossy());
//!         let artifact = assembler.assemble(&dataset, Path::new("assembled"), &name).await?;
//!         println!("{} {:?}", artifact.path.display(), artifact.shape);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod cube;
pub mod error;
pub mod fits;
pub mod io;
pub mod scan;
pub mod zip;

pub use cli::Cli;
pub use cube::{
    AssembleOptions, OutputArtifact, SlitAssembler, SplitOutcome, artifact_file_name,
    split_time_series,
};
pub use error::{Error, Result};
pub use io::{LocalFileReader, ReadAt};
pub use scan::{DatasetScan, scan_tree};
pub use crate::zip::{ArchiveExtractor, ZipFileEntry, extract_archive};
