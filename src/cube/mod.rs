//! Stokes cube assembly.
//!
//! A dataset directory holds one FITS file per slit position, each shaped
//! `(stokes, spatial_y, spectral)`. [`SlitAssembler`] stacks them into a
//! raster cube shaped `(stokes, wavelength, spatial_y, spatial_x)`, applies
//! the requested corrections and writes one artifact. [`split_time_series`]
//! cuts a time-stacked artifact back into per-scan files.

pub mod artifact;
mod assembler;
pub mod ops;
mod splitter;

pub use artifact::{OutputArtifact, artifact_file_name};
pub use assembler::{SlitAssembler, list_exposures};
pub use splitter::{SplitOutcome, segment_file_name, split_time_series, unstacked_dir_name};

use crate::error::{Error, Result};

/// Stokes I, Q, U, V.
pub const STOKES_PLANES: usize = 4;

/// Index of the Stokes I plane on the polarization axis.
pub const STOKES_I: usize = 0;

/// Spectral samples in every raw exposure.
pub const RAW_SPECTRAL_SAMPLES: usize = 112;

/// Cutoff that keeps both spectral lines.
pub const BOTH_LINES: usize = RAW_SPECTRAL_SAMPLES;

/// Cutoff that keeps only the first spectral line.
pub const FIRST_LINE: usize = 60;

/// Added to negative Stokes I counts wrapped around by the 16-bit digitizer.
pub const SPILLOVER_OFFSET: f64 = 65536.0;

/// Leading wavelength samples treated as continuum.
pub const CONTINUUM_SAMPLES: usize = 10;

pub const POLARIZATION_AXIS: usize = 0;
pub const WAVELENGTH_AXIS: usize = 1;
pub const SPATIAL_Y_AXIS: usize = 2;
pub const SPATIAL_X_AXIS: usize = 3;
/// Only present on stacked cubes, after the per-scan step axis.
pub const TIME_AXIS: usize = 4;

/// What the assembler does to a dataset besides concatenating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Slit positions per scan; `None` keeps a single raster.
    pub steps: Option<usize>,
    /// Undo digitizer wraparound in Stokes I.
    pub correct: bool,
    /// Divide by the Stokes I continuum level.
    pub normalize: bool,
    /// Wavelength samples to keep, counted from the start.
    pub spectral_cutoff: usize,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            steps: None,
            correct: true,
            normalize: true,
            spectral_cutoff: BOTH_LINES,
        }
    }
}

impl AssembleOptions {
    pub fn validate(&self) -> Result<()> {
        if !(1..=RAW_SPECTRAL_SAMPLES).contains(&self.spectral_cutoff) {
            return Err(Error::precondition(format!(
                "spectral cutoff must be between 1 and {RAW_SPECTRAL_SAMPLES}, got {}",
                self.spectral_cutoff
            )));
        }
        if self.steps == Some(0) {
            return Err(Error::precondition("steps per scan must be at least 1"));
        }
        Ok(())
    }
}
