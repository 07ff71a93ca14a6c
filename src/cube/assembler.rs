use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayD, Ix3};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::fits::{Header, read_fits, read_fits_layout, write_fits};

use super::artifact::{OutputArtifact, artifact_file_name};
use super::ops;
use super::{AssembleOptions, RAW_SPECTRAL_SAMPLES, STOKES_PLANES};

/// File extension of exposure files.
const EXPOSURE_EXTENSION: &str = "fits";

/// Builds one artifact from a dataset directory of slit exposures.
#[derive(Debug, Clone, Default)]
pub struct SlitAssembler {
    options: AssembleOptions,
}

impl SlitAssembler {
    pub fn new(options: AssembleOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AssembleOptions {
        &self.options
    }

    /// Assemble every exposure in `dataset_dir` and write the result to
    /// `output_dir` under the artifact name derived from `base_name`.
    ///
    /// All exposure headers are checked before any pixel data is read, so an
    /// empty or inconsistent directory fails without building an array.
    pub async fn assemble(
        &self,
        dataset_dir: &Path,
        output_dir: &Path,
        base_name: &str,
    ) -> Result<OutputArtifact> {
        self.options.validate()?;

        let files = list_exposures(dataset_dir).await?;
        if files.is_empty() {
            return Err(Error::precondition(format!(
                "no .{EXPOSURE_EXTENSION} exposures in {}",
                dataset_dir.display()
            )));
        }

        let mut rows = None;
        for file in &files {
            let (_, layout) = read_fits_layout(file).await?;
            check_exposure_shape(file, &layout.shape(), &mut rows)?;
        }
        info!(
            dataset = %dataset_dir.display(),
            slits = files.len(),
            slit_length = rows.unwrap_or_default(),
            "assembling slits"
        );

        let mut exposures = Vec::with_capacity(files.len());
        let mut header = Header::new();
        for file in &files {
            let image = read_fits(file).await?;
            debug!(file = %file.display(), "loaded exposure");
            exposures.push(image.data.into_dimensionality::<Ix3>()?);
            header = image.header;
        }

        let cube = self.process(&exposures)?;

        let name = artifact_file_name(
            base_name,
            self.options.correct,
            self.options.normalize,
            self.options.steps.is_some(),
        );
        let path = output_dir.join(name);
        write_fits(&path, &header, &cube.view()).await?;

        info!(artifact = %path.display(), shape = ?cube.shape(), "saved assembled cube");
        Ok(OutputArtifact {
            path,
            shape: cube.shape().to_vec(),
            corrected: self.options.correct,
            normalized: self.options.normalize,
            stacked: self.options.steps.is_some(),
        })
    }

    /// Run the in-memory part of assembly on already loaded exposures.
    pub fn process(&self, exposures: &[Array3<f64>]) -> Result<ArrayD<f64>> {
        self.options.validate()?;

        let raster = ops::build_raster(exposures)?;
        let mut cube = ops::truncate_spectral(&raster, self.options.spectral_cutoff);

        if self.options.correct {
            let corrected = ops::correct_spillover(&mut cube);
            debug!(corrected, "corrected spillover counts");
        }

        if self.options.normalize {
            let level = ops::normalize_continuum(&mut cube)?;
            debug!(continuum = level, "normalized to continuum");
        }

        match self.options.steps {
            Some(steps) => {
                let stacked = ops::stack_time_series(&cube, steps)?;
                debug!(steps, scans = stacked.dim().4, "stacked time series");
                Ok(stacked.into_dyn())
            }
            None => Ok(cube.into_dyn()),
        }
    }
}

/// Exposure files in `dir`, sorted by file name (which is scan order).
pub async fn list_exposures(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| Error::io(dir, e))?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(|e| Error::io(dir, e))? {
        let path = entry.path();
        let is_exposure = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(EXPOSURE_EXTENSION));
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| Error::io(&path, e))?
            .is_file();
        if is_exposure && is_file {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Every exposure must be `(4, rows, 112)` with the same `rows`.
fn check_exposure_shape(file: &Path, shape: &[usize], rows: &mut Option<usize>) -> Result<()> {
    let [planes, slit, samples] = shape else {
        return Err(Error::precondition(format!(
            "{}: expected 3 axes, found {}",
            file.display(),
            shape.len()
        )));
    };

    if *planes != STOKES_PLANES || *samples != RAW_SPECTRAL_SAMPLES || *slit == 0 {
        return Err(Error::precondition(format!(
            "{}: expected shape ({STOKES_PLANES}, n, {RAW_SPECTRAL_SAMPLES}), found {shape:?}",
            file.display()
        )));
    }

    match *rows {
        Some(expected) if expected != *slit => Err(Error::precondition(format!(
            "{}: slit length {slit} differs from {expected} in earlier exposures",
            file.display()
        ))),
        _ => {
            *rows = Some(*slit);
            Ok(())
        }
    }
}
