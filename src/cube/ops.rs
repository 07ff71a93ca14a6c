//! Array algebra behind the assembler, free of any I/O.

use ndarray::{Array3, Array4, Array5, ArrayView4, ArrayView5, Axis, Slice, s, stack};

use crate::error::{Error, Result};

use super::{CONTINUUM_SAMPLES, SPILLOVER_OFFSET, STOKES_I, TIME_AXIS, WAVELENGTH_AXIS};

/// Concatenate exposures `(stokes, y, wavelength)` along a new scan axis and
/// reorder to `(stokes, wavelength, y, x)`. Exposure `k` becomes column `x = k`.
pub fn build_raster(exposures: &[Array3<f64>]) -> Result<Array4<f64>> {
    if exposures.is_empty() {
        return Err(Error::precondition("no exposures to assemble"));
    }
    let views: Vec<_> = exposures.iter().map(|e| e.view()).collect();
    let scans = stack(Axis(0), &views)?;
    Ok(scans
        .permuted_axes([1, 3, 2, 0])
        .as_standard_layout()
        .into_owned())
}

/// Keep the first `cutoff` wavelength samples.
pub fn truncate_spectral(cube: &Array4<f64>, cutoff: usize) -> Array4<f64> {
    let keep = cutoff.min(cube.len_of(Axis(WAVELENGTH_AXIS)));
    cube.slice_axis(Axis(WAVELENGTH_AXIS), Slice::from(..keep))
        .to_owned()
}

/// Add [`SPILLOVER_OFFSET`] to negative Stokes I values. Q, U and V are left
/// alone. Returns how many values changed.
pub fn correct_spillover(cube: &mut Array4<f64>) -> usize {
    let mut corrected = 0;
    cube.index_axis_mut(Axis(0), STOKES_I).mapv_inplace(|v| {
        if v < 0.0 {
            corrected += 1;
            v + SPILLOVER_OFFSET
        } else {
            v
        }
    });
    corrected
}

/// Mean Stokes I over the leading continuum samples at every position.
pub fn continuum(cube: &ArrayView4<'_, f64>) -> Option<f64> {
    let samples = CONTINUUM_SAMPLES.min(cube.len_of(Axis(WAVELENGTH_AXIS)));
    cube.slice(s![STOKES_I, ..samples, .., ..]).mean()
}

/// Divide every plane by the Stokes I continuum. Returns the divisor.
pub fn normalize_continuum(cube: &mut Array4<f64>) -> Result<f64> {
    let level = continuum(&cube.view())
        .filter(|c| c.is_finite() && *c != 0.0)
        .ok_or_else(|| Error::precondition("continuum level is zero or undefined"))?;
    cube.mapv_inplace(|v| v / level);
    Ok(level)
}

/// Number of scans needed to hold `columns` slit positions.
pub fn time_step_count(columns: usize, steps: usize) -> usize {
    columns.div_ceil(steps)
}

/// Split the scan axis into `(step, time)`: scan `t` holds columns
/// `t * steps .. (t + 1) * steps`. A short final scan is zero-padded.
pub fn stack_time_series(cube: &Array4<f64>, steps: usize) -> Result<Array5<f64>> {
    if steps == 0 {
        return Err(Error::precondition("steps per scan must be at least 1"));
    }

    let (planes, waves, rows, columns) = cube.dim();
    let scans = time_step_count(columns, steps);
    let mut stacked = Array5::zeros((planes, waves, rows, steps, scans));

    for t in 0..scans {
        let start = t * steps;
        let end = (start + steps).min(columns);
        stacked
            .slice_mut(s![.., .., .., ..end - start, t])
            .assign(&cube.slice(s![.., .., .., start..end]));
    }

    Ok(stacked)
}

/// One scan of a stacked cube.
pub fn segment<'a>(stacked: &'a ArrayView5<'a, f64>, t: usize) -> ArrayView4<'a, f64> {
    stacked.index_axis(Axis(TIME_AXIS), t)
}
