//! Naming and description of assembled output files.

use std::path::PathBuf;

use super::TIME_AXIS;

/// Every assembled artifact name starts with this.
pub const ARTIFACT_PREFIX: &str = "a.";

/// Build `a.[c.][n.][stacked.]<base>`; downstream tools rely on this exact order.
pub fn artifact_file_name(base: &str, corrected: bool, normalized: bool, stacked: bool) -> String {
    let mut name = String::from(ARTIFACT_PREFIX);
    if corrected {
        name.push_str("c.");
    }
    if normalized {
        name.push_str("n.");
    }
    if stacked {
        name.push_str("stacked.");
    }
    name.push_str(base);
    name
}

/// A cube written by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    /// Row-major shape of the stored array.
    pub shape: Vec<usize>,
    pub corrected: bool,
    pub normalized: bool,
    pub stacked: bool,
}

impl OutputArtifact {
    /// Number of scans in a stacked artifact.
    pub fn time_steps(&self) -> Option<usize> {
        if self.stacked {
            self.shape.get(TIME_AXIS).copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_follow_fixed_order() {
        assert_eq!(artifact_file_name("x.fits", false, false, false), "a.x.fits");
        assert_eq!(artifact_file_name("x.fits", true, false, false), "a.c.x.fits");
        assert_eq!(artifact_file_name("x.fits", false, true, true), "a.n.stacked.x.fits");
        assert_eq!(
            artifact_file_name("20230615120000.fits", true, true, true),
            "a.c.n.stacked.20230615120000.fits"
        );
    }
}
