use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cube::{AssembleOptions, BOTH_LINES};

#[derive(Parser, Debug)]
#[command(name = "slitcube")]
#[command(version)]
#[command(about = "Assemble spectro-polarimeter slit scans into Stokes cubes", long_about = None)]
#[command(after_help = "Examples:\n  \
  slitcube assemble --archive obs.zip --archive-dir raw --output assembled\n  \
  slitcube assemble --archive obs.zip --archive-dir raw --output assembled --steps 7 --cleanup\n  \
  slitcube unstack assembled/a.c.n.stacked.20230615120000.fits -d series\n  \
  slitcube list -v raw/obs.zip")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract an archive and assemble every dataset inside it
    Assemble(AssembleArgs),
    /// Split a stacked cube into one file per scan
    Unstack(UnstackArgs),
    /// List the members of an archive
    List(ListArgs),
    /// Show the shape and header of an assembled cube
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Archive file name, relative to --archive-dir
    #[arg(long, value_name = "NAME")]
    pub archive: String,

    /// Directory holding the archive
    #[arg(long, value_name = "DIR")]
    pub archive_dir: PathBuf,

    /// Directory for assembled cubes
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: PathBuf,

    /// Staging directory for extracted slits [default: <archive-dir>/temp]
    #[arg(long, value_name = "DIR")]
    pub staging: Option<PathBuf>,

    /// Slit positions per scan, for time series observations
    #[arg(long, value_name = "N")]
    pub steps: Option<usize>,

    /// Skip the Stokes I spillover correction
    #[arg(long)]
    pub no_correct: bool,

    /// Skip continuum normalization
    #[arg(long)]
    pub no_normalize: bool,

    /// Wavelength samples to keep (112 for both lines, 60 for the first)
    #[arg(long, value_name = "N", default_value_t = BOTH_LINES)]
    pub spectral_cutoff: usize,

    /// Remove the default staging directory after assembly (not allowed
    /// with --staging, which may name a directory slitcube does not own)
    #[arg(long, conflicts_with = "staging")]
    pub cleanup: bool,
}

impl AssembleArgs {
    pub fn archive_path(&self) -> PathBuf {
        self.archive_dir.join(&self.archive)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging
            .clone()
            .unwrap_or_else(|| self.archive_dir.join("temp"))
    }

    pub fn options(&self) -> AssembleOptions {
        AssembleOptions {
            steps: self.steps,
            correct: !self.no_correct,
            normalize: !self.no_normalize,
            spectral_cutoff: self.spectral_cutoff,
        }
    }
}

#[derive(Args, Debug)]
pub struct UnstackArgs {
    /// Stacked cube to split
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Directory that receives the <name>_unstacked folder [default: the cube's directory]
    #[arg(short = 'd', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Write at most N scans
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

impl UnstackArgs {
    pub fn output_root(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            self.file
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default()
        })
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// ZIP archive
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// List verbosely: sizes, compression ratio and timestamps
    #[arg(short = 'v')]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// FITS file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Also print every header card
    #[arg(short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter for the quiet level.
    pub fn log_level(&self) -> &'static str {
        match self.quiet {
            0 => "info",
            1 => "warn",
            _ => "error",
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }
}
