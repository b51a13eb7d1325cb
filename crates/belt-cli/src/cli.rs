use std::ops::RangeInclusive;
use std::path::PathBuf;

use anyhow::{bail, Result};
use belt_types::{BeltSpecification, ToothProfile, DEFAULT_WIDTH_MM};
use clap::{Args, Parser, Subcommand};

const LENGTH_RANGE_MM: RangeInclusive<f64> = 50.0..=1000.0;
const TEETH_RANGE: RangeInclusive<u32> = 10..=200;
const WIDTH_RANGE_MM: RangeInclusive<f64> = 3.0..=30.0;
const SCALE_RANGE_PERCENT: RangeInclusive<f64> = 100.0..=102.0;

#[derive(Parser)]
#[command(name = "s3m-belt")]
#[command(author, version, about = "Generate printable S3M timing belts as STL and STEP")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the belt solid and write STL and STEP files
    Generate(GenerateArgs),

    /// Print the derived belt configuration without building geometry
    Info {
        #[command(flatten)]
        belt: BeltArgs,

        /// JSON file with a custom tooth profile
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print recommended TPU print settings
    PrintSettings {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Belt dimensions shared by every command that derives a belt.
#[derive(Args, Debug)]
pub struct BeltArgs {
    /// Desired belt length in mm; snapped to a whole number of teeth
    #[arg(long, conflicts_with = "teeth", required_unless_present = "teeth")]
    pub length: Option<f64>,

    /// Number of teeth
    #[arg(long)]
    pub teeth: Option<u32>,

    /// Belt width in mm
    #[arg(long, default_value_t = DEFAULT_WIDTH_MM)]
    pub width: f64,

    /// Shrinkage compensation in percent (100 = no scaling)
    #[arg(long, default_value_t = 100.5)]
    pub scale_percent: f64,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub belt: BeltArgs,

    /// STL output path [default: <belt name>.stl]
    #[arg(long)]
    pub out_stl: Option<PathBuf>,

    /// STEP output path [default: <belt name>.step]
    #[arg(long)]
    pub out_step: Option<PathBuf>,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    pub ascii_stl: bool,

    /// JSON file with build, export and tooth profile overrides
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl BeltArgs {
    /// Check the host's input ranges, then derive and validate the belt.
    pub fn to_spec(&self, profile: ToothProfile) -> Result<BeltSpecification> {
        if let Some(length) = self.length {
            check_range("length", length, &LENGTH_RANGE_MM, "mm")?;
        }
        if let Some(teeth) = self.teeth {
            if !TEETH_RANGE.contains(&teeth) {
                bail!(
                    "teeth must be between {} and {} (got {})",
                    TEETH_RANGE.start(),
                    TEETH_RANGE.end(),
                    teeth
                );
            }
        }
        check_range("width", self.width, &WIDTH_RANGE_MM, "mm")?;
        check_range("scale", self.scale_percent, &SCALE_RANGE_PERCENT, "%")?;

        let spec = BeltSpecification::with_profile(
            profile,
            self.length,
            self.teeth,
            self.width,
            self.scale_percent / 100.0,
        )?;
        Ok(spec)
    }
}

fn check_range(name: &str, value: f64, range: &RangeInclusive<f64>, unit: &str) -> Result<()> {
    if !range.contains(&value) {
        bail!(
            "{} must be between {}{unit} and {}{unit} (got {}{unit})",
            name,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(())
}
