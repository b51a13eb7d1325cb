use std::path::Path;

use anyhow::Result;

use crate::cli::BeltArgs;
use crate::config::CliConfig;

pub fn run(belt: &BeltArgs, config: Option<&Path>) -> Result<()> {
    let config = CliConfig::load(config)?;
    let spec = belt.to_spec(config.profile())?;

    println!("{}", spec.summary());
    println!("- Inner Radius: {:.2} mm", spec.inner_radius());
    println!("- Tooth Spacing: {:.4}°", spec.angle_step_degrees());
    Ok(())
}
