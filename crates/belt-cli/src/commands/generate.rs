use std::path::PathBuf;

use anyhow::{Context, Result};
use belt_builder::BeltModelBuilder;
use belt_export::export_artifacts;

use crate::cli::GenerateArgs;
use crate::config::CliConfig;

pub fn run(args: GenerateArgs) -> Result<()> {
    let config = CliConfig::load(args.config.as_deref())?;
    let spec = args.belt.to_spec(config.profile())?;
    println!("{}", spec.summary());

    let stl_path = args
        .out_stl
        .unwrap_or_else(|| PathBuf::from(format!("{}.stl", spec.file_stem())));
    let step_path = args
        .out_step
        .unwrap_or_else(|| PathBuf::from(format!("{}.step", spec.file_stem())));

    let mut kernel = config.kernel();
    let model = BeltModelBuilder::with_options(&mut kernel, config.build_options())
        .build_belt(&spec)
        .context("failed to build belt solid")?;

    // Both artifacts are produced before either file is touched.
    let artifacts = export_artifacts(&mut kernel, &model, &config.export_options(args.ascii_stl))
        .context("failed to export belt")?;
    artifacts.write(&stl_path, &step_path)?;

    println!("STL:  {}", stl_path.display());
    println!("STEP: {}", step_path.display());
    Ok(())
}
