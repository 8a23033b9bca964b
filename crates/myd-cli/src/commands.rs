use anyhow::Result;
use tracing::debug;

use myd_cli::config::AppConfig;
use myd_cli::pipeline::{
    IndexSourceReport, IndexTargetReport, MapReport, Project, index_source, index_target, map,
};

use crate::cli::{Cli, IndexSourceArgs, MapArgs, ObjectArgs};

fn load_config(cli: &Cli) -> Result<(Project, AppConfig)> {
    let config = AppConfig::load(&cli.root, cli.config.as_deref())?;
    let project = Project::new(&cli.root, &config);
    debug!(
        input = %project.input_dir.display(),
        output = %project.output_dir.display(),
        "project directories"
    );
    Ok((project, config))
}

pub fn run_index_source(cli: &Cli, args: &IndexSourceArgs) -> Result<IndexSourceReport> {
    let (project, config) = load_config(cli)?;
    index_source(
        &project,
        &config,
        &args.selection.object,
        &args.selection.variant,
        args.force,
    )
}

pub fn run_index_target(cli: &Cli, args: &ObjectArgs) -> Result<IndexTargetReport> {
    let (project, config) = load_config(cli)?;
    index_target(&project, &config, &args.object, &args.variant)
}

pub fn run_map(cli: &Cli, args: &MapArgs) -> Result<MapReport> {
    let (project, config) = load_config(cli)?;
    let config =
        config.with_overrides(args.fuzzy_threshold, args.max_suggestions, args.disable_fuzzy);
    map(
        &project,
        &config,
        &args.selection.object,
        &args.selection.variant,
    )
}
