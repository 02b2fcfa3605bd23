use crate::output::print_json;
use aipo_core::commandgen::{self, CommandGenOptions};
use anyhow::Context;
use std::path::Path;

pub fn run(
    root: &Path,
    project: Option<&str>,
    path: Option<&Path>,
    overwrite: bool,
    include_management: bool,
    json: bool,
) -> anyhow::Result<()> {
    let base_dir = super::resolve_base(root, project, path)?;
    let opts = CommandGenOptions {
        overwrite,
        include_management,
    };
    let summary = commandgen::generate_commands(&base_dir, &opts)
        .context("failed to generate command files")?;

    if json {
        print_json(&summary)?;
        return Ok(());
    }
    println!(
        "Generated {} command file(s) under {}",
        summary.generated,
        summary.target_dir.display()
    );
    Ok(())
}
