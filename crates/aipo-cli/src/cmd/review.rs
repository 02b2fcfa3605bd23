use crate::output::print_json;
use aipo_core::lang::LangChoice;
use aipo_core::review::{self, ReviewOptions};
use anyhow::Context;
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    project: Option<&str>,
    path: Option<&Path>,
    lang: &str,
    out: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let base_dir = super::resolve_base(root, project, path)?;
    let lang: LangChoice = lang.parse()?;

    let opts = ReviewOptions {
        base_dir,
        lang,
        out_path: out,
    };
    let written = review::generate(&opts).context("failed to generate weekly review")?;

    if json {
        print_json(&serde_json::json!({ "path": written }))?;
        return Ok(());
    }
    println!("Wrote: {}", written.display());
    Ok(())
}
