pub mod commands;
pub mod review;
pub mod validate;

use aipo_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the program folder from `--project` (under `<root>/programs/`)
/// or a direct `--path`.
pub fn resolve_base(
    root: &Path,
    project: Option<&str>,
    path: Option<&Path>,
) -> anyhow::Result<PathBuf> {
    match (project, path) {
        (_, Some(p)) => Ok(p.to_path_buf()),
        (Some(name), None) => Ok(root.join(paths::PROGRAMS_DIR).join(name)),
        (None, None) => anyhow::bail!("provide --project or --path"),
    }
}
