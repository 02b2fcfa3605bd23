use crate::output::print_json;
use aipo_core::validate::validate_program;
use std::path::Path;

pub fn run(
    root: &Path,
    project: Option<&str>,
    path: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let base_dir = super::resolve_base(root, project, path)?;
    let errors = validate_program(&base_dir);

    if json {
        print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "errors": errors,
        }))?;
    } else {
        for err in &errors {
            println!("error: {err}");
        }
        if errors.is_empty() {
            println!("Valid: {}", base_dir.display());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} validation error(s)", errors.len())
    }
}
