//! Command-stub generation: one Markdown instruction file per task,
//! named by the layer's naming pattern, written into its command
//! directory. Existing files are left alone unless overwrite is asked
//! for, so operators can edit stubs freely.

use crate::command::CommandConfig;
use crate::error::{AipoError, Result};
use crate::{io, paths, reader};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandGenOptions {
    /// Rewrite stubs that already exist on disk.
    pub overwrite: bool,
    /// Also generate stubs for tasks whose `command` is null
    /// (management/coordination work).
    pub include_management: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandGenSummary {
    pub generated: usize,
    pub target_dir: PathBuf,
}

/// Generate stubs for every eligible task in `<base_dir>/tasks.yaml`.
/// Refuses an unsafe target directory and any rendered filename that
/// would land outside the program folder.
pub fn generate_commands(base_dir: &Path, opts: &CommandGenOptions) -> Result<CommandGenSummary> {
    let tasks_doc = reader::read_object(&paths::tasks_file(base_dir))?;
    let config = CommandConfig::resolve(base_dir, Some(&tasks_doc));

    if !paths::is_safe_relative(&config.target_dir) {
        return Err(AipoError::UnsafePath(config.target_dir.clone()));
    }

    let Some(tasks) = tasks_doc.get("tasks").and_then(Value::as_array) else {
        return Err(AipoError::InvalidDocument {
            path: paths::tasks_file(base_dir),
            message: "tasks must be a list".to_string(),
        });
    };

    let mut generated = 0;
    for task in tasks.iter().filter(|t| t.is_object()) {
        let command_is_null = task.get("command").map_or(true, Value::is_null);
        if command_is_null && !opts.include_management {
            continue;
        }

        let task_id = task.get("id").and_then(Value::as_str).unwrap_or("").trim();
        let task_name = task
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .trim();
        let filename = config.render_filename(task_id, task_name);

        let rel = Path::new(&config.target_dir).join(&filename);
        let rel_str = rel.to_string_lossy().into_owned();
        if !paths::is_safe_relative(&rel_str) {
            return Err(AipoError::UnsafePath(rel_str));
        }
        let out_path = base_dir.join(&rel);

        let stub = render_stub(task_id, task_name, task.get("command_template_ref"));
        let written = if opts.overwrite {
            io::atomic_write(&out_path, stub.as_bytes())?;
            true
        } else {
            io::write_if_missing(&out_path, stub.as_bytes())?
        };
        if written {
            generated += 1;
        }
    }

    tracing::debug!(generated, dir = %config.target_dir, "command stubs written");
    Ok(CommandGenSummary {
        generated,
        target_dir: base_dir.join(&config.target_dir),
    })
}

fn render_stub(task_id: &str, task_name: &str, template_ref: Option<&Value>) -> String {
    let template_line = match template_ref.and_then(Value::as_str) {
        Some(r) if !r.is_empty() => format!("- command_template_ref: `{r}`"),
        _ => "- command_template_ref: `null`".to_string(),
    };
    format!(
        "# {task_id}: {task_name}\n\n\
         ## Goal\n\
         - （このタスクで達成したいことを1〜2行で）\n\n\
         ## Done (Acceptance Criteria)\n\
         - （完了条件を箇条書きで）\n\n\
         ## Inputs\n\
         - （必要な前提情報・参照ファイル・URLなど）\n\n\
         ## Steps\n\
         1.\n\
         2.\n\n\
         ## Outputs\n\
         - （作成/更新するファイル、成果物の場所）\n\n\
         ## Notes\n\
         {template_line}\n"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
