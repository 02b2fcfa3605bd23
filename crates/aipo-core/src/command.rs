use crate::paths;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Command-directory and naming-pattern resolution
// ---------------------------------------------------------------------------

/// Effective command-generation settings for one layer: explicit
/// `command_generation` block, else an existing (possibly legacy-cased)
/// commands directory, else defaults.
#[derive(Debug, Clone)]
pub struct CommandConfig {
    pub target_dir: String,
    pub naming_pattern: String,
}

impl CommandConfig {
    pub fn resolve(layer_dir: &Path, tasks_doc: Option<&Value>) -> Self {
        let mut target_dir = paths::COMMANDS_DIR.to_string();
        if let Some(existing) = paths::pick_existing_dir(
            layer_dir,
            &[paths::COMMANDS_DIR, paths::COMMANDS_DIR_LEGACY],
        ) {
            if let Some(name) = existing.file_name() {
                target_dir = name.to_string_lossy().into_owned();
            }
        }
        let mut naming_pattern = paths::DEFAULT_NAMING_PATTERN.to_string();

        let cmd_cfg = tasks_doc.and_then(|d| d.get("command_generation"));
        if let Some(cfg) = cmd_cfg.and_then(Value::as_object) {
            if let Some(dir) = cfg.get("target_dir").and_then(Value::as_str) {
                if !dir.trim().is_empty() {
                    target_dir = dir.trim().to_string();
                }
            }
            if let Some(pattern) = cfg.get("naming_pattern").and_then(Value::as_str) {
                if !pattern.trim().is_empty() {
                    naming_pattern = pattern.trim().to_string();
                }
            }
        }

        Self {
            target_dir,
            naming_pattern,
        }
    }

    /// Expand the naming pattern with sanitized task id and name.
    pub fn render_filename(&self, task_id: &str, task_name: &str) -> String {
        self.naming_pattern
            .replace("{task_id}", &paths::safe_filename(task_id))
            .replace("{task_name}", &paths::safe_filename(task_name))
    }
}

/// Resolve the generated instruction file for a task: an explicit
/// per-task `command` override first, then the templated name; the
/// first candidate present on disk wins.
pub fn resolve_command_path(
    layer_dir: &Path,
    config: &CommandConfig,
    task: &Value,
) -> Option<PathBuf> {
    let cmd_dir = layer_dir.join(&config.target_dir);
    let mut candidates: Vec<PathBuf> = Vec::new();

    if let Some(command) = task.get("command").and_then(Value::as_str) {
        if !command.trim().is_empty() {
            candidates.push(cmd_dir.join(format!("{}.md", command.trim())));
        }
    }

    let task_id = task.get("id").and_then(Value::as_str).unwrap_or("").trim();
    let task_name = task
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();
    if !task_id.is_empty() && !task_name.is_empty() {
        candidates.push(cmd_dir.join(config.render_filename(task_id, task_name)));
    }

    candidates.into_iter().find(|p| p.exists())
}

// ---------------------------------------------------------------------------
// "Outputs" section extraction
// ---------------------------------------------------------------------------

static OUTPUTS_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static NEXT_HEADING_RE: OnceLock<Regex> = OnceLock::new();

fn outputs_heading_re() -> &'static Regex {
    OUTPUTS_HEADING_RE.get_or_init(|| Regex::new(r"(?m)^\s*##\s*Outputs\s*$").unwrap())
}

fn next_heading_re() -> &'static Regex {
    NEXT_HEADING_RE.get_or_init(|| Regex::new(r"(?m)^\s*##\s+").unwrap())
}

/// Collect the bullet lines of a command file's `## Outputs` section
/// (up to the next `##` heading). Missing section means no outputs.
pub fn extract_outputs(text: &str) -> Vec<String> {
    let Some(m) = outputs_heading_re().find(text) else {
        return Vec::new();
    };
    let rest = &text[m.end()..];
    let block = match next_heading_re().find(rest) {
        Some(stop) => &rest[..stop.start()],
        None => rest,
    };

    block
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('-') || line.starts_with('*'))
        .filter_map(|line| {
            let item = line.trim_start_matches(['-', '*']).trim();
            (!item.is_empty()).then(|| item.to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn config_defaults_without_doc_or_dirs() {
        let dir = TempDir::new().unwrap();
        let cfg = CommandConfig::resolve(dir.path(), None);
        assert_eq!(cfg.target_dir, "commands");
        assert_eq!(cfg.naming_pattern, "{task_id}_{task_name}.md");
    }

    #[test]
    fn config_prefers_existing_legacy_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Commands")).unwrap();
        let cfg = CommandConfig::resolve(dir.path(), None);
        assert_eq!(cfg.target_dir, "Commands");
    }

    #[test]
    fn config_override_from_tasks_doc() {
        let dir = TempDir::new().unwrap();
        let doc = json!({"command_generation": {
            "target_dir": "cmds",
            "naming_pattern": "{task_id}.md",
        }});
        let cfg = CommandConfig::resolve(dir.path(), Some(&doc));
        assert_eq!(cfg.target_dir, "cmds");
        assert_eq!(cfg.render_filename("T1", "ignored"), "T1.md");
    }

    #[test]
    fn explicit_command_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let cmd_dir = dir.path().join("commands");
        std::fs::create_dir(&cmd_dir).unwrap();
        std::fs::write(cmd_dir.join("custom.md"), "x").unwrap();
        std::fs::write(cmd_dir.join("T1_Build.md"), "y").unwrap();

        let cfg = CommandConfig::resolve(dir.path(), None);
        let task = json!({"id": "T1", "name": "Build", "command": "custom"});
        let resolved = resolve_command_path(dir.path(), &cfg, &task).unwrap();
        assert_eq!(resolved, cmd_dir.join("custom.md"));
    }

    #[test]
    fn templated_candidate_used_when_no_override() {
        let dir = TempDir::new().unwrap();
        let cmd_dir = dir.path().join("commands");
        std::fs::create_dir(&cmd_dir).unwrap();
        std::fs::write(cmd_dir.join("T2_Write_docs.md"), "x").unwrap();

        let cfg = CommandConfig::resolve(dir.path(), None);
        let task = json!({"id": "T2", "name": "Write docs"});
        let resolved = resolve_command_path(dir.path(), &cfg, &task).unwrap();
        assert_eq!(resolved, cmd_dir.join("T2_Write_docs.md"));
    }

    #[test]
    fn unresolved_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        let cfg = CommandConfig::resolve(dir.path(), None);
        let task = json!({"id": "T3", "name": "Ghost"});
        assert!(resolve_command_path(dir.path(), &cfg, &task).is_none());
    }

    #[test]
    fn outputs_section_bullets() {
        let text = "# T1\n\n## Steps\n1. go\n\n## Outputs\n- documents/report.md\n* documents/data.csv\nnot a bullet\n\n## Notes\n- ignored\n";
        assert_eq!(
            extract_outputs(text),
            vec!["documents/report.md", "documents/data.csv"]
        );
    }

    #[test]
    fn outputs_missing_section_is_empty() {
        assert!(extract_outputs("# T1\n\n## Steps\n- x\n").is_empty());
    }

    #[test]
    fn outputs_section_at_end_of_file() {
        let text = "## Outputs\n- a/b.md\n";
        assert_eq!(extract_outputs(text), vec!["a/b.md"]);
    }
}
