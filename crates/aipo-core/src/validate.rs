//! Program-folder shape validation for the strict (JSON-compatible)
//! descriptor profile. Errors are collected, not fail-fast, so one run
//! reports everything an operator has to fix.

use crate::paths;
use crate::reader;
use serde_json::{Map, Value};
use std::path::Path;

const LAYER_REQUIRED: &[&str] = &[
    "version",
    "project_name",
    "layer_id",
    "layer_name",
    "workflow_preset",
    "goal",
    "mode",
    "owner",
];

const CONTEXT_REQUIRED: &[&str] = &[
    "version",
    "project_name",
    "layer_id",
    "generated_at",
    "context_documents",
];

const TASKS_REQUIRED: &[&str] = &[
    "version",
    "project_name",
    "layer_id",
    "generated_at",
    "decomposition_type",
    "focus_strategy",
    "focus_strategy_reason",
    "focus_strategy_confirmed_by",
    "sublayers",
    "tasks",
    "command_generation",
];

// Task types whose command must stay null (nothing is generated for
// pure people-work).
const COMMANDLESS_TYPES: &[&str] = &["management", "coordination", "verification"];

/// Validate the three descriptor files of a program folder. Returns the
/// collected error messages; empty means valid.
pub fn validate_program(base_dir: &Path) -> Vec<String> {
    let mut errors = Vec::new();

    if let Some(layer) = load(&paths::layer_file(base_dir), &mut errors) {
        validate_layer(&layer, &mut errors);
    }
    if let Some(context) = load(&base_dir.join(paths::CONTEXT_FILE), &mut errors) {
        validate_context(&context, &mut errors);
    }
    if let Some(tasks) = load(&paths::tasks_file(base_dir), &mut errors) {
        validate_tasks(&tasks, &mut errors);
    }

    errors
}

fn load(path: &Path, errors: &mut Vec<String>) -> Option<Map<String, Value>> {
    match reader::read_structured(path) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            errors.push(format!(
                "{} must contain a JSON object at the top level",
                path.display()
            ));
            None
        }
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}

fn require<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    prefix: &str,
    errors: &mut Vec<String>,
) -> Option<&'a Value> {
    match map.get(key) {
        Some(v) => Some(v),
        None => {
            errors.push(format!("missing key '{prefix}{key}'"));
            None
        }
    }
}

fn nonempty_str(value: &Value) -> bool {
    value.as_str().is_some_and(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// layer.yaml
// ---------------------------------------------------------------------------

fn validate_layer(layer: &Map<String, Value>, errors: &mut Vec<String>) {
    for key in LAYER_REQUIRED {
        require(layer, key, "layer.", errors);
    }
    if let Some(goal) = layer.get("goal") {
        let ok = goal
            .as_object()
            .is_some_and(|g| g.contains_key("description"));
        if !ok {
            errors.push("layer.goal.description is required".to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// context.yaml
// ---------------------------------------------------------------------------

fn validate_context(context: &Map<String, Value>, errors: &mut Vec<String>) {
    for key in CONTEXT_REQUIRED {
        require(context, key, "context.", errors);
    }
    let Some(docs) = context.get("context_documents") else {
        return;
    };
    let Some(docs) = docs.as_array() else {
        errors.push("context.context_documents must be a list".to_string());
        return;
    };
    for (i, doc) in docs.iter().enumerate() {
        let Some(doc) = doc.as_object() else {
            errors.push(format!("context.context_documents[{i}] must be an object"));
            continue;
        };
        for key in ["name", "path", "summary"] {
            if !doc.contains_key(key) {
                errors.push(format!("context.context_documents[{i}].{key} is required"));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// tasks.yaml
// ---------------------------------------------------------------------------

fn validate_tasks(tasks: &Map<String, Value>, errors: &mut Vec<String>) {
    for key in TASKS_REQUIRED {
        require(tasks, key, "tasks.", errors);
    }

    if let Some(confirmed_by) = tasks.get("focus_strategy_confirmed_by") {
        if !matches!(confirmed_by.as_str(), Some("user") | Some("ai")) {
            errors.push("tasks.focus_strategy_confirmed_by must be 'user' or 'ai'".to_string());
        }
    }

    if let Some(cmd_gen) = tasks.get("command_generation") {
        match cmd_gen.as_object() {
            Some(cfg) => {
                if !cfg.get("enabled").is_some_and(Value::is_boolean) {
                    errors.push("tasks.command_generation.enabled must be a boolean".to_string());
                }
            }
            None => errors.push("tasks.command_generation must be an object".to_string()),
        }
    }

    match tasks.get("sublayers") {
        Some(Value::Array(sublayers)) => {
            for (i, sublayer) in sublayers.iter().enumerate() {
                validate_sublayer(i, sublayer, errors);
            }
        }
        Some(_) => errors.push("tasks.sublayers must be a list".to_string()),
        None => {}
    }

    match tasks.get("tasks") {
        Some(Value::Array(list)) => {
            for (i, task) in list.iter().enumerate() {
                validate_task(i, task, errors);
            }
        }
        Some(_) => errors.push("tasks.tasks must be a list".to_string()),
        None => {}
    }
}

fn validate_sublayer(i: usize, sublayer: &Value, errors: &mut Vec<String>) {
    let Some(sublayer) = sublayer.as_object() else {
        errors.push(format!("tasks.sublayers[{i}] must be an object"));
        return;
    };
    for key in ["id", "goal"] {
        match sublayer.get(key) {
            None => errors.push(format!("tasks.sublayers[{i}].{key} is required")),
            Some(v) if !nonempty_str(v) => {
                errors.push(format!("tasks.sublayers[{i}].{key} must be a non-empty string"))
            }
            _ => {}
        }
    }

    if let Some(mode) = sublayer.get("mode") {
        if !mode.is_null() && !matches!(mode.as_str(), Some("concrete") | Some("abstract")) {
            errors.push(format!(
                "tasks.sublayers[{i}].mode must be 'concrete' or 'abstract' when set"
            ));
        }
    }

    if let Some(path_value) = sublayer.get("path") {
        if !path_value.is_null() {
            if !nonempty_str(path_value) {
                errors.push(format!(
                    "tasks.sublayers[{i}].path must be a non-empty string when set"
                ));
            } else if !paths::is_safe_relative(path_value.as_str().unwrap_or_default().trim()) {
                errors.push(format!("tasks.sublayers[{i}].path must be a safe relative path"));
            }
        }
    }
}

fn validate_task(i: usize, task: &Value, errors: &mut Vec<String>) {
    let Some(task) = task.as_object() else {
        errors.push(format!("tasks.tasks[{i}] must be an object"));
        return;
    };
    for key in ["id", "name", "type", "status", "command", "command_template_ref"] {
        if !task.contains_key(key) {
            errors.push(format!("tasks.tasks[{i}].{key} is required"));
        }
    }

    let task_type = task.get("type").and_then(Value::as_str).unwrap_or_default();
    let command = task.get("command");
    if COMMANDLESS_TYPES.contains(&task_type) {
        if command.is_some_and(|c| !c.is_null()) {
            errors.push(format!(
                "tasks.tasks[{i}].command must be null for management/coordination/verification"
            ));
        }
    } else if command.is_some() && !command.is_some_and(nonempty_str) {
        errors.push(format!(
            "tasks.tasks[{i}].command is required for type={task_type}"
        ));
    }

    if let Some(template_ref) = task.get("command_template_ref") {
        if !template_ref.is_null() && !template_ref.is_string() {
            errors.push(format!(
                "tasks.tasks[{i}].command_template_ref must be a string or null"
            ));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn valid_fixture(dir: &Path) {
        write(
            dir,
            "layer.yaml",
            r#"{"version": 1, "project_name": "Alpha", "layer_id": "L0",
                "layer_name": "Root", "workflow_preset": "standard",
                "goal": {"description": "Ship"}, "mode": "concrete", "owner": "ops"}"#,
        );
        write(
            dir,
            "context.yaml",
            r#"{"version": 1, "project_name": "Alpha", "layer_id": "L0",
                "generated_at": "2026-08-01",
                "context_documents": [
                    {"name": "brief", "path": "documents/brief.md", "summary": "short"}
                ]}"#,
        );
        write(
            dir,
            "tasks.yaml",
            r#"{"version": 1, "project_name": "Alpha", "layer_id": "L0",
                "generated_at": "2026-08-01", "decomposition_type": "flat",
                "focus_strategy": "depth", "focus_strategy_reason": "small",
                "focus_strategy_confirmed_by": "user",
                "sublayers": [{"id": "S1", "goal": "explore", "path": "sublayers/s1"}],
                "tasks": [
                    {"id": "T1", "name": "Build", "type": "implementation",
                     "status": "pending", "command": "build_site",
                     "command_template_ref": null},
                    {"id": "T2", "name": "Align", "type": "coordination",
                     "status": "pending", "command": null,
                     "command_template_ref": null}
                ],
                "command_generation": {"enabled": true}}"#,
        );
    }

    #[test]
    fn valid_program_has_no_errors() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        let errors = validate_program(dir.path());
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn missing_files_reported() {
        let dir = TempDir::new().unwrap();
        let errors = validate_program(dir.path());
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("missing file"));
    }

    #[test]
    fn missing_layer_keys_named() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(dir.path(), "layer.yaml", r#"{"version": 1}"#);
        let errors = validate_program(dir.path());
        assert!(errors.iter().any(|e| e == "missing key 'layer.project_name'"));
        assert!(errors.iter().any(|e| e == "missing key 'layer.owner'"));
    }

    #[test]
    fn goal_description_required() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(
            dir.path(),
            "layer.yaml",
            r#"{"version": 1, "project_name": "A", "layer_id": "L0",
                "layer_name": "R", "workflow_preset": "std",
                "goal": {}, "mode": "concrete", "owner": "ops"}"#,
        );
        let errors = validate_program(dir.path());
        assert!(errors.iter().any(|e| e == "layer.goal.description is required"));
    }

    #[test]
    fn command_must_be_null_for_coordination() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(
            dir.path(),
            "tasks.yaml",
            r#"{"version": 1, "project_name": "A", "layer_id": "L0",
                "generated_at": "x", "decomposition_type": "flat",
                "focus_strategy": "d", "focus_strategy_reason": "r",
                "focus_strategy_confirmed_by": "ai",
                "sublayers": [],
                "tasks": [{"id": "T1", "name": "Align", "type": "coordination",
                           "status": "pending", "command": "oops",
                           "command_template_ref": null}],
                "command_generation": {"enabled": false}}"#,
        );
        let errors = validate_program(dir.path());
        assert!(
            errors.iter().any(|e| e.contains("must be null")),
            "{errors:?}"
        );
    }

    #[test]
    fn unsafe_sublayer_path_rejected() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(
            dir.path(),
            "tasks.yaml",
            r#"{"version": 1, "project_name": "A", "layer_id": "L0",
                "generated_at": "x", "decomposition_type": "flat",
                "focus_strategy": "d", "focus_strategy_reason": "r",
                "focus_strategy_confirmed_by": "user",
                "sublayers": [{"id": "S1", "goal": "g", "path": "../escape"}],
                "tasks": [],
                "command_generation": {"enabled": true}}"#,
        );
        let errors = validate_program(dir.path());
        assert!(
            errors
                .iter()
                .any(|e| e == "tasks.sublayers[0].path must be a safe relative path"),
            "{errors:?}"
        );
    }

    #[test]
    fn confirmed_by_vocabulary_enforced() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(
            dir.path(),
            "tasks.yaml",
            r#"{"version": 1, "project_name": "A", "layer_id": "L0",
                "generated_at": "x", "decomposition_type": "flat",
                "focus_strategy": "d", "focus_strategy_reason": "r",
                "focus_strategy_confirmed_by": "robot",
                "sublayers": [], "tasks": [],
                "command_generation": {"enabled": true}}"#,
        );
        let errors = validate_program(dir.path());
        assert!(errors
            .iter()
            .any(|e| e.contains("must be 'user' or 'ai'")));
    }

    #[test]
    fn yaml_subset_profile_also_accepted() {
        let dir = TempDir::new().unwrap();
        valid_fixture(dir.path());
        write(
            dir.path(),
            "context.yaml",
            "version: 1\nproject_name: Alpha\nlayer_id: L0\ngenerated_at: x\ncontext_documents:\n  - name: brief\n    path: documents/brief.md\n    summary: short\n",
        );
        let errors = validate_program(dir.path());
        assert!(errors.is_empty(), "{errors:?}");
    }
}
