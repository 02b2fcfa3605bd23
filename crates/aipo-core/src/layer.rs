use crate::command::{self, CommandConfig};
use crate::deliverable;
use crate::error::{AipoError, Result};
use crate::paths;
use crate::reader;
use crate::task::{self, TaskRow};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// ---------------------------------------------------------------------------
// LayerInfo
// ---------------------------------------------------------------------------

/// One organizational node of a program, identified by its directory.
/// Built once per run from the on-disk snapshot; read-only afterward.
#[derive(Debug, Clone, Serialize)]
pub struct LayerInfo {
    pub path: PathBuf,
    pub project_name: String,
    pub layer_id: String,
    pub layer_name: String,
    pub goal_description: String,
    pub goal_deliverable: Option<String>,
    pub parent_layer_id: Option<String>,
    pub tasks: Vec<TaskRow>,
    pub documents_dir: Option<PathBuf>,
    pub documents: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Find every layer directory below `base_dir` (any directory holding a
/// `layer.yaml`) and assemble a `LayerInfo` for each. Any unreadable or
/// malformed descriptor aborts the whole discovery — no partial forest.
pub fn discover_layers(base_dir: &Path) -> Result<Vec<LayerInfo>> {
    let mut layer_dirs: Vec<PathBuf> = WalkDir::new(base_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == paths::LAYER_FILE)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    layer_dirs.sort();
    layer_dirs.dedup();

    if layer_dirs.is_empty() {
        return Err(AipoError::NoLayers(base_dir.to_path_buf()));
    }

    layer_dirs
        .iter()
        .map(|dir| build_layer_info(base_dir, dir))
        .collect()
}

fn value_to_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn field_string(doc: &Value, key: &str) -> String {
    value_to_string(doc.get(key)).trim().to_string()
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Enumerate the layer's document folder (legacy capitalized variant
/// honored), recursively, hidden files excluded, sorted for stable
/// rendering.
pub fn list_documents(layer_dir: &Path) -> (Option<PathBuf>, Vec<PathBuf>) {
    let Some(docs_dir) =
        paths::pick_existing_dir(layer_dir, &[paths::DOCUMENTS_DIR, paths::DOCUMENTS_DIR_LEGACY])
    else {
        return (None, Vec::new());
    };

    let mut files: Vec<PathBuf> = WalkDir::new(&docs_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && !entry.file_name().to_string_lossy().starts_with('.')
        })
        .filter_map(|entry| entry.path().canonicalize().ok())
        .collect();
    files.sort();

    let docs_dir = docs_dir.canonicalize().unwrap_or(docs_dir);
    (Some(docs_dir), files)
}

/// Read one layer directory into a `LayerInfo`. Missing `tasks.yaml` is
/// fine (zero tasks); a malformed one is fatal.
pub fn build_layer_info(base_dir: &Path, layer_dir: &Path) -> Result<LayerInfo> {
    let layer_doc = reader::read_object(&paths::layer_file(layer_dir))?;

    let tasks_path = paths::tasks_file(layer_dir);
    let tasks_doc = if tasks_path.exists() {
        Some(reader::read_object(&tasks_path)?)
    } else {
        None
    };

    let project_name = {
        let name = field_string(&layer_doc, "project_name");
        if name.is_empty() {
            dir_name(base_dir)
        } else {
            name
        }
    };
    let layer_id = {
        let id = field_string(&layer_doc, "layer_id");
        if id.is_empty() {
            "UNKNOWN".to_string()
        } else {
            id
        }
    };
    let layer_name = {
        let name = field_string(&layer_doc, "layer_name");
        if name.is_empty() {
            dir_name(layer_dir)
        } else {
            name
        }
    };

    // Legacy descriptors use `parent_layer` for the same reference.
    let parent_layer_id = ["parent_layer_id", "parent_layer"]
        .iter()
        .map(|key| field_string(&layer_doc, key))
        .find(|v| !v.is_empty());

    let goal = layer_doc.get("goal").and_then(Value::as_object);
    let goal_description = goal
        .map(|g| value_to_string(g.get("description")).trim().to_string())
        .unwrap_or_default();
    let goal_deliverable = goal
        .and_then(|g| g.get("deliverable"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let (documents_dir, documents) = list_documents(layer_dir);

    let mut tasks: Vec<TaskRow> = Vec::new();
    if let Some(doc) = &tasks_doc {
        let config = CommandConfig::resolve(layer_dir, Some(doc));
        if let Some(list) = doc.get("tasks").and_then(Value::as_array) {
            for entry in list.iter().filter(|t| t.is_object()) {
                tasks.push(build_task_row(layer_dir, &config, entry, &documents));
            }
        }
    }

    Ok(LayerInfo {
        path: layer_dir.to_path_buf(),
        project_name,
        layer_id,
        layer_name,
        goal_description,
        goal_deliverable,
        parent_layer_id,
        tasks,
        documents_dir,
        documents,
    })
}

fn build_task_row(
    layer_dir: &Path,
    config: &CommandConfig,
    entry: &Value,
    documents: &[PathBuf],
) -> TaskRow {
    let estimate_raw = entry
        .get("estimate")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);
    let estimate_hours = estimate_raw.as_deref().and_then(task::parse_estimate_hours);
    if estimate_raw.is_some() && estimate_hours.is_none() {
        tracing::debug!(
            task = %field_string(entry, "id"),
            raw = estimate_raw.as_deref().unwrap_or_default(),
            "unparseable estimate; ETA coverage reduced"
        );
    }

    let command_path = command::resolve_command_path(layer_dir, config, entry);
    let deliverable_paths =
        deliverable::infer_deliverables(layer_dir, entry, command_path.as_deref(), documents);

    TaskRow {
        task_id: field_string(entry, "id"),
        name: field_string(entry, "name"),
        task_type: field_string(entry, "type"),
        status: field_string(entry, "status"),
        estimate_raw,
        estimate_hours,
        command_path,
        deliverable_paths,
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

    #[test]
    fn builds_layer_with_tasks_and_documents() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "layer.yaml",
            "project_name: Alpha\nlayer_id: L0\nlayer_name: Root\ngoal:\n  description: Ship v1\n  deliverable: site\n",
        );
        write(
            dir.path(),
            "tasks.yaml",
            "tasks:\n  - id: T1\n    name: Build\n    type: implementation\n    status: pending\n    estimate: 4h\n  - id: T2\n    name: Bad estimate\n    type: research\n    status: pending\n    estimate: soon\n",
        );
        write(dir.path(), "documents/T1_output.md", "x");

        let layer = build_layer_info(dir.path(), dir.path()).unwrap();
        assert_eq!(layer.project_name, "Alpha");
        assert_eq!(layer.layer_id, "L0");
        assert_eq!(layer.goal_description, "Ship v1");
        assert_eq!(layer.goal_deliverable.as_deref(), Some("site"));
        assert_eq!(layer.documents.len(), 1);
        assert_eq!(layer.tasks.len(), 2);

        let t1 = &layer.tasks[0];
        assert_eq!(t1.estimate_hours, Some(4.0));
        assert_eq!(t1.deliverable_paths.len(), 1);

        let t2 = &layer.tasks[1];
        assert_eq!(t2.estimate_raw.as_deref(), Some("soon"));
        assert_eq!(t2.estimate_hours, None);
    }

    #[test]
    fn missing_tasks_file_means_no_tasks() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_id: L0\n");
        let layer = build_layer_info(dir.path(), dir.path()).unwrap();
        assert!(layer.tasks.is_empty());
        assert!(layer.documents_dir.is_none());
    }

    #[test]
    fn layer_id_defaults_to_unknown() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_name: Anonymous\n");
        let layer = build_layer_info(dir.path(), dir.path()).unwrap();
        assert_eq!(layer.layer_id, "UNKNOWN");
    }

    #[test]
    fn legacy_parent_layer_alias() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_id: L1\nparent_layer: L0\n");
        let layer = build_layer_info(dir.path(), dir.path()).unwrap();
        assert_eq!(layer.parent_layer_id.as_deref(), Some("L0"));
    }

    #[test]
    fn hidden_documents_excluded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_id: L0\n");
        write(dir.path(), "documents/.hidden", "x");
        write(dir.path(), "documents/visible.md", "x");
        let layer = build_layer_info(dir.path(), dir.path()).unwrap();
        assert_eq!(layer.documents.len(), 1);
        assert!(layer.documents[0].ends_with("visible.md"));
    }

    #[test]
    fn discovery_finds_nested_layers() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_id: L0\n");
        write(dir.path(), "sublayers/a/layer.yaml", "layer_id: L1\n");
        write(dir.path(), "sublayers/b/layer.yaml", "layer_id: L2\n");

        let layers = discover_layers(dir.path()).unwrap();
        assert_eq!(layers.len(), 3);
        let ids: Vec<_> = layers.iter().map(|l| l.layer_id.as_str()).collect();
        assert!(ids.contains(&"L0") && ids.contains(&"L1") && ids.contains(&"L2"));
    }

    #[test]
    fn discovery_without_layers_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            discover_layers(dir.path()),
            Err(AipoError::NoLayers(_))
        ));
    }

    #[test]
    fn malformed_layer_aborts_discovery() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layer.yaml", "layer_id: L0\n");
        write(dir.path(), "sublayers/a/layer.yaml", "layer_id: [flow]\n");
        assert!(discover_layers(dir.path()).is_err());
    }
}
