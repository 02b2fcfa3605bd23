use crate::command;
use crate::paths;
use regex::Regex;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Path-candidate extraction
// ---------------------------------------------------------------------------

// Free-text fields mix prose (often Japanese) with embedded paths, so
// extraction runs two passes: a prefix allowlist that survives adjacent
// punctuation, then a permissive contains-a-slash fallback.
static PREFIXED_PATH_RE: OnceLock<Regex> = OnceLock::new();
static SLASH_TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn prefixed_path_re() -> &'static Regex {
    PREFIXED_PATH_RE.get_or_init(|| {
        Regex::new(
            r#"@?(?:Documents|documents|sublayers|site|Context|context|Commands|commands|weekly_review)/[^\s`"'()\[\]{}<>、。（）「」]+"#,
        )
        .unwrap()
    })
}

fn slash_token_re() -> &'static Regex {
    SLASH_TOKEN_RE.get_or_init(|| Regex::new(r"[^\s`]+/[^\s`]+").unwrap())
}

const TRAILING_PUNCT: &[char] = &[')', '）', '.', ',', '、', '。', ':', ';'];

fn clean_candidate(raw: &str) -> String {
    let p = raw.trim().trim_end_matches(TRAILING_PUNCT);
    p.strip_prefix('@').unwrap_or(p).to_string()
}

/// Pull path-like tokens out of free text, deduplicated in first-seen
/// order. URLs are excluded; a leading `@` reference marker is dropped.
pub fn extract_path_candidates(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();

    let mut push = |candidate: String| {
        if !candidate.is_empty() && seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    };

    for m in prefixed_path_re().find_iter(text) {
        push(clean_candidate(m.as_str()));
    }
    for m in slash_token_re().find_iter(text) {
        let token = m.as_str();
        if token.starts_with("http://") || token.starts_with("https://") {
            continue;
        }
        push(clean_candidate(token));
    }
    out
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

const LEGACY_TEXT_FIELDS: &[&str] = &["output", "result", "deliverables", "description", "notes"];

/// Gate a candidate: safe relative form, resolves inside the owning
/// layer directory, and actually exists as a file. Anything else is
/// silently dropped.
fn accept_candidate(layer_dir: &Path, layer_canon: &Path, candidate: &str) -> Option<PathBuf> {
    if !paths::is_safe_relative(candidate) {
        return None;
    }
    let resolved = layer_dir.join(candidate).canonicalize().ok()?;
    if !resolved.starts_with(layer_canon) {
        return None;
    }
    resolved.is_file().then_some(resolved)
}

fn legacy_field_texts(task: &Value) -> Vec<String> {
    let mut texts = Vec::new();
    for field in LEGACY_TEXT_FIELDS {
        match task.get(*field) {
            Some(Value::String(s)) => texts.push(s.clone()),
            Some(Value::Array(items)) => {
                texts.extend(items.iter().filter_map(Value::as_str).map(String::from));
            }
            Some(v @ Value::Object(_)) => {
                if let Ok(s) = serde_json::to_string(v) {
                    texts.push(s);
                }
            }
            _ => {}
        }
    }
    texts
}

/// Best-effort inference of a task's output files. Three sources, in
/// order: document files whose name contains the task id or command
/// token, path tokens in the command file's Outputs section, and path
/// tokens in legacy free-text fields. Never fails the run.
pub fn infer_deliverables(
    layer_dir: &Path,
    task: &Value,
    command_path: Option<&Path>,
    documents: &[PathBuf],
) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    let mut seen: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();
    let mut push = |p: PathBuf| {
        if seen.insert(p.clone()) {
            out.push(p);
        }
    };

    let task_id = task.get("id").and_then(Value::as_str).unwrap_or("").trim();
    let command_token = task
        .get("command")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim();

    for doc in documents {
        let name = doc
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if (!task_id.is_empty() && name.contains(task_id))
            || (!command_token.is_empty() && name.contains(command_token))
        {
            push(doc.clone());
        }
    }

    let Ok(layer_canon) = layer_dir.canonicalize() else {
        return out;
    };

    if let Some(cmd) = command_path {
        if let Ok(text) = std::fs::read_to_string(cmd) {
            for line in command::extract_outputs(&text) {
                for candidate in extract_path_candidates(&line) {
                    if let Some(p) = accept_candidate(layer_dir, &layer_canon, &candidate) {
                        push(p);
                    }
                }
            }
        }
    }

    for text in legacy_field_texts(task) {
        for candidate in extract_path_candidates(&text) {
            if let Some(p) = accept_candidate(layer_dir, &layer_canon, &candidate) {
                push(p);
            }
        }
    }

    out
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
    fn candidates_prefixed_and_fallback() {
        let text = "成果物は documents/report.md と site/index.html に置く";
        assert_eq!(
            extract_path_candidates(text),
            vec!["documents/report.md", "site/index.html"]
        );
    }

    #[test]
    fn candidates_strip_at_marker_and_punctuation() {
        assert_eq!(
            extract_path_candidates("see @documents/plan.md."),
            vec!["documents/plan.md"]
        );
        // Japanese punctuation hugging the path must not leak into it.
        let cands = extract_path_candidates("（documents/仕様.md）を更新");
        assert_eq!(cands[0], "documents/仕様.md");
    }

    #[test]
    fn candidates_exclude_urls() {
        assert_eq!(
            extract_path_candidates("see https://example.com/x and notes/todo.md"),
            vec!["notes/todo.md"]
        );
    }

    #[test]
    fn candidates_dedup_first_seen() {
        let text = "documents/a.md then documents/a.md again";
        assert_eq!(extract_path_candidates(text), vec!["documents/a.md"]);
    }

    fn layer_with_doc(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn documents_matched_by_task_id() {
        let dir = TempDir::new().unwrap();
        let hit = layer_with_doc(&dir, "documents/T1_report.md", "x");
        let miss = layer_with_doc(&dir, "documents/other.md", "x");
        let docs = vec![hit.canonicalize().unwrap(), miss.canonicalize().unwrap()];

        let task = json!({"id": "T1", "name": "Report"});
        let found = infer_deliverables(dir.path(), &task, None, &docs);
        assert_eq!(found, vec![hit.canonicalize().unwrap()]);
    }

    #[test]
    fn outputs_section_paths_resolved() {
        let dir = TempDir::new().unwrap();
        let doc = layer_with_doc(&dir, "documents/out.md", "x");
        let cmd = layer_with_doc(&dir, "commands/T1_Go.md", "## Outputs\n- documents/out.md\n");

        let task = json!({"id": "T1", "name": "Go"});
        let found = infer_deliverables(dir.path(), &task, Some(&cmd), &[]);
        assert_eq!(found, vec![doc.canonicalize().unwrap()]);
    }

    #[test]
    fn traversal_and_absolute_candidates_dropped() {
        let dir = TempDir::new().unwrap();
        layer_with_doc(&dir, "documents/safe.md", "x");
        let cmd = layer_with_doc(
            &dir,
            "commands/T1_Go.md",
            "## Outputs\n- ../../etc/passwd\n- /etc/passwd\n- documents/safe.md\n",
        );

        let task = json!({"id": "T1", "name": "Go"});
        let found = infer_deliverables(dir.path(), &task, Some(&cmd), &[]);
        assert_eq!(
            found,
            vec![dir.path().join("documents/safe.md").canonicalize().unwrap()]
        );
    }

    #[test]
    fn legacy_fields_scanned_for_paths() {
        let dir = TempDir::new().unwrap();
        let doc = layer_with_doc(&dir, "documents/result.md", "x");

        let task = json!({
            "id": "T9",
            "name": "Legacy",
            "result": "documents/result.md に保存済み",
            "notes": ["also documents/result.md"],
        });
        let found = infer_deliverables(dir.path(), &task, None, &[]);
        assert_eq!(found, vec![doc.canonicalize().unwrap()]);
    }

    #[test]
    fn nonexistent_paths_dropped() {
        let dir = TempDir::new().unwrap();
        let task = json!({"id": "T1", "result": "documents/ghost.md"});
        assert!(infer_deliverables(dir.path(), &task, None, &[]).is_empty());
    }
}
