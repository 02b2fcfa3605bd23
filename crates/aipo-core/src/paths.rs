use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File and directory names
// ---------------------------------------------------------------------------

pub const LAYER_FILE: &str = "layer.yaml";
pub const TASKS_FILE: &str = "tasks.yaml";
pub const CONTEXT_FILE: &str = "context.yaml";

pub const DOCUMENTS_DIR: &str = "documents";
pub const DOCUMENTS_DIR_LEGACY: &str = "Documents";
pub const COMMANDS_DIR: &str = "commands";
pub const COMMANDS_DIR_LEGACY: &str = "Commands";
pub const WEEKLY_REVIEW_DIR: &str = "weekly_review";
pub const PROGRAMS_DIR: &str = "programs";

pub const DEFAULT_NAMING_PATTERN: &str = "{task_id}_{task_name}.md";

pub fn layer_file(layer_dir: &Path) -> PathBuf {
    layer_dir.join(LAYER_FILE)
}

pub fn tasks_file(layer_dir: &Path) -> PathBuf {
    layer_dir.join(TASKS_FILE)
}

// ---------------------------------------------------------------------------
// Filename sanitization
// ---------------------------------------------------------------------------

static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();
static UNSAFE_CHAR_RE: OnceLock<Regex> = OnceLock::new();
static UNDERSCORE_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn whitespace_re() -> &'static Regex {
    WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn unsafe_char_re() -> &'static Regex {
    UNSAFE_CHAR_RE.get_or_init(|| Regex::new(r"[^\w\-.]+").unwrap())
}

fn underscore_run_re() -> &'static Regex {
    UNDERSCORE_RUN_RE.get_or_init(|| Regex::new(r"_{2,}").unwrap())
}

/// Reduce an arbitrary task id or name to a filename-safe token.
///
/// Path separators become underscores, runs of whitespace collapse to a
/// single underscore, and anything outside word characters / `-` / `.`
/// (Unicode letters included) is stripped.
pub fn safe_filename(value: &str) -> String {
    let s = value.trim().replace(['/', '\\'], "_");
    let s = whitespace_re().replace_all(&s, "_");
    let s = unsafe_char_re().replace_all(&s, "");
    let s = underscore_run_re().replace_all(&s, "_");
    let s = s.trim_matches(['_', '.']);
    if s.is_empty() || s == "." || s == ".." {
        "task".to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Path safety
// ---------------------------------------------------------------------------

/// A candidate path is safe when it is relative, non-empty, and never
/// steps upward or through the current directory.
pub fn is_safe_relative(path_str: &str) -> bool {
    let p = Path::new(path_str);
    let mut components = p.components().peekable();
    if components.peek().is_none() {
        return false;
    }
    components.all(|c| matches!(c, Component::Normal(_)))
}

// ---------------------------------------------------------------------------
// Directory lookup / relative links
// ---------------------------------------------------------------------------

/// Return the first candidate directory name that exists under `dir`,
/// matching on the exact entry name first so legacy capitalized folders
/// win on case-insensitive filesystems.
pub fn pick_existing_dir(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    if let Ok(entries) = std::fs::read_dir(dir) {
        let names: Vec<String> = entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        for cand in candidates {
            if names.iter().any(|n| n == cand) {
                return Some(dir.join(cand));
            }
        }
    }
    candidates
        .iter()
        .map(|c| dir.join(c))
        .find(|p| p.is_dir())
}

/// Render `target` relative to `from_dir` for report links. The base
/// directory itself renders as `.`; targets on a different root fall
/// back to their absolute form.
pub fn relative_to(from_dir: &Path, target: &Path) -> String {
    match pathdiff::diff_paths(target, from_dir) {
        Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Some(rel) => rel.to_string_lossy().into_owned(),
        None => target.to_string_lossy().into_owned(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
