use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// TaskRow
// ---------------------------------------------------------------------------

/// One unit of work inside a layer, assembled once per run and never
/// mutated afterward. `task_type` and `status` are free-form tags taken
/// from the task list as-is.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow {
    pub task_id: String,
    pub name: String,
    pub task_type: String,
    pub status: String,
    pub estimate_raw: Option<String>,
    pub estimate_hours: Option<f64>,
    pub command_path: Option<PathBuf>,
    pub deliverable_paths: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// StatusBucket
// ---------------------------------------------------------------------------

/// Coarse classification of a free-form status tag. The tag itself is
/// never rewritten; buckets only drive ETA partitioning and counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Done,
    Pending,
    InProgress,
    Other,
}

impl StatusBucket {
    pub fn from_status(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "completed" | "verified" => StatusBucket::Done,
            "pending" | "pending_init" => StatusBucket::Pending,
            "in_progress" => StatusBucket::InProgress,
            _ => StatusBucket::Other,
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, StatusBucket::Done)
    }
}

impl TaskRow {
    pub fn status_bucket(&self) -> StatusBucket {
        StatusBucket::from_status(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Estimate parsing
// ---------------------------------------------------------------------------

pub const HOURS_PER_DAY: f64 = 8.0;

static ESTIMATE_RE: OnceLock<Regex> = OnceLock::new();

fn estimate_re() -> &'static Regex {
    ESTIMATE_RE.get_or_init(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)\s*(m|h|d)$").unwrap())
}

/// Parse a free-text effort estimate (`"4h"`, `"2d"`, `"90m"`) into
/// hours. Anything outside the `<number><m|h|d>` grammar yields `None`;
/// unparseable estimates only lower ETA coverage, they never fail a run.
pub fn parse_estimate_hours(value: &str) -> Option<f64> {
    let s = value.trim();
    if s.is_empty() {
        return None;
    }
    let caps = estimate_re().captures(s)?;
    let qty: f64 = caps[1].parse().ok()?;
    match caps[2].to_ascii_lowercase().as_str() {
        "m" => Some(qty / 60.0),
        "h" => Some(qty),
        "d" => Some(qty * HOURS_PER_DAY),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

static NAME_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
static SPACE_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn name_prefix_re() -> &'static Regex {
    NAME_PREFIX_RE
        .get_or_init(|| Regex::new(r"(?i)^\s*(Deep Research:|Research:|Verification:)\s*").unwrap())
}

fn space_run_re() -> &'static Regex {
    SPACE_RUN_RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Truncate to `max_chars` characters, appending an ellipsis marker.
pub(crate) fn ellipsize(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Compact task name for fallback summaries: drop boilerplate prefixes,
/// collapse whitespace, cap the length.
pub fn short_task_name(name: &str) -> String {
    let s = name.trim();
    if s.is_empty() {
        return String::new();
    }
    let s = name_prefix_re().replace(s, "");
    let s = space_run_re().replace_all(&s, " ");
    ellipsize(&s, 48)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_units() {
        assert_eq!(parse_estimate_hours("90m"), Some(1.5));
        assert_eq!(parse_estimate_hours("4h"), Some(4.0));
        assert_eq!(parse_estimate_hours("2d"), Some(16.0));
        assert_eq!(parse_estimate_hours("0.5h"), Some(0.5));
    }

    #[test]
    fn estimate_case_and_whitespace() {
        assert_eq!(parse_estimate_hours("  4H  "), Some(4.0));
        assert_eq!(parse_estimate_hours("1D"), Some(8.0));
        assert_eq!(parse_estimate_hours("2 h"), Some(2.0));
    }

    #[test]
    fn estimate_rejects_noise() {
        assert_eq!(parse_estimate_hours("abc"), None);
        assert_eq!(parse_estimate_hours(""), None);
        assert_eq!(parse_estimate_hours("4 hours"), None);
        assert_eq!(parse_estimate_hours("-4h"), None);
        assert_eq!(parse_estimate_hours("h4"), None);
    }

    #[test]
    fn status_buckets() {
        assert_eq!(StatusBucket::from_status("completed"), StatusBucket::Done);
        assert_eq!(StatusBucket::from_status("Verified"), StatusBucket::Done);
        assert_eq!(StatusBucket::from_status("pending"), StatusBucket::Pending);
        assert_eq!(
            StatusBucket::from_status("pending_init"),
            StatusBucket::Pending
        );
        assert_eq!(
            StatusBucket::from_status("in_progress"),
            StatusBucket::InProgress
        );
        assert_eq!(StatusBucket::from_status("blocked"), StatusBucket::Other);
    }

    #[test]
    fn short_name_strips_prefix_and_truncates() {
        assert_eq!(short_task_name("Research: market scan"), "market scan");
        assert_eq!(short_task_name("deep research:  deep  dive"), "deep dive");

        let long = "x".repeat(80);
        let short = short_task_name(&long);
        assert_eq!(short.chars().count(), 48);
        assert!(short.ends_with('…'));
    }
}
