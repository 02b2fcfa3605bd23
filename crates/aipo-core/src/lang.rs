use crate::error::AipoError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Lang / LangChoice
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Ja,
    En,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Ja => "ja",
            Lang::En => "en",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested display language. `Auto` defers to content detection; the
/// caller decides how environment overrides map into this value, so the
/// pipeline itself never reads ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LangChoice {
    #[default]
    Auto,
    Fixed(Lang),
}

impl std::str::FromStr for LangChoice {
    type Err = AipoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(LangChoice::Auto),
            "ja" => Ok(LangChoice::Fixed(Lang::Ja)),
            "en" => Ok(LangChoice::Fixed(Lang::En)),
            other => Err(AipoError::InvalidLang(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

static CJK_RE: OnceLock<Regex> = OnceLock::new();

fn cjk_re() -> &'static Regex {
    CJK_RE.get_or_init(|| {
        Regex::new(r"[\u{3040}-\u{30ff}\u{3400}-\u{4dbf}\u{4e00}-\u{9fff}]").unwrap()
    })
}

pub fn contains_cjk(text: &str) -> bool {
    cjk_re().is_match(text)
}

/// Resolve the display language: an explicit choice wins, otherwise a
/// CJK scan of `sample` picks Japanese, defaulting to English.
pub fn resolve(choice: LangChoice, sample: &str) -> Lang {
    match choice {
        LangChoice::Fixed(lang) => lang,
        LangChoice::Auto => {
            if contains_cjk(sample) {
                Lang::Ja
            } else {
                Lang::En
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Fixed report vocabulary for one display language. Free-text fields
/// from descriptors are never translated.
pub struct Labels {
    pub title: &'static str,
    pub project_goal: &'static str,
    pub project_structure: &'static str,
    pub progress: &'static str,
    pub eta: &'static str,
    pub eta_missing: &'static str,
    pub coverage_label: &'static str,
    pub coverage_note: &'static str,
    pub layer_table_header: &'static str,
    pub layer_table_sep: &'static str,
    pub tasks_table_header: &'static str,
    pub tasks_table_sep: &'static str,
    pub dash: &'static str,
}

static LABELS_EN: Labels = Labels {
    title: "Weekly Review",
    project_goal: "Project Goal",
    project_structure: "Project Structure",
    progress: "Progress",
    eta: "Project ETA (90%)",
    eta_missing: "ETA: — (cannot compute because estimates are missing)",
    coverage_label: "Estimate coverage",
    coverage_note: "Note: Some tasks are missing estimates; ETA precision is reduced.",
    layer_table_header: "| Depth | Layer | Purpose | Work Summary | Final Deliverable | Path |",
    layer_table_sep: "|---:|---|---|---|---|---|",
    tasks_table_header: "| Task | Type | Status | Estimate | Command | Deliverables |",
    tasks_table_sep: "|---|---|---|---|---|---|",
    dash: "—",
};

static LABELS_JA: Labels = Labels {
    title: "週次レビュー",
    project_goal: "プロジェクトのゴール",
    project_structure: "プロジェクトの全体構造",
    progress: "プロジェクトの進捗",
    eta: "プロジェクトのETA（90%）",
    eta_missing: "ETA: —（estimate が不足しているため算出不可）",
    coverage_label: "信頼係数（estimate coverage）",
    coverage_note: "注: estimate が未設定のタスクがあるため、レンジの精度は低下します。",
    layer_table_header: "| 階層 | レイヤー | 目的 | 作業概要 | 最終成果物 | パス |",
    layer_table_sep: "|---:|---|---|---|---|---|",
    tasks_table_header: "| タスク | 種別 | ステータス | 見積 | コマンド | 成果物 |",
    tasks_table_sep: "|---|---|---|---|---|---|",
    dash: "—",
};

pub fn labels(lang: Lang) -> &'static Labels {
    match lang {
        Lang::Ja => &LABELS_JA,
        Lang::En => &LABELS_EN,
    }
}

// ---------------------------------------------------------------------------
// Vocabulary localization
// ---------------------------------------------------------------------------

const TASK_TYPE_JA: &[(&str, &str)] = &[
    ("research", "調査"),
    ("implementation", "実装"),
    ("verification", "検証"),
    ("coordination", "調整"),
    ("management", "管理"),
    ("decision", "意思決定"),
    ("design", "設計"),
    ("content", "コンテンツ"),
    ("planning", "計画"),
    ("deployment", "デプロイ"),
    ("review", "レビュー"),
];

const STATUS_JA: &[(&str, &str)] = &[
    ("pending", "未着手"),
    ("in_progress", "進行中"),
    ("completed", "完了"),
    ("verified", "検証済"),
    ("ready", "準備完了"),
    ("pending_init", "初期化待ち"),
];

fn localize(table: &[(&str, &str)], value: &str, lang: Lang) -> String {
    let v = value.trim();
    if v.is_empty() || lang != Lang::Ja {
        return v.to_string();
    }
    let low = v.to_ascii_lowercase();
    table
        .iter()
        .find(|(key, _)| *key == low)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| v.to_string())
}

/// Localize a known task-type tag; unknown tags pass through untouched.
pub fn localize_task_type(value: &str, lang: Lang) -> String {
    localize(TASK_TYPE_JA, value, lang)
}

/// Localize a known status tag; unknown tags pass through untouched.
pub fn localize_status(value: &str, lang: Lang) -> String {
    localize(STATUS_JA, value, lang)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
