use crate::lang::Lang;
use crate::task::{self, TaskRow};
use regex::Regex;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// WorkCategory
// ---------------------------------------------------------------------------

/// Coarse work category inferred from a layer's tasks. Advisory only —
/// ambiguous task names may land in the wrong bucket, and that is fine
/// for a one-line summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkCategory {
    Research,
    Requirements,
    Planning,
    Design,
    Implementation,
    Verification,
    Content,
    Coordination,
    Ops,
}

impl WorkCategory {
    /// Tie-break priority when match counts are equal (lower wins).
    pub fn priority(self) -> usize {
        match self {
            WorkCategory::Requirements => 0,
            WorkCategory::Research => 1,
            WorkCategory::Design => 2,
            WorkCategory::Implementation => 3,
            WorkCategory::Content => 4,
            WorkCategory::Verification => 5,
            WorkCategory::Planning => 6,
            WorkCategory::Ops => 7,
            WorkCategory::Coordination => 8,
        }
    }

    pub fn label(self, lang: Lang) -> &'static str {
        match (self, lang) {
            (WorkCategory::Research, Lang::Ja) => "調査・分析",
            (WorkCategory::Research, Lang::En) => "Research & analysis",
            (WorkCategory::Requirements, Lang::Ja) => "要件整理・仕様策定",
            (WorkCategory::Requirements, Lang::En) => "Requirements & specs",
            (WorkCategory::Planning, Lang::Ja) => "計画・意思決定",
            (WorkCategory::Planning, Lang::En) => "Planning & decisions",
            (WorkCategory::Design, Lang::Ja) => "設計",
            (WorkCategory::Design, Lang::En) => "Design",
            (WorkCategory::Implementation, Lang::Ja) => "実装・構築",
            (WorkCategory::Implementation, Lang::En) => "Implementation",
            (WorkCategory::Verification, Lang::Ja) => "検証・レビュー",
            (WorkCategory::Verification, Lang::En) => "Verification",
            (WorkCategory::Content, Lang::Ja) => "コンテンツ制作",
            (WorkCategory::Content, Lang::En) => "Content creation",
            (WorkCategory::Coordination, Lang::Ja) => "調整",
            (WorkCategory::Coordination, Lang::En) => "Coordination",
            (WorkCategory::Ops, Lang::Ja) => "運用・リリース",
            (WorkCategory::Ops, Lang::En) => "Ops & release",
        }
    }
}

// ---------------------------------------------------------------------------
// CategoryRule / WorkClassifier
// ---------------------------------------------------------------------------

/// One inference rule: a task matches the category when its type tag is
/// in `task_types` or its name matches `name_pattern`. Rules are
/// independent — a task may match several categories.
pub struct CategoryRule {
    pub category: WorkCategory,
    pub task_types: &'static [&'static str],
    name_pattern: Regex,
}

impl CategoryRule {
    pub fn new(
        category: WorkCategory,
        task_types: &'static [&'static str],
        name_pattern: &str,
    ) -> Self {
        Self {
            category,
            task_types,
            name_pattern: Regex::new(name_pattern).expect("invalid category rule pattern"),
        }
    }

    fn matches(&self, task: &TaskRow) -> bool {
        let ttype = task.task_type.trim().to_ascii_lowercase();
        if self.task_types.contains(&ttype.as_str()) {
            return true;
        }
        let name = task.name.trim();
        !name.is_empty() && self.name_pattern.is_match(&name.to_lowercase())
    }
}

pub struct WorkClassifier {
    rules: Vec<CategoryRule>,
}

impl WorkClassifier {
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    pub fn with_default_rules() -> Self {
        Self::new(default_rules())
    }

    /// Up to two dominant categories for a task set, ranked by match
    /// count, ties broken by fixed priority.
    pub fn dominant_categories(&self, tasks: &[TaskRow]) -> Vec<WorkCategory> {
        let mut counts: HashMap<WorkCategory, usize> = HashMap::new();
        for t in tasks {
            for rule in &self.rules {
                if rule.matches(t) {
                    *counts.entry(rule.category).or_insert(0) += 1;
                }
            }
        }
        let mut ranked: Vec<(WorkCategory, usize)> = counts.into_iter().collect();
        ranked.sort_by_key(|(cat, count)| (std::cmp::Reverse(*count), cat.priority()));
        ranked.into_iter().take(2).map(|(cat, _)| cat).collect()
    }
}

/// Default rule set. Name patterns run against the lowercased task name,
/// so the Japanese alternatives carry no case classes and the English
/// ones are plain lowercase words.
pub fn default_rules() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new(
            WorkCategory::Research,
            &["research"],
            r"(調査|リサーチ|分析|ヒアリング|インタビュー|競合|市場)|\b(research|analy[sz]e|analysis|interview|survey|competitor|market)\b",
        ),
        CategoryRule::new(
            WorkCategory::Requirements,
            &[],
            r"(要件|仕様|要約|整理|課題|仮説|kpi|okr|ゴール)|\b(requirements?|specs?|specification|scope|kpi|okr|goal)\b",
        ),
        CategoryRule::new(
            WorkCategory::Planning,
            &["planning", "management", "decision"],
            r"(計画|プランニング|ロードマップ)|\b(plan|planning|roadmap|prioriti[sz]e)\b",
        ),
        CategoryRule::new(
            WorkCategory::Design,
            &["design"],
            r"(設計|デザイン|ワイヤ|ux|ui|情報設計)|\b(design|ux|ui|wireframe|architecture)\b",
        ),
        CategoryRule::new(
            WorkCategory::Implementation,
            &["implementation", "deployment"],
            r"(実装|開発|構築|作成|作る|生成|コーディング)|\b(implement|build|develop|coding|prototype)\b",
        ),
        CategoryRule::new(
            WorkCategory::Verification,
            &["verification", "review"],
            r"(検証|テスト|確認|レビュー|qa)|\b(test|verify|review|qa|validate)\b",
        ),
        CategoryRule::new(
            WorkCategory::Content,
            &["content"],
            r"(執筆|記事|ライティング|コンテンツ|コピー|文章)|\b(content|copy|write|writing|article)\b",
        ),
        CategoryRule::new(
            WorkCategory::Ops,
            &[],
            r"(運用|リリース|公開|配信|デプロイ)|\b(deploy|release|launch|publish|operations?)\b",
        ),
        CategoryRule::new(
            WorkCategory::Coordination,
            &["coordination"],
            r"(調整|連携|合意|依頼|問い合わせ)|\b(coordination|align|sync|stakeholder)\b",
        ),
    ]
}

// ---------------------------------------------------------------------------
// Sentence rendering
// ---------------------------------------------------------------------------

const MAX_SUMMARY_CHARS: usize = 140;

/// One-sentence description of a layer's work, localized, compact.
/// Falls back to naming one example task when no category matches, and
/// to a dash when the layer has no tasks at all.
pub fn summarize_tasks(classifier: &WorkClassifier, tasks: &[TaskRow], lang: Lang) -> String {
    if tasks.is_empty() {
        return "—".to_string();
    }

    let cats = classifier.dominant_categories(tasks);
    let sentence = match cats.as_slice() {
        [only] => match lang {
            Lang::Ja => format!("{}を進め、目的に沿った成果物を整える。", only.label(lang)),
            Lang::En => format!(
                "Advance {} to produce the outputs needed for this layer’s goal.",
                only.label(lang)
            ),
        },
        [first, second, ..] => match lang {
            Lang::Ja => format!(
                "{}を軸に、{}まで進めて成果物を整える。",
                first.label(lang),
                second.label(lang)
            ),
            Lang::En => format!(
                "Advance {} and {} to produce the outputs needed for this layer’s goal.",
                first.label(lang),
                second.label(lang)
            ),
        },
        [] => {
            let example = tasks
                .iter()
                .map(|t| task::short_task_name(&t.name))
                .find(|n| !n.is_empty());
            match (lang, example) {
                (Lang::Ja, Some(example)) => {
                    format!("{example}などを進め、目的達成に必要な作業を具体化する。")
                }
                (Lang::Ja, None) => "目的達成に必要な作業を具体化する。".to_string(),
                (Lang::En, Some(example)) => format!(
                    "Progress items like {example} to clarify the work needed for this layer’s goal."
                ),
                (Lang::En, None) => "Clarify the work needed for this layer’s goal.".to_string(),
            }
        }
    };

    task::ellipsize(&sentence, MAX_SUMMARY_CHARS)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, task_type: &str) -> TaskRow {
        TaskRow {
            task_id: "T".to_string(),
            name: name.to_string(),
            task_type: task_type.to_string(),
            status: "pending".to_string(),
            estimate_raw: None,
            estimate_hours: None,
            command_path: None,
            deliverable_paths: Vec::new(),
        }
    }

    #[test]
    fn type_tag_matches_category() {
        let c = WorkClassifier::with_default_rules();
        let cats = c.dominant_categories(&[row("anything", "research")]);
        assert_eq!(cats, vec![WorkCategory::Research]);
    }

    #[test]
    fn name_keywords_match_both_languages() {
        let c = WorkClassifier::with_default_rules();
        assert_eq!(
            c.dominant_categories(&[row("競合の市場調査", "")]),
            vec![WorkCategory::Research]
        );
        assert_eq!(
            c.dominant_categories(&[row("Build the prototype", "")]),
            vec![WorkCategory::Implementation]
        );
    }

    #[test]
    fn dominant_two_by_count() {
        let c = WorkClassifier::with_default_rules();
        let tasks = vec![
            row("implement api", "implementation"),
            row("implement ui", "implementation"),
            row("verify api", "verification"),
        ];
        let cats = c.dominant_categories(&tasks);
        assert_eq!(
            cats,
            vec![WorkCategory::Implementation, WorkCategory::Verification]
        );
    }

    #[test]
    fn tie_breaks_by_priority() {
        let c = WorkClassifier::with_default_rules();
        let tasks = vec![row("deploy it", "deployment"), row("survey users", "research")];
        // one match each; research outranks implementation
        let cats = c.dominant_categories(&tasks);
        assert_eq!(
            cats,
            vec![WorkCategory::Research, WorkCategory::Implementation]
        );
    }

    #[test]
    fn a_task_can_match_multiple_categories() {
        let c = WorkClassifier::with_default_rules();
        let cats = c.dominant_categories(&[row("design and build the site", "")]);
        assert!(cats.contains(&WorkCategory::Design));
        assert!(cats.contains(&WorkCategory::Implementation));
    }

    #[test]
    fn sentence_single_category_en() {
        let c = WorkClassifier::with_default_rules();
        let s = summarize_tasks(&c, &[row("implement api", "implementation")], Lang::En);
        assert_eq!(
            s,
            "Advance Implementation to produce the outputs needed for this layer’s goal."
        );
    }

    #[test]
    fn sentence_two_categories_ja() {
        let c = WorkClassifier::with_default_rules();
        let tasks = vec![
            row("記事の執筆", "content"),
            row("記事のレビュー", "verification"),
        ];
        let s = summarize_tasks(&c, &tasks, Lang::Ja);
        assert!(s.contains("コンテンツ制作"), "{s}");
        assert!(s.contains("検証・レビュー"), "{s}");
    }

    #[test]
    fn fallback_names_an_example_task() {
        let c = WorkClassifier::with_default_rules();
        let s = summarize_tasks(&c, &[row("xyzzy", "")], Lang::En);
        assert!(s.contains("xyzzy"), "{s}");
    }

    #[test]
    fn empty_tasks_is_dash() {
        let c = WorkClassifier::with_default_rules();
        assert_eq!(summarize_tasks(&c, &[], Lang::En), "—");
    }

    #[test]
    fn summary_stays_compact() {
        let c = WorkClassifier::with_default_rules();
        let long_name = "verylongword".repeat(10);
        let s = summarize_tasks(&c, &[row(&long_name, "")], Lang::En);
        assert!(s.chars().count() <= 140, "{s}");
        assert!(s.starts_with("Progress items like"), "{s}");
    }
}
