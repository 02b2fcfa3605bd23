use crate::eta::{self, EtaOutcome};
use crate::lang::{self, Lang, Labels};
use crate::layer::LayerInfo;
use crate::paths;
use crate::summary::{self, WorkClassifier};
use crate::task::TaskRow;
use crate::tree::LayerTree;
use chrono::NaiveDate;
use std::path::Path;

// ---------------------------------------------------------------------------
// Markdown helpers
// ---------------------------------------------------------------------------

fn md_link(label: &str, rel_path: &str) -> String {
    format!("[{label}]({rel_path})")
}

fn file_links(from_dir: &Path, paths_list: &[std::path::PathBuf], dash: &str) -> String {
    if paths_list.is_empty() {
        return dash.to_string();
    }
    let items: Vec<String> = paths_list
        .iter()
        .map(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string_lossy().into_owned());
            md_link(&name, &paths::relative_to(from_dir, p))
        })
        .collect();
    items.join("<br>")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the full weekly-review document. Pure function of its inputs:
/// the same snapshot, language, and date always produce byte-identical
/// Markdown. Every link is relative to `report_dir`, the directory the
/// report will be written into, so it resolves from the report itself.
pub fn render(report_dir: &Path, layers: &[LayerInfo], lang: Lang, today: NaiveDate) -> String {
    let labels = lang::labels(lang);
    let classifier = WorkClassifier::with_default_rules();

    let project_name = layers
        .first()
        .map(|l| l.project_name.as_str())
        .unwrap_or("");
    let goal = layers
        .first()
        .map(|l| l.goal_description.as_str())
        .filter(|g| !g.is_empty())
        .unwrap_or(labels.dash);

    let mut out = String::new();
    let mut line = |s: String| {
        out.push_str(&s);
        out.push('\n');
    };

    line(format!(
        "# {} ({}) - {}",
        labels.title,
        today.format("%Y-%m-%d"),
        project_name
    ));
    line(String::new());
    line(format!("## {}", labels.project_goal));
    line(format!("- {goal}"));
    line(String::new());

    line(format!("## {}", labels.project_structure));
    line(structure_table(report_dir, layers, &classifier, lang, labels));
    line(String::new());

    line(format!("## {}", labels.progress));
    for layer in layers {
        let rel = paths::relative_to(report_dir, &layer.path);
        line(format!(
            "### `{}` {} ({})",
            layer.layer_id,
            layer.layer_name,
            md_link(&rel, &rel)
        ));
        line(tasks_table(report_dir, layer, lang, labels));
        line(String::new());
    }

    line(format!("## {}", labels.eta));
    let all_tasks: Vec<TaskRow> = layers.iter().flat_map(|l| l.tasks.clone()).collect();
    for eta_line in eta_section(&eta::estimate(&all_tasks), labels) {
        line(eta_line);
    }
    line(String::new());

    out
}

fn structure_table(
    from_dir: &Path,
    layers: &[LayerInfo],
    classifier: &WorkClassifier,
    lang: Lang,
    labels: &Labels,
) -> String {
    let tree = LayerTree::build(layers);

    let mut lines: Vec<String> = vec![
        labels.layer_table_header.to_string(),
        labels.layer_table_sep.to_string(),
    ];

    // Depth-first over the forest; the Depth column carries hierarchy.
    let mut stack: Vec<(usize, usize)> = tree
        .roots()
        .iter()
        .rev()
        .map(|&idx| (idx, 0))
        .collect();
    while let Some((idx, depth)) = stack.pop() {
        let node = &layers[idx];
        lines.push(structure_row(from_dir, node, depth, classifier, lang, labels));
        for &child in tree.children(idx).iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    lines.join("\n")
}

fn structure_row(
    from_dir: &Path,
    node: &LayerInfo,
    depth: usize,
    classifier: &WorkClassifier,
    lang: Lang,
    labels: &Labels,
) -> String {
    let purpose = if node.goal_description.is_empty() {
        labels.dash
    } else {
        node.goal_description.as_str()
    };

    let mut deliverable_parts: Vec<String> = Vec::new();
    if let Some(deliverable) = &node.goal_deliverable {
        deliverable_parts.push(deliverable.clone());
    }
    if !node.documents.is_empty() {
        // Keep the cell short: at most 3 document links plus the folder.
        let sample_end = node.documents.len().min(3);
        deliverable_parts.push(format!(
            "docs: {}",
            file_links(from_dir, &node.documents[..sample_end], labels.dash)
        ));
        if let Some(docs_dir) = node.documents_dir.as_deref().filter(|d| d.is_dir()) {
            let rel = paths::relative_to(from_dir, docs_dir);
            deliverable_parts.push(format!("dir: {}", md_link(&rel, &rel)));
        }
    }
    let deliverable = if deliverable_parts.is_empty() {
        labels.dash.to_string()
    } else {
        deliverable_parts.join("<br>")
    };

    let layer_label = if node.layer_id.is_empty() && node.layer_name.is_empty() {
        labels.dash.to_string()
    } else {
        format!("`{}` {}", node.layer_id, node.layer_name)
            .trim()
            .to_string()
    };
    let rel = paths::relative_to(from_dir, &node.path);
    let work = summary::summarize_tasks(classifier, &node.tasks, lang);

    format!(
        "| {depth} | {layer_label} | {purpose} | {work} | {deliverable} | {} |",
        md_link(&rel, &rel)
    )
}

fn tasks_table(from_dir: &Path, layer: &LayerInfo, lang: Lang, labels: &Labels) -> String {
    let mut lines: Vec<String> = vec![
        labels.tasks_table_header.to_string(),
        labels.tasks_table_sep.to_string(),
    ];
    if layer.tasks.is_empty() {
        let d = labels.dash;
        lines.push(format!("| {d} | {d} | {d} | {d} | {d} | {d} |"));
        return lines.join("\n");
    }

    for t in &layer.tasks {
        let task_label = if t.task_id.is_empty() && t.name.is_empty() {
            labels.dash.to_string()
        } else {
            format!("`{}` {}", t.task_id, t.name).trim().to_string()
        };
        let task_type = if t.task_type.is_empty() {
            labels.dash.to_string()
        } else {
            lang::localize_task_type(&t.task_type, lang)
        };
        let status = if t.status.is_empty() {
            labels.dash.to_string()
        } else {
            lang::localize_status(&t.status, lang)
        };
        let estimate = t.estimate_raw.as_deref().unwrap_or(labels.dash);
        let command = match &t.command_path {
            Some(p) => {
                let name = p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                md_link(&name, &paths::relative_to(from_dir, p))
            }
            None => labels.dash.to_string(),
        };
        let deliverables = file_links(from_dir, &t.deliverable_paths, labels.dash);
        lines.push(format!(
            "| {task_label} | {task_type} | {status} | {estimate} | {command} | {deliverables} |"
        ));
    }
    lines.join("\n")
}

fn eta_section(outcome: &EtaOutcome, labels: &Labels) -> Vec<String> {
    match outcome {
        EtaOutcome::NoRemaining => vec![
            "- ETA: 0h (no remaining tasks)".to_string(),
            format!("- {}: 100%", labels.coverage_label),
        ],
        EtaOutcome::CannotCompute { .. } => vec![format!("- {}", labels.eta_missing)],
        EtaOutcome::Interval {
            low_hours,
            high_hours,
            coverage,
            ..
        } => {
            let mut lines = vec![
                format!(
                    "- ETA: {} – {} (90% interval)",
                    eta::format_hours(*low_hours),
                    eta::format_hours(*high_hours)
                ),
                format!("- {}: {:.0}%", labels.coverage_label, coverage * 100.0),
            ];
            if *coverage < 1.0 {
                lines.push(format!("- {}", labels.coverage_note));
            }
            lines
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
