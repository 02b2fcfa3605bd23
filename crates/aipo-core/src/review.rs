use crate::error::{AipoError, Result};
use crate::lang::{self, LangChoice};
use crate::layer::{self, LayerInfo};
use crate::{io, paths, report};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ReviewOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ReviewOptions {
    /// Program folder: must contain a `layer.yaml` at its top.
    pub base_dir: PathBuf,
    /// Display language; `Auto` samples the root layer's text.
    pub lang: LangChoice,
    /// Report destination; defaults to a dated file under
    /// `weekly_review/` inside the program folder.
    pub out_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the whole weekly-review pipeline and write the report. Returns
/// the written path. Any layer read error aborts with no partial output.
pub fn generate(opts: &ReviewOptions) -> Result<PathBuf> {
    generate_with_date(opts, chrono::Local::now().date_naive())
}

/// Same pipeline with an explicit date, so a snapshot renders
/// reproducibly.
pub fn generate_with_date(opts: &ReviewOptions, today: NaiveDate) -> Result<PathBuf> {
    let base_dir = opts.base_dir.canonicalize().map_err(|_| {
        AipoError::MissingFile(paths::layer_file(&opts.base_dir))
    })?;
    if !paths::layer_file(&base_dir).exists() {
        return Err(AipoError::MissingFile(paths::layer_file(&base_dir)));
    }

    let mut layers = layer::discover_layers(&base_dir)?;
    sort_layers(&mut layers);

    let sample = language_sample(&layers);
    let lang = lang::resolve(opts.lang, &sample);
    tracing::debug!(layers = layers.len(), lang = %lang, "rendering weekly review");

    let out_path = match &opts.out_path {
        Some(p) => p.clone(),
        None => base_dir
            .join(paths::WEEKLY_REVIEW_DIR)
            .join(format!("weekly_review_{}.md", today.format("%Y-%m-%d"))),
    };

    // Links must resolve from where the report lives, so the renderer
    // gets the report directory, not the program folder.
    let report_dir = out_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| base_dir.clone());
    std::fs::create_dir_all(&report_dir)?;
    let report_dir = report_dir.canonicalize().unwrap_or(report_dir);

    let markdown = report::render(&report_dir, &layers, lang, today);
    io::atomic_write(&out_path, markdown.as_bytes())?;
    Ok(out_path)
}

/// Stable report order: layers without an explicit parent first, then
/// by path.
fn sort_layers(layers: &mut [LayerInfo]) {
    layers.sort_by_key(|l| (l.parent_layer_id.is_some(), l.path.clone()));
}

fn language_sample(layers: &[LayerInfo]) -> String {
    match layers.first() {
        Some(root) => format!("{} {}", root.goal_description, root.layer_name),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
