pub mod problems;
pub mod readings;
pub mod report;
pub mod score;
pub mod severity;

use crate::config::Config;
use crate::core::problems::{SkinIssueCatalog, enrich_impurities, top_problems};
use crate::core::readings::{ImpurityReading, ReadingSet};
use crate::core::report::{AnalysisReport, AnalysisSource, ImpurityLine, ProblemLine, TrendPoint};
use crate::core::severity::{ColorPreset, SeverityPreset, color_for_value};
use crate::session::Session;
use crate::store::models::{Area, SkinAnalysis};
use crate::store::{self, DataStore, Direction, Query, SKIN_ANALYSES, StoreError};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Everything the analytics functions need to know about presets.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub severity: SeverityPreset,
    pub color: ColorPreset,
    pub clamp_score: bool,
    pub top_n: usize,
}

impl AnalysisOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            severity: cfg.thresholds.severity,
            color: cfg.thresholds.color,
            clamp_score: cfg.thresholds.clamp_score,
            top_n: cfg.analysis.top_n,
        }
    }

    pub fn with_top_n(mut self, top_n: Option<usize>) -> Self {
        if let Some(top_n) = top_n {
            self.top_n = top_n;
        }
        self
    }
}

pub fn analyze(
    readings: &ReadingSet,
    catalog: &SkinIssueCatalog,
    opts: AnalysisOptions,
    source: Option<AnalysisSource>,
) -> AnalysisReport {
    let readings = readings.as_slice();
    let score = score::compute_skin_score(readings, opts.clamp_score);
    let thresholds = opts.severity.thresholds();

    let top = top_problems(readings, opts.top_n, thresholds)
        .into_iter()
        .map(|problem| ProblemLine {
            color: color_for_value(problem.value, opts.color),
            label: problem.label,
            value: problem.value,
            severity: problem.severity,
        })
        .collect();

    let impurities = enrich_impurities(readings, catalog)
        .into_iter()
        .map(|impurity| ImpurityLine {
            color: color_for_value(impurity.value, opts.color),
            label: impurity.label,
            value: impurity.value,
            image: impurity.image,
            description: impurity.description,
        })
        .collect();

    AnalysisReport {
        score,
        label: score::label_for_score(score).to_string(),
        top_problems: top,
        impurities,
        source,
        severity_preset: opts.severity,
        color_preset: opts.color,
    }
}

pub fn load_catalog(path: Option<&Path>) -> Result<SkinIssueCatalog> {
    match path {
        Some(path) => {
            let catalog = SkinIssueCatalog::load(path)?;
            debug!(path = %path.display(), entries = catalog.len(), "loaded issue catalog");
            Ok(catalog)
        }
        None => Ok(SkinIssueCatalog::builtin().clone()),
    }
}

/// Reads a JSON array of `{label, value}` readings from disk.
pub fn load_readings_file(path: &Path) -> Result<ReadingSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed reading readings file {}", path.display()))?;
    let readings: Vec<ImpurityReading> = serde_json::from_str(&content)
        .with_context(|| format!("failed parsing readings file {}", path.display()))?;
    ReadingSet::new(readings)
        .with_context(|| format!("invalid readings in {}", path.display()))
}

fn user_analyses(
    store: &dyn DataStore,
    session: &Session,
    area: Option<Area>,
    direction: Direction,
) -> Result<Vec<SkinAnalysis>, StoreError> {
    let mut query = Query::new().eq("user_id", session.user_id());
    if let Some(area) = area {
        query = query.eq("area", area.as_str());
    }
    store::select_as(
        store,
        SKIN_ANALYSES,
        &query.order_by("created_at", direction),
    )
}

pub fn latest_analysis(
    store: &dyn DataStore,
    session: &Session,
    area: Option<Area>,
) -> Result<SkinAnalysis, StoreError> {
    user_analyses(store, session, area, Direction::Desc)?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(SKIN_ANALYSES, format!("latest for {}", session.user_id())))
}

pub fn score_trend(
    store: &dyn DataStore,
    session: &Session,
    area: Option<Area>,
    opts: AnalysisOptions,
) -> Result<Vec<TrendPoint>, StoreError> {
    user_analyses(store, session, area, Direction::Asc)?
        .into_iter()
        .map(|analysis| {
            let readings = ReadingSet::new(analysis.readings)?;
            let score = score::compute_skin_score(readings.as_slice(), opts.clamp_score);
            Ok(TrendPoint {
                analysis_id: analysis.id,
                area: analysis.area,
                created_at: analysis.created_at,
                score,
                label: score::label_for_score(score).to_string(),
            })
        })
        .collect()
}
