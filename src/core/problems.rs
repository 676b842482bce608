use crate::core::readings::ImpurityReading;
use crate::core::severity::{Severity, SeverityThresholds, classify_severity};
use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

pub const DEFAULT_TOP_N: usize = 3;
pub const MISSING_DESCRIPTION: &str = "No description available";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyProblem {
    pub label: String,
    pub value: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedImpurity {
    pub label: String,
    pub value: f64,
    pub image: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(default)]
    pub image: String,
    pub description: String,
}

/// Descriptive content per skin issue label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkinIssueCatalog(HashMap<String, CatalogEntry>);

static BUILTIN_CATALOG: Lazy<SkinIssueCatalog> = Lazy::new(|| {
    let entries = [
        (
            "Acne",
            "/images/issues/acne.png",
            "Inflamed or clogged follicles showing as papules, pustules or whiteheads.",
        ),
        (
            "Blackheads",
            "/images/issues/blackheads.png",
            "Open comedones where trapped sebum oxidizes and darkens at the surface.",
        ),
        (
            "Pores",
            "/images/issues/pores.png",
            "Visibly enlarged pores, usually around the nose and cheeks.",
        ),
        (
            "Wrinkles",
            "/images/issues/wrinkles.png",
            "Fine lines and creases from reduced elasticity and collagen.",
        ),
        (
            "Redness",
            "/images/issues/redness.png",
            "Diffuse or patchy redness from irritation or sensitivity.",
        ),
        (
            "Dark Circles",
            "/images/issues/dark-circles.png",
            "Darkened skin under the eyes from pigmentation or thin skin.",
        ),
        (
            "Pigmentation",
            "/images/issues/pigmentation.png",
            "Uneven tone and dark spots from excess melanin.",
        ),
        (
            "Oiliness",
            "/images/issues/oiliness.png",
            "Excess sebum giving a shiny look, often in the T-zone.",
        ),
        (
            "Dryness",
            "/images/issues/dryness.png",
            "Tight, flaky or rough skin lacking moisture.",
        ),
    ];

    SkinIssueCatalog(
        entries
            .into_iter()
            .map(|(label, image, description)| {
                (
                    label.to_string(),
                    CatalogEntry {
                        image: image.to_string(),
                        description: description.to_string(),
                    },
                )
            })
            .collect(),
    )
});

impl SkinIssueCatalog {
    pub fn builtin() -> &'static Self {
        &BUILTIN_CATALOG
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog file {}", path.display()))?;
        let catalog: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed parsing catalog file {}", path.display()))?;
        catalog
            .check_unique_labels()
            .with_context(|| format!("invalid catalog file {}", path.display()))?;
        Ok(catalog)
    }

    /// Lookups fall back to a case-insensitive match, so labels must stay
    /// distinct once case is ignored.
    fn check_unique_labels(&self) -> Result<()> {
        let mut labels: Vec<&String> = self.0.keys().collect();
        labels.sort();
        let mut seen = HashSet::new();
        for label in labels {
            if !seen.insert(label.to_ascii_lowercase()) {
                bail!("label {label} duplicates another entry ignoring case");
            }
        }
        Ok(())
    }

    pub fn lookup(&self, label: &str) -> Option<&CatalogEntry> {
        self.0.get(label).or_else(|| {
            self.0
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(label))
                .map(|(_, entry)| entry)
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Highest positive readings first, ties in input order, truncated to `n`.
pub fn top_problems(
    readings: &[ImpurityReading],
    n: usize,
    thresholds: SeverityThresholds,
) -> Vec<KeyProblem> {
    let mut ranked: Vec<&ImpurityReading> =
        readings.iter().filter(|reading| reading.value > 0.0).collect();
    ranked.sort_by(|a, b| b.value.total_cmp(&a.value));

    ranked
        .into_iter()
        .take(n)
        .map(|reading| KeyProblem {
            label: reading.label.clone(),
            value: reading.value,
            severity: classify_severity(reading.value, thresholds),
        })
        .collect()
}

pub fn enrich_impurities(
    readings: &[ImpurityReading],
    catalog: &SkinIssueCatalog,
) -> Vec<EnrichedImpurity> {
    readings
        .iter()
        .map(|reading| {
            let (image, description) = match catalog.lookup(&reading.label) {
                Some(entry) => (entry.image.clone(), entry.description.clone()),
                None => (String::new(), MISSING_DESCRIPTION.to_string()),
            };
            EnrichedImpurity {
                label: reading.label.clone(),
                value: reading.value,
                image,
                description,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(label: &str, value: f64) -> ImpurityReading {
        ImpurityReading::new(label, value)
    }

    #[test]
    fn example_snapshot_ranks_and_classifies() {
        let readings = vec![
            reading("Blackheads", 50.0),
            reading("Acne", 80.0),
            reading("Pores", 65.0),
        ];
        let top = top_problems(&readings, DEFAULT_TOP_N, SeverityThresholds::default());

        let labels: Vec<&str> = top.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Acne", "Pores", "Blackheads"]);
        assert_eq!(top[0].severity, Severity::Severe);
        assert_eq!(top[1].severity, Severity::Moderate);
        assert_eq!(top[2].severity, Severity::Moderate);
    }

    #[test]
    fn ties_keep_input_order() {
        let readings = vec![
            reading("Redness", 40.0),
            reading("Pores", 70.0),
            reading("Dryness", 40.0),
            reading("Oiliness", 40.0),
        ];
        let top = top_problems(&readings, 3, SeverityThresholds::default());
        let labels: Vec<&str> = top.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["Pores", "Redness", "Dryness"]);
    }

    #[test]
    fn drops_non_positive_and_respects_n() {
        let readings = vec![
            reading("Acne", 0.0),
            reading("Pores", 12.0),
            reading("Wrinkles", -3.0),
            reading("Redness", 5.0),
        ];
        let top = top_problems(&readings, 3, SeverityThresholds::default());
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|p| p.value > 0.0));

        assert!(top_problems(&readings, 0, SeverityThresholds::default()).is_empty());
        assert_eq!(top_problems(&readings, 1, SeverityThresholds::default()).len(), 1);
    }

    #[test]
    fn enrich_falls_back_for_unknown_labels() {
        let readings = vec![reading("Acne", 30.0), reading("Freckles", 10.0)];
        let enriched = enrich_impurities(&readings, SkinIssueCatalog::builtin());

        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched[0].image, "/images/issues/acne.png");
        assert_eq!(enriched[1].description, MISSING_DESCRIPTION);
        assert_eq!(enriched[1].image, "");
        assert_eq!(enriched[1].value, 10.0);
    }

    #[test]
    fn lookup_ignores_ascii_case() {
        let catalog = SkinIssueCatalog::builtin();
        assert!(catalog.lookup("dark circles").is_some());
        assert!(catalog.lookup("DARK CIRCLES").is_some());
    }

    #[test]
    fn custom_catalog_replaces_builtin() {
        let catalog: SkinIssueCatalog = serde_json::from_value(serde_json::json!({
            "Scars": {"image": "scars.png", "description": "Healed marks"}
        }))
        .unwrap();
        let enriched = enrich_impurities(&[reading("Acne", 10.0), reading("Scars", 4.0)], &catalog);
        assert_eq!(enriched[0].description, MISSING_DESCRIPTION);
        assert_eq!(enriched[1].description, "Healed marks");
    }

    #[test]
    fn load_rejects_labels_differing_only_by_case() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"{"acne": {"description": "lower"}, "ACNE": {"description": "upper"}}"#,
        )
        .unwrap();
        let err = SkinIssueCatalog::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("ignoring case"));

        std::fs::write(&path, r#"{"Acne": {"description": "only"}}"#).unwrap();
        let catalog = SkinIssueCatalog::load(&path).unwrap();
        assert_eq!(catalog.lookup("ACNE").map(|e| e.description.as_str()), Some("only"));
    }
}
