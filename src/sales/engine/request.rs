use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_ALPHA: f64 = 0.05;
pub const DEFAULT_HISTOGRAM_BINS: usize = 10;
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// Hypothesis to test alongside the descriptive summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hypothesis {
    /// The field's population mean equals `mean`.
    OneSample { mean: f64 },
    /// Two product categories share the same mean for the field.
    TwoSample { group_a: String, group_b: String },
}

/// Everything a caller selects before asking for a summary: the field,
/// interval and test thresholds, category filter and optional hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub field: String,
    pub confidence_level: f64,
    pub alpha: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default)]
    pub hypothesis: Option<Hypothesis>,
}

impl AnalysisRequest {
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            field: "quantity".to_string(),
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            alpha: DEFAULT_ALPHA,
            categories: Vec::new(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            hypothesis: None,
        }
    }
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}
