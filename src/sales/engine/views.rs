use crate::sales::domain::SalesField;
use serde::Serialize;

/// Sample standard deviation, or the reason it could not be estimated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dispersion {
    Estimated { value: f64 },
    InsufficientData { required: usize, actual: usize },
}

impl Dispersion {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Estimated { value } => Some(*value),
            Self::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub field: SalesField,
    pub field_label: &'static str,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: Vec<f64>,
    pub std_dev: Dispersion,
    pub min: f64,
    pub first_quartile: f64,
    pub third_quartile: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence_level: f64,
    pub mean: f64,
    pub margin_of_error: f64,
    pub count: usize,
}

impl ConfidenceInterval {
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    RejectNull,
    FailToReject,
}

impl Decision {
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value < alpha {
            Self::RejectNull
        } else {
            Self::FailToReject
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RejectNull => "reject null",
            Self::FailToReject => "fail to reject",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    OneSample,
    Welch,
}

impl TestKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneSample => "One-sample t-test",
            Self::Welch => "Welch two-sample t-test",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub alpha: f64,
    pub decision: Decision,
    pub decision_label: &'static str,
}

impl TestResult {
    pub(crate) fn new(
        kind: TestKind,
        statistic: f64,
        p_value: f64,
        degrees_of_freedom: f64,
        alpha: f64,
    ) -> Self {
        let decision = Decision::from_p_value(p_value, alpha);
        Self {
            kind,
            statistic,
            p_value,
            degrees_of_freedom,
            alpha,
            decision,
            decision_label: decision.label(),
        }
    }
}

/// Totals and five-number summary for one product category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    pub total: f64,
    pub mean: f64,
    pub min: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub third_quartile: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub record_count: usize,
    pub categories: Vec<String>,
    pub descriptive: DescriptiveStats,
    pub confidence_interval: ConfidenceInterval,
    pub category_breakdown: Vec<CategorySummary>,
    pub histogram: Vec<HistogramBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hypothesis_test: Option<TestResult>,
}
