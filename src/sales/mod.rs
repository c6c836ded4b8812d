pub mod domain;
pub mod engine;
pub mod error;
pub mod importer;

pub use domain::{Dataset, SalesField, SalesRecord};
pub use engine::{
    AnalysisRequest, CategorySummary, ConfidenceInterval, Decision, DescriptiveStats, Dispersion,
    HistogramBin, Hypothesis, SummaryEngine, SummaryResult, TestKind, TestResult,
};
pub use error::{DatasetError, StatsError, StatsResult};
pub use importer::{write_csv, SalesCsvImporter, SalesImportError};
