use metrics_exporter_prometheus::PrometheusHandle;
use sales_insight::config::AnalysisDefaults;
use sales_insight::sales::{Dataset, SalesCsvImporter, SalesImportError};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) analysis: AnalysisDefaults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum DataSource {
    Uploaded,
    Sample,
}

impl DataSource {
    pub(crate) const fn label(self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded CSV",
            Self::Sample => "Bundled sample data",
        }
    }
}

pub(crate) fn load_dataset_from_path(
    path: Option<&Path>,
) -> Result<(Dataset, DataSource), SalesImportError> {
    match path {
        Some(path) => Ok((SalesCsvImporter::from_path(path)?, DataSource::Uploaded)),
        None => Ok((SalesCsvImporter::sample()?, DataSource::Sample)),
    }
}

pub(crate) fn load_dataset_from_reader<R: Read>(
    reader: Option<R>,
) -> Result<(Dataset, DataSource), SalesImportError> {
    match reader {
        Some(reader) => Ok((SalesCsvImporter::from_reader(reader)?, DataSource::Uploaded)),
        None => Ok((SalesCsvImporter::sample()?, DataSource::Sample)),
    }
}
