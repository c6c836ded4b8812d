use super::domain::{normalize_column_name, Dataset, SalesRecord};
use super::error::DatasetError;
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

const SAMPLE_CSV: &str = include_str!("../../data/sample_sales.csv");

#[derive(Debug, thiserror::Error)]
pub enum SalesImportError {
    #[error("failed to read sales data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid sales CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: could not parse sale date '{value}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate { row: usize, value: String },
    #[error("sales data failed validation: {0}")]
    Dataset(#[from] DatasetError),
}

pub struct SalesCsvImporter;

impl SalesCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Dataset, SalesImportError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading sales CSV");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset, SalesImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers: csv::StringRecord = csv_reader
            .headers()?
            .iter()
            .map(normalize_column_name)
            .collect();
        csv_reader.set_headers(headers);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<SalesRow>().enumerate() {
            let row = row?;
            records.push(row.into_record(index + 1)?);
        }

        let dataset = Dataset::new(records)?;
        debug!(
            rows = dataset.len(),
            fields = ?dataset.schema(),
            "sales dataset loaded"
        );
        Ok(dataset)
    }

    /// Twenty products across four categories, sold over January 2023.
    pub fn sample() -> Result<Dataset, SalesImportError> {
        Self::from_reader(SAMPLE_CSV.as_bytes())
    }
}

/// Writes the dataset with canonical headers.
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), SalesImportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in dataset.records() {
        csv_writer.serialize(ExportRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Headers are normalized before deserializing, so aliases are snake_case.
#[derive(Debug, Deserialize)]
struct SalesRow {
    #[serde(alias = "sale_date")]
    date: String,
    #[serde(alias = "category")]
    product_category: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    product_name: Option<String>,
    #[serde(alias = "units_sold", alias = "units")]
    quantity: u32,
    #[serde(default, alias = "price")]
    unit_price: Option<f64>,
    #[serde(default, alias = "sales")]
    revenue: Option<f64>,
}

impl SalesRow {
    fn into_record(self, row: usize) -> Result<SalesRecord, SalesImportError> {
        let date = parse_date(&self.date).ok_or_else(|| SalesImportError::InvalidDate {
            row,
            value: self.date.clone(),
        })?;

        let mut record = SalesRecord::new(date, self.product_category, self.quantity);
        if let Some(name) = self.product_name {
            record = record.with_product_name(name);
        }
        if let Some(revenue) = self.revenue {
            record = record.with_revenue(revenue);
        }
        if let Some(unit_price) = self.unit_price {
            record = record.with_unit_price(unit_price);
        }
        Ok(record)
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: String,
    product_category: &'a str,
    product_name: Option<&'a str>,
    quantity: u32,
    unit_price: Option<f64>,
    revenue: Option<f64>,
}

impl<'a> From<&'a SalesRecord> for ExportRow<'a> {
    fn from(record: &'a SalesRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            product_category: &record.product_category,
            product_name: record.product_name.as_deref(),
            quantity: record.quantity,
            unit_price: record.unit_price,
            revenue: record.revenue,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::SalesField;

    #[test]
    fn parse_date_accepts_plain_and_rfc3339() {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 5).expect("valid date");
        assert_eq!(parse_date("2023-01-05"), Some(expected));
        assert_eq!(parse_date("2023-01-05T10:00:00Z"), Some(expected));
        assert_eq!(parse_date("05/01/2023"), None);
        assert_eq!(parse_date("  "), None);
    }

    #[test]
    fn canonical_headers_keep_explicit_revenue() {
        let csv = "date,product_category,product_name,quantity,unit_price,revenue\n\
2023-02-01,Home,Lamp,2,10.0,18.0\n";
        let dataset = SalesCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        let record = &dataset.records()[0];
        assert_eq!(record.product_name.as_deref(), Some("Lamp"));
        assert_eq!(record.revenue, Some(18.0));
        assert_eq!(dataset.schema(), &SalesField::ordered());
    }

    #[test]
    fn spaced_and_hyphenated_headers_resolve() {
        let csv = "Sale Date,Category,Product Name,Units Sold,Unit Price\n\
2023-02-01,Home,Lamp,2,10.0\n";
        let dataset = SalesCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        let record = &dataset.records()[0];
        assert_eq!(record.product_category, "Home");
        assert_eq!(record.product_name.as_deref(), Some("Lamp"));
        assert_eq!(record.quantity, 2);
        assert_eq!(record.revenue, Some(20.0));

        let csv = "DATE,Product-Category,Units-Sold\n2023-02-01,Sports,4\n";
        let dataset = SalesCsvImporter::from_reader(csv.as_bytes()).expect("import succeeds");
        assert_eq!(dataset.schema(), &[SalesField::Quantity]);
        assert_eq!(dataset.records()[0].quantity, 4);
    }

    #[test]
    fn sample_dataset_loads() {
        let dataset = SalesCsvImporter::sample().expect("embedded sample parses");
        assert_eq!(dataset.len(), 20);
        assert_eq!(
            dataset.categories(),
            vec!["Clothing", "Electronics", "Home", "Sports"]
        );
    }
}
