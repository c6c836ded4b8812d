use super::error::{DatasetError, StatsError, StatsResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Numeric columns of a sales record that the engine can analyse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesField {
    Quantity,
    UnitPrice,
    Revenue,
}

impl SalesField {
    pub const fn ordered() -> [Self; 3] {
        [Self::Quantity, Self::UnitPrice, Self::Revenue]
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
            Self::Revenue => "revenue",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Quantity => "Units Sold",
            Self::UnitPrice => "Unit Price",
            Self::Revenue => "Revenue",
        }
    }

    /// Resolves a column name, accepting the headers older exports used.
    pub fn from_name(raw: &str) -> Option<Self> {
        match normalize_column_name(raw).as_str() {
            "quantity" | "units_sold" | "units" => Some(Self::Quantity),
            "unit_price" | "price" => Some(Self::UnitPrice),
            "revenue" | "sales" => Some(Self::Revenue),
            _ => None,
        }
    }
}

/// Lowercase snake_case form of a header or field name, so that
/// `"Units Sold"`, `"units-sold"` and `"units_sold"` compare equal.
pub(crate) fn normalize_column_name(raw: &str) -> String {
    raw.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

impl fmt::Display for SalesField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SalesField {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| StatsError::FieldNotFound {
            field: s.trim().to_string(),
        })
    }
}

/// A single sale as loaded from the source data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub product_category: String,
    pub product_name: Option<String>,
    pub quantity: u32,
    pub unit_price: Option<f64>,
    pub revenue: Option<f64>,
}

impl SalesRecord {
    pub fn new(date: NaiveDate, product_category: impl Into<String>, quantity: u32) -> Self {
        Self {
            date,
            product_category: product_category.into(),
            product_name: None,
            quantity,
            unit_price: None,
            revenue: None,
        }
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Sets the unit price and derives revenue unless one was already given.
    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = Some(unit_price);
        if self.revenue.is_none() {
            self.revenue = Some(f64::from(self.quantity) * unit_price);
        }
        self
    }

    pub fn with_revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn value(&self, field: SalesField) -> Option<f64> {
        match field {
            SalesField::Quantity => Some(f64::from(self.quantity)),
            SalesField::UnitPrice => self.unit_price,
            SalesField::Revenue => self.revenue,
        }
    }
}

/// An immutable, schema-checked sequence of sales records.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<SalesRecord>,
    schema: Vec<SalesField>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Result<Self, DatasetError> {
        let Some(first) = records.first() else {
            return Ok(Self::empty());
        };

        let schema: Vec<SalesField> = SalesField::ordered()
            .into_iter()
            .filter(|field| first.value(*field).is_some())
            .collect();

        for (index, record) in records.iter().enumerate() {
            let row = index + 1;
            for field in SalesField::ordered() {
                let value = record.value(field);
                if value.is_some() != schema.contains(&field) {
                    return Err(DatasetError::SchemaMismatch {
                        row,
                        field: field.name(),
                    });
                }
                if let Some(value) = value {
                    if !value.is_finite() || value < 0.0 {
                        return Err(DatasetError::InvalidValue {
                            row,
                            field: field.name(),
                            value,
                        });
                    }
                }
            }
        }

        Ok(Self { records, schema })
    }

    /// A dataset without records. Every field counts as present so callers
    /// see `EmptyInput` rather than `FieldNotFound`.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            schema: SalesField::ordered().to_vec(),
        }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn schema(&self) -> &[SalesField] {
        &self.schema
    }

    pub fn has_field(&self, field: SalesField) -> bool {
        self.schema.contains(&field)
    }

    pub fn resolve_field(&self, name: &str) -> StatsResult<SalesField> {
        let field: SalesField = name.parse()?;
        if self.has_field(field) {
            Ok(field)
        } else {
            Err(StatsError::FieldNotFound {
                field: field.name().to_string(),
            })
        }
    }

    /// Values of a field in record order. Fields outside the schema yield
    /// nothing; use [`Dataset::column`] for checked access by name.
    pub fn values(&self, field: SalesField) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|record| record.value(field))
            .collect()
    }

    pub fn column(&self, name: &str) -> StatsResult<Vec<f64>> {
        let field = self.resolve_field(name)?;
        Ok(self.values(field))
    }

    /// Distinct product categories in ascending order.
    pub fn categories(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|record| record.product_category.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Keeps the records whose category is listed. An empty list keeps
    /// everything.
    pub fn filter_categories<S: AsRef<str>>(&self, categories: &[S]) -> Dataset {
        if categories.is_empty() {
            return self.clone();
        }

        let records = self
            .records
            .iter()
            .filter(|record| {
                categories
                    .iter()
                    .any(|category| category.as_ref().trim() == record.product_category)
            })
            .cloned()
            .collect();

        Dataset {
            records,
            schema: self.schema.clone(),
        }
    }

    /// Values of one field restricted to a single category.
    pub fn group_values(&self, name: &str, category: &str) -> StatsResult<Vec<f64>> {
        let field = self.resolve_field(name)?;
        let category = category.trim();
        Ok(self
            .records
            .iter()
            .filter(|record| record.product_category == category)
            .filter_map(|record| record.value(field))
            .collect())
    }
}
