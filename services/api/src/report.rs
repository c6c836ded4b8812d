use crate::infra::{load_dataset_from_path, DataSource};
use clap::Args;
use sales_insight::config::AppConfig;
use sales_insight::error::AppError;
use sales_insight::sales::{
    write_csv, AnalysisRequest, Dispersion, Hypothesis, SummaryEngine, SummaryResult,
};
use sales_insight::telemetry;
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Sales CSV to analyse (defaults to the bundled sample dataset)
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Numeric field to summarize: quantity, unit_price or revenue
    #[arg(long, default_value = "quantity")]
    pub(crate) field: String,
    /// Confidence level for the interval, strictly between 0 and 1
    #[arg(long)]
    pub(crate) confidence_level: Option<f64>,
    /// Significance threshold for the hypothesis test
    #[arg(long)]
    pub(crate) alpha: Option<f64>,
    /// Only analyse these product categories (repeatable)
    #[arg(long = "category")]
    pub(crate) categories: Vec<String>,
    /// Run a one-sample t-test against this hypothesized mean
    #[arg(long, conflicts_with = "compare")]
    pub(crate) test_mean: Option<f64>,
    /// Run a Welch t-test between two categories
    #[arg(long, num_args = 2, value_names = ["GROUP_A", "GROUP_B"])]
    pub(crate) compare: Option<Vec<String>>,
    /// Number of histogram bins
    #[arg(long)]
    pub(crate) bins: Option<usize>,
    /// Write the (filtered) dataset to this CSV path
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

pub(crate) fn run_summary_report(args: SummaryArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let SummaryArgs {
        csv,
        field,
        confidence_level,
        alpha,
        categories,
        test_mean,
        compare,
        bins,
        export,
    } = args;

    let (dataset, source) = load_dataset_from_path(csv.as_deref())?;

    let hypothesis = match (test_mean, compare) {
        (Some(mean), _) => Some(Hypothesis::OneSample { mean }),
        (None, Some(groups)) => {
            // clap guarantees two values per --compare; the first pair wins
            let mut groups = groups.into_iter();
            match (groups.next(), groups.next()) {
                (Some(group_a), Some(group_b)) => Some(Hypothesis::TwoSample { group_a, group_b }),
                _ => None,
            }
        }
        (None, None) => None,
    };

    let request = AnalysisRequest {
        field,
        confidence_level: confidence_level.unwrap_or(config.analysis.confidence_level),
        alpha: alpha.unwrap_or(config.analysis.alpha),
        categories,
        histogram_bins: bins.unwrap_or(config.analysis.histogram_bins),
        hypothesis,
    };

    let summary = SummaryEngine::summarize(&dataset, &request)?;

    if let Some(path) = export {
        let filtered = dataset.filter_categories(&request.categories);
        write_csv(&filtered, File::create(&path)?)?;
        info!(path = %path.display(), rows = filtered.len(), "exported sales data");
    }

    render_summary(&summary, &request, source);
    Ok(())
}

fn render_summary(summary: &SummaryResult, request: &AnalysisRequest, source: DataSource) {
    let descriptive = &summary.descriptive;

    println!("Sales data summary");
    println!("Data source: {}", source.label());
    println!(
        "Records analysed: {} across {}",
        summary.record_count,
        summary.categories.join(", ")
    );

    println!("\nDescriptive statistics ({})", descriptive.field_label);
    println!("- Count: {}", descriptive.count);
    println!("- Mean: {:.2}", descriptive.mean);
    println!("- Median: {:.2}", descriptive.median);
    println!("- Mode: {}", format_values(&descriptive.mode));
    match descriptive.std_dev {
        Dispersion::Estimated { value } => println!("- Std. deviation: {value:.2}"),
        Dispersion::InsufficientData { required, actual } => println!(
            "- Std. deviation: insufficient data ({actual} of {required} observations)"
        ),
    }
    println!(
        "- Min / Q1 / Q3 / Max: {:.2} / {:.2} / {:.2} / {:.2}",
        descriptive.min, descriptive.first_quartile, descriptive.third_quartile, descriptive.max
    );

    let interval = &summary.confidence_interval;
    println!(
        "\n{:.0}% confidence interval: ({:.2}, {:.2})",
        interval.confidence_level * 100.0,
        interval.lower,
        interval.upper
    );

    match &summary.hypothesis_test {
        Some(test) => {
            println!("\n{}", test.kind.label());
            println!(
                "- t = {:.4}, df = {:.2}, p-value = {:.4}",
                test.statistic, test.degrees_of_freedom, test.p_value
            );
            println!("- Decision at alpha {}: {}", test.alpha, test.decision_label);
        }
        None => println!("\nHypothesis test: none requested"),
    }

    println!("\nBy category");
    for entry in &summary.category_breakdown {
        println!(
            "- {}: {} records, total {:.2}, median {:.2} (range {:.2}-{:.2})",
            entry.category, entry.count, entry.total, entry.median, entry.min, entry.max
        );
    }

    println!("\nHistogram ({} bins)", request.histogram_bins);
    for bin in &summary.histogram {
        println!(
            "- [{:>8.2}, {:>8.2}] {}",
            bin.lower,
            bin.upper,
            "#".repeat(bin.count)
        );
    }
}

fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| format!("{value:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_values_lists_ties() {
        assert_eq!(format_values(&[1.0, 2.5]), "1.00, 2.50");
        assert_eq!(format_values(&[]), "");
    }
}
