//! Stateless summary statistics over a [`Dataset`].
//!
//! Every operation is a pure function of its arguments: nothing is cached
//! between calls and the dataset is only ever borrowed immutably.

mod request;
mod stats;
mod views;

pub use request::{
    AnalysisRequest, Hypothesis, DEFAULT_ALPHA, DEFAULT_CONFIDENCE_LEVEL, DEFAULT_HISTOGRAM_BINS,
    MAX_HISTOGRAM_BINS,
};
pub use views::{
    CategorySummary, ConfidenceInterval, Decision, DescriptiveStats, Dispersion, HistogramBin,
    SummaryResult, TestKind, TestResult,
};

use super::domain::{Dataset, SalesField};
use super::error::{StatsError, StatsResult};
use stats::Moments;
use tracing::debug;

pub struct SummaryEngine;

impl SummaryEngine {
    /// Count, mean, median, modes, sample standard deviation and quartiles
    /// of a numeric field.
    ///
    /// The field is resolved before the dataset size is checked, so an
    /// unknown field on an empty dataset reports `FieldNotFound`.
    pub fn describe(dataset: &Dataset, field: &str) -> StatsResult<DescriptiveStats> {
        let field = dataset.resolve_field(field)?;
        describe_values(field, &dataset.values(field))
    }

    /// Student-t interval for the mean of a field.
    pub fn confidence_interval(
        dataset: &Dataset,
        field: &str,
        confidence_level: f64,
    ) -> StatsResult<ConfidenceInterval> {
        stats::ensure_probability("confidence level", confidence_level)?;
        let values = dataset.column(field)?;
        let moments = Moments::from_values(&values);
        let std_dev = moments
            .sample_std_dev()
            .ok_or_else(|| StatsError::empty("confidence interval", 2, moments.count))?;

        let n = moments.count as f64;
        let standard_error = std_dev / n.sqrt();
        let t_critical = stats::t_critical(confidence_level, n - 1.0)?;
        let margin_of_error = t_critical * standard_error;

        Ok(ConfidenceInterval {
            lower: moments.mean - margin_of_error,
            upper: moments.mean + margin_of_error,
            confidence_level,
            mean: moments.mean,
            margin_of_error,
            count: moments.count,
        })
    }

    /// Welch's unequal-variance t-test that both groups share a mean.
    ///
    /// Two constant groups with the same value fail to reject with a zero
    /// statistic; constant groups with different values have no defined
    /// statistic and are rejected as an invalid parameter.
    pub fn two_sample_test(
        group_a: &[f64],
        group_b: &[f64],
        alpha: f64,
    ) -> StatsResult<TestResult> {
        stats::ensure_probability("alpha", alpha)?;
        stats::ensure_finite("group value", group_a)?;
        stats::ensure_finite("group value", group_b)?;

        let a = Moments::from_values(group_a);
        let b = Moments::from_values(group_b);
        let var_a = a
            .sample_variance()
            .ok_or_else(|| StatsError::empty("two-sample test (group A)", 2, a.count))?;
        let var_b = b
            .sample_variance()
            .ok_or_else(|| StatsError::empty("two-sample test (group B)", 2, b.count))?;

        let se_a = var_a / a.count as f64;
        let se_b = var_b / b.count as f64;
        let pooled = se_a + se_b;
        let difference = a.mean - b.mean;

        if pooled == 0.0 {
            let df = (a.count + b.count - 2) as f64;
            return constant_samples(TestKind::Welch, difference, df, alpha);
        }

        let statistic = difference / pooled.sqrt();
        let df = pooled.powi(2)
            / (se_a.powi(2) / (a.count - 1) as f64 + se_b.powi(2) / (b.count - 1) as f64);
        let p_value = stats::two_sided_p_value(statistic, df)?;

        debug!(statistic, p_value, df, "welch t-test computed");
        Ok(TestResult::new(TestKind::Welch, statistic, p_value, df, alpha))
    }

    /// One-sample t-test of a field's mean against `hypothesized_mean`.
    pub fn one_sample_test(
        dataset: &Dataset,
        field: &str,
        hypothesized_mean: f64,
        alpha: f64,
    ) -> StatsResult<TestResult> {
        stats::ensure_probability("alpha", alpha)?;
        if !hypothesized_mean.is_finite() {
            return Err(StatsError::invalid(
                "hypothesized mean",
                hypothesized_mean,
                "must be finite",
            ));
        }

        let values = dataset.column(field)?;
        let moments = Moments::from_values(&values);
        let variance = moments
            .sample_variance()
            .ok_or_else(|| StatsError::empty("one-sample test", 2, moments.count))?;

        let df = (moments.count - 1) as f64;
        let difference = moments.mean - hypothesized_mean;
        let standard_error = (variance / moments.count as f64).sqrt();
        if standard_error == 0.0 {
            return constant_samples(TestKind::OneSample, difference, df, alpha);
        }

        let statistic = difference / standard_error;
        let p_value = stats::two_sided_p_value(statistic, df)?;
        debug!(statistic, p_value, df, "one-sample t-test computed");
        Ok(TestResult::new(TestKind::OneSample, statistic, p_value, df, alpha))
    }

    /// Totals and five-number summaries per product category, ordered by
    /// category name.
    pub fn category_breakdown(
        dataset: &Dataset,
        field: &str,
    ) -> StatsResult<Vec<CategorySummary>> {
        let field = dataset.resolve_field(field)?;
        if dataset.is_empty() {
            return Err(StatsError::empty("category breakdown", 1, 0));
        }

        let mut breakdown = Vec::new();
        for category in dataset.categories() {
            let values: Vec<f64> = dataset
                .records()
                .iter()
                .filter(|record| record.product_category == category)
                .filter_map(|record| record.value(field))
                .collect();
            let sorted = stats::sorted(&values);
            let moments = Moments::from_values(&values);
            let (min, max) = (sorted[0], sorted[sorted.len() - 1]);

            breakdown.push(CategorySummary {
                category: category.to_string(),
                count: values.len(),
                total: values.iter().sum(),
                mean: moments.mean.clamp(min, max),
                min,
                first_quartile: stats::quantile_sorted(&sorted, 0.25),
                median: stats::median_sorted(&sorted),
                third_quartile: stats::quantile_sorted(&sorted, 0.75),
                max,
            });
        }

        Ok(breakdown)
    }

    /// Equal-width bins spanning the observed range; the last bin includes
    /// the maximum. At most [`MAX_HISTOGRAM_BINS`] bins are produced.
    pub fn histogram(
        dataset: &Dataset,
        field: &str,
        bins: usize,
    ) -> StatsResult<Vec<HistogramBin>> {
        if bins == 0 {
            return Err(StatsError::invalid("bin count", 0.0, "must be at least 1"));
        }
        if bins > MAX_HISTOGRAM_BINS {
            return Err(StatsError::invalid(
                "bin count",
                bins as f64,
                "exceeds the maximum of 1000 bins",
            ));
        }
        let values = dataset.column(field)?;
        if values.is_empty() {
            return Err(StatsError::empty("histogram", 1, 0));
        }

        let sorted = stats::sorted(&values);
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
        if min == max {
            return Ok(vec![HistogramBin {
                lower: min,
                upper: max,
                count: values.len(),
            }]);
        }

        let width = (max - min) / bins as f64;
        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|index| HistogramBin {
                lower: min + index as f64 * width,
                upper: if index + 1 == bins {
                    max
                } else {
                    min + (index + 1) as f64 * width
                },
                count: 0,
            })
            .collect();

        for value in values {
            let index = (((value - min) / width).floor() as usize).min(bins - 1);
            histogram[index].count += 1;
        }

        Ok(histogram)
    }

    /// Runs the full analysis a dashboard view needs in one call.
    pub fn summarize(dataset: &Dataset, request: &AnalysisRequest) -> StatsResult<SummaryResult> {
        stats::ensure_probability("confidence level", request.confidence_level)?;
        stats::ensure_probability("alpha", request.alpha)?;

        let filtered = dataset.filter_categories(&request.categories);
        debug!(
            field = %request.field,
            records = filtered.len(),
            filtered_out = dataset.len() - filtered.len(),
            "summarizing sales dataset"
        );

        let descriptive = Self::describe(&filtered, &request.field)?;
        let confidence_interval =
            Self::confidence_interval(&filtered, &request.field, request.confidence_level)?;
        let category_breakdown = Self::category_breakdown(&filtered, &request.field)?;
        let histogram = Self::histogram(&filtered, &request.field, request.histogram_bins)?;

        let hypothesis_test = match &request.hypothesis {
            None => None,
            Some(Hypothesis::OneSample { mean }) => Some(Self::one_sample_test(
                &filtered,
                &request.field,
                *mean,
                request.alpha,
            )?),
            Some(Hypothesis::TwoSample { group_a, group_b }) => {
                let a = filtered.group_values(&request.field, group_a)?;
                let b = filtered.group_values(&request.field, group_b)?;
                Some(Self::two_sample_test(&a, &b, request.alpha)?)
            }
        };

        Ok(SummaryResult {
            record_count: filtered.len(),
            categories: filtered
                .categories()
                .into_iter()
                .map(str::to_string)
                .collect(),
            descriptive,
            confidence_interval,
            category_breakdown,
            histogram,
            hypothesis_test,
        })
    }
}

fn describe_values(field: SalesField, values: &[f64]) -> StatsResult<DescriptiveStats> {
    if values.is_empty() {
        return Err(StatsError::empty("describe", 1, 0));
    }

    let sorted = stats::sorted(values);
    let moments = Moments::from_values(values);
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let std_dev = match moments.sample_std_dev() {
        Some(value) => Dispersion::Estimated { value },
        None => Dispersion::InsufficientData {
            required: 2,
            actual: moments.count,
        },
    };

    Ok(DescriptiveStats {
        field,
        field_label: field.label(),
        count: moments.count,
        // rounding can push the running mean just past the extremes
        mean: moments.mean.clamp(min, max),
        median: stats::median_sorted(&sorted),
        mode: stats::modes_sorted(&sorted),
        std_dev,
        min,
        first_quartile: stats::quantile_sorted(&sorted, 0.25),
        third_quartile: stats::quantile_sorted(&sorted, 0.75),
        max,
    })
}

fn constant_samples(
    kind: TestKind,
    difference: f64,
    df: f64,
    alpha: f64,
) -> StatsResult<TestResult> {
    if difference == 0.0 {
        Ok(TestResult::new(kind, 0.0, 1.0, df, alpha))
    } else {
        Err(StatsError::invalid(
            "sample variance",
            0.0,
            "samples are constant with different means, so the t statistic is undefined",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales::SalesRecord;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn quantities(values: &[u32]) -> Dataset {
        let date = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");
        Dataset::new(
            values
                .iter()
                .map(|&quantity| SalesRecord::new(date, "Home", quantity))
                .collect(),
        )
        .expect("valid dataset")
    }

    #[test]
    fn describe_odd_and_even_medians() {
        let even = SummaryEngine::describe(&quantities(&[1, 2, 3, 4]), "quantity").expect("describe");
        assert_relative_eq!(even.median, 2.5);

        let odd = SummaryEngine::describe(&quantities(&[3, 1, 2]), "quantity").expect("describe");
        assert_relative_eq!(odd.median, 2.0);
    }

    #[test]
    fn describe_reports_tied_modes() {
        let stats = SummaryEngine::describe(&quantities(&[1, 1, 2, 2, 3]), "quantity").expect("describe");
        assert_eq!(stats.mode, vec![1.0, 2.0]);
        assert_relative_eq!(stats.mean, 1.8, epsilon = 1e-12);
    }

    #[test]
    fn single_observation_has_no_dispersion() {
        let stats = SummaryEngine::describe(&quantities(&[7]), "quantity").expect("describe");
        assert_eq!(
            stats.std_dev,
            Dispersion::InsufficientData {
                required: 2,
                actual: 1
            }
        );
        assert!(stats.std_dev.value().is_none());
    }

    #[test]
    fn describe_empty_dataset_fails() {
        let err = SummaryEngine::describe(&Dataset::empty(), "quantity").expect_err("no records");
        assert!(matches!(err, StatsError::EmptyInput { required: 1, actual: 0, .. }));
    }

    #[test]
    fn interval_brackets_the_mean() {
        let interval =
            SummaryEngine::confidence_interval(&quantities(&[10, 12, 9, 11, 10]), "quantity", 0.95)
                .expect("interval");
        assert_relative_eq!(interval.mean, 10.4, epsilon = 1e-12);
        assert!(interval.lower <= interval.mean && interval.mean <= interval.upper);
        // t(0.975, 4) * sqrt(1.3 / 5)
        assert_relative_eq!(interval.margin_of_error, 2.776445 * (0.26f64).sqrt(), epsilon = 1e-4);
        assert_eq!(interval.count, 5);
    }

    #[test]
    fn interval_rejects_out_of_range_levels() {
        let dataset = quantities(&[10, 12, 9]);
        for level in [0.0, 1.0, 1.5, -0.2] {
            let err = SummaryEngine::confidence_interval(&dataset, "quantity", level)
                .expect_err("invalid level");
            assert!(matches!(err, StatsError::InvalidParameter { .. }));
        }
    }

    #[test]
    fn interval_needs_two_observations() {
        let err = SummaryEngine::confidence_interval(&quantities(&[4]), "quantity", 0.9)
            .expect_err("one observation");
        assert!(matches!(err, StatsError::EmptyInput { required: 2, actual: 1, .. }));
    }

    #[test]
    fn welch_statistic_and_df() {
        let result = SummaryEngine::two_sample_test(&[1.0, 2.0, 3.0], &[100.0, 101.0, 102.0], 0.05)
            .expect("test runs");
        assert_relative_eq!(result.statistic, -99.0 / (2.0f64 / 3.0).sqrt(), epsilon = 1e-9);
        assert_relative_eq!(result.degrees_of_freedom, 4.0, epsilon = 1e-9);
        assert_eq!(result.decision, Decision::RejectNull);
        assert_eq!(result.decision_label, "reject null");
    }

    #[test]
    fn constant_groups_with_different_means_are_undefined() {
        let err = SummaryEngine::two_sample_test(&[5.0, 5.0], &[6.0, 6.0], 0.05)
            .expect_err("undefined statistic");
        assert!(matches!(err, StatsError::InvalidParameter { .. }));
    }

    #[test]
    fn histogram_covers_every_value() {
        let dataset = quantities(&[1, 2, 2, 3, 4, 5, 9, 10]);
        let bins = SummaryEngine::histogram(&dataset, "quantity", 3).expect("histogram");
        assert_eq!(bins.len(), 3);
        assert_eq!(bins.iter().map(|bin| bin.count).sum::<usize>(), 8);
        assert_relative_eq!(bins[0].lower, 1.0);
        assert_relative_eq!(bins[2].upper, 10.0);
        assert_eq!(bins[2].count, 2);

        let constant = SummaryEngine::histogram(&quantities(&[4, 4, 4]), "quantity", 10)
            .expect("histogram");
        assert_eq!(constant.len(), 1);
        assert_eq!(constant[0].count, 3);

        assert!(matches!(
            SummaryEngine::histogram(&dataset, "quantity", 0),
            Err(StatsError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn histogram_caps_bin_count() {
        let dataset = quantities(&[1, 2, 3]);
        let widest = SummaryEngine::histogram(&dataset, "quantity", MAX_HISTOGRAM_BINS)
            .expect("largest allowed bin count");
        assert_eq!(widest.len(), MAX_HISTOGRAM_BINS);

        for bins in [MAX_HISTOGRAM_BINS + 1, usize::MAX] {
            assert!(matches!(
                SummaryEngine::histogram(&dataset, "quantity", bins),
                Err(StatsError::InvalidParameter { name: "bin count", .. })
            ));
        }
    }

    #[test]
    fn welch_rejects_non_finite_values() {
        let err = SummaryEngine::two_sample_test(&[1.0, f64::NAN], &[2.0, 3.0], 0.05)
            .expect_err("NaN in group A");
        assert!(matches!(err, StatsError::InvalidParameter { name: "group value", .. }));

        let err = SummaryEngine::two_sample_test(&[1.0, 2.0], &[3.0, f64::INFINITY], 0.05)
            .expect_err("infinity in group B");
        assert!(matches!(err, StatsError::InvalidParameter { name: "group value", .. }));
    }

    #[test]
    fn welch_far_tail_p_value_stays_positive() {
        let result = SummaryEngine::two_sample_test(&[1.0, 2.0, 3.0], &[100.0, 101.0, 102.0], 0.05)
            .expect("test runs");
        assert!(result.p_value > 0.0);
    }
}
