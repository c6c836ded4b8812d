//! Slice-level statistics shared by the engine operations.

use crate::sales::error::{StatsError, StatsResult};
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::cmp::Ordering;

/// Running mean and sum of squared deviations (Welford).
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Moments {
    pub(crate) count: usize,
    pub(crate) mean: f64,
    m2: f64,
}

impl Moments {
    pub(crate) fn from_values(values: &[f64]) -> Self {
        let mut moments = Self::default();
        for &value in values {
            moments.count += 1;
            let delta = value - moments.mean;
            moments.mean += delta / moments.count as f64;
            moments.m2 += delta * (value - moments.mean);
        }
        moments
    }

    /// Sample variance with Bessel's correction; `None` below two values.
    pub(crate) fn sample_variance(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let variance = self.m2 / (self.count - 1) as f64;
        // rounding can leave a tiny negative value; NaN must survive
        Some(if variance < 0.0 { 0.0 } else { variance })
    }

    pub(crate) fn sample_std_dev(&self) -> Option<f64> {
        self.sample_variance().map(f64::sqrt)
    }
}

pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Linear interpolation between order statistics (`h = (n - 1) * p`).
/// `sorted` must be non-empty and ascending.
pub(crate) fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lower = h.floor() as usize;
    let upper = h.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = h - lower as f64;
    sorted[lower] + weight * (sorted[upper] - sorted[lower])
}

pub(crate) fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Every value sharing the highest frequency, ascending.
pub(crate) fn modes_sorted(sorted: &[f64]) -> Vec<f64> {
    let mut runs: Vec<(f64, usize)> = Vec::new();
    for &value in sorted {
        match runs.last_mut() {
            Some((current, count)) if *current == value => *count += 1,
            _ => runs.push((value, 1)),
        }
    }

    let best = runs.iter().map(|(_, count)| *count).max().unwrap_or(0);
    runs.into_iter()
        .filter(|(_, count)| *count == best)
        .map(|(value, _)| value)
        .collect()
}

fn students_t(df: f64) -> StatsResult<StudentsT> {
    StudentsT::new(0.0, 1.0, df)
        .map_err(|_| StatsError::invalid("degrees of freedom", df, "must be positive"))
}

/// Two-sided critical value for a confidence level in (0, 1).
pub(crate) fn t_critical(confidence_level: f64, df: f64) -> StatsResult<f64> {
    Ok(students_t(df)?.inverse_cdf((1.0 + confidence_level) / 2.0))
}

/// Two-sided p-value for a t statistic.
pub(crate) fn two_sided_p_value(statistic: f64, df: f64) -> StatsResult<f64> {
    if !statistic.is_finite() {
        return Err(StatsError::invalid("t statistic", statistic, "must be finite"));
    }
    let upper_tail = students_t(df)?.sf(statistic.abs());
    Ok((2.0 * upper_tail).clamp(0.0, 1.0))
}

pub(crate) fn ensure_finite(name: &'static str, values: &[f64]) -> StatsResult<()> {
    match values.iter().find(|value| !value.is_finite()) {
        Some(&value) => Err(StatsError::invalid(name, value, "must be finite")),
        None => Ok(()),
    }
}

pub(crate) fn ensure_probability(name: &'static str, value: f64) -> StatsResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(StatsError::invalid(name, value, "must be strictly between 0 and 1"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn moments_match_textbook_variance() {
        let moments = Moments::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(moments.count, 8);
        assert_relative_eq!(moments.mean, 5.0, epsilon = 1e-12);
        assert_relative_eq!(moments.sample_variance().expect("n >= 2"), 32.0 / 7.0, epsilon = 1e-12);
        assert!(Moments::from_values(&[3.0]).sample_std_dev().is_none());
    }

    #[test]
    fn quantiles_interpolate() {
        let values = sorted(&[4.0, 1.0, 3.0, 2.0]);
        assert_relative_eq!(quantile_sorted(&values, 0.25), 1.75, epsilon = 1e-12);
        assert_relative_eq!(quantile_sorted(&values, 0.5), 2.5, epsilon = 1e-12);
        assert_relative_eq!(quantile_sorted(&values, 1.0), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn modes_keep_ties() {
        assert_eq!(modes_sorted(&[1.0, 1.0, 2.0, 2.0, 3.0]), vec![1.0, 2.0]);
        assert_eq!(modes_sorted(&[7.0]), vec![7.0]);
    }

    #[test]
    fn t_critical_matches_tables() {
        assert_relative_eq!(t_critical(0.95, 4.0).expect("valid df"), 2.776445, epsilon = 1e-4);
        assert_relative_eq!(t_critical(0.90, 10.0).expect("valid df"), 1.812461, epsilon = 1e-4);
    }

    #[test]
    fn p_value_is_symmetric() {
        let left = two_sided_p_value(-2.0, 9.0).expect("valid df");
        let right = two_sided_p_value(2.0, 9.0).expect("valid df");
        assert_relative_eq!(left, right, epsilon = 1e-12);
        assert_relative_eq!(two_sided_p_value(0.0, 9.0).expect("valid df"), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn far_tail_p_value_does_not_underflow() {
        let p_value = two_sided_p_value(20.0, 30.0).expect("valid df");
        assert!(p_value > 0.0 && p_value < 1e-12, "p-value {p_value}");
    }

    #[test]
    fn nan_survives_variance() {
        let moments = Moments::from_values(&[1.0, f64::NAN]);
        assert!(moments.sample_variance().expect("n >= 2").is_nan());
        assert!(two_sided_p_value(f64::NAN, 4.0).is_err());
    }

    #[test]
    fn non_finite_values_are_named() {
        assert!(ensure_finite("group value", &[1.0, 2.0]).is_ok());
        assert!(matches!(
            ensure_finite("group value", &[1.0, f64::INFINITY]),
            Err(StatsError::InvalidParameter { name: "group value", .. })
        ));
    }

    #[test]
    fn probabilities_must_be_open_interval() {
        assert!(ensure_probability("alpha", 0.05).is_ok());
        assert!(ensure_probability("alpha", 0.0).is_err());
        assert!(ensure_probability("alpha", 1.0).is_err());
        assert!(ensure_probability("alpha", f64::NAN).is_err());
    }
}
