//! Statistics Calculator Module
//! Descriptive statistics shown under each chart for the selected rounds.

use crate::kpi::{KeySeries, KpiSeries};
use statrs::statistics::Statistics;

/// Summary of one plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSummary {
    pub label: String,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
    pub latest: f64,
    /// Latest minus first value; `None` with fewer than two points.
    pub change: Option<f64>,
}

impl Default for SeriesSummary {
    fn default() -> Self {
        Self {
            label: String::new(),
            count: 0,
            mean: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            std: f64::NAN,
            latest: f64::NAN,
            change: None,
        }
    }
}

pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for values in plotting order.
    pub fn compute_descriptive_stats(label: &str, values: &[f64]) -> SeriesSummary {
        let n = values.len();
        if n == 0 {
            return SeriesSummary {
                label: label.to_string(),
                ..SeriesSummary::default()
            };
        }

        let std = if n > 1 {
            Statistics::std_dev(values.iter())
        } else {
            0.0
        };

        SeriesSummary {
            label: label.to_string(),
            count: n,
            mean: Statistics::mean(values.iter()),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
            std,
            latest: values[n - 1],
            change: (n > 1).then(|| values[n - 1] - values[0]),
        }
    }

    pub fn summarize(series: &KpiSeries) -> SeriesSummary {
        Self::compute_descriptive_stats(series.label(), &series.values())
    }

    /// Across-key summary of a grouping; `latest` and `change` follow key order.
    pub fn summarize_groups(groups: &KeySeries) -> SeriesSummary {
        let values: Vec<f64> = groups.points().iter().map(|p| p.value).collect();
        let mut summary = Self::compute_descriptive_stats(groups.label(), &values);
        summary.change = None;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::KpiPoint;

    #[test]
    fn summary_of_round_series() {
        let series = KpiSeries::new(
            "OSA",
            vec![
                KpiPoint { round: 0, value: 2.0 },
                KpiPoint { round: 1, value: 4.0 },
                KpiPoint { round: 2, value: 9.0 },
            ],
        );

        let summary = StatsCalculator::summarize(&series);
        assert_eq!(summary.label, "OSA");
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);
        assert_eq!(summary.latest, 9.0);
        assert_eq!(summary.change, Some(7.0));
        assert!((summary.std - 13.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn empty_and_single_point_series() {
        let empty = StatsCalculator::summarize(&KpiSeries::empty("ROI"));
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
        assert_eq!(empty.change, None);

        let single = StatsCalculator::compute_descriptive_stats("ROI", &[3.0]);
        assert_eq!(single.std, 0.0);
        assert_eq!(single.change, None);
    }
}
