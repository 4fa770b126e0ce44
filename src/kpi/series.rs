//! KPI Series Module
//! Clean, chart-ready series produced by the aggregation pipeline.

use serde::Serialize;

/// Inclusive round interval selected in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundRange {
    pub min: i64,
    pub max: i64,
}

impl RoundRange {
    /// Bounds are swapped if given in the wrong order.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, round: i64) -> bool {
        round >= self.min && round <= self.max
    }

    /// Smallest range covering both.
    pub fn union(self, other: RoundRange) -> RoundRange {
        RoundRange::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Clamp a requested range into `self`.
    pub fn clamp(self, requested: RoundRange) -> RoundRange {
        let lo = requested.min.clamp(self.min, self.max);
        let hi = requested.max.clamp(self.min, self.max);
        RoundRange::new(lo, hi)
    }
}

impl Default for RoundRange {
    fn default() -> Self {
        Self { min: 0, max: 0 }
    }
}

/// One aggregated value for a round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiPoint {
    pub round: i64,
    pub value: f64,
}

/// Round-ordered series for one KPI. Rounds are unique and ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSeries {
    label: String,
    points: Vec<KpiPoint>,
}

impl KpiSeries {
    pub fn new(label: impl Into<String>, points: Vec<KpiPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> &[KpiPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn rounds(&self) -> Vec<i64> {
        self.points.iter().map(|p| p.round).collect()
    }

    /// Points whose round lies in `[round_min, round_max]`.
    /// Empty when `round_min > round_max`.
    pub fn filter_range(&self, round_min: i64, round_max: i64) -> KpiSeries {
        KpiSeries::new(
            self.label.clone(),
            self.points
                .iter()
                .filter(|p| p.round >= round_min && p.round <= round_max)
                .copied()
                .collect(),
        )
    }

    /// Multiply every value by `factor`.
    pub fn scale(&self, factor: f64) -> KpiSeries {
        KpiSeries::new(
            self.label.clone(),
            self.points
                .iter()
                .map(|p| KpiPoint {
                    round: p.round,
                    value: p.value * factor,
                })
                .collect(),
        )
    }

    /// Series from positional values: index `i` is round `i`, missing
    /// positions are skipped.
    pub fn from_positions(label: impl Into<String>, values: &[Option<f64>]) -> KpiSeries {
        let points = values
            .iter()
            .enumerate()
            .filter_map(|(round, value)| {
                value.map(|value| KpiPoint {
                    round: round as i64,
                    value,
                })
            })
            .collect();
        KpiSeries::new(label, points)
    }

    /// Element-wise `a - b` over positional values, truncated to the shorter
    /// input. A position missing on either side gives no point for that round.
    pub fn difference(
        a: &[Option<f64>],
        b: &[Option<f64>],
        label: impl Into<String>,
    ) -> KpiSeries {
        let values: Vec<Option<f64>> = a
            .iter()
            .zip(b)
            .map(|(x, y)| Some((*x)? - (*y)?))
            .collect();
        KpiSeries::from_positions(label, &values)
    }
}

/// One aggregated value for a categorical key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPoint {
    pub key: String,
    pub value: f64,
}

/// Per-entity grouping, e.g. purchase value by supplier. Ordered by key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeySeries {
    label: String,
    points: Vec<KeyPoint>,
}

impl KeySeries {
    pub fn new(label: impl Into<String>, points: Vec<KeyPoint>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self::new(label, Vec::new())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn points(&self) -> &[KeyPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.points.iter().find(|p| p.key == key).map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i64, f64)]) -> KpiSeries {
        KpiSeries::new(
            "kpi",
            points
                .iter()
                .map(|&(round, value)| KpiPoint { round, value })
                .collect(),
        )
    }

    #[test]
    fn filter_range_is_inclusive() {
        let s = series(&[(0, 1.0), (1, 2.0), (2, 3.0), (4, 5.0)]);
        assert_eq!(s.filter_range(1, 2).rounds(), vec![1, 2]);
        assert!(s.filter_range(2, 1).is_empty());
        assert!(s.filter_range(5, 9).is_empty());
    }

    #[test]
    fn filter_range_is_idempotent_and_non_destructive() {
        let s = series(&[(0, 1.0), (1, 2.0), (2, 3.0), (3, 4.0), (5, 6.0)]);

        let narrow = s.filter_range(1, 3);
        assert_eq!(narrow.filter_range(1, 3), narrow);

        let widened_again = s.filter_range(0, 5);
        assert_eq!(widened_again, s);
        assert_eq!(s.len(), 5);
    }

    #[test]
    fn difference_truncates_to_shorter_input() {
        let a = [Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)];
        let b = [Some(1.0), Some(2.0), Some(3.0)];

        let net = KpiSeries::difference(&a, &b, "Net");
        assert_eq!(net.rounds(), vec![0, 1, 2]);
        assert_eq!(net.values(), vec![9.0, 18.0, 27.0]);
        assert_eq!(net.label(), "Net");

        let reversed = KpiSeries::difference(&b, &a, "Net");
        assert_eq!(reversed.len(), 3);
    }

    #[test]
    fn difference_keeps_rounds_aligned_across_gaps() {
        let gross = [Some(10.0), Some(20.0), Some(30.0), Some(40.0)];
        let overhead = [Some(1.0), None, Some(3.0), Some(4.0)];

        let net = KpiSeries::difference(&gross, &overhead, "Net");
        assert_eq!(net.rounds(), vec![0, 2, 3]);
        assert_eq!(net.values(), vec![9.0, 27.0, 36.0]);

        let net = KpiSeries::difference(&overhead, &gross, "Net");
        assert_eq!(net.rounds(), vec![0, 2, 3]);
    }

    #[test]
    fn positions_become_rounds() {
        let s = KpiSeries::from_positions("ROI", &[None, Some(2.0), Some(3.0)]);
        assert_eq!(s.rounds(), vec![1, 2]);
        assert!(KpiSeries::from_positions("ROI", &[None]).is_empty());
    }

    #[test]
    fn scale_divides_run_hours_into_shifts() {
        let hours = series(&[(0, 40.0), (1, 120.0)]);
        assert_eq!(hours.scale(1.0 / 8.0).values(), vec![5.0, 15.0]);
    }

    #[test]
    fn range_clamp_and_union() {
        let bounds = RoundRange::new(0, 10);
        assert_eq!(bounds.clamp(RoundRange::new(-3, 4)), RoundRange::new(0, 4));
        assert_eq!(bounds.clamp(RoundRange::new(8, 30)), RoundRange::new(8, 10));
        assert_eq!(
            RoundRange::new(2, 3).union(RoundRange::new(0, 1)),
            RoundRange::new(0, 3)
        );
    }
}
