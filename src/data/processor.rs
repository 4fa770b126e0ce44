//! Data Processor Module
//! KPI aggregation pipeline: numeric coercion, grouping and averaging.

use crate::data::table::coerce_number;
use crate::data::{coerce_key, FinanceTable, RawTable};
use crate::kpi::{KeyPoint, KeySeries, KpiPoint, KpiSeries};
use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

const ROUND: &str = "round";
const KEY: &str = "key";
const VALUE: &str = "value";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Turns raw or finance-shaped tables into clean series.
pub struct DataProcessor;

impl DataProcessor {
    /// Best-effort numeric view of a column: unparseable cells become `None`.
    pub fn coerce_numeric(column: &Column) -> Vec<Option<f64>> {
        column
            .as_materialized_series()
            .iter()
            .map(|v| coerce_number(&v))
            .collect()
    }

    /// Mean of `column` per round, ascending by round.
    ///
    /// A missing column (under every alias) or a table without rounds gives
    /// an empty series. Rounds whose cells are all missing are dropped.
    pub fn aggregate(
        table: &RawTable,
        column: &[&str],
        label: &str,
    ) -> Result<KpiSeries, PipelineError> {
        let Some(name) = table.resolve_column(column) else {
            debug!(table = table.name(), ?column, "column not present");
            return Ok(KpiSeries::empty(label));
        };
        let Some(rounds) = table.rounds() else {
            debug!(table = table.name(), "table has no round column");
            return Ok(KpiSeries::empty(label));
        };
        let values = Self::coerce_numeric(table.column(&name)?);

        let grouped = DataFrame::new(vec![
            Column::new(ROUND.into(), rounds),
            Column::new(VALUE.into(), values),
        ])?
        .lazy()
        .filter(col(ROUND).is_not_null().and(col(VALUE).is_not_null()))
        .group_by([col(ROUND)])
        .agg([col(VALUE).mean()])
        .sort([ROUND], SortMultipleOptions::default())
        .collect()?;

        let rounds = grouped.column(ROUND)?.as_materialized_series().i64()?;
        let means = grouped.column(VALUE)?.as_materialized_series().f64()?;

        let points = rounds
            .into_iter()
            .zip(means.into_iter())
            .filter_map(|(round, value)| {
                Some(KpiPoint {
                    round: round?,
                    value: value?,
                })
            })
            .collect();

        Ok(KpiSeries::new(label, points))
    }

    /// Mean of `column` per value of the categorical `key_column`.
    pub fn aggregate_by_key(
        table: &RawTable,
        column: &[&str],
        key_column: &str,
        label: &str,
    ) -> Result<KeySeries, PipelineError> {
        let (Some(name), Some(key_name)) = (
            table.resolve_column(column),
            table.resolve_column(&[key_column]),
        ) else {
            debug!(table = table.name(), ?column, key_column, "grouping columns not present");
            return Ok(KeySeries::empty(label));
        };

        let keys: Vec<Option<String>> = table
            .column(&key_name)?
            .as_materialized_series()
            .iter()
            .map(|v| coerce_key(&v))
            .collect();
        let values = Self::coerce_numeric(table.column(&name)?);

        let grouped = DataFrame::new(vec![
            Column::new(KEY.into(), keys),
            Column::new(VALUE.into(), values),
        ])?
        .lazy()
        .filter(col(KEY).is_not_null().and(col(VALUE).is_not_null()))
        .group_by([col(KEY)])
        .agg([col(VALUE).mean()])
        .sort([KEY], SortMultipleOptions::default())
        .collect()?;

        let keys = grouped.column(KEY)?.as_materialized_series().str()?;
        let means = grouped.column(VALUE)?.as_materialized_series().f64()?;

        let points = keys
            .into_iter()
            .zip(means.into_iter())
            .filter_map(|(key, value)| {
                Some(KeyPoint {
                    key: key?.to_string(),
                    value: value?,
                })
            })
            .collect();

        Ok(KeySeries::new(label, points))
    }

    /// Series for a finance metric row; column position is the round.
    /// Unknown metrics give an empty series.
    pub fn fin_series(finance: &FinanceTable, metric_name: &str, label: &str) -> KpiSeries {
        let Some(values) = finance.metric_values(metric_name) else {
            debug!(metric = metric_name, "finance metric not present");
            return KpiSeries::empty(label);
        };

        KpiSeries::from_positions(label, &values)
    }

    /// `minuend - subtrahend` over two finance rows, position by position.
    /// Either metric being absent gives an empty series.
    pub fn fin_difference(
        finance: &FinanceTable,
        minuend: &str,
        subtrahend: &str,
        label: &str,
    ) -> KpiSeries {
        match (finance.metric_values(minuend), finance.metric_values(subtrahend)) {
            (Some(a), Some(b)) => KpiSeries::difference(&a, &b, label),
            _ => {
                debug!(minuend, subtrahend, "finance metric not present");
                KpiSeries::empty(label)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::CellValue;

    fn table(headers: &[&str], rows: Vec<Vec<CellValue>>) -> RawTable {
        let headers: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
        RawTable::from_rows("test", &headers, &rows).unwrap()
    }

    #[test]
    fn missing_column_gives_empty_series() {
        let t = table(&["Round", "X"], vec![vec![0.0.into(), 1.0.into()]]);
        let series = DataProcessor::aggregate(&t, &["Y"], "Y").unwrap();
        assert!(series.is_empty());
        assert_eq!(series.label(), "Y");
    }

    #[test]
    fn missing_round_column_gives_empty_series() {
        let t = table(&["X"], vec![vec![1.0.into()]]);
        assert!(DataProcessor::aggregate(&t, &["X"], "X").unwrap().is_empty());
    }

    #[test]
    fn bad_cells_are_excluded_from_the_mean() {
        let t = table(
            &["Round", "X"],
            vec![
                vec![0.0.into(), "10".into()],
                vec![0.0.into(), "bad".into()],
                vec![1.0.into(), "20".into()],
            ],
        );

        let series = DataProcessor::aggregate(&t, &["X"], "X").unwrap();
        assert_eq!(
            series.points(),
            &[
                KpiPoint { round: 0, value: 10.0 },
                KpiPoint { round: 1, value: 20.0 },
            ]
        );
    }

    #[test]
    fn all_missing_round_is_dropped() {
        let t = table(
            &["Round", "X"],
            vec![
                vec![1.0.into(), "4".into()],
                vec![2.0.into(), "oops".into()],
                vec![2.0.into(), CellValue::Missing],
                vec![3.0.into(), "6".into()],
            ],
        );

        let series = DataProcessor::aggregate(&t, &["X"], "X").unwrap();
        assert_eq!(series.rounds(), vec![1, 3]);
    }

    #[test]
    fn output_is_sorted_with_unique_rounds() {
        let t = table(
            &["Round", "X"],
            vec![
                vec![5.0.into(), 1.0.into()],
                vec![2.0.into(), 2.0.into()],
                vec![5.0.into(), 3.0.into()],
                vec![3.0.into(), 4.0.into()],
                vec![2.0.into(), 6.0.into()],
            ],
        );

        let series = DataProcessor::aggregate(&t, &["X"], "X").unwrap();
        assert_eq!(series.rounds(), vec![2, 3, 5]);
        assert_eq!(series.values(), vec![4.0, 4.0, 2.0]);
    }

    #[test]
    fn aliases_pick_the_spelling_present() {
        let t = table(
            &["Round", "Rejection (%)"],
            vec![vec![0.0.into(), 3.0.into()], vec![0.0.into(), 5.0.into()]],
        );

        let series =
            DataProcessor::aggregate(&t, &["Rejection  (%)", "Rejection (%)"], "Delivery Window")
                .unwrap();
        assert_eq!(series.values(), vec![4.0]);
        assert_eq!(series.label(), "Delivery Window");
    }

    #[test]
    fn supplier_mix_groups_by_key() {
        let t = table(
            &["Supplier", "V"],
            vec![
                vec!["A".into(), 100.0.into()],
                vec!["A".into(), 200.0.into()],
                vec!["B".into(), 50.0.into()],
            ],
        );

        let mix = DataProcessor::aggregate_by_key(&t, &["V"], "Supplier", "Mix").unwrap();
        assert_eq!(mix.points().len(), 2);
        assert_eq!(mix.get("A"), Some(150.0));
        assert_eq!(mix.get("B"), Some(50.0));
    }

    #[test]
    fn key_grouping_skips_missing_keys_and_values() {
        let t = table(
            &["Supplier", "V"],
            vec![
                vec![CellValue::Missing, 10.0.into()],
                vec!["A".into(), "x".into()],
                vec!["B".into(), "7".into()],
            ],
        );

        let mix = DataProcessor::aggregate_by_key(&t, &["V"], "Supplier", "Mix").unwrap();
        assert_eq!(mix.get("A"), None);
        assert_eq!(mix.get("B"), Some(7.0));
        assert!(DataProcessor::aggregate_by_key(&t, &["V"], "Vendor", "Mix")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn finance_metric_lookup() {
        let headers: Vec<String> = ["", "a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let raw = RawTable::from_rows(
            "Output",
            &headers,
            &[vec!["ROI".into(), 1.0.into(), "".into(), 3.0.into()]],
        )
        .unwrap();
        let finance = FinanceTable::from_raw(raw).unwrap();

        let roi = DataProcessor::fin_series(&finance, "ROI", "ROI");
        assert_eq!(roi.rounds(), vec![0, 2]);
        assert_eq!(roi.values(), vec![1.0, 3.0]);

        assert!(DataProcessor::fin_series(&finance, "Net income", "Net").is_empty());
    }

    fn finance(rows: &[Vec<CellValue>]) -> FinanceTable {
        let headers: Vec<String> =
            ["", "0", "1", "2", "3"].iter().map(|s| s.to_string()).collect();
        FinanceTable::from_raw(RawTable::from_rows("Output", &headers, rows).unwrap()).unwrap()
    }

    #[test]
    fn finance_difference_aligns_on_round_when_a_cell_is_missing() {
        let finance = finance(&[
            vec!["Gross margin".into(), 10.0.into(), 20.0.into(), 30.0.into(), 40.0.into()],
            vec!["Overhead".into(), 1.0.into(), "-".into(), 3.0.into(), 4.0.into()],
        ]);

        let net = DataProcessor::fin_difference(&finance, "Gross margin", "Overhead", "Net Profit");
        assert_eq!(
            net.points(),
            &[
                KpiPoint { round: 0, value: 9.0 },
                KpiPoint { round: 2, value: 27.0 },
                KpiPoint { round: 3, value: 36.0 },
            ]
        );
        assert_eq!(net.label(), "Net Profit");
    }

    #[test]
    fn finance_difference_with_absent_metric_is_empty() {
        let finance = finance(&[vec!["Gross margin".into(), 10.0.into()]]);
        assert!(DataProcessor::fin_difference(&finance, "Gross margin", "Overhead", "Net")
            .is_empty());
    }
}
