//! KPI Evaluation
//! Runs registry entries through the pipeline for the selected round range.

use crate::data::{DataProcessor, PipelineError, RawTable, SourceTables};
use crate::kpi::registry::{ChartDef, ChartKind, KpiDef, KpiSource, RowFilter, TabDef};
use crate::kpi::{KeySeries, KpiSeries, RoundRange};
use polars::prelude::PolarsResult;
use serde::Serialize;
use tracing::debug;

/// What a chart plots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ChartContent {
    Lines(Vec<KpiSeries>),
    Bars(KeySeries),
}

/// A chart ready for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub title: String,
    pub kind: ChartKind,
    pub unit: String,
    pub content: ChartContent,
}

impl ChartData {
    /// True when nothing would be drawn; the viewer shows a placeholder.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            ChartContent::Lines(lines) => lines.iter().all(KpiSeries::is_empty),
            ChartContent::Bars(bars) => bars.is_empty(),
        }
    }
}

pub struct KpiEvaluator;

impl KpiEvaluator {
    /// Round-indexed series for a KPI, restricted to `range`.
    ///
    /// `ByKey` sources have no round axis and yield an empty series here.
    pub fn series(
        kpi: &KpiDef,
        sources: &SourceTables,
        range: RoundRange,
    ) -> Result<KpiSeries, PipelineError> {
        let series = match kpi.source {
            KpiSource::Rounds {
                table,
                column,
                filter,
                scale,
            } => {
                let table = sources.table(table);
                let series = match filter {
                    Some(filter) => match Self::apply_filter(table, &filter)? {
                        Some(filtered) => DataProcessor::aggregate(&filtered, column, kpi.label)?,
                        None => KpiSeries::empty(kpi.label),
                    },
                    None => DataProcessor::aggregate(table, column, kpi.label)?,
                };
                match scale {
                    Some(factor) => series.scale(factor),
                    None => series,
                }
            }
            KpiSource::Finance { metric } => {
                DataProcessor::fin_series(&sources.finance, metric, kpi.label)
            }
            KpiSource::FinanceDifference {
                minuend,
                subtrahend,
            } => DataProcessor::fin_difference(&sources.finance, minuend, subtrahend, kpi.label),
            KpiSource::ByKey { .. } => KpiSeries::empty(kpi.label),
        };

        Ok(series.filter_range(range.min, range.max))
    }

    /// Categorical grouping for a `ByKey` KPI over rows inside `range`.
    pub fn groups(
        kpi: &KpiDef,
        sources: &SourceTables,
        range: RoundRange,
    ) -> Result<KeySeries, PipelineError> {
        let KpiSource::ByKey { table, column, key } = kpi.source else {
            return Ok(KeySeries::empty(kpi.label));
        };
        let rows = sources.table(table).filter_rounds(range)?;
        DataProcessor::aggregate_by_key(&rows, column, key, kpi.label)
    }

    pub fn chart(
        chart: &ChartDef,
        sources: &SourceTables,
        range: RoundRange,
    ) -> Result<ChartData, PipelineError> {
        let content = match chart.kind {
            ChartKind::Line => ChartContent::Lines(
                chart
                    .kpis
                    .iter()
                    .map(|kpi| Self::series(kpi, sources, range))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            ChartKind::Bar => match chart.kpis.first() {
                Some(kpi) => ChartContent::Bars(Self::groups(kpi, sources, range)?),
                None => ChartContent::Bars(KeySeries::empty(chart.title)),
            },
        };

        Ok(ChartData {
            title: chart.title.to_string(),
            kind: chart.kind,
            unit: chart.unit.to_string(),
            content,
        })
    }

    /// Every chart of a tab, in registry order.
    pub fn tab(
        tab: &TabDef,
        sources: &SourceTables,
        range: RoundRange,
    ) -> Result<Vec<ChartData>, PipelineError> {
        let charts = tab
            .charts
            .iter()
            .map(|chart| Self::chart(chart, sources, range))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(tab = tab.heading, charts = charts.len(), ?range, "built tab charts");
        Ok(charts)
    }

    /// Rows kept by `filter`, or `None` when the filter column is absent.
    fn apply_filter(table: &RawTable, filter: &RowFilter) -> PolarsResult<Option<RawTable>> {
        let Some(name) = table.resolve_column(&[filter.column()]) else {
            debug!(table = table.name(), column = filter.column(), "filter column not present");
            return Ok(None);
        };
        let column = table.column(&name)?.as_materialized_series();
        let mask: Vec<bool> = column
            .iter()
            .map(|v| filter.keeps(crate::data::coerce_key(&v).as_deref()))
            .collect();
        Ok(Some(table.filter_mask(&mask)?))
    }
}
