//! Headless commands: PNG export and JSON dump.

use crate::config::{ExportArgs, JsonArgs};
use crate::data::SourceTables;
use crate::export::ChartExporter;
use crate::kpi::{ChartData, KpiEvaluator, RoundRange, Tab};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct TabCharts {
    tab: Tab,
    title: &'static str,
    range: RoundRange,
    charts: Vec<ChartData>,
}

fn build_tab(tab: Tab, sources: &SourceTables, range: RoundRange) -> Result<Vec<ChartData>> {
    KpiEvaluator::tab(tab.definition(), sources, range)
        .with_context(|| format!("Failed to build charts for {}", tab.title()))
}

pub fn export(sources: &SourceTables, args: &ExportArgs) -> Result<()> {
    let range = args.selection.range(sources.round_bounds());
    let mut total = 0;

    for tab in args.selection.tabs() {
        let charts = build_tab(tab, sources, range)?;
        let written = ChartExporter::export_tab(tab, &charts, &args.out, args.width, args.height)
            .with_context(|| format!("Failed to export {} charts", tab.title()))?;
        total += written.len();
    }

    info!(charts = total, out = %args.out.display(), ?range, "export finished");
    println!("Wrote {} charts to {}", total, args.out.display());
    Ok(())
}

pub fn json(sources: &SourceTables, args: &JsonArgs) -> Result<()> {
    let range = args.selection.range(sources.round_bounds());

    let tabs = args
        .selection
        .tabs()
        .into_iter()
        .map(|tab| {
            Ok(TabCharts {
                tab,
                title: tab.title(),
                range,
                charts: build_tab(tab, sources, range)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let output = serde_json::to_string_pretty(&tabs).context("Failed to serialize chart data")?;
    println!("{}", output);
    Ok(())
}
