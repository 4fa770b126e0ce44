//! Command line configuration.

use crate::data::DataPaths;
use crate::export::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::kpi::{RoundRange, Tab};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tfc-dashboard", version, about = "KPI dashboard for The Fresh Connection")]
pub struct Cli {
    /// Main simulation workbook.
    #[arg(long, env = "TFC_WORKBOOK", default_value = "TFC_0_3.xlsx")]
    pub workbook: PathBuf,
    /// Finance report workbook.
    #[arg(long, env = "TFC_FINANCE", default_value = "FinanceReport (5).xlsx")]
    pub finance: PathBuf,
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            workbook: self.workbook.clone(),
            finance: self.finance.clone(),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the dashboard window (default).
    Gui,
    /// Render charts to PNG files.
    Export(ExportArgs),
    /// Print chart data as JSON.
    Json(JsonArgs),
}

/// Tab and round selection shared by the headless commands.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct Selection {
    /// Only this tab; all tabs when omitted.
    #[arg(long, value_enum)]
    pub tab: Option<Tab>,
    /// First round to include.
    #[arg(long)]
    pub from: Option<i64>,
    /// Last round to include.
    #[arg(long)]
    pub to: Option<i64>,
}

impl Selection {
    pub fn tabs(&self) -> Vec<Tab> {
        match self.tab {
            Some(tab) => vec![tab],
            None => Tab::ALL.to_vec(),
        }
    }

    /// Requested rounds clamped to what the workbooks contain.
    pub fn range(&self, bounds: RoundRange) -> RoundRange {
        bounds.clamp(RoundRange::new(
            self.from.unwrap_or(bounds.min),
            self.to.unwrap_or(bounds.max),
        ))
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct ExportArgs {
    /// Output directory.
    #[arg(long)]
    pub out: PathBuf,
    #[command(flatten)]
    pub selection: Selection,
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct JsonArgs {
    #[command(flatten)]
    pub selection: Selection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_gui_with_default_workbooks() {
        let cli = Cli::try_parse_from(["tfc-dashboard"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.finance, PathBuf::from("FinanceReport (5).xlsx"));
    }

    #[test]
    fn parses_export_selection() {
        let cli = Cli::try_parse_from([
            "tfc-dashboard",
            "--workbook",
            "w.xlsx",
            "export",
            "--out",
            "charts",
            "--tab",
            "supply-chain",
            "--from",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.data_paths().workbook, PathBuf::from("w.xlsx"));
        let Some(Command::Export(args)) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.selection.tabs(), vec![Tab::SupplyChain]);
        assert_eq!(args.width, DEFAULT_WIDTH);
        assert_eq!(args.selection.range(RoundRange::new(0, 6)), RoundRange::new(2, 6));
    }

    #[test]
    fn selection_range_is_clamped_to_bounds() {
        let selection = Selection {
            tab: None,
            from: Some(-3),
            to: Some(50),
        };
        assert_eq!(selection.range(RoundRange::new(0, 6)), RoundRange::new(0, 6));
        assert_eq!(selection.tabs().len(), 5);
    }
}
