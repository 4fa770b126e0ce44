//! TFC Dashboard - KPI viewer for The Fresh Connection simulation
//!
//! Reads the simulation and finance workbooks once, then shows per-round KPI
//! charts by business function, or exports them headlessly.

mod charts;
mod commands;
mod config;
mod data;
mod export;
mod gui;
mod kpi;
mod stats;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use config::{Cli, Command};
use data::DataLoader;
use eframe::egui;
use gui::DashboardApp;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "dashboard failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let paths = cli.data_paths();
    let sources = DataLoader::load(&paths).context("Failed to load simulation workbooks")?;

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => {
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default()
                    .with_inner_size([1400.0, 800.0])
                    .with_min_inner_size([1000.0, 600.0])
                    .with_title("TFC Dashboard"),
                ..Default::default()
            };

            eframe::run_native(
                "TFC Dashboard",
                options,
                Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, sources, paths)))),
            )
            .map_err(|e| anyhow!("Window failed: {}", e))
        }
        Command::Export(args) => commands::export(sources, &args),
        Command::Json(args) => commands::json(sources, &args),
    }
}
