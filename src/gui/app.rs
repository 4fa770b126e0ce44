//! TFC Dashboard Main Application
//! Main window with tab bar, control panel and chart viewer.

use crate::data::{DataPaths, SourceTables};
use crate::export::{ChartExporter, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::kpi::{KpiEvaluator, Tab};
use egui::{RichText, SidePanel, TopBottomPanel};
use tracing::{error, info, warn};

/// Main application window.
pub struct DashboardApp {
    sources: &'static SourceTables,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
}

impl DashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        sources: &'static SourceTables,
        paths: DataPaths,
    ) -> Self {
        let mut app = Self {
            sources,
            control_panel: ControlPanel::new(
                sources.round_bounds(),
                &paths.workbook,
                &paths.finance,
            ),
            chart_viewer: ChartViewer::new(),
        };
        app.refresh();
        app
    }

    /// Rebuild the charts (and tables) of the selected tab.
    fn refresh(&mut self) {
        let settings = self.control_panel.settings.clone();
        let definition = settings.tab.definition();

        match KpiEvaluator::tab(definition, self.sources, settings.range) {
            Ok(charts) => {
                let empty = charts.iter().filter(|c| c.is_empty()).count();
                self.chart_viewer.set_charts(definition.heading, charts);
                self.control_panel.set_status(&format!(
                    "Rounds {}-{}: {} charts, {} without data",
                    settings.range.min,
                    settings.range.max,
                    definition.charts.len(),
                    empty
                ));
            }
            Err(e) => {
                error!(tab = settings.tab.title(), error = %e, "failed to build charts");
                self.chart_viewer.set_charts(definition.heading, Vec::new());
                self.control_panel.set_error(&format!("Error: {}", e));
            }
        }

        let tables = if settings.show_tables {
            definition
                .tables
                .iter()
                .filter_map(|table| match self.sources.view(*table, settings.range) {
                    Ok((name, df)) => Some((name.to_string(), df)),
                    Err(e) => {
                        warn!(error = %e, "failed to prepare table view");
                        None
                    }
                })
                .collect()
        } else {
            Vec::new()
        };
        self.chart_viewer.set_tables(tables);
    }

    /// Export the current tab's charts as PNG files into a picked folder.
    fn handle_export_png(&mut self) {
        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        let tab = self.control_panel.settings.tab;
        let charts = self.chart_viewer.charts();

        match ChartExporter::export_tab(tab, &charts, &dir, DEFAULT_WIDTH, DEFAULT_HEIGHT) {
            Ok(written) => {
                self.control_panel.set_status(&format!(
                    "Exported {} charts to {}",
                    written.len(),
                    dir.display()
                ));
                if let Err(e) = open::that(&dir) {
                    info!(error = %e, "could not open export folder");
                }
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel.set_error(&format!("Export error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut changed = false;

        // Top panel - Tabs
        TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in Tab::ALL {
                    let selected = self.control_panel.settings.tab == tab;
                    if ui
                        .selectable_label(selected, RichText::new(tab.title()).size(15.0))
                        .clicked()
                        && !selected
                    {
                        self.control_panel.settings.tab = tab;
                        changed = true;
                    }
                }
            });
        });

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::SettingsChanged => changed = true,
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        if changed {
            self.refresh();
        }

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
