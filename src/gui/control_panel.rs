//! Control Panel Widget
//! Left side panel with the round range, table toggle and export controls.

use crate::kpi::{RoundRange, Tab};
use egui::{Color32, RichText};
use std::path::Path;

/// Dashboard selection, kept for the session only.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct UserSettings {
    pub tab: Tab,
    pub range: RoundRange,
    pub show_tables: bool,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    /// Rounds present in the workbooks; the sliders never leave them.
    pub bounds: RoundRange,
    workbook: String,
    finance: String,
    pub status: String,
    is_error: bool,
}

impl ControlPanel {
    pub fn new(bounds: RoundRange, workbook: &Path, finance: &Path) -> Self {
        let file_name = |p: &Path| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string())
        };

        Self {
            settings: UserSettings {
                range: bounds,
                ..UserSettings::default()
            },
            bounds,
            workbook: file_name(workbook),
            finance: file_name(finance),
            status: "Ready".to_string(),
            is_error: false,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;
        let before = self.settings.clone();

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("TFC Dashboard")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("The Fresh Connection KPIs")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Workbooks").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.workbook).size(12.0));
                ui.label(RichText::new(&self.finance).size(12.0));
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Round Range Section =====
        ui.label(RichText::new("🔧 Rounds").size(14.0).strong());
        ui.add_space(8.0);

        let bounds = self.bounds.min..=self.bounds.max;
        let label_width = 50.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("From:"));
            ui.add(egui::Slider::new(&mut self.settings.range.min, bounds.clone()));
        });
        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("To:"));
            ui.add(egui::Slider::new(&mut self.settings.range.max, bounds));
        });

        // Keep min <= max by dragging the other bound along.
        let range = &mut self.settings.range;
        if range.min > range.max {
            if range.min != before.range.min {
                range.max = range.min;
            } else {
                range.min = range.max;
            }
        }

        ui.add_space(5.0);
        if ui.small_button("All rounds").clicked() {
            self.settings.range = self.bounds;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.checkbox(&mut self.settings.show_tables, "Show tables");

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            let button = egui::Button::new(RichText::new("📄 Export PNG").size(14.0))
                .min_size(egui::vec2(150.0, 30.0));
            if ui.add(button).clicked() {
                action = ControlPanelAction::ExportPng;
            }
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        let status_color = if self.is_error {
            Color32::from_rgb(220, 53, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        if action == ControlPanelAction::None && self.settings != before {
            action = ControlPanelAction::SettingsChanged;
        }
        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
        self.is_error = false;
    }

    pub fn set_error(&mut self, status: &str) {
        self.status = status.to_string();
        self.is_error = true;
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    SettingsChanged,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_finance_with_full_range() {
        let panel = ControlPanel::new(
            RoundRange::new(0, 6),
            Path::new("/data/TFC_0_3.xlsx"),
            Path::new("FinanceReport (5).xlsx"),
        );
        assert_eq!(panel.settings.tab, Tab::Finance);
        assert_eq!(panel.settings.range, RoundRange::new(0, 6));
        assert!(!panel.settings.show_tables);
        assert_eq!(panel.workbook, "TFC_0_3.xlsx");
    }
}
