//! Chart Plotter Module
//! Interactive KPI charts using egui_plot.

use crate::kpi::{KeySeries, KpiSeries};
use crate::stats::SeriesSummary;
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(52, 152, 219), // Blue
    Color32::from_rgb(231, 76, 60),  // Red
    Color32::from_rgb(46, 204, 113), // Green
    Color32::from_rgb(155, 89, 182), // Purple
    Color32::from_rgb(243, 156, 18), // Orange
    Color32::from_rgb(26, 188, 156), // Teal
    Color32::from_rgb(233, 30, 99),  // Pink
    Color32::from_rgb(0, 188, 212),  // Cyan
    Color32::from_rgb(121, 85, 72),  // Brown
    Color32::from_rgb(96, 125, 139), // Blue Grey
];

const PLOT_HEIGHT: f32 = 260.0;

pub struct ChartPlotter;

impl ChartPlotter {
    pub fn series_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Round-indexed line chart; hovering shows the round and value.
    pub fn draw_line_chart(ui: &mut egui::Ui, id: &str, series: &[KpiSeries], unit: &str) {
        let unit_label = unit.to_string();

        Plot::new(format!("line_{}", id))
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label("Round")
            .y_axis_label(unit)
            .x_axis_formatter(|mark, _range| {
                if mark.value.fract() == 0.0 {
                    format!("{:.0}", mark.value)
                } else {
                    String::new()
                }
            })
            .label_formatter(move |name, value| {
                if name.is_empty() {
                    String::new()
                } else {
                    format!(
                        "{}\nRound {:.0}: {:.2} {}",
                        name, value.x, value.y, unit_label
                    )
                }
            })
            .show(ui, |plot_ui| {
                for (idx, s) in series.iter().enumerate() {
                    if s.is_empty() {
                        continue;
                    }
                    let color = Self::series_color(idx);
                    let points: Vec<[f64; 2]> = s
                        .points()
                        .iter()
                        .map(|p| [p.round as f64, p.value])
                        .collect();

                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(2.0)
                            .name(s.label()),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(3.0)
                            .color(color)
                            .name(s.label()),
                    );
                }
            });
    }

    /// Bar chart of a categorical grouping, one bar per key.
    pub fn draw_bar_chart(ui: &mut egui::Ui, id: &str, groups: &KeySeries, unit: &str) {
        let labels: Vec<String> = groups.points().iter().map(|p| p.key.clone()).collect();

        let bars: Vec<Bar> = groups
            .points()
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                Bar::new(idx as f64, p.value)
                    .width(0.6)
                    .name(&p.key)
                    .fill(Self::series_color(idx))
            })
            .collect();

        Plot::new(format!("bar_{}", id))
            .height(PLOT_HEIGHT)
            .allow_scroll(false)
            .allow_drag(false)
            .y_axis_label(unit)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                    return String::new();
                }
                labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).name(groups.label()));
            });
    }

    /// Placeholder drawn in place of a chart with no data.
    pub fn draw_no_data(ui: &mut egui::Ui) {
        ui.allocate_ui(egui::vec2(ui.available_width(), PLOT_HEIGHT), |ui| {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No data").size(18.0).color(Color32::GRAY));
            });
        });
    }

    /// Summary statistics table under a chart.
    pub fn draw_stats_table(ui: &mut egui::Ui, id: &str, summaries: &[SeriesSummary]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("stats_table_{}", id)))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["KPI", "N", "Mean", "Min", "Max", "Latest", "Change"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for (idx, s) in summaries.iter().enumerate() {
                            ui.label(
                                RichText::new(&s.label)
                                    .size(11.0)
                                    .color(Self::series_color(idx)),
                            );
                            ui.label(RichText::new(s.count.to_string()).size(11.0));
                            for value in [s.mean, s.min, s.max, s.latest] {
                                ui.label(RichText::new(Self::format_value(value)).size(11.0));
                            }
                            let change = s.change.map(Self::format_value);
                            ui.label(RichText::new(change.as_deref().unwrap_or("-")).size(11.0));
                            ui.end_row();
                        }
                    });
            });
    }

    pub fn format_value(value: f64) -> String {
        if value.is_nan() {
            "-".to_string()
        } else if value.abs() >= 1000.0 {
            format!("{:.0}", value)
        } else {
            format!("{:.2}", value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_format_by_magnitude() {
        assert_eq!(ChartPlotter::format_value(f64::NAN), "-");
        assert_eq!(ChartPlotter::format_value(12345.6), "12346");
        assert_eq!(ChartPlotter::format_value(0.456), "0.46");
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(ChartPlotter::series_color(0), ChartPlotter::series_color(PALETTE.len()));
    }
}
