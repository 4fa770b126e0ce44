//! Chart Viewer Widget
//! Central scrollable panel with the KPI chart cards of the current tab and,
//! optionally, the underlying tables.
//! Cards wrap into as many columns as the available width allows.

use crate::charts::ChartPlotter;
use crate::kpi::{ChartContent, ChartData};
use crate::stats::{SeriesSummary, StatsCalculator};
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::{AnyValue, DataFrame};

const CHART_SPACING: f32 = 15.0;
const CHART_WIDTH: f32 = 560.0;
const CARD_BORDER: Color32 = Color32::from_rgb(100, 149, 237);

/// One chart card: the chart plus its summary table.
struct Card {
    id: String,
    data: ChartData,
    summaries: Vec<SeriesSummary>,
}

/// A source table shown under the charts.
struct TableView {
    name: String,
    df: DataFrame,
}

#[derive(Default)]
pub struct ChartViewer {
    heading: String,
    cards: Vec<Card>,
    tables: Vec<TableView>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn charts(&self) -> Vec<ChartData> {
        self.cards.iter().map(|c| c.data.clone()).collect()
    }

    /// Replace the cards, computing summary statistics for each chart.
    pub fn set_charts(&mut self, heading: &str, charts: Vec<ChartData>) {
        self.heading = heading.to_string();
        self.cards = charts
            .into_iter()
            .enumerate()
            .map(|(idx, data)| {
                let summaries = match &data.content {
                    ChartContent::Lines(lines) => {
                        lines.iter().map(StatsCalculator::summarize).collect()
                    }
                    ChartContent::Bars(bars) => vec![StatsCalculator::summarize_groups(bars)],
                };
                Card {
                    id: format!("{}_{}", heading, idx),
                    data,
                    summaries,
                }
            })
            .collect();
    }

    pub fn set_tables(&mut self, tables: Vec<(String, DataFrame)>) {
        self.tables = tables
            .into_iter()
            .map(|(name, df)| TableView { name, df })
            .collect();
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let avail_width = ui.available_width();
        let card_total_width = CHART_WIDTH + CHART_SPACING;
        let num_columns = ((avail_width / card_total_width).floor() as usize).max(1);

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(RichText::new(&self.heading).size(20.0).strong());
                ui.add_space(CHART_SPACING);

                for row in self.cards.chunks(num_columns) {
                    ui.horizontal(|ui| {
                        for card in row {
                            Self::draw_card(ui, card);
                            ui.add_space(CHART_SPACING);
                        }
                    });
                    ui.add_space(CHART_SPACING);
                }

                for table in &self.tables {
                    ui.separator();
                    Self::draw_table(ui, table);
                    ui.add_space(CHART_SPACING);
                }
            });
    }

    fn draw_card(ui: &mut egui::Ui, card: &Card) {
        let card_width = CHART_WIDTH - 20.0;

        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(2.0, CARD_BORDER))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(card_width);

                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(&card.data.title)
                            .size(18.0)
                            .strong()
                            .color(CARD_BORDER),
                    );
                    ui.add_space(8.0);

                    if card.data.is_empty() {
                        ChartPlotter::draw_no_data(ui);
                        return;
                    }

                    match &card.data.content {
                        ChartContent::Lines(lines) => {
                            ChartPlotter::draw_line_chart(ui, &card.id, lines, &card.data.unit)
                        }
                        ChartContent::Bars(bars) => {
                            ChartPlotter::draw_bar_chart(ui, &card.id, bars, &card.data.unit)
                        }
                    }

                    ui.add_space(10.0);
                    ChartPlotter::draw_stats_table(ui, &card.id, &card.summaries);
                });
            });
    }

    fn draw_table(ui: &mut egui::Ui, table: &TableView) {
        ui.label(
            RichText::new(format!("{} ({} rows)", table.name, table.df.height()))
                .size(14.0)
                .strong(),
        );
        ui.add_space(5.0);

        let columns = table.df.get_columns();
        ScrollArea::both()
            .id_salt(format!("table_{}", table.name))
            .max_height(300.0)
            .show(ui, |ui| {
                egui::Grid::new(format!("grid_{}", table.name))
                    .striped(true)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for column in columns {
                            ui.label(RichText::new(column.name().as_str()).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in 0..table.df.height() {
                            for column in columns {
                                let text = column
                                    .get(row)
                                    .map(|v| Self::cell_text(&v))
                                    .unwrap_or_default();
                                ui.label(RichText::new(text).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    fn cell_text(value: &AnyValue) -> String {
        match value {
            AnyValue::Null => String::new(),
            AnyValue::String(s) => s.to_string(),
            AnyValue::StringOwned(s) => s.to_string(),
            AnyValue::Float64(v) => ChartPlotter::format_value(*v),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::{ChartKind, KeyPoint, KeySeries, KpiPoint, KpiSeries};

    #[test]
    fn cards_carry_one_summary_per_series() {
        let mut viewer = ChartViewer::new();
        let lines = ChartData {
            title: "Revenue vs Operating Costs".to_string(),
            kind: ChartKind::Line,
            unit: "EUR".to_string(),
            content: ChartContent::Lines(vec![
                KpiSeries::new("Revenue", vec![KpiPoint { round: 0, value: 1.0 }]),
                KpiSeries::empty("Operating Costs"),
            ]),
        };
        let bars = ChartData {
            title: "Supplier Purchase Mix".to_string(),
            kind: ChartKind::Bar,
            unit: "EUR".to_string(),
            content: ChartContent::Bars(KeySeries::new(
                "Purchase value",
                vec![KeyPoint {
                    key: "A".to_string(),
                    value: 2.0,
                }],
            )),
        };

        viewer.set_charts("Finance", vec![lines, bars]);

        assert_eq!(viewer.cards.len(), 2);
        assert_eq!(viewer.cards[0].summaries.len(), 2);
        assert_eq!(viewer.cards[1].summaries.len(), 1);
        assert_ne!(viewer.cards[0].id, viewer.cards[1].id);
        assert_eq!(viewer.charts()[1].title, "Supplier Purchase Mix");
    }

    #[test]
    fn cells_render_without_null_markers() {
        assert_eq!(ChartViewer::cell_text(&AnyValue::Null), "");
        assert_eq!(ChartViewer::cell_text(&AnyValue::Float64(0.5)), "0.50");
        assert_eq!(ChartViewer::cell_text(&AnyValue::String("DC North")), "DC North");
    }
}
