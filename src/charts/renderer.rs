//! Static Chart Renderer
//! Renders KPI charts to PNG images with plotters, for exports.
//!
//! Layout:
//! 1. Caption: chart title
//! 2. Plot: one line per KPI over rounds, or one bar per key
//! 3. Legend for line charts
//! Empty charts render a "no data" placeholder with the title.

use crate::kpi::{ChartContent, ChartData, KeySeries, KpiSeries};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use thiserror::Error;

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image buffer has the wrong size")]
    Buffer,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Draw(err.to_string())
}

type Root<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render a chart to PNG bytes.
    pub fn render_png(data: &ChartData, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            match &data.content {
                _ if data.is_empty() => Self::draw_placeholder(&root, &data.title)?,
                ChartContent::Lines(lines) => Self::draw_lines(&root, data, lines)?,
                ChartContent::Bars(bars) => Self::draw_bars(&root, data, bars)?,
            }

            root.present().map_err(draw_err)?;
        }

        let image = RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }

    fn draw_lines(root: &Root, data: &ChartData, lines: &[KpiSeries]) -> Result<(), RenderError> {
        let (x_min, x_max) = Self::round_range(lines);
        let (y_min, y_max) =
            Self::value_range(lines.iter().flat_map(|s| s.values()), false);

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Round")
            .y_desc(data.unit.as_str())
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .draw()
            .map_err(draw_err)?;

        for (idx, series) in lines.iter().enumerate() {
            if series.is_empty() {
                continue;
            }
            let color = Palette99::pick(idx).to_rgba();
            let points: Vec<(f64, f64)> = series
                .points()
                .iter()
                .map(|p| (p.round as f64, p.value))
                .collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .map_err(draw_err)?
                .label(series.label())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart
                .draw_series(points.iter().map(|&p| Circle::new(p, 3, color.filled())))
                .map_err(draw_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(draw_err)?;

        Ok(())
    }

    fn draw_bars(root: &Root, data: &ChartData, bars: &KeySeries) -> Result<(), RenderError> {
        let keys: Vec<String> = bars.points().iter().map(|p| p.key.clone()).collect();
        let (y_min, y_max) = Self::value_range(bars.points().iter().map(|p| p.value), true);

        let mut chart = ChartBuilder::on(root)
            .caption(&data.title, (FONT, 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..keys.len() as u32).into_segmented(), y_min..y_max)
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(bars.label())
            .y_desc(data.unit.as_str())
            .x_label_formatter(&|v: &SegmentValue<u32>| match v {
                SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                    keys.get(*i as usize).cloned().unwrap_or_default()
                }
                SegmentValue::Last => String::new(),
            })
            .draw()
            .map_err(draw_err)?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(Palette99::pick(0).filled())
                    .margin(12)
                    .data(
                        bars.points()
                            .iter()
                            .enumerate()
                            .map(|(idx, p)| (idx as u32, p.value)),
                    ),
            )
            .map_err(draw_err)?;

        Ok(())
    }

    fn draw_placeholder(root: &Root, title: &str) -> Result<(), RenderError> {
        let (width, height) = root.dim_in_pixel();
        let style = TextStyle::from((FONT, 28).into_font())
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw(&Text::new(
            format!("{}: no data", title),
            (width as i32 / 2, height as i32 / 2),
            style,
        ))
        .map_err(draw_err)?;
        Ok(())
    }

    /// Round axis bounds, widened by one when all points share a round.
    fn round_range(lines: &[KpiSeries]) -> (f64, f64) {
        let rounds: Vec<i64> = lines.iter().flat_map(|s| s.rounds()).collect();
        let min = rounds.iter().min().copied().unwrap_or(0) as f64;
        let max = rounds.iter().max().copied().unwrap_or(0) as f64;
        if max > min {
            (min, max)
        } else {
            (min - 0.5, max + 0.5)
        }
    }

    /// Value axis bounds with 10% padding; bars always include zero.
    fn value_range(values: impl Iterator<Item = f64>, include_zero: bool) -> (f64, f64) {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            min = min.min(v);
            max = max.max(v);
        }
        if min.is_infinite() {
            return (0.0, 1.0);
        }
        if include_zero {
            min = min.min(0.0);
            max = max.max(0.0);
        }
        let pad = if max > min {
            (max - min) * 0.1
        } else {
            min.abs().max(1.0) * 0.1
        };
        let lo = if include_zero && min >= 0.0 { 0.0 } else { min - pad };
        (lo, max + pad)
    }
}
