//! Chart Export Module
//! Writes the charts of a tab as PNG files.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::kpi::{ChartData, Tab};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_WIDTH: u32 = 1200;
pub const DEFAULT_HEIGHT: u32 = 700;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to render '{title}': {source}")]
    Render {
        title: String,
        #[source]
        source: RenderError,
    },
}

pub struct ChartExporter;

impl ChartExporter {
    /// Render every chart in parallel, then write `{tab}_{nn}_{title}.png`
    /// into `out_dir`. Returns the written paths in chart order.
    pub fn export_tab(
        tab: Tab,
        charts: &[ChartData],
        out_dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
            path: out_dir.to_path_buf(),
            source,
        })?;

        let images: Vec<Vec<u8>> = charts
            .par_iter()
            .map(|chart| {
                StaticChartRenderer::render_png(chart, width, height).map_err(|source| {
                    ExportError::Render {
                        title: chart.title.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<_, _>>()?;

        let prefix = Self::safe_name(tab.title());
        let mut written = Vec::with_capacity(images.len());

        for (idx, (chart, png)) in charts.iter().zip(images).enumerate() {
            let path = out_dir.join(format!(
                "{}_{:02}_{}.png",
                prefix,
                idx + 1,
                Self::safe_name(&chart.title)
            ));
            fs::write(&path, png).map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;
            written.push(path);
        }

        info!(
            tab = tab.title(),
            charts = written.len(),
            dir = %out_dir.display(),
            "exported charts"
        );
        Ok(written)
    }

    /// File-name friendly version of a title.
    pub fn safe_name(title: &str) -> String {
        title
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}
