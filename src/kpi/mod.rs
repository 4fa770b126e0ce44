//! KPI module - series types, registry and evaluation

mod evaluate;
pub mod registry;
mod series;

pub use evaluate::{ChartContent, ChartData, KpiEvaluator};
pub use registry::{ChartKind, SourceTable, Tab, TableRef};
pub use series::{KeyPoint, KeySeries, KpiPoint, KpiSeries, RoundRange};
