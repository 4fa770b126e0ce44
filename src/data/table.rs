//! In-memory tables
//! Raw sheet tables and the metric-indexed finance table, both backed by Polars.

use crate::kpi::RoundRange;
use polars::prelude::*;
use std::collections::HashMap;

/// Name of the round column carried by every round-indexed sheet.
pub const ROUND_COLUMN: &str = "Round";

/// Label given to the finance sheet's unlabeled key column.
pub const METRIC_COLUMN: &str = "Metric";

/// A single spreadsheet cell before it lands in a typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Date(String),
    Missing,
}

impl CellValue {
    fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Number(v) => Some(v.to_string()),
            CellValue::Text(s) | CellValue::Date(s) => Some(s.clone()),
            CellValue::Missing => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// Best-effort numeric coercion of a single cell.
///
/// Text is trimmed and parsed as a float; anything that does not yield a
/// finite number becomes `None`.
pub fn coerce_number(value: &AnyValue) -> Option<f64> {
    let number = match value {
        AnyValue::Null => None,
        AnyValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        AnyValue::String(s) => parse_number(s),
        AnyValue::StringOwned(s) => parse_number(s.as_str()),
        other => other.extract::<f64>(),
    };
    number.filter(|v| v.is_finite())
}

/// Round number of a cell: a non-negative integral value.
pub fn coerce_round(value: &AnyValue) -> Option<i64> {
    coerce_number(value)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as i64)
}

/// Categorical key of a cell, trimmed; blank text counts as missing.
pub fn coerce_key(value: &AnyValue) -> Option<String> {
    let text = match value {
        AnyValue::Null => return None,
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string().trim_matches('"').to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

/// Collapse runs of whitespace so "Rejection  (%)" and "Rejection (%)" compare equal.
fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make header names usable as DataFrame column names.
/// Blank headers become `Unnamed: {i}`, repeats get a `.n` suffix.
fn unique_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.clone()
        };

        let mut name = base.clone();
        while let Some(count) = seen.get(&name).copied() {
            seen.insert(name.clone(), count + 1);
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone(), 1);
        names.push(name);
    }

    names
}

/// One sheet of simulation output.
#[derive(Debug, Clone)]
pub struct RawTable {
    name: String,
    df: DataFrame,
}

impl RawTable {
    pub fn new(name: impl Into<String>, df: DataFrame) -> Self {
        Self {
            name: name.into(),
            df,
        }
    }

    /// Build a table from a header row and data rows.
    ///
    /// Short rows are padded with missing cells. A column whose present cells
    /// are all numbers is stored as `Float64`, every other column as text.
    pub fn from_rows(
        name: impl Into<String>,
        headers: &[String],
        rows: &[Vec<CellValue>],
    ) -> PolarsResult<Self> {
        let names = unique_headers(headers);
        let missing = CellValue::Missing;

        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(idx, col_name)| {
                let cells: Vec<&CellValue> = rows
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(&missing))
                    .collect();

                let numeric = cells
                    .iter()
                    .all(|c| matches!(c, CellValue::Number(_) | CellValue::Missing));

                if numeric {
                    let values: Vec<Option<f64>> = cells
                        .iter()
                        .map(|c| match c {
                            CellValue::Number(v) => Some(*v),
                            _ => None,
                        })
                        .collect();
                    Column::new(col_name.as_str().into(), values)
                } else {
                    let values: Vec<Option<String>> = cells
                        .iter()
                        .map(|c| if c.is_missing() { None } else { c.as_text() })
                        .collect();
                    Column::new(col_name.as_str().into(), values)
                }
            })
            .collect();

        Ok(Self::new(name, DataFrame::new(columns)?))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Resolve the first present column among `aliases`.
    ///
    /// Exact names are tried first, in order; after that each alias is
    /// compared with internal whitespace collapsed.
    pub fn resolve_column(&self, aliases: &[&str]) -> Option<String> {
        let names = self.column_names();

        if let Some(exact) = aliases
            .iter()
            .find(|alias| names.iter().any(|n| n == *alias))
        {
            return Some(exact.to_string());
        }

        aliases.iter().find_map(|alias| {
            let wanted = normalize_name(alias);
            names.iter().find(|n| normalize_name(n) == wanted).cloned()
        })
    }

    pub fn column(&self, name: &str) -> PolarsResult<&Column> {
        self.df.column(name)
    }

    /// Per-row round numbers, or `None` when the sheet has no round column.
    pub fn rounds(&self) -> Option<Vec<Option<i64>>> {
        let name = self.resolve_column(&[ROUND_COLUMN])?;
        let column = self.df.column(&name).ok()?;
        Some(
            column
                .as_materialized_series()
                .iter()
                .map(|v| coerce_round(&v))
                .collect(),
        )
    }

    /// Smallest and largest round present, if any.
    pub fn round_bounds(&self) -> Option<RoundRange> {
        let rounds: Vec<i64> = self.rounds()?.into_iter().flatten().collect();
        let min = rounds.iter().min()?;
        let max = rounds.iter().max()?;
        Some(RoundRange::new(*min, *max))
    }

    /// Keep the rows selected by `mask`.
    pub fn filter_mask(&self, mask: &[bool]) -> PolarsResult<RawTable> {
        let mask: BooleanChunked = mask.iter().copied().collect();
        Ok(Self::new(self.name.clone(), self.df.filter(&mask)?))
    }

    /// Rows whose round lies in `range`. Tables without a round column are
    /// returned whole.
    pub fn filter_rounds(&self, range: RoundRange) -> PolarsResult<RawTable> {
        let Some(rounds) = self.rounds() else {
            return Ok(self.clone());
        };
        let mask: Vec<bool> = rounds
            .iter()
            .map(|r| r.is_some_and(|r| range.contains(r)))
            .collect();
        self.filter_mask(&mask)
    }
}

/// Finance output: one row per metric, one column per round position.
#[derive(Debug, Clone)]
pub struct FinanceTable {
    df: DataFrame,
    index: HashMap<String, usize>,
}

impl FinanceTable {
    /// Reshape the raw finance sheet: the first column is renamed to
    /// `Metric`, read as text and used as the row index.
    pub fn from_raw(raw: RawTable) -> PolarsResult<Self> {
        let mut columns: Vec<Column> = raw.df.get_columns().to_vec();
        if columns.is_empty() {
            let metric = Column::new(METRIC_COLUMN.into(), Vec::<Option<String>>::new());
            return Ok(Self {
                df: DataFrame::new(vec![metric])?,
                index: HashMap::new(),
            });
        }

        let mut metric = columns[0].cast(&DataType::String)?;
        metric.rename(METRIC_COLUMN.into());
        columns[0] = metric;
        let df = DataFrame::new(columns)?;

        let mut index = HashMap::new();
        for (row, value) in df.get_columns()[0]
            .as_materialized_series()
            .iter()
            .enumerate()
        {
            if let AnyValue::String(name) = value {
                index.entry(name.to_string()).or_insert(row);
            }
        }

        Ok(Self { df, index })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    /// Number of implicit rounds (value columns after `Metric`).
    pub fn round_count(&self) -> usize {
        self.df.width().saturating_sub(1)
    }

    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Positional values of `metric`, coerced to numbers. Exact-match lookup.
    pub fn metric_values(&self, metric: &str) -> Option<Vec<Option<f64>>> {
        let row = *self.index.get(metric)?;
        Some(
            self.df
                .get_columns()
                .iter()
                .skip(1)
                .map(|column| column.get(row).ok().and_then(|v| coerce_number(&v)))
                .collect(),
        )
    }

    pub fn round_bounds(&self) -> Option<RoundRange> {
        match self.round_count() {
            0 => None,
            n => Some(RoundRange::new(0, n as i64 - 1)),
        }
    }

    /// `Metric` plus the columns whose position falls inside `range`.
    pub fn filter_rounds(&self, range: RoundRange) -> PolarsResult<DataFrame> {
        let columns: Vec<Column> = self
            .df
            .get_columns()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx == 0 || range.contains(*idx as i64 - 1))
            .map(|(_, c)| c.clone())
            .collect();
        DataFrame::new(columns)
    }
}
