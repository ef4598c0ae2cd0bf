use polars::prelude::*;
use rayon::prelude::*;

use super::columns::{numeric_columns, parse_float_or_zero};
use crate::models::{Cell, Dataset, SummaryStat};

/// Number of statistics shown as cards.
pub const STAT_CARD_LIMIT: usize = 4;

/// Sum, average, min and max of every numeric column over all rows.
/// Cells that do not parse count as 0.
pub fn summarize(dataset: &Dataset) -> Vec<SummaryStat> {
    if dataset.is_empty() {
        return Vec::new();
    }

    let columns = numeric_columns(dataset);
    columns
        .par_iter()
        .map(|column| summarize_column(dataset, column))
        .collect()
}

fn summarize_column(dataset: &Dataset, column: &str) -> SummaryStat {
    let empty = Cell::empty();
    let values: Vec<f64> = dataset
        .rows
        .iter()
        .map(|row| parse_float_or_zero(row.get(column).unwrap_or(&empty)))
        .collect();
    let row_count = values.len();

    let ca = Float64Chunked::from_vec(column, values);
    let sum = ca.sum().unwrap_or(0.0);
    let min = ca.min().unwrap_or(0.0);
    let max = ca.max().unwrap_or(0.0);

    SummaryStat {
        column: column.to_string(),
        sum,
        average: if row_count == 0 { 0.0 } else { sum / row_count as f64 },
        min,
        max,
    }
}
