use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;

use crate::models::{Cell, Dataset};

/// Label-column names that mark the data as a time series (English and
/// Indonesian).
pub const TIME_KEYWORDS: [&str; 10] = [
    "year", "date", "month", "time", "period", "tahun", "tanggal", "bulan", "waktu", "periode",
];

static LEADING_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading float pattern is valid")
});

/// True when the cell is a finite number, or text that is entirely a finite
/// number once trimmed. Unsigned `0x`, `0b` and `0o` literals count too.
pub fn is_numeric(cell: &Cell) -> bool {
    match cell {
        Cell::Number(n) => n.is_finite(),
        Cell::Text(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty()
                && (trimmed.parse::<f64>().map_or(false, f64::is_finite) || is_radix_literal(trimmed))
        }
    }
}

fn is_radix_literal(s: &str) -> bool {
    let radix = match s.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0b" | "0B") => 2,
        Some("0o" | "0O") => 8,
        _ => return false,
    };
    let digits = &s[2..];
    !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix))
}

/// Parses the numeric prefix of a cell, falling back to 0.
pub fn parse_float_or_zero(cell: &Cell) -> f64 {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => LEADING_FLOAT
            .find(s)
            .and_then(|m| m.as_str().trim().parse::<f64>().ok())
            .unwrap_or(0.0),
    };
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Columns whose first-row value is numeric, in header order. Later rows
/// are never consulted.
pub fn numeric_columns(dataset: &Dataset) -> Vec<String> {
    let Some(first) = dataset.first_row() else {
        return Vec::new();
    };
    dataset
        .columns
        .iter()
        .filter(|column| first.get(column).map_or(false, is_numeric))
        .cloned()
        .collect()
}

/// The first column whose first-row value is not numeric, or the first
/// column when every column is numeric.
pub fn label_column(dataset: &Dataset) -> Option<String> {
    let first = dataset.first_row()?;
    dataset
        .columns
        .iter()
        .find(|column| !first.get(column).map_or(false, is_numeric))
        .or_else(|| dataset.columns.first())
        .cloned()
}

/// Case-insensitive keyword match on the column name.
pub fn is_time_based(column: &str) -> bool {
    let lowered = column.to_lowercase();
    TIME_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// The first `limit` numeric columns, the series a chart plots.
pub fn plotted_series(numeric_columns: &[String], limit: usize) -> SmallVec<[String; 3]> {
    numeric_columns.iter().take(limit).cloned().collect()
}
