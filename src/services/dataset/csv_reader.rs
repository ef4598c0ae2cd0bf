use csv::ReaderBuilder;

use super::utils::{header_names, strip_bom};
use crate::error::AppError;
use crate::models::{Cell, Dataset, Row};

/// Parses CSV text with the first line as the header. Empty lines are
/// skipped, short records simply lack their trailing keys and fields past
/// the header are dropped. Values stay text.
pub fn parse_csv(data: &[u8]) -> Result<Dataset, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(data));

    let headers = reader
        .headers()
        .map_err(|e| AppError::ParseFailure(format!("Failed to read CSV header: {}", e)))?
        .clone();
    let columns = header_names(headers.iter());

    let mut rows = Vec::new();
    let mut dropped_fields = 0usize;
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::ParseFailure(format!("Failed to read CSV record {}: {}", idx + 1, e))
        })?;

        dropped_fields += record.len().saturating_sub(columns.len());
        let mut row = Row::with_capacity(columns.len());
        for (column, value) in columns.iter().zip(record.iter()) {
            row.insert(column.clone(), Cell::Text(value.to_string()));
        }
        rows.push(row);
    }

    if dropped_fields > 0 {
        tracing::debug!("Dropped {} CSV fields beyond the header width", dropped_fields);
    }

    Ok(Dataset::new(columns, rows))
}
