use csv::{QuoteStyle, WriterBuilder};

use crate::error::AppError;
use crate::models::{Cell, Dataset};

/// Serialises the full dataset back to CSV: header in column order, missing
/// cells empty, fields with commas, quotes or line breaks quoted.
pub fn to_csv(dataset: &Dataset) -> Result<String, AppError> {
    if dataset.columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(&dataset.columns)
        .map_err(|e| AppError::ExportFailure(format!("Failed to write CSV header: {}", e)))?;

    for (idx, row) in dataset.rows.iter().enumerate() {
        let record = dataset.columns.iter().map(|column| match row.get(column) {
            Some(Cell::Text(s)) => s.clone(),
            Some(Cell::Number(n)) => n.to_string(),
            None => String::new(),
        });
        writer
            .write_record(record)
            .map_err(|e| AppError::ExportFailure(format!("Failed to write CSV row {}: {}", idx + 1, e)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::ExportFailure(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::ExportFailure(e.to_string()))
}
