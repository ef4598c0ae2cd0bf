use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use super::utils::header_names;
use crate::error::AppError;
use crate::models::{Cell, Dataset, Row};

/// Decodes the first sheet of an `.xlsx` workbook into rows keyed by the
/// sheet's first row.
pub fn parse_xlsx(data: &[u8]) -> Result<Dataset, AppError> {
    let start = std::time::Instant::now();
    let cursor = Cursor::new(data);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::ParseFailure(format!("Failed to open Excel file: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| AppError::ParseFailure("No sheets found in workbook".to_string()))?;
    if sheet_names.len() > 1 {
        tracing::debug!("Workbook has {} sheets, reading only {:?}", sheet_names.len(), sheet_name);
    }

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        AppError::ParseFailure(format!("Failed to read worksheet {}: {}", sheet_name, e))
    })?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        tracing::info!("Sheet {} is empty", sheet_name);
        return Ok(Dataset::default());
    };
    let columns = header_names(header_row.iter().map(header_text));

    let rows: Vec<Row> = rows_iter
        .filter(|row| !row.iter().all(is_blank))
        .map(|row| {
            columns
                .iter()
                .zip(row.iter())
                .filter(|(_, value)| !is_blank(value))
                .map(|(column, value)| (column.clone(), to_cell(value)))
                .collect::<Row>()
        })
        .collect();

    tracing::info!(
        "Decoded sheet {} into {} rows x {} columns in {:?}",
        sheet_name,
        rows.len(),
        columns.len(),
        start.elapsed()
    );

    Ok(Dataset::new(columns, rows))
}

fn header_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Data) -> bool {
    match value {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        // Date cells keep their serial number, like any other numeric cell.
        Data::DateTime(d) => Cell::Number(d.as_f64()),
        Data::Empty => Cell::empty(),
        other => Cell::Text(other.to_string()),
    }
}
