use serde::Serialize;

use super::columns::{is_time_based, label_column, numeric_columns, parse_float_or_zero};
use crate::models::{Cell, ChartPoint, Dataset};

/// Rows shown in any chart.
pub const PROJECTION_LIMIT: usize = 10;
const MISSING_LABEL: &str = "N/A";

/// The bounded view of a dataset that charts are drawn from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Projection {
    pub label_column: Option<String>,
    pub numeric_columns: Vec<String>,
    pub time_based: bool,
    pub points: Vec<ChartPoint>,
}

/// Takes the first `PROJECTION_LIMIT` rows, labelled by the label column,
/// with one value per numeric column.
pub fn project(dataset: &Dataset) -> Projection {
    let Some(label_column) = label_column(dataset) else {
        return Projection::default();
    };
    let numeric_columns = numeric_columns(dataset);
    let empty = Cell::empty();

    let points = dataset
        .rows
        .iter()
        .take(PROJECTION_LIMIT)
        .map(|row| ChartPoint {
            label: point_label(row.get(&label_column)),
            values: numeric_columns
                .iter()
                .map(|column| {
                    let cell = row.get(column).unwrap_or(&empty);
                    (column.clone(), parse_float_or_zero(cell))
                })
                .collect(),
        })
        .collect();

    Projection {
        time_based: is_time_based(&label_column),
        label_column: Some(label_column),
        numeric_columns,
        points,
    }
}

/// Missing, empty and zero values all read as "N/A".
fn point_label(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Text(s)) if !s.is_empty() => s.clone(),
        Some(Cell::Number(n)) if *n != 0.0 && !n.is_nan() => n.to_string(),
        _ => MISSING_LABEL.to_string(),
    }
}
