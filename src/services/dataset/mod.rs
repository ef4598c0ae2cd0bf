pub mod csv_reader;
pub mod types;
pub mod utils;
pub mod xlsx_reader;

pub use csv_reader::parse_csv;
pub use types::FileKind;
pub use xlsx_reader::parse_xlsx;

use crate::error::AppError;
use crate::models::Dataset;

/// Validates the file name and decodes `data` into a dataset. The extension
/// is checked before any parsing happens.
pub fn ingest(file_name: &str, data: &[u8]) -> Result<Dataset, AppError> {
    let kind = FileKind::from_file_name(file_name)?;
    tracing::info!("Ingesting {} ({:?}, {}KB)", file_name, kind, data.len() / 1024);

    let dataset = match kind {
        FileKind::Xlsx => parse_xlsx(data)?,
        FileKind::Csv => parse_csv(data)?,
    };

    tracing::info!(
        "Ingested {}: {} rows, {} columns",
        file_name,
        dataset.len(),
        dataset.columns.len()
    );
    Ok(dataset)
}

/// Rejects payloads above `limit` bytes.
pub fn check_size(size: usize, limit: usize) -> Result<(), AppError> {
    if size > limit {
        return Err(AppError::FileTooLarge { size, limit });
    }
    Ok(())
}
