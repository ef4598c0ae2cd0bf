use crate::error::{AppError, UNSUPPORTED_FORMAT_MESSAGE};

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Xlsx,
    Csv,
}

impl FileKind {
    /// Detects the kind from the file name's extension, case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self, AppError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("xlsx") => Ok(FileKind::Xlsx),
            Some("csv") => Ok(FileKind::Csv),
            _ => {
                tracing::warn!("Rejected upload with unsupported name: {}", file_name);
                Err(AppError::InvalidFileType(UNSUPPORTED_FORMAT_MESSAGE.to_string()))
            }
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            FileKind::Xlsx => XLSX_MIME,
            FileKind::Csv => CSV_MIME,
        }
    }
}
