pub mod csv_writer;
pub mod pdf;
mod pdf_canvas;

pub use csv_writer::to_csv;
pub use pdf::to_pdf;

/// Download name for an export: the upload's name without its extension,
/// suffixed `_analysis.<ext>`.
pub fn export_file_name(file_name: &str, ext: &str) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    format!("{}_analysis.{}", stem, ext)
}
