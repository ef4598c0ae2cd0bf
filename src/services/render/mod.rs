pub mod charts;
pub mod dashboard;
pub mod landing;

pub use charts::{ChartKind, ChartSpec};
pub use dashboard::{Dashboard, PreviewTable, StatCard};
