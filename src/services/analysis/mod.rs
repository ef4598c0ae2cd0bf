pub mod columns;
pub mod projection;
pub mod stats;

pub use columns::{is_numeric, is_time_based, label_column, numeric_columns, parse_float_or_zero};
pub use projection::{project, Projection, PROJECTION_LIMIT};
pub use stats::{summarize, STAT_CARD_LIMIT};
