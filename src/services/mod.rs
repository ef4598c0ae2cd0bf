pub mod analysis;
pub mod dataset;
pub mod export;
pub mod insight;
pub mod render;
pub mod session;
