pub mod analyzer;
pub mod cache;
pub mod decode;
pub mod downsample;
pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod signal;
pub mod throttle;
pub mod tui;

pub use analyzer::{analyze, AnalyzerConfig};
pub use downsample::downsample;
pub use error::AnalysisError;
pub use models::AnalysisResult;
pub use signal::Signal;
