pub mod preset;
pub mod stats;
pub mod upload;

pub use preset::{get_preset, QualityLevel, QualityPreset};
pub use stats::{savings_percent, CompressionMethod, CompressionResult, CompressionStats};
pub use upload::UploadedFile;
