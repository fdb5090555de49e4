//! PDF compression backends and the orchestrator that chooses between them

pub mod compressor;
pub mod ghostscript;
pub mod images;
pub mod native;
pub mod process;

pub use compressor::{CompressorOptions, PdfCompressor};
pub use ghostscript::GhostscriptBackend;
pub use native::{strip_metadata, NativeBackend};

use crate::error::BackendError;
use crate::model::{CompressionMethod, QualityPreset};

/// One way of turning PDF bytes into smaller PDF bytes
pub trait CompressionBackend {
    fn method(&self) -> CompressionMethod;

    /// Compress a complete document. Either returns a whole document or an error.
    fn compress(
        &self,
        data: &[u8],
        preset: &QualityPreset,
        remove_metadata: bool,
    ) -> Result<Vec<u8>, BackendError>;
}
