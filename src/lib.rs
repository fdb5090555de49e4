pub mod batch;
pub mod cli;
pub mod compress;
pub mod config;
pub mod error;
pub mod model;
pub mod util;

pub use batch::{process_batch, BatchOptions, BatchSummary, FileOutcome};
pub use compress::{CompressionBackend, CompressorOptions, GhostscriptBackend, NativeBackend, PdfCompressor};
pub use config::Settings;
pub use error::{BackendError, CompressError, OutputError};
pub use model::{get_preset, CompressionMethod, CompressionResult, CompressionStats, QualityLevel, QualityPreset};

/// Compress one PDF with default options.
///
/// This is the simplest entry point for library consumers. It probes for
/// Ghostscript, uses it if present and falls back to the in-process rewrite
/// otherwise. Build a `PdfCompressor` directly to reuse the probe result across
/// many files.
///
/// # Arguments
///
/// * `data` - The complete PDF file
/// * `quality_level` - `"maximum"`, `"high"`, `"medium"` or `"low"`; anything
///   else is treated as `"medium"`
/// * `remove_metadata` - Clear the document information dictionary (native path only)
///
/// # Example
///
/// ```no_run
/// use pdf_compressor::compress_pdf;
///
/// let input = std::fs::read("scan.pdf").unwrap();
/// let result = compress_pdf(&input, "high", false).unwrap();
///
/// println!(
///     "{} -> {} bytes via {}",
///     result.stats.original_size, result.stats.compressed_size, result.stats.method
/// );
/// std::fs::write("scan_compressed.pdf", result.data).unwrap();
/// ```
pub fn compress_pdf(
    data: &[u8],
    quality_level: &str,
    remove_metadata: bool,
) -> Result<CompressionResult, CompressError> {
    PdfCompressor::new(&CompressorOptions::default()).compress(data, quality_level, remove_metadata)
}
