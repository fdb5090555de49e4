use std::path::PathBuf;
use std::time::Duration;

use crate::batch::BatchOptions;
use crate::cli::Args;
use crate::compress::CompressorOptions;
use crate::model::QualityLevel;
use crate::util::recommend_level;

use super::defaults::*;

/// How the quality level is chosen for each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualitySelection {
    Fixed(QualityLevel),
    /// Recommend a level from the file's size
    Auto,
}

impl QualitySelection {
    pub fn level_for(&self, file_size: u64) -> QualityLevel {
        match self {
            QualitySelection::Fixed(level) => *level,
            QualitySelection::Auto => recommend_level(file_size),
        }
    }
}

impl Default for QualitySelection {
    fn default() -> Self {
        QualitySelection::Fixed(QualityLevel::Medium)
    }
}

/// Runtime settings for a compression session
#[derive(Debug, Clone)]
pub struct Settings {
    pub quality: QualitySelection,
    pub remove_metadata: bool,
    pub optimize_images: bool,
    /// Skip the Ghostscript probe and always use the native path
    pub native_only: bool,

    pub ghostscript: PathBuf,
    pub compress_timeout: Duration,
    pub probe_timeout: Duration,
    pub temp_dir: Option<PathBuf>,

    pub max_file_size: u64,
    /// None = write next to each input
    pub output_dir: Option<PathBuf>,
    pub write_archive: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualitySelection::default(),
            remove_metadata: false,
            optimize_images: true,
            native_only: false,

            ghostscript: PathBuf::from(DEFAULT_GHOSTSCRIPT),
            compress_timeout: COMPRESS_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            temp_dir: None,

            max_file_size: MAX_UPLOAD_BYTES,
            output_dir: None,
            write_archive: false,
        }
    }
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_args(args: &Args) -> Self {
        let quality = match args.quality.level() {
            Some(level) => QualitySelection::Fixed(level),
            None => QualitySelection::Auto,
        };

        Self {
            quality,
            remove_metadata: args.remove_metadata,
            optimize_images: args.optimize_images(),
            native_only: args.native_only,
            ghostscript: args.ghostscript.clone(),
            compress_timeout: Duration::from_secs(args.timeout),
            temp_dir: args.temp_dir.clone(),
            max_file_size: args.max_file_size_bytes(),
            output_dir: args.output_dir.clone(),
            write_archive: args.zip,
            ..Default::default()
        }
    }

    /// Options for constructing a `PdfCompressor`
    pub fn compressor_options(&self) -> CompressorOptions {
        CompressorOptions {
            ghostscript: self.ghostscript.clone(),
            use_ghostscript: !self.native_only,
            optimize_images: self.optimize_images,
            compress_timeout: self.compress_timeout,
            probe_timeout: self.probe_timeout,
            temp_dir: self.temp_dir.clone(),
        }
    }

    /// Options for `process_batch`
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            quality: self.quality,
            remove_metadata: self.remove_metadata,
            max_file_size: self.max_file_size,
        }
    }
}
