use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::defaults::DEFAULT_GHOSTSCRIPT;
use crate::model::QualityLevel;

#[derive(Parser, Debug)]
#[command(name = "pdf-compressor")]
#[command(
    author,
    version,
    about = "Shrink PDF files with Ghostscript, falling back to an in-process rewrite"
)]
pub struct Args {
    /// Input PDF file paths
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for compressed output (defaults to each input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Compression quality
    #[arg(short, long, value_enum, default_value = "medium")]
    pub quality: QualityArg,

    /// Strip document metadata (author, creation date, ...)
    #[arg(long)]
    pub remove_metadata: bool,

    /// Leave embedded images untouched in the fallback path
    #[arg(long)]
    pub no_optimize_images: bool,

    /// Never use Ghostscript, even if it is installed
    #[arg(long)]
    pub native_only: bool,

    /// Ghostscript executable
    #[arg(long = "gs", value_name = "PATH", default_value = DEFAULT_GHOSTSCRIPT)]
    pub ghostscript: PathBuf,

    /// Ghostscript timeout per file, in seconds
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout: u64,

    /// Skip inputs larger than this many MiB
    #[arg(long, value_name = "MB", default_value_t = 200)]
    pub max_size_mb: u64,

    /// Directory for scratch files handed to Ghostscript
    #[arg(long, value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Also bundle every compressed file into one ZIP archive
    #[arg(long)]
    pub zip: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Quality choice on the command line
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum QualityArg {
    /// 72 DPI, image quality 30
    Maximum,
    /// 150 DPI, image quality 50
    High,
    /// 200 DPI, image quality 70
    #[default]
    Medium,
    /// 300 DPI, image quality 85
    Low,
    /// Pick a level per file from its size
    Auto,
}

impl QualityArg {
    /// The fixed level, or None for `auto`
    pub fn level(&self) -> Option<QualityLevel> {
        match self {
            QualityArg::Maximum => Some(QualityLevel::Maximum),
            QualityArg::High => Some(QualityLevel::High),
            QualityArg::Medium => Some(QualityLevel::Medium),
            QualityArg::Low => Some(QualityLevel::Low),
            QualityArg::Auto => None,
        }
    }
}

impl Args {
    pub fn optimize_images(&self) -> bool {
        !self.no_optimize_images
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_size_mb.saturating_mul(1024 * 1024)
    }
}
