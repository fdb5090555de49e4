use crate::compress::PdfCompressor;
use crate::config::defaults::MAX_UPLOAD_BYTES;
use crate::config::QualitySelection;
use crate::error::CompressError;
use crate::model::{CompressionResult, QualityLevel, UploadedFile};
use crate::util::{format_file_size, is_pdf_name, validate_pdf_header};

/// Per-batch choices shared by every file
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub quality: QualitySelection,
    pub remove_metadata: bool,
    pub max_file_size: u64,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            quality: QualitySelection::default(),
            remove_metadata: false,
            max_file_size: MAX_UPLOAD_BYTES,
        }
    }
}

/// Result of one file in a batch
#[derive(Debug)]
pub enum FileOutcome {
    Success {
        filename: String,
        level: QualityLevel,
        result: CompressionResult,
    },
    Failed {
        filename: String,
        original_size: u64,
        error: CompressError,
    },
}

impl FileOutcome {
    pub fn filename(&self) -> &str {
        match self {
            FileOutcome::Success { filename, .. } | FileOutcome::Failed { filename, .. } => filename,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success { .. })
    }

    pub fn result(&self) -> Option<&CompressionResult> {
        match self {
            FileOutcome::Success { result, .. } => Some(result),
            FileOutcome::Failed { .. } => None,
        }
    }

    pub fn original_size(&self) -> u64 {
        match self {
            FileOutcome::Success { result, .. } => result.stats.original_size,
            FileOutcome::Failed { original_size, .. } => *original_size,
        }
    }
}

/// Front-end admission checks: `.pdf` name, size ceiling, `%PDF-` signature
pub fn validate_upload(file: &UploadedFile, max_file_size: u64) -> Result<(), CompressError> {
    if !is_pdf_name(&file.name) {
        return Err(CompressError::InvalidInput("Not a PDF file".to_string()));
    }
    if file.size > max_file_size {
        return Err(CompressError::InvalidInput(format!(
            "File exceeds {} limit",
            format_file_size(max_file_size as i64)
        )));
    }
    if !validate_pdf_header(&file.content) {
        return Err(CompressError::InvalidInput(
            "Missing %PDF- header".to_string(),
        ));
    }
    Ok(())
}

/// Compress each file in turn.
///
/// A failing file is recorded and the batch moves on. `progress` is called with
/// `(index, total, filename)` before each file starts.
pub fn process_batch<F>(
    compressor: &PdfCompressor,
    files: &[UploadedFile],
    options: &BatchOptions,
    mut progress: F,
) -> Vec<FileOutcome>
where
    F: FnMut(usize, usize, &str),
{
    let total = files.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, file) in files.iter().enumerate() {
        progress(index, total, &file.name);

        let outcome = match compress_one(compressor, file, options) {
            Ok((level, result)) => FileOutcome::Success {
                filename: file.name.clone(),
                level,
                result,
            },
            Err(error) => {
                log::warn!("{}: {}", file.name, error);
                FileOutcome::Failed {
                    filename: file.name.clone(),
                    original_size: file.size,
                    error,
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

fn compress_one(
    compressor: &PdfCompressor,
    file: &UploadedFile,
    options: &BatchOptions,
) -> Result<(QualityLevel, CompressionResult), CompressError> {
    validate_upload(file, options.max_file_size)?;

    let level = options.quality.level_for(file.size);
    log::info!("Compressing {} at {} quality", file.name, level);
    let result = compressor.compress_level(&file.content, level, options.remove_metadata)?;
    Ok((level, result))
}

/// Totals over a finished batch. Byte totals cover successful files only.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_original: u64,
    pub total_compressed: u64,
    pub total_saved: i64,
    pub average_savings_percent: f64,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let results: Vec<&CompressionResult> = outcomes.iter().filter_map(|o| o.result()).collect();

        let total_original: u64 = results.iter().map(|r| r.stats.original_size).sum();
        let total_compressed: u64 = results.iter().map(|r| r.stats.compressed_size).sum();
        let total_saved = total_original as i64 - total_compressed as i64;
        let average_savings_percent = if total_original > 0 {
            total_saved as f64 / total_original as f64 * 100.0
        } else {
            0.0
        };

        Self {
            total_files: outcomes.len(),
            successful: results.len(),
            failed: outcomes.len() - results.len(),
            total_original,
            total_compressed,
            total_saved,
            average_savings_percent,
        }
    }
}
