use std::time::Duration;

/// Ghostscript executable looked up on PATH
pub const DEFAULT_GHOSTSCRIPT: &str = "gs";

/// PDF version requested from Ghostscript's pdfwrite device
pub const PDF_COMPATIBILITY_LEVEL: &str = "1.4";

/// Hard limit for one Ghostscript compression run
pub const COMPRESS_TIMEOUT: Duration = Duration::from_secs(300);

/// Hard limit for the `gs --version` availability probe
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// How often a running subprocess is polled for exit
pub const PROCESS_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Largest upload accepted by the batch front end (200 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Embedded images are capped at `dpi * IMAGE_PIXELS_PER_DPI` pixels on their long side
pub const IMAGE_PIXELS_PER_DPI: u32 = 10;

/// Appended to the input stem when naming outputs
pub const COMPRESSED_SUFFIX: &str = "_compressed";

/// Name of the bulk download archive
pub const ARCHIVE_NAME: &str = "compressed_pdfs.zip";

/// Prefix for scoped temp files handed to Ghostscript
pub const TEMP_FILE_PREFIX: &str = "pdf-compressor-";
