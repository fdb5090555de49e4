use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::COMPRESSED_SUFFIX;
use crate::model::QualityLevel;

/// Longest file name most filesystems accept
const MAX_FILENAME_LEN: usize = 255;

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Replace characters that are invalid on common filesystems and trim stray dots/spaces
pub fn sanitize_filename(filename: &str) -> String {
    let replaced: String = filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect();
    let mut sanitized = replaced.trim_matches(|c| c == '.' || c == ' ').to_string();

    if sanitized.chars().count() > MAX_FILENAME_LEN {
        let path = Path::new(&sanitized);
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let keep = MAX_FILENAME_LEN.saturating_sub(ext.chars().count());
        sanitized = stem.chars().take(keep).collect::<String>() + &ext;
    }

    if sanitized.is_empty() {
        "unnamed_file".to_string()
    } else {
        sanitized
    }
}

/// Name for the compressed copy of `original`: `<stem>_compressed.pdf`
pub fn compressed_file_name(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    sanitize_filename(&format!("{}{}.pdf", stem, COMPRESSED_SUFFIX))
}

/// `dir/name`, or `dir/<stem>_2.pdf`, `_3`, ... while the candidate is in `reserved`
pub fn output_path(dir: &Path, name: &str, reserved: &HashSet<PathBuf>) -> PathBuf {
    let stem = name.strip_suffix(".pdf").unwrap_or(name);
    let mut candidate = dir.join(name);
    let mut n = 2;
    while reserved.contains(&candidate) {
        candidate = dir.join(format!("{}_{}.pdf", stem, n));
        n += 1;
    }
    candidate
}

/// True when the name ends in `.pdf`, ignoring case
pub fn is_pdf_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".pdf")
}

/// True when the bytes start with the `%PDF-` signature
pub fn validate_pdf_header(data: &[u8]) -> bool {
    data.starts_with(PDF_SIGNATURE)
}

/// Suggested level for a file of the given size
pub fn recommend_level(file_size: u64) -> QualityLevel {
    const MIB: u64 = 1024 * 1024;
    if file_size < 5 * MIB {
        QualityLevel::Medium
    } else if file_size < 20 * MIB {
        QualityLevel::High
    } else {
        QualityLevel::Maximum
    }
}
