use std::fmt;

/// Which backend produced the compressed bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// External Ghostscript process
    Ghostscript,
    /// In-process lopdf rewrite
    Native,
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionMethod::Ghostscript => f.write_str("ghostscript"),
            CompressionMethod::Native => f.write_str("native"),
        }
    }
}

/// Size statistics for one compression request
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// `original_size - compressed_size`, negative when the output grew
    pub savings_bytes: i64,
    /// Always within [0, 100]
    pub savings_percent: f64,
    pub method: CompressionMethod,
}

impl CompressionStats {
    pub fn new(original_size: u64, compressed_size: u64, method: CompressionMethod) -> Self {
        Self {
            original_size,
            compressed_size,
            savings_bytes: original_size as i64 - compressed_size as i64,
            savings_percent: savings_percent(original_size, compressed_size),
            method,
        }
    }
}

/// Compressed document plus the statistics describing it
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub data: Vec<u8>,
    pub stats: CompressionStats,
}

/// Percentage of the original size removed, clamped to [0, 100].
///
/// An empty original yields 0.
pub fn savings_percent(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let saved = original_size as f64 - compressed_size as f64;
    (saved / original_size as f64 * 100.0).clamp(0.0, 100.0)
}
