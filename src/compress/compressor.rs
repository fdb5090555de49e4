use std::path::PathBuf;
use std::time::Duration;

use super::ghostscript::GhostscriptBackend;
use super::native::NativeBackend;
use super::CompressionBackend;
use crate::config::defaults::{COMPRESS_TIMEOUT, DEFAULT_GHOSTSCRIPT, PROBE_TIMEOUT};
use crate::error::CompressError;
use crate::model::{
    get_preset, CompressionMethod, CompressionResult, CompressionStats, QualityLevel,
    QualityPreset,
};

/// Options for building a `PdfCompressor`
#[derive(Debug, Clone)]
pub struct CompressorOptions {
    pub ghostscript: PathBuf,
    /// When false the probe is skipped and Ghostscript is never used
    pub use_ghostscript: bool,
    pub optimize_images: bool,
    pub compress_timeout: Duration,
    pub probe_timeout: Duration,
    pub temp_dir: Option<PathBuf>,
}

impl Default for CompressorOptions {
    fn default() -> Self {
        Self {
            ghostscript: PathBuf::from(DEFAULT_GHOSTSCRIPT),
            use_ghostscript: true,
            optimize_images: true,
            compress_timeout: COMPRESS_TIMEOUT,
            probe_timeout: PROBE_TIMEOUT,
            temp_dir: None,
        }
    }
}

/// Picks a backend per request and reports size savings.
///
/// Ghostscript availability is probed once, at construction. A compressor built
/// without a primary backend never tries one, even if the tool appears later.
pub struct PdfCompressor {
    primary: Option<Box<dyn CompressionBackend>>,
    fallback: Box<dyn CompressionBackend>,
}

impl PdfCompressor {
    /// Probe for Ghostscript and build a compressor around whatever is available
    pub fn new(options: &CompressorOptions) -> Self {
        let fallback = NativeBackend::new(options.optimize_images);

        let primary = if options.use_ghostscript {
            let gs = GhostscriptBackend::new(&options.ghostscript)
                .with_timeout(options.compress_timeout)
                .with_temp_dir(options.temp_dir.clone());
            if gs.is_available(options.probe_timeout) {
                log::info!("Using {} as primary backend", gs.executable().display());
                Some(gs)
            } else {
                log::info!(
                    "{} not available, using native compression only",
                    gs.executable().display()
                );
                None
            }
        } else {
            None
        };

        Self {
            primary: primary.map(|gs| Box::new(gs) as Box<dyn CompressionBackend>),
            fallback: Box::new(fallback),
        }
    }

    /// Build from explicit backends, skipping the probe
    pub fn with_backends(
        primary: Option<Box<dyn CompressionBackend>>,
        fallback: Box<dyn CompressionBackend>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Whether the primary backend was found at construction
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Compress with a level key; unknown keys use the medium preset.
    pub fn compress(
        &self,
        data: &[u8],
        quality_level: &str,
        remove_metadata: bool,
    ) -> Result<CompressionResult, CompressError> {
        self.compress_with_preset(data, get_preset(quality_level), remove_metadata)
    }

    pub fn compress_level(
        &self,
        data: &[u8],
        level: QualityLevel,
        remove_metadata: bool,
    ) -> Result<CompressionResult, CompressError> {
        self.compress_with_preset(data, level.preset(), remove_metadata)
    }

    fn compress_with_preset(
        &self,
        data: &[u8],
        preset: &QualityPreset,
        remove_metadata: bool,
    ) -> Result<CompressionResult, CompressError> {
        let original_size = data.len() as u64;

        let (compressed, method) = match &self.primary {
            Some(primary) => match primary.compress(data, preset, remove_metadata) {
                Ok(bytes) => (bytes, primary.method()),
                Err(e) => {
                    log::warn!("{} failed, falling back: {}", primary.method(), e);
                    self.run_fallback(data, preset, remove_metadata)?
                }
            },
            None => self.run_fallback(data, preset, remove_metadata)?,
        };

        let stats = CompressionStats::new(original_size, compressed.len() as u64, method);
        log::info!(
            "{} -> {} bytes ({:.1}% saved, {})",
            stats.original_size,
            stats.compressed_size,
            stats.savings_percent,
            stats.method
        );

        Ok(CompressionResult {
            data: compressed,
            stats,
        })
    }

    fn run_fallback(
        &self,
        data: &[u8],
        preset: &QualityPreset,
        remove_metadata: bool,
    ) -> Result<(Vec<u8>, CompressionMethod), CompressError> {
        let method = self.fallback.method();
        self.fallback
            .compress(data, preset, remove_metadata)
            .map(|bytes| (bytes, method))
            .map_err(|source| CompressError::CompressionFailure { method, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Backend returning canned output and counting calls
    struct Canned {
        method: CompressionMethod,
        output: Option<Vec<u8>>,
        calls: Rc<Cell<usize>>,
    }

    impl Canned {
        fn ok(
            method: CompressionMethod,
            output: &[u8],
            calls: Rc<Cell<usize>>,
        ) -> Box<dyn CompressionBackend> {
            Box::new(Self {
                method,
                output: Some(output.to_vec()),
                calls,
            })
        }

        fn failing(method: CompressionMethod, calls: Rc<Cell<usize>>) -> Box<dyn CompressionBackend> {
            Box::new(Self {
                method,
                output: None,
                calls,
            })
        }
    }

    impl CompressionBackend for Canned {
        fn method(&self) -> CompressionMethod {
            self.method
        }

        fn compress(&self, _: &[u8], _: &QualityPreset, _: bool) -> Result<Vec<u8>, BackendError> {
            self.calls.set(self.calls.get() + 1);
            self.output.clone().ok_or_else(|| BackendError::Execution {
                tool: "canned".to_string(),
                code: Some(1),
                stderr: "forced failure".to_string(),
            })
        }
    }

    #[test]
    fn test_primary_used_when_it_succeeds() {
        let primary_calls = Rc::new(Cell::new(0));
        let fallback_calls = Rc::new(Cell::new(0));
        let compressor = PdfCompressor::with_backends(
            Some(Canned::ok(CompressionMethod::Ghostscript, &[1; 40], primary_calls.clone())),
            Canned::ok(CompressionMethod::Native, &[2; 80], fallback_calls.clone()),
        );

        let result = compressor.compress(&[0; 100], "maximum", false).unwrap();
        assert_eq!(result.stats.method, CompressionMethod::Ghostscript);
        assert_eq!(result.stats.compressed_size, 40);
        assert_eq!(result.stats.savings_bytes, 60);
        assert!((result.stats.savings_percent - 60.0).abs() < 1e-9);
        assert_eq!(primary_calls.get(), 1);
        assert_eq!(fallback_calls.get(), 0);
    }

    #[test]
    fn test_primary_failure_falls_back_once() {
        let primary_calls = Rc::new(Cell::new(0));
        let fallback_calls = Rc::new(Cell::new(0));
        let compressor = PdfCompressor::with_backends(
            Some(Canned::failing(CompressionMethod::Ghostscript, primary_calls.clone())),
            Canned::ok(CompressionMethod::Native, &[2; 80], fallback_calls.clone()),
        );

        let result = compressor.compress(&[0; 100], "high", false).unwrap();
        assert_eq!(result.stats.method, CompressionMethod::Native);
        assert_eq!(result.data, vec![2; 80]);
        assert_eq!(primary_calls.get(), 1);
        assert_eq!(fallback_calls.get(), 1);
    }

    #[test]
    fn test_no_primary_goes_straight_to_fallback() {
        let fallback_calls = Rc::new(Cell::new(0));
        let compressor = PdfCompressor::with_backends(
            None,
            Canned::ok(CompressionMethod::Native, &[2; 10], fallback_calls.clone()),
        );
        assert!(!compressor.has_primary());

        for _ in 0..3 {
            let result = compressor.compress(&[0; 100], "low", false).unwrap();
            assert_eq!(result.stats.method, CompressionMethod::Native);
        }
        assert_eq!(fallback_calls.get(), 3);
    }

    #[test]
    fn test_both_failing_reports_fallback_error() {
        let primary_calls = Rc::new(Cell::new(0));
        let fallback_calls = Rc::new(Cell::new(0));
        let compressor = PdfCompressor::with_backends(
            Some(Canned::failing(CompressionMethod::Ghostscript, primary_calls.clone())),
            Canned::failing(CompressionMethod::Native, fallback_calls.clone()),
        );

        let err = compressor.compress(&[0; 100], "medium", false).unwrap_err();
        match err {
            CompressError::CompressionFailure { method, .. } => {
                assert_eq!(method, CompressionMethod::Native)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(primary_calls.get(), 1);
        assert_eq!(fallback_calls.get(), 1);
    }

    #[test]
    fn test_growth_is_clamped() {
        let compressor = PdfCompressor::with_backends(
            None,
            Canned::ok(CompressionMethod::Native, &[2; 150], Rc::new(Cell::new(0))),
        );

        let result = compressor.compress(&[0; 100], "medium", false).unwrap();
        assert_eq!(result.stats.savings_bytes, -50);
        assert_eq!(result.stats.savings_percent, 0.0);
    }

    #[test]
    fn test_native_only_options_skip_primary() {
        let options = CompressorOptions {
            use_ghostscript: false,
            ..Default::default()
        };
        assert!(!PdfCompressor::new(&options).has_primary());
    }

    #[test]
    fn test_missing_ghostscript_means_no_primary() {
        let options = CompressorOptions {
            ghostscript: PathBuf::from("/nonexistent/gs-not-here"),
            probe_timeout: Duration::from_secs(1),
            ..Default::default()
        };
        assert!(!PdfCompressor::new(&options).has_primary());
    }
}
