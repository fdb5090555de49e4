//! Primary backend: Ghostscript's pdfwrite device run as a subprocess

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tempfile::{Builder, NamedTempFile};

use super::process::run_with_timeout;
use super::CompressionBackend;
use crate::config::defaults::{
    COMPRESS_TIMEOUT, DEFAULT_GHOSTSCRIPT, PDF_COMPATIBILITY_LEVEL, TEMP_FILE_PREFIX,
};
use crate::error::BackendError;
use crate::model::{CompressionMethod, QualityPreset};
use crate::util::validate_pdf_header;

#[derive(Debug, Clone)]
pub struct GhostscriptBackend {
    executable: PathBuf,
    timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl Default for GhostscriptBackend {
    fn default() -> Self {
        Self::new(DEFAULT_GHOSTSCRIPT)
    }
}

impl GhostscriptBackend {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: COMPRESS_TIMEOUT,
            temp_dir: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create scratch files in `dir` instead of the system temp directory
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn tool_name(&self) -> String {
        self.executable.display().to_string()
    }

    /// Ask the tool for its version. Any failure, including a timeout, is an error.
    pub fn version(&self, timeout: Duration) -> Result<String, BackendError> {
        let tool = self.tool_name();
        let mut command = Command::new(&self.executable);
        command.arg("--version");

        let output = run_with_timeout(&mut command, &tool, timeout)?;
        if !output.status.success() {
            return Err(BackendError::Execution {
                tool,
                code: output.status.code(),
                stderr: output.stderr_lossy(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Probe whether the tool can be run at all
    pub fn is_available(&self, timeout: Duration) -> bool {
        match self.version(timeout) {
            Ok(version) => {
                log::debug!("Found {} version {}", self.tool_name(), version);
                true
            }
            Err(e) => {
                log::debug!("Ghostscript unavailable: {}", e);
                false
            }
        }
    }

    /// Argument list for one pdfwrite run
    pub fn build_args(preset: &QualityPreset, input: &Path, output: &Path) -> Vec<OsString> {
        let dpi = preset.dpi;
        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(output);

        vec![
            "-sDEVICE=pdfwrite".into(),
            format!("-dCompatibilityLevel={}", PDF_COMPATIBILITY_LEVEL).into(),
            format!("-dPDFSETTINGS={}", preset.gs_setting).into(),
            "-dNOPAUSE".into(),
            "-dQUIET".into(),
            "-dBATCH".into(),
            format!("-r{}", dpi).into(),
            "-dCompressFonts=true".into(),
            "-dSubsetFonts=true".into(),
            "-dColorImageDownsampleType=/Bicubic".into(),
            format!("-dColorImageResolution={}", dpi).into(),
            "-dGrayImageDownsampleType=/Bicubic".into(),
            format!("-dGrayImageResolution={}", dpi).into(),
            output_arg,
            input.as_os_str().to_os_string(),
        ]
    }

    fn scratch_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = Builder::new();
        builder.prefix(TEMP_FILE_PREFIX).suffix(".pdf");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

impl CompressionBackend for GhostscriptBackend {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Ghostscript
    }

    fn compress(
        &self,
        data: &[u8],
        preset: &QualityPreset,
        _remove_metadata: bool,
    ) -> Result<Vec<u8>, BackendError> {
        // Both files are removed when they drop, on every return path.
        let mut input = self.scratch_file()?;
        input.write_all(data)?;
        input.flush()?;
        let output = self.scratch_file()?;

        let tool = self.tool_name();
        let mut command = Command::new(&self.executable);
        command.args(Self::build_args(preset, input.path(), output.path()));

        log::debug!(
            "Running {} with PDFSETTINGS={} at {} DPI",
            tool,
            preset.gs_setting,
            preset.dpi
        );
        let result = run_with_timeout(&mut command, &tool, self.timeout)?;
        if !result.status.success() {
            return Err(BackendError::Execution {
                tool,
                code: result.status.code(),
                stderr: result.stderr_lossy(),
            });
        }

        let compressed = fs::read(output.path())?;
        if !validate_pdf_header(&compressed) {
            return Err(BackendError::Execution {
                tool,
                code: result.status.code(),
                stderr: "no PDF written to output file".to_string(),
            });
        }
        Ok(compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::get_preset;

    #[test]
    fn test_build_args_follow_preset() {
        let preset = get_preset("maximum");
        let args = GhostscriptBackend::build_args(preset, Path::new("/tmp/in.pdf"), Path::new("/tmp/out.pdf"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args[0], "-sDEVICE=pdfwrite");
        assert!(args.contains(&"-dCompatibilityLevel=1.4".to_string()));
        assert!(args.contains(&"-dPDFSETTINGS=/screen".to_string()));
        assert!(args.contains(&"-dColorImageResolution=72".to_string()));
        assert!(args.contains(&"-dGrayImageResolution=72".to_string()));
        assert!(args.contains(&"-dColorImageDownsampleType=/Bicubic".to_string()));
        assert!(args.contains(&"-dSubsetFonts=true".to_string()));
        assert!(args.contains(&"-dBATCH".to_string()));
        assert_eq!(args[args.len() - 2], "-sOutputFile=/tmp/out.pdf");
        assert_eq!(args[args.len() - 1], "/tmp/in.pdf");
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let backend = GhostscriptBackend::new("/nonexistent/gs-not-here");
        assert!(!backend.is_available(Duration::from_secs(1)));
    }

    #[test]
    fn test_missing_tool_compress_fails_without_leaking_files() {
        let scratch = tempfile::tempdir().unwrap();
        let backend = GhostscriptBackend::new("/nonexistent/gs-not-here")
            .with_temp_dir(Some(scratch.path().to_path_buf()));

        let err = backend
            .compress(b"%PDF-1.4\n%%EOF\n", get_preset("medium"), false)
            .unwrap_err();
        assert!(err.is_execution_failure());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
