use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use pdf_compressor::batch::{compressed_outputs, process_batch, write_archive, BatchSummary, FileOutcome};
use pdf_compressor::cli::Args;
use pdf_compressor::config::defaults::ARCHIVE_NAME;
use pdf_compressor::config::Settings;
use pdf_compressor::model::UploadedFile;
use pdf_compressor::util::{format_duration, format_file_size, output_path};
use pdf_compressor::PdfCompressor;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let settings = Settings::from_args(&args);
    let started = Instant::now();

    // Unreadable inputs are reported like any other per-file failure
    let mut paths = Vec::new();
    let mut uploads = Vec::new();
    let mut unreadable = Vec::new();
    for path in &args.inputs {
        match UploadedFile::from_path(path) {
            Ok(file) => {
                paths.push(path.as_path());
                uploads.push(file);
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                unreadable.push((path.display().to_string(), e.to_string()));
            }
        }
    }

    let compressor = PdfCompressor::new(&settings.compressor_options());
    let outcomes = process_batch(&compressor, &uploads, &settings.batch_options(), |i, total, name| {
        log::info!("Processing {}/{}: {}", i + 1, total, name);
    });

    // Inputs are never overwritten, and neither is an output written earlier in this run
    let mut reserved: HashSet<PathBuf> = paths.iter().filter_map(|p| fs::canonicalize(p).ok()).collect();

    let outputs = compressed_outputs(&outcomes);
    for output in &outputs {
        let dir = output_dir(&settings, Some(paths[output.index]))?;
        let target = output_path(&dir, &output.name, &reserved);
        fs::write(&target, &output.result.data)
            .with_context(|| format!("Failed to write output file: {}", target.display()))?;
        log::info!("Wrote {}", target.display());
        reserved.insert(target);
    }

    if settings.write_archive && !outputs.is_empty() {
        let dir = output_dir(&settings, None)?;
        let archive_path = dir.join(ARCHIVE_NAME);
        let file = fs::File::create(&archive_path)
            .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
        write_archive(file, &outcomes)
            .with_context(|| format!("Failed to write archive: {}", archive_path.display()))?;
        println!("Wrote {}", archive_path.display());
    }

    print_results(&outcomes, &unreadable);
    println!("Finished in {}", format_duration(started.elapsed()));

    let summary = BatchSummary::from_outcomes(&outcomes);
    if summary.successful == 0 {
        anyhow::bail!("No files were successfully compressed");
    }

    Ok(())
}

/// Where outputs go, canonicalized: `--output-dir`, else the input's own directory
fn output_dir(settings: &Settings, input: Option<&Path>) -> Result<PathBuf> {
    let dir = match (&settings.output_dir, input) {
        (Some(dir), _) => dir.clone(),
        (None, Some(path)) => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        (None, None) => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    fs::canonicalize(&dir)
        .with_context(|| format!("Failed to resolve output directory: {}", dir.display()))
}

fn print_results(outcomes: &[FileOutcome], unreadable: &[(String, String)]) {
    println!(
        "{:<40} {:<8} {:>12} {:>12} {:>10}  {}",
        "File", "Status", "Original", "Compressed", "Savings", "Method"
    );

    for outcome in outcomes {
        match outcome {
            FileOutcome::Success { filename, result, .. } => println!(
                "{:<40} {:<8} {:>12} {:>12} {:>9.1}%  {}",
                filename,
                "ok",
                format_file_size(result.stats.original_size as i64),
                format_file_size(result.stats.compressed_size as i64),
                result.stats.savings_percent,
                result.stats.method.to_string().to_uppercase()
            ),
            FileOutcome::Failed {
                filename,
                original_size,
                error,
            } => println!(
                "{:<40} {:<8} {:>12} {:>12} {}",
                filename,
                "error",
                format_file_size(*original_size as i64),
                "N/A",
                error
            ),
        }
    }
    for (path, error) in unreadable {
        println!("{:<40} {:<8} {:>12} {:>12} {}", path, "error", "N/A", "N/A", error);
    }

    let summary = BatchSummary::from_outcomes(outcomes);
    println!(
        "\n{} files, {} successful, {} failed; saved {} ({:.1}% average)",
        summary.total_files + unreadable.len(),
        summary.successful,
        summary.failed + unreadable.len(),
        format_file_size(summary.total_saved),
        summary.average_savings_percent
    );
}
