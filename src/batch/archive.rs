use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use super::runner::FileOutcome;
use crate::error::OutputError;
use crate::model::CompressionResult;
use crate::util::compressed_file_name;

/// A successful result paired with its output file name
#[derive(Debug)]
pub struct NamedOutput<'a> {
    /// Position of the source file in the batch
    pub index: usize,
    pub name: String,
    pub result: &'a CompressionResult,
}

/// Output names for every successful outcome, made unique within the batch
pub fn compressed_outputs(outcomes: &[FileOutcome]) -> Vec<NamedOutput<'_>> {
    let mut used = HashSet::new();
    let mut outputs = Vec::new();

    for (index, outcome) in outcomes.iter().enumerate() {
        let Some(result) = outcome.result() else {
            continue;
        };

        let name = compressed_file_name(outcome.filename());
        let mut candidate = name.clone();
        let mut n = 2;
        while !used.insert(candidate.clone()) {
            let stem = name.strip_suffix(".pdf").unwrap_or(&name);
            candidate = format!("{}_{}.pdf", stem, n);
            n += 1;
        }
        outputs.push(NamedOutput {
            index,
            name: candidate,
            result,
        });
    }

    outputs
}

/// Write every successful result into a deflated ZIP archive
pub fn write_archive<W: Write + Seek>(writer: W, outcomes: &[FileOutcome]) -> Result<W, OutputError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for output in compressed_outputs(outcomes) {
        zip.start_file(output.name, options)?;
        zip.write_all(&output.result.data)?;
    }

    Ok(zip.finish()?)
}

/// In-memory ZIP of every successful result
pub fn build_archive(outcomes: &[FileOutcome]) -> Result<Vec<u8>, OutputError> {
    let cursor = write_archive(Cursor::new(Vec::new()), outcomes)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompressError;
    use crate::model::{CompressionMethod, CompressionStats, QualityLevel};
    use std::io::Read;
    use zip::ZipArchive;

    fn success(name: &str, data: &[u8]) -> FileOutcome {
        FileOutcome::Success {
            filename: name.to_string(),
            level: QualityLevel::Medium,
            result: CompressionResult {
                data: data.to_vec(),
                stats: CompressionStats::new(100, data.len() as u64, CompressionMethod::Native),
            },
        }
    }

    fn failure(name: &str) -> FileOutcome {
        FileOutcome::Failed {
            filename: name.to_string(),
            original_size: 10,
            error: CompressError::InvalidInput("Not a PDF file".to_string()),
        }
    }

    #[test]
    fn test_output_names_are_unique() {
        let outcomes = vec![
            success("report.pdf", b"a"),
            success("other/report.pdf", b"b"),
            failure("skip.pdf"),
            success("report.PDF", b"c"),
        ];
        let outputs = compressed_outputs(&outcomes);
        let names: Vec<&str> = outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "report_compressed.pdf",
                "report_compressed_2.pdf",
                "report_compressed_3.pdf",
            ]
        );
        assert_eq!(outputs[2].index, 3);
    }

    #[test]
    fn test_archive_contains_only_successes() {
        let outcomes = vec![
            success("a.pdf", b"%PDF-first"),
            failure("b.pdf"),
            success("c.pdf", b"%PDF-second"),
        ];
        let bytes = build_archive(&outcomes).unwrap();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("c_compressed.pdf")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "%PDF-second");
    }
}
