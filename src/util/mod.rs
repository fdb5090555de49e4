//! Small helpers shared by the batch front end and the CLI

pub mod files;
pub mod format;

pub use files::{
    compressed_file_name, is_pdf_name, output_path, recommend_level, sanitize_filename,
    validate_pdf_header,
};
pub use format::{format_duration, format_file_size};
