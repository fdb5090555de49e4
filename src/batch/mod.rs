//! Sequential processing of many uploads, as a front end would drive it

pub mod archive;
pub mod runner;

pub use archive::{build_archive, compressed_outputs, write_archive, NamedOutput};
pub use runner::{process_batch, validate_upload, BatchOptions, BatchSummary, FileOutcome};
