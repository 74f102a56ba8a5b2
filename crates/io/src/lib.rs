//! Dataset ingestion.
//!
//! Turns an uploaded spreadsheet (CSV-like text or a workbook) into a list
//! of records keyed by the header row. Format is chosen by file extension.

pub mod csv;
pub mod xlsx;

mod error;
mod table;

use std::path::Path;

use ledgerlink_recon::Dataset;

pub use error::IngestError;

/// Source formats, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.csv`, `.tsv`, `.txt`
    Delimited,
    /// `.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`
    Workbook,
}

impl Format {
    pub fn from_file_name(file_name: &str) -> Result<Self, IngestError> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            _ => Err(IngestError::UnsupportedFormat(file_name.to_string())),
        }
    }
}

/// Parse an uploaded file's bytes. `file_name` only selects the format.
pub fn load_dataset(bytes: &[u8], file_name: &str) -> Result<Dataset, IngestError> {
    let records = match Format::from_file_name(file_name)? {
        Format::Delimited => csv::parse(bytes)?,
        Format::Workbook => xlsx::parse(bytes)?,
    };
    log::debug!("{file_name}: {} record(s)", records.len());
    Ok(records)
}

pub fn load_dataset_from_path(path: &Path) -> Result<Dataset, IngestError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    // Reject by extension before touching the file.
    Format::from_file_name(&file_name)?;
    let bytes = std::fs::read(path).map_err(|e| IngestError::Io(format!("{}: {e}", path.display())))?;
    load_dataset(&bytes, &file_name)
}
