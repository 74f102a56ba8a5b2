use std::fmt;

#[derive(Debug)]
pub enum IngestError {
    /// Extension is not a recognised spreadsheet format.
    UnsupportedFormat(String),
    /// No header row (empty file or empty first sheet).
    Empty,
    Io(String),
    /// Malformed delimited text.
    Csv(String),
    /// Workbook could not be opened or read.
    Workbook(String),
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(name) => write!(
                f,
                "unsupported file format: {name} (expected .csv, .tsv, .xlsx, .xls, .xlsb or .ods)"
            ),
            Self::Empty => write!(f, "file has no header row"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Workbook(msg) => write!(f, "workbook error: {msg}"),
        }
    }
}

impl std::error::Error for IngestError {}
