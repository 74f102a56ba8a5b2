// Header naming shared by the CSV and workbook readers

use std::collections::HashSet;

use ledgerlink_recon::Record;
use serde_json::Value;

const EMPTY_HEADER: &str = "__EMPTY";

/// Column names derived from the header row.
///
/// Blank header cells become `__EMPTY`, `__EMPTY_1`, ... and repeated names
/// get a numeric suffix (`Name`, `Name_1`, ...), so every column has a
/// distinct key.
pub(crate) struct Headers {
    names: Vec<String>,
    taken: HashSet<String>,
}

impl Headers {
    pub(crate) fn new<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut headers = Self {
            names: Vec::new(),
            taken: HashSet::new(),
        };
        for cell in cells {
            headers.push(cell);
        }
        headers
    }

    fn push(&mut self, cell: Option<String>) {
        let base = cell
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| EMPTY_HEADER.to_string());

        let mut name = base.clone();
        let mut n = 1;
        while self.taken.contains(&name) {
            name = format!("{base}_{n}");
            n += 1;
        }
        self.taken.insert(name.clone());
        self.names.push(name);
    }

    /// Name for column `idx`, extending with `__EMPTY_n` for ragged rows.
    pub(crate) fn name(&mut self, idx: usize) -> &str {
        while self.names.len() <= idx {
            self.push(None);
        }
        &self.names[idx]
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> &[String] {
        &self.names
    }
}

/// Build a record from `(column, value)` cells. `None` if every cell is empty.
pub(crate) fn build_record<I>(headers: &mut Headers, cells: I) -> Option<Record>
where
    I: IntoIterator<Item = (usize, Value)>,
{
    let mut record = Record::new();
    for (idx, value) in cells {
        record.insert(headers.name(idx).to_string(), value);
    }
    (!record.is_empty()).then_some(record)
}
