use std::io::{Cursor, Read};

use tracing::debug;
use zip::ZipArchive;

use crate::error::IngestError;

/// The tabular file pulled out of a downloaded archive.
pub enum TableFile {
    Workbook(Vec<u8>),
    Csv(String),
}

/// Pick and extract the best tabular entry from a ZIP payload.
///
/// Eligible entries end in `.xlsx` or `.csv` (case-insensitive). `.xlsx`
/// beats `.csv`; within the same extension the longer name wins, since the
/// full export tends to carry the longer name than temp/auxiliary files.
pub fn extract_table(bytes: &[u8]) -> Result<TableFile, IngestError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| is_eligible(n))
        .map(String::from)
        .collect();
    if names.is_empty() {
        return Err(IngestError::Format(
            "archive contains no .xlsx or .csv entries".to_string(),
        ));
    }

    names.sort_by(|a, b| {
        ext_rank(a)
            .cmp(&ext_rank(b))
            .then(b.len().cmp(&a.len()))
    });
    let chosen = &names[0];
    debug!(entry = %chosen, candidates = names.len(), "selected archive entry");

    let mut entry = archive.by_name(chosen)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf).map_err(|e| {
        IngestError::Format(format!("failed to read archive entry {}: {}", chosen, e))
    })?;

    if chosen.to_lowercase().ends_with(".csv") {
        Ok(TableFile::Csv(String::from_utf8_lossy(&buf).into_owned()))
    } else {
        Ok(TableFile::Workbook(buf))
    }
}

fn is_eligible(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".xlsx") || lower.ends_with(".csv")
}

fn ext_rank(name: &str) -> u8 {
    if name.to_lowercase().ends_with(".xlsx") {
        0
    } else {
        1
    }
}
