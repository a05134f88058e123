//! Heterogeneous tabular input → normalized records.
//!
//! Both entry points produce the same thing: a rectangular grid of
//! display-formatted cell text. Whatever the upstream tool rendered for a
//! cell is what flows downstream; date and number cells are never collapsed
//! to their underlying serial values.

pub mod header;
pub mod records;

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::debug;

use crate::error::IngestError;
use crate::parse::header::ColumnMap;
use crate::parse::records::LicenseRecord;

/// One fully ingested upstream snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<LicenseRecord>,
    pub column_map: ColumnMap,
}

/// Parse workbook bytes into a grid. With several sheets, the one with the
/// most rows wins; ties keep the earliest sheet in declaration order.
pub fn grid_from_workbook(bytes: &[u8]) -> Result<Vec<Vec<String>>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let mut best: Option<(String, Vec<Vec<String>>)> = None;
    for name in workbook.sheet_names().to_owned() {
        let range = workbook.worksheet_range(&name)?;
        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        match &best {
            Some((_, current)) if grid.len() <= current.len() => {}
            _ => best = Some((name, grid)),
        }
    }

    let (sheet, mut grid) = best.ok_or_else(|| {
        IngestError::Format("workbook contains no readable sheets".to_string())
    })?;
    debug!(sheet = %sheet, rows = grid.len(), "selected workbook sheet");
    pad_rows(&mut grid);
    Ok(grid)
}

/// Parse CSV text into a grid. Rows are taken as-is (no header semantics) and
/// ragged rows are tolerated, then padded to the widest row.
pub fn grid_from_csv(text: &str) -> Result<Vec<Vec<String>>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(|s| s.to_string()).collect());
    }
    pad_rows(&mut grid);
    Ok(grid)
}

/// Grid → snapshot: classify row 0, strip it when it is a header, normalize
/// the rest under the resulting column map.
pub fn to_snapshot(mut grid: Vec<Vec<String>>) -> Snapshot {
    let (is_header, column_map) = match grid.first() {
        Some(row) => header::detect(row),
        None => (false, ColumnMap::fixed()),
    };
    if is_header {
        grid.remove(0);
    }
    let records = records::normalize_records(&grid, &column_map);
    debug!(
        records = records.len(),
        header_detected = is_header,
        "normalized snapshot"
    );
    Snapshot {
        records,
        column_map,
    }
}

fn pad_rows(grid: &mut [Vec<String>]) {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in grid.iter_mut() {
        row.resize(width, String::new());
    }
}

/// Display text for one workbook cell. String cells pass through untouched;
/// date cells render in the US short form the registry publishes.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => {
                if naive.time() == chrono::NaiveTime::MIN {
                    naive.format("%-m/%-d/%Y").to_string()
                } else {
                    naive.format("%-m/%-d/%Y %H:%M").to_string()
                }
            }
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}
