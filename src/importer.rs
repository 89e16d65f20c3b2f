//! CSV entry importer
//!
//! Reads a CSV file whose header row names entry fields (fixed wire names
//! such as `date_created`, or form field ids such as `1` and `2.3`) and
//! submits every following row as a new entry.
//!
//! ```csv
//! email,favorite_color,date_created
//! a@example.com,blue,2024-05-01 10:00:00
//! b@example.com,green,2024-05-02 11:30:00
//! ```
//!
//! A row that cannot be converted or submitted is logged and skipped; only a
//! file that cannot be read at all aborts the import.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::{debug, error, info, warn};

use crate::api::{ApiError, Entry, EntryService};

/// UTF-8 byte-order mark that spreadsheet exports prepend to the first cell
const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data row keyed by header name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub values: HashMap<String, String>,
}

/// Entry created from one row
#[derive(Debug, Clone)]
pub struct ImportedRow {
    pub line: usize,
    /// The submitted entry, carrying its `form_id` and assigned `id`
    pub entry: Entry,
}

/// Row that was skipped
#[derive(Debug)]
pub struct RowFailure {
    pub line: usize,
    pub error: ApiError,
}

/// Outcome of an import run
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub rows: usize,
    pub created: Vec<ImportedRow>,
    pub failures: Vec<RowFailure>,
}

impl ImportSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse CSV content into header-keyed records
///
/// Cells beyond the header width are dropped and missing trailing cells are
/// left unset. A leading byte-order mark is stripped from the first cell of
/// every row, the header included. Bytes that are not valid UTF-8 are
/// replaced with U+FFFD rather than rejecting the row.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<ImportRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = reader.byte_records();

    let header = rows
        .next()
        .ok_or_else(|| anyhow::anyhow!("CSV has no header row"))?
        .context("Failed to read CSV header")?;

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(index, cell)| clean_cell(index, cell))
        .collect();

    debug!("CSV columns: {:?}", columns);

    let mut records = Vec::new();

    for (index, row) in rows.enumerate() {
        let fallback_line = index + 2; // +2 for header + 0-index
        let row = row.with_context(|| format!("Failed to read CSV line {}", fallback_line))?;
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(fallback_line);

        if std::str::from_utf8(row.as_slice()).is_err() {
            warn!("Line {}: invalid UTF-8 replaced", line);
        }

        if row.len() > columns.len() {
            warn!(
                "Line {}: {} cells but only {} columns, extra cells ignored",
                line,
                row.len(),
                columns.len()
            );
        }

        let values = columns
            .iter()
            .zip(row.iter().enumerate())
            .map(|(column, (cell_index, cell))| (column.clone(), clean_cell(cell_index, cell)))
            .collect();

        records.push(ImportRecord { line, values });
    }

    info!("Parsed CSV: {} columns, {} rows", columns.len(), records.len());
    Ok(records)
}

/// Open and parse a CSV file
pub fn read_records_from_path(path: &Path) -> Result<Vec<ImportRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    read_records(file).with_context(|| format!("Failed to read CSV {}", path.display()))
}

/// Submit each record as a new entry on `form_id`
///
/// Failures are collected per row and never abort the run.
pub async fn import_records(
    service: &EntryService,
    form_id: u64,
    records: Vec<ImportRecord>,
) -> ImportSummary {
    let mut summary = ImportSummary {
        rows: records.len(),
        ..ImportSummary::default()
    };

    for record in records {
        let mut entry = match Entry::from_record(&record.values) {
            Ok(entry) => entry,
            Err(e) => {
                error!("Failed to convert entry for line {}: {}", record.line, e);
                summary.failures.push(RowFailure {
                    line: record.line,
                    error: e,
                });
                continue;
            }
        };

        match service.create_entry(form_id, &mut entry).await {
            Ok(()) => {
                info!("Line {}: created entry {:?}", record.line, entry.id());
                summary.created.push(ImportedRow {
                    line: record.line,
                    entry,
                });
            }
            Err(e) => {
                error!("Failed to create entry for line {}: {}", record.line, e);
                summary.failures.push(RowFailure {
                    line: record.line,
                    error: e,
                });
            }
        }
    }

    summary
}

/// Read `path` and import every row into `form_id`
pub async fn import_file(service: &EntryService, form_id: u64, path: &Path) -> Result<ImportSummary> {
    let records = read_records_from_path(path)?;
    Ok(import_records(service, form_id, records).await)
}

fn clean_cell(index: usize, cell: &[u8]) -> String {
    let cell = String::from_utf8_lossy(cell);
    if index == 0 {
        cell.strip_prefix(BYTE_ORDER_MARK).unwrap_or(&*cell).to_string()
    } else {
        cell.into_owned()
    }
}
