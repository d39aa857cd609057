//! CSV event files -> ordered raw rows.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::core::model::RawRecord;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to read csv header: {0}")]
    Header(#[source] csv::Error),
}

/// Read every row of the CSV at `path`. The header row names the columns.
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>, LoadError> {
    let reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let rows = collect_rows(reader)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "loaded timeline records");
    Ok(rows)
}

pub fn read_records<R: Read>(input: R) -> Result<Vec<RawRecord>, LoadError> {
    let reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(input);
    collect_rows(reader)
}

/// Lines that fail to decode are logged and dropped; the rest still load.
fn collect_rows<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawRecord>, LoadError> {
    let headers = reader.headers().map_err(LoadError::Header)?.clone();
    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) => rows.push(to_raw(&headers, &record)),
            Err(err) => tracing::warn!(line = line + 2, error = %err, "skipping unreadable csv line"),
        }
    }
    Ok(rows)
}

fn to_raw(headers: &StringRecord, record: &StringRecord) -> RawRecord {
    headers
        .iter()
        .zip(record.iter())
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}
