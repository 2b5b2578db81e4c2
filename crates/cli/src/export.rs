//! CSV export of collected records.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use tracing::info;
use veil_types::Record;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: record does not match the {columns}-column header")]
    MixedRecords { path: PathBuf, columns: usize },

    #[error("failed to flush {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// `{timestamp}.csv` for search exports.
pub fn search_file_name(now: DateTime<Local>) -> String {
    format!("{}.csv", now.format(FILE_TIMESTAMP_FORMAT))
}

/// `{name}-{degree}-{timestamp}.csv` for transcript exports.
pub fn transcript_file_name(student_name: &str, degree: &str, now: DateTime<Local>) -> String {
    let clean = |part: &str| part.replace(['/', '\\'], "_");
    format!("{}-{}-{}.csv", clean(student_name), clean(degree), now.format(FILE_TIMESTAMP_FORMAT))
}

/// Writes `header` then `records` and returns the number of rows written.
///
/// The header is written even when there are no records. Every record must
/// be of the kind `header` describes.
pub fn write_records(path: &Path, header: &[&str], records: &[Record]) -> Result<usize, ExportError> {
    let csv_error = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(header).map_err(csv_error)?;
    for record in records {
        if record.header() != header {
            return Err(ExportError::MixedRecords {
                path: path.to_path_buf(),
                columns: header.len(),
            });
        }
        writer.write_record(record.fields()).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = records.len(), "exported records");
    Ok(records.len())
}
