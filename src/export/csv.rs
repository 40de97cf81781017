use crate::error::ExportError;
use crate::history::HistoryLog;
use std::io::Write;
use std::path::Path;

const HEADER: [&str; 5] = ["id", "timestamp", "metric", "value", "category"];

/// Write history entries as CSV, newest first
pub fn write_history<W: Write>(history: &HistoryLog, writer: W) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    let to_error = |e: ::csv::Error| ExportError::Serialization(e.to_string());

    wtr.write_record(HEADER).map_err(to_error)?;
    for entry in history.entries() {
        wtr.write_record([
            entry.id.to_string(),
            entry.timestamp.to_rfc3339(),
            entry.metric.clone(),
            entry.value.to_string(),
            entry.category.to_string(),
        ])
        .map_err(to_error)?;
    }

    wtr.flush()
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    Ok(())
}

/// Export history to a CSV file
pub fn export_history<P: AsRef<Path>>(history: &HistoryLog, output_path: P) -> Result<(), ExportError> {
    let path = output_path.as_ref();
    let file = std::fs::File::create(path).map_err(|e| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    write_history(history, file)?;
    tracing::debug!(path = %path.display(), entries = history.len(), "History CSV written");
    Ok(())
}
