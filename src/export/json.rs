use super::ExportRecord;
use crate::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Write an export record to a pretty-printed JSON file
pub fn export_record<P: AsRef<Path>>(record: &ExportRecord, output_path: P) -> Result<(), ExportError> {
    export_json(record, output_path)
}

/// Export any serializable data structure to JSON
pub fn export_json<T, P>(data: &T, output_path: P) -> Result<(), ExportError>
where
    T: serde::Serialize,
    P: AsRef<Path>,
{
    let path = output_path.as_ref();
    let json_data = serde_json::to_string_pretty(data)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;

    let write_failed = |e: std::io::Error| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut file = std::fs::File::create(path).map_err(write_failed)?;
    file.write_all(json_data.as_bytes()).map_err(write_failed)?;

    tracing::debug!(path = %path.display(), "JSON export written");
    Ok(())
}
