use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::consts::{ALL_SITES, EXPORT_FILE_NAME, EXPORT_MIME, FIELD_DATE};
use crate::core::ExportTable;
use crate::error::AppError;

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render the export table as CSV text.
///
/// Numbers keep their full precision and are never quoted; absent cells are `0`.
pub(crate) fn export_csv(table: &ExportTable) -> String {
    let mut out = String::new();

    out.push_str(FIELD_DATE);
    for site in &table.columns {
        let _ = write!(out, ",{}", csv_escape(&format!("{site} (kWh)")));
    }
    let _ = write!(out, ",{ALL_SITES} (kWh)");
    out.push('\n');

    for key in &table.rows {
        let _ = write!(out, "{key}");
        for column in 0..table.columns.len() {
            let _ = write!(out, ",{}", table.cell(column, key));
        }
        let _ = write!(out, ",{}", table.total(key));
        out.push('\n');
    }

    out
}

/// Write `Production_data.csv` into `dir`, returning the file path
pub(crate) fn write_export(table: &ExportTable, dir: &Path) -> Result<PathBuf, AppError> {
    let path = dir.join(EXPORT_FILE_NAME);
    let text = export_csv(table);
    fs::write(&path, &text).map_err(|source| AppError::Write {
        path: path.display().to_string(),
        source,
    })?;
    info!(
        path = %path.display(),
        mime = EXPORT_MIME,
        rows = table.rows.len(),
        bytes = text.len(),
        "wrote export"
    );
    Ok(path)
}
