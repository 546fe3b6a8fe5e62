// SQLite materialization: every report as a table, for inspection after the run

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};

use linkdiff_recon::NamedReport;

use crate::error::ExportError;

const CATALOG_TABLE: &str = "report_catalog";

const SCHEMA: &str = r#"
CREATE TABLE report_catalog (
    position INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL,
    row_count INTEGER NOT NULL,
    fingerprint TEXT NOT NULL
);
"#;

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Recreate the database at `path` with one all-TEXT table per report plus
/// the `report_catalog` index. Returns the number of rows inserted.
pub fn materialize(reports: &[NamedReport], path: &Path) -> Result<usize, ExportError> {
    // Delete existing file if present (SQLite will create fresh)
    if path.exists() {
        std::fs::remove_file(path).map_err(|e| ExportError::io(path, e))?;
    }

    log::info!("Materializing {} report table(s) into {}", reports.len(), path.display());
    let mut conn = Connection::open(path).map_err(|e| ExportError::sqlite(CATALOG_TABLE, e))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| ExportError::sqlite(CATALOG_TABLE, e))?;

    let tx = conn.transaction().map_err(|e| ExportError::sqlite(CATALOG_TABLE, e))?;
    let mut inserted = 0;

    for (position, report) in reports.iter().enumerate() {
        let table = &report.table;
        let err = |e: rusqlite::Error| ExportError::sqlite(&report.name, e);

        let columns: Vec<String> = table.columns.iter().map(|c| format!("{} TEXT", quote_ident(c))).collect();
        tx.execute_batch(&format!(
            "CREATE TABLE {} ({});",
            quote_ident(&report.name),
            columns.join(", ")
        ))
        .map_err(err)?;

        {
            let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} VALUES ({})",
                    quote_ident(&report.name),
                    placeholders.join(", ")
                ))
                .map_err(err)?;
            for row in &table.rows {
                stmt.execute(params_from_iter(row.iter())).map_err(err)?;
                inserted += 1;
            }
        }

        tx.execute(
            "INSERT INTO report_catalog (position, name, description, row_count, fingerprint) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![position as i64, report.name, report.description, table.len() as i64, table.fingerprint()],
        )
        .map_err(|e| ExportError::sqlite(CATALOG_TABLE, e))?;
    }

    tx.commit().map_err(|e| ExportError::sqlite(CATALOG_TABLE, e))?;
    Ok(inserted)
}
