// Delimited export: one file per report, one header row

use std::io::Write;
use std::path::{Path, PathBuf};

use linkdiff_recon::{NamedReport, ReportTable};

use crate::error::ExportError;

/// Write `table` to any sink. Every row has the header's width.
pub fn write_table<W: Write>(table: &ReportTable, sink: W) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new().from_writer(sink);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_report(table: &ReportTable, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::io(path, e))?;
    write_table(table, file).map_err(|e| ExportError::csv(path, e))
}

/// Write `<dir>/<name>.csv` for every report, in order.
pub fn write_reports(reports: &[NamedReport], dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::with_capacity(reports.len());
    for report in reports {
        let path = dir.join(format!("{}.csv", report.name));
        log::info!("Creating csv: {}", path.display());
        write_report(&report.table, &path)?;
        written.push(path);
    }
    Ok(written)
}
