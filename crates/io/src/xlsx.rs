// Multi-sheet workbook export: one sheet per report, catalog order

use std::path::Path;
use std::time::Instant;

use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet};

use linkdiff_recon::{NamedReport, ReportTable};

use crate::error::ExportError;
use crate::MAX_SHEET_NAME_LEN;

/// Header of the optional link column.
pub const LINK_COLUMN: &str = "link";

#[derive(Debug, Clone, Default)]
pub struct WorkbookOptions {
    /// URL template with `{gene}`; adds a trailing link column to every
    /// report that has a `gene` column.
    pub link_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub rows_exported: usize,
    pub links_exported: usize,
    pub export_duration_ms: u128,
}

/// Write every report to its own sheet of a new workbook at `path`.
pub fn export_workbook(
    reports: &[NamedReport],
    path: &Path,
    options: &WorkbookOptions,
) -> Result<ExportResult, ExportError> {
    let start_time = Instant::now();
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();

    log::info!("Combining all reports into one xlsx: {}", path.display());

    for report in reports {
        let sheet_name = sheet_name(&report.name);
        let worksheet = xlsx_workbook
            .add_worksheet()
            .set_name(&sheet_name)
            .map_err(|e| ExportError::Xlsx(format!("Failed to create sheet '{sheet_name}': {e}")))?;

        let link_template = options
            .link_url
            .as_deref()
            .filter(|_| report.table.column_index("gene").is_some());

        let links = write_sheet(worksheet, &report.table, &header_format, link_template)
            .map_err(|e| ExportError::Xlsx(format!("sheet '{sheet_name}': {e}")))?;

        result.rows_exported += report.table.len();
        result.links_exported += links;
        result.sheets_exported += 1;
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| ExportError::Xlsx(format!("Failed to save XLSX file: {e}")))?;

    result.export_duration_ms = start_time.elapsed().as_millis();
    Ok(result)
}

/// Returns the number of link cells written.
fn write_sheet(
    worksheet: &mut Worksheet,
    table: &ReportTable,
    header_format: &Format,
    link_template: Option<&str>,
) -> Result<usize, rust_xlsxwriter::XlsxError> {
    let mut headers: Vec<&str> = table.columns.iter().map(String::as_str).collect();
    if link_template.is_some() {
        headers.push(LINK_COLUMN);
    }
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, header_format)?;
    }

    let gene_idx = table.column_index("gene");
    let link_col = table.columns.len() as u16;
    let mut links = 0;

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = row_idx as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row32, col as u16, value)?;
            }
        }
        if let (Some(template), Some(gi)) = (link_template, gene_idx) {
            let gene = row.get(gi).map(String::as_str).unwrap_or("");
            if !gene.is_empty() {
                worksheet.write_formula(row32, link_col, hyperlink_formula(template, gene))?;
                links += 1;
            }
        }
    }

    for (col, width) in column_widths(table, link_template.is_some()).into_iter().enumerate() {
        worksheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(links)
}

/// `=HYPERLINK("<url>", "link")` with the gene substituted into the template.
pub fn hyperlink_formula(template: &str, gene: &str) -> Formula {
    let url = template.replace("{gene}", gene).replace('"', "\"\"");
    Formula::new(format!("=HYPERLINK(\"{url}\", \"{LINK_COLUMN}\")")).set_result(LINK_COLUMN)
}

/// Excel rejects column widths above 255 characters.
pub const MAX_COLUMN_WIDTH: usize = 255;

/// Character width per column: the longest cell or the header, whichever
/// is wider, capped at `MAX_COLUMN_WIDTH`.
pub fn column_widths(table: &ReportTable, with_link: bool) -> Vec<usize> {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (col, value) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(value.chars().count());
            }
        }
    }
    if with_link {
        widths.push(LINK_COLUMN.len());
    }
    widths.into_iter().map(|w| w.min(MAX_COLUMN_WIDTH)).collect()
}

/// Sheet names are capped by Excel; report names are already ASCII.
pub fn sheet_name(report: &str) -> String {
    report.chars().take(MAX_SHEET_NAME_LEN).collect()
}
