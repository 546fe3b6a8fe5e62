//! `linkdiff run` / `linkdiff validate`: config-driven snapshot reconciliation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use linkdiff_io::manifest::{RunManifest, MANIFEST_FILE};
use linkdiff_io::xlsx::WorkbookOptions;
use linkdiff_io::ExportError;
use linkdiff_recon::store::{load_abbreviation_rows, load_link_rows, RecordStore, RelationName};
use linkdiff_recon::{ReconConfig, ReconError, RunResult, Side};

use crate::exit_codes::{recon_exit_code, EXIT_EXPORT, EXIT_LOAD, EXIT_USAGE};
use crate::util::{format_elapsed, timestamp_now};
use crate::CliError;

fn recon_err(err: ReconError) -> CliError {
    let hint = match &err {
        ReconError::MissingColumn { .. } => {
            Some("set the column names under [columns] / [abbreviation_columns] in the config".to_string())
        }
        ReconError::MalformedRow { message, .. } if message.contains("attribution id") => {
            Some("attribution ids are listed comma-separated in reports and must not contain ','".to_string())
        }
        ReconError::KeyCollision { .. } => {
            Some("gene and accession ids must not contain the key separator '|'".to_string())
        }
        _ => None,
    };
    CliError { code: recon_exit_code(&err), message: err.to_string(), hint }
}

fn export_err(err: ExportError) -> CliError {
    CliError { code: EXIT_EXPORT, message: err.to_string(), hint: None }
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        CliError {
            code: EXIT_USAGE,
            message: format!("cannot read config {}: {e}", config_path.display()),
            hint: None,
        }
    })?;
    ReconConfig::from_toml(&config_str).map_err(recon_err)
}

fn read_relation(base_dir: &Path, relation: RelationName, file: &str) -> Result<String, CliError> {
    let path = base_dir.join(file);
    std::fs::read_to_string(&path).map_err(|e| CliError {
        code: EXIT_LOAD,
        message: format!("relation '{relation}': cannot read {}: {e}", path.display()),
        hint: None,
    })
}

/// Load the three input relations, resolving file paths relative to the
/// config file's directory.
fn load_store(config: &ReconConfig, base_dir: &Path) -> Result<RecordStore, CliError> {
    let mut store = RecordStore::new();

    for side in [Side::Old, Side::New] {
        let relation = RelationName::for_side(side);
        let file = match side {
            Side::Old => &config.inputs.old_links,
            Side::New => &config.inputs.new_links,
        };
        let csv_data = read_relation(base_dir, relation, file)?;
        let rows = load_link_rows(relation, &csv_data, &config.columns).map_err(recon_err)?;
        log::info!("Loaded {} row(s) into {relation}", rows.len());
        store.insert_links(side, rows);
    }

    let csv_data = read_relation(base_dir, RelationName::Abbreviations, &config.inputs.abbreviations)?;
    let rows = load_abbreviation_rows(&csv_data, &config.abbreviation_columns).map_err(recon_err)?;
    log::info!("Loaded {} row(s) into {}", rows.len(), RelationName::Abbreviations);
    store.insert_abbreviations(rows);

    Ok(store)
}

/// Write every configured output and return the manifest describing them.
fn export(
    config: &ReconConfig,
    result: &RunResult,
    out_dir: &Path,
    started: Instant,
) -> Result<RunManifest, CliError> {
    std::fs::create_dir_all(out_dir).map_err(|e| export_err(ExportError::io(out_dir, e)))?;
    let mut manifest = RunManifest::from_result(result, started.elapsed());

    if config.output.csv {
        let written = linkdiff_io::csv::write_reports(&result.reports, out_dir).map_err(export_err)?;
        for (report, path) in result.reports.iter().zip(&written) {
            manifest.add_file(Some(report.name.as_str()), file_label(path));
        }
    }

    if let Some(ref xlsx) = config.output.xlsx {
        let path = out_dir.join(xlsx);
        let options = WorkbookOptions { link_url: config.output.link_url.clone() };
        let exported = linkdiff_io::xlsx::export_workbook(&result.reports, &path, &options).map_err(export_err)?;
        log::debug!(
            "workbook: {} sheet(s), {} row(s), {} link(s) in {}ms",
            exported.sheets_exported,
            exported.rows_exported,
            exported.links_exported,
            exported.export_duration_ms,
        );
        manifest.add_file(None, xlsx.clone());
    }

    if let Some(ref sqlite) = config.output.sqlite {
        let path = out_dir.join(sqlite);
        let inserted = linkdiff_io::sqlite::materialize(&result.reports, &path).map_err(export_err)?;
        log::debug!("database: {inserted} row(s) in {}", path.display());
        manifest.add_file(None, sqlite.clone());
    }

    manifest.elapsed_ms = started.elapsed().as_millis() as u64;
    if config.output.manifest {
        manifest.write(&out_dir.join(MANIFEST_FILE)).map_err(export_err)?;
    }

    Ok(manifest)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn cmd_run(config_path: PathBuf, json_output: bool) -> Result<(), CliError> {
    let started = Instant::now();
    eprintln!("Start time: {}", timestamp_now());

    let config = read_config(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let store = load_store(&config, base_dir)?;
    let result = linkdiff_recon::run(&config, &store).map_err(recon_err)?;

    let out_dir = base_dir.join(&config.output.dir);
    let manifest = export(&config, &result, &out_dir, started)?;

    if json_output {
        println!("{}", manifest.to_json().map_err(export_err)?);
    }

    // Human summary to stderr
    eprintln!(
        "'{}': {} report(s) from {} old / {} new record(s) written to {}",
        result.meta.config_name,
        result.reports.len(),
        result.meta.old_records,
        result.meta.new_records,
        out_dir.display(),
    );
    eprintln!("Done after: {}", format_elapsed(started.elapsed()));
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let catalog = linkdiff_recon::ReportCatalog::standard(&config).map_err(recon_err)?;
    eprintln!(
        "valid: '{}' with {} report(s), {} allowed transition(s)",
        config.name,
        catalog.len(),
        config.fix.transitions.len(),
    );
    Ok(())
}
