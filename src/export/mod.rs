//! Report exporters.
//!
//! Both exporters are formatting layers over a computed `Dashboard`:
//! they lay out figures the analysis modules already produced and never
//! aggregate on their own.

pub mod document;
pub mod workbook;

use crate::analysis::Dashboard;
use crate::config::ReportConfig;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while producing an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// There is nothing to export under the current filters.
    #[error("no responses match the current filters; nothing to export")]
    NoData,

    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to build PDF: {0}")]
    Document(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings shared by both exporters.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub report_name: String,
    pub organization: String,
    /// Length of the top/bottom performer lists.
    pub top_n: usize,
    /// Date stamped into the file name and the report body.
    pub date: NaiveDate,
}

impl ExportOptions {
    pub fn from_config(config: &ReportConfig, date: NaiveDate) -> Self {
        Self {
            report_name: config.name.clone(),
            organization: config.organization.clone(),
            top_n: config.top_n.max(1),
            date,
        }
    }
}

/// File name for an export: `<report-name>_<YYYY-MM-DD>.<ext>`.
pub fn export_filename(report_name: &str, date: NaiveDate, extension: &str) -> String {
    let name: String = report_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let name = if name.is_empty() { "report".to_string() } else { name };

    format!("{}_{}.{}", name, date.format("%Y-%m-%d"), extension)
}

/// Write the workbook export into `dir`, returning its path.
pub fn export_workbook(
    dashboard: &Dashboard,
    options: &ExportOptions,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    if dashboard.is_empty() {
        return Err(ExportError::NoData);
    }

    let sheets = workbook::build_sheets(dashboard, options);
    let bytes = workbook::render(&sheets)?;
    let path = dir.join(export_filename(&options.report_name, options.date, "xlsx"));
    write_file(&path, &bytes)?;

    info!("Workbook written to {} ({} sheets)", path.display(), sheets.len());
    Ok(path)
}

/// Write the PDF export into `dir`, returning its path.
pub fn export_document(
    dashboard: &Dashboard,
    options: &ExportOptions,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    if dashboard.is_empty() {
        return Err(ExportError::NoData);
    }

    let sections = document::build_document(dashboard, options);
    let pages = document::layout(&sections);
    let bytes = document::render(&pages, &options.report_name)?;
    let path = dir.join(export_filename(&options.report_name, options.date, "pdf"));
    write_file(&path, &bytes)?;

    info!("PDF written to {} ({} pages)", path.display(), pages.len());
    Ok(path)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, bytes).map_err(io_err)
}
