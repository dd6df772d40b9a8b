//! Writes collected reviews in the supported file formats.

use docx_rs::{BreakType, Docx, Paragraph, Run};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use steam_reviews_models::{ExportFormat, ReviewEntry};
use tracing::{debug, info};

use crate::error::ExportError;

/// Column order shared by the tabular formats
pub const COLUMNS: [&str; 6] = [
    "author",
    "author_steamid",
    "review",
    "voted_up",
    "timestamp",
    "playtime_minutes",
];

const SEPARATOR_WIDTH: usize = 80;

/// Identifies the game an export belongs to
#[derive(Debug, Clone)]
pub struct ExportContext {
    pub app_id: u64,
    pub app_name: String,
}

impl ExportContext {
    pub fn new(app_id: u64, app_name: impl Into<String>) -> Self {
        Self {
            app_id,
            app_name: app_name.into(),
        }
    }

    pub fn title(&self) -> String {
        format!("Reviews for '{}' (App ID: {})", self.app_name, self.app_id)
    }
}

/// One row of the CSV, XLSX and JSON outputs
#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    pub author: &'a str,
    pub author_steamid: &'a str,
    pub review: &'a str,
    pub voted_up: bool,
    pub timestamp: String,
    pub playtime_minutes: u64,
}

impl<'a> From<&'a ReviewEntry> for ExportRow<'a> {
    fn from(entry: &'a ReviewEntry) -> Self {
        Self {
            author: &entry.author_label,
            author_steamid: &entry.author_id,
            review: &entry.body,
            voted_up: entry.recommended,
            timestamp: entry.created_at_display(),
            playtime_minutes: entry.playtime_minutes,
        }
    }
}

/// Write `entries` to `writer` in the given format
pub fn export<W: Write>(
    entries: &[ReviewEntry],
    format: ExportFormat,
    context: &ExportContext,
    mut writer: W,
) -> Result<(), ExportError> {
    debug!("Exporting {} reviews as {:?}", entries.len(), format);
    match format {
        ExportFormat::Text => write_text(entries, &mut writer)?,
        ExportFormat::Csv => write_csv(entries, &mut writer)?,
        ExportFormat::Json => write_json(entries, &mut writer)?,
        ExportFormat::Xlsx => writer.write_all(&xlsx_bytes(entries)?)?,
        ExportFormat::Docx => writer.write_all(&docx_bytes(entries, context)?)?,
    }
    writer.flush()?;
    Ok(())
}

/// Create (or truncate) `path` and export into it
pub fn write_export(
    path: &Path,
    entries: &[ReviewEntry],
    format: ExportFormat,
    context: &ExportContext,
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    export(entries, format, context, BufWriter::new(file))?;
    info!("Saved {} reviews to {}", entries.len(), path.display());
    Ok(())
}

fn write_text<W: Write>(entries: &[ReviewEntry], writer: &mut W) -> Result<(), ExportError> {
    let separator = "-".repeat(SEPARATOR_WIDTH);
    for (i, entry) in entries.iter().enumerate() {
        write!(
            writer,
            "Review {}\nAuthor: {}\n\n{}\n\n{}\n",
            i + 1,
            entry.author_label,
            entry.body,
            separator
        )?;
    }
    Ok(())
}

fn write_csv<W: Write>(entries: &[ReviewEntry], writer: &mut W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if entries.is_empty() {
        // serialize() emits the header with the first row only
        csv_writer.write_record(COLUMNS)?;
    }
    for entry in entries {
        csv_writer.serialize(ExportRow::from(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_json<W: Write>(entries: &[ReviewEntry], writer: &mut W) -> Result<(), ExportError> {
    let rows: Vec<ExportRow> = entries.iter().map(ExportRow::from).collect();
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(())
}

fn xlsx_bytes(entries: &[ReviewEntry]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Reviews")?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }

    for (i, entry) in entries.iter().enumerate() {
        let row = (i + 1) as u32;
        let data = ExportRow::from(entry);
        sheet.write_string(row, 0, data.author)?;
        sheet.write_string(row, 1, data.author_steamid)?;
        sheet.write_string(row, 2, data.review)?;
        sheet.write_boolean(row, 3, data.voted_up)?;
        sheet.write_string(row, 4, data.timestamp.as_str())?;
        sheet.write_number(row, 5, data.playtime_minutes as f64)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn docx_bytes(entries: &[ReviewEntry], context: &ExportContext) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new().add_paragraph(
        Paragraph::new().add_run(Run::new().add_text(context.title()).bold().size(32)),
    );

    for (i, entry) in entries.iter().enumerate() {
        docx = docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!("Review {}:", i + 1)).bold()))
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text(format!("Author: {}", entry.author_label))))
            .add_paragraph(Paragraph::new().add_run(body_run(&entry.body)))
            .add_paragraph(Paragraph::new());
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| ExportError::Document(e.to_string()))?;
    Ok(buffer.into_inner())
}

/// Word ignores '\n' inside a text element, so each line gets its own text
/// with a line break in between
fn body_run(body: &str) -> Run {
    let mut run = Run::new();
    for (i, line) in body.lines().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    run
}
