//! Terminal rendering of screen state

use crate::screen::{ScreenModel, ScreenState};
use catalyst_core::{Comment, Record, ResourceDescriptor, StatusHistoryEntry};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::fmt::Write as _;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Shown when a fetch succeeded but returned nothing
pub const NO_DATA: &str = "No data available";

/// Shown for a record without status history
pub const NO_HISTORY: &str = "No status history available.";

/// Shown for a record without comments
pub const NO_COMMENTS: &str = "No comments yet.";

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Raw JSON
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// The list view: loading text, error banner, empty message or a table
#[must_use]
pub fn render_table(descriptor: &ResourceDescriptor, model: &ScreenModel) -> String {
    if model.state == ScreenState::Loading {
        return format!("Loading {}...", descriptor.title);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", descriptor.title);
    if !descriptor.description.is_empty() {
        let _ = writeln!(out, "{}", descriptor.description);
    }

    if let Some(error) = &model.error {
        let _ = writeln!(out, "Error: {error}");
    }

    if model.records.is_empty() {
        out.push_str(NO_DATA);
        return out;
    }

    out.push_str(&records_table(descriptor, &model.records));
    out
}

/// The descriptor's columns as a table
#[must_use]
pub fn records_table(descriptor: &ResourceDescriptor, records: &[Record]) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        std::iter::once("ID".to_string()).chain(descriptor.columns.iter().map(|c| c.label.clone())),
    );

    for record in records {
        builder.push_record(
            std::iter::once(record.id.to_string())
                .chain(descriptor.columns.iter().map(|c| c.format(record))),
        );
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// The detail drawer for one record
#[must_use]
pub fn render_detail(descriptor: &ResourceDescriptor, record: &Record) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", descriptor.detail_heading(record));

    let width = descriptor
        .fields
        .iter()
        .chain(&descriptor.status_fields)
        .map(|f| f.label.chars().count())
        .max()
        .unwrap_or(0);

    for field in &descriptor.fields {
        let _ = writeln!(out, "  {:<width$}  {}", field.label, field.format(record));
    }

    if !descriptor.status_fields.is_empty() {
        let _ = writeln!(out, "Status");
        for field in &descriptor.status_fields {
            let _ = write!(out, "  {:<width$}  {}", field.label, field.format(record));
            if !field.options.is_empty() {
                let _ = write!(out, "  [{}]", field.options.join(" | "));
            }
            out.push('\n');
        }
    }

    out
}

/// A status history timeline
#[must_use]
pub fn render_history(entries: &[StatusHistoryEntry]) -> String {
    if entries.is_empty() {
        return NO_HISTORY.to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(["Date", "Status", "User", "Notes"].map(String::from));
    for entry in entries {
        builder.push_record([
            entry.status_date.format("%Y-%m-%d %H:%M").to_string(),
            entry.status.clone(),
            entry.acting_user(),
            entry.notes.clone().unwrap_or_default(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// A comment thread
#[must_use]
pub fn render_comments(comments: &[Comment]) -> String {
    if comments.is_empty() {
        return NO_COMMENTS.to_string();
    }

    comments
        .iter()
        .map(|c| match c.created_at {
            Some(at) => format!("[{}] {}", at.format("%Y-%m-%d %H:%M"), c.comment_text),
            None => c.comment_text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Known resources
#[must_use]
pub fn render_resources(descriptors: &[ResourceDescriptor]) -> String {
    let mut builder = Builder::default();
    builder.push_record(
        ["Name", "Title", "Path", "Editable", "History", "Comments"].map(String::from),
    );
    for d in descriptors {
        builder.push_record([
            d.name.clone(),
            d.title.clone(),
            d.collection_path.clone(),
            d.status_fields
                .iter()
                .map(|f| f.key.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            yes_no(d.history).to_string(),
            yes_no(d.comments).to_string(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Pretty JSON for any serialisable value
///
/// # Errors
///
/// Returns an error if the value cannot be serialised.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> catalyst_core::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

const fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
