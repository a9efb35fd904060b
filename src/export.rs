//! Export of ingested artifacts.
//!
//! Writes the contents of a case database to `contacts.<ext>` and
//! `messages.<ext>` in an output directory, as CSV or pretty-printed JSON.

use std::fmt;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::DateTime;
use csv::Writer;
use serde::Serialize;

use crate::error::{ExtractError, Result};
use crate::models::{StoredContact, StoredMessage};

/// Output format for exported artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format
    Csv,
    /// JSON format
    Json,
}

impl ExportFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(ExtractError::InvalidConfig(format!("Unknown export format: {other}"))),
        }
    }
}

/// Render epoch seconds as RFC 3339 UTC, or the raw number if out of range
#[must_use]
pub fn format_timestamp(seconds: i64) -> String {
    DateTime::from_timestamp(seconds, 0).map_or_else(|| seconds.to_string(), |dt| dt.to_rfc3339())
}

/// Write contacts to `output_dir/contacts.<ext>`
pub fn write_contacts(contacts: &[StoredContact], format: ExportFormat, output_dir: &Path) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!("contacts.{}", format.extension()));

    match format {
        ExportFormat::Csv => write_contacts_csv(contacts, &file_path)?,
        ExportFormat::Json => write_json_file(contacts, &file_path)?,
    }
    Ok(file_path)
}

/// Write messages to `output_dir/messages.<ext>`
pub fn write_messages(messages: &[StoredMessage], format: ExportFormat, output_dir: &Path) -> Result<PathBuf> {
    create_dir_all(output_dir)?;
    let file_path = output_dir.join(format!("messages.{}", format.extension()));

    match format {
        ExportFormat::Csv => write_messages_csv(messages, &file_path)?,
        ExportFormat::Json => write_json_file(messages, &file_path)?,
    }
    Ok(file_path)
}

/// Attributes are flattened into one `kind=value; ...` cell.
fn write_contacts_csv(contacts: &[StoredContact], file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;

    writer.write_record([
        "ID", "Source", "Name", "Phone", "Home Phone", "Mobile Phone", "Email", "Attributes",
    ])?;

    for stored in contacts {
        let contact = &stored.contact;
        let attributes = contact
            .extra_attributes
            .iter()
            .map(|a| format!("{}={}", a.kind.as_str(), a.value))
            .collect::<Vec<_>>()
            .join("; ");
        writer.write_record([
            stored.id.to_string().as_str(),
            stored.source_file.as_str(),
            contact.display_name.as_str(),
            contact.phone.as_str(),
            contact.home_phone.as_str(),
            contact.mobile_phone.as_str(),
            contact.email.as_str(),
            attributes.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_messages_csv(messages: &[StoredMessage], file_path: &Path) -> Result<()> {
    let mut writer = Writer::from_path(file_path)?;

    writer.write_record([
        "ID", "Source", "Type", "Direction", "From", "To", "Datetime", "Read Status", "Subject",
        "Body", "Thread",
    ])?;

    for stored in messages {
        let message = &stored.message;
        writer.write_record([
            stored.id.to_string().as_str(),
            stored.source_file.as_str(),
            message.type_label.as_str(),
            message.direction.as_str(),
            message.sender_id.as_str(),
            message.recipient_id.as_str(),
            format_timestamp(message.timestamp).as_str(),
            message.read_status.as_str(),
            message.subject.as_str(),
            message.body.as_str(),
            message.thread_id.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn write_json_file<T: Serialize>(items: &[T], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, items)?;
    writer.flush()?;
    Ok(())
}
