//! Data models for normalized communication artifacts
//!
//! This module contains the vendor-neutral records the extractor hands to
//! the case: contacts, messages, the attributes hung off a contact, and the
//! account type every artifact is linked to.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Kind of an extra attribute attached to a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Stable numeric identifier of the user
    Id,
    /// Profile URL
    Url,
    /// Handle or username
    UserId,
}

impl AttributeKind {
    /// Stable label used in storage and exports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Url => "url",
            Self::UserId => "user_id",
        }
    }
}

impl FromStr for AttributeKind {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "url" => Ok(Self::Url),
            "user_id" => Ok(Self::UserId),
            other => Err(ExtractError::Other(format!("Unknown attribute kind: {other}"))),
        }
    }
}

/// One `(kind, value)` pair tagged with the parser that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// What the value means
    pub kind: AttributeKind,
    /// Source label of the parser that produced the value
    pub source: String,
    /// The value itself
    pub value: String,
}

impl Attribute {
    /// Build an attribute
    pub fn new(kind: AttributeKind, source: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            value: value.into(),
        }
    }
}

/// A normalized contact
///
/// Fields the source schema does not carry stay at their empty default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Display name
    pub display_name: String,
    /// Phone number
    pub phone: String,
    /// Home phone number
    pub home_phone: String,
    /// Mobile phone number
    pub mobile_phone: String,
    /// Email address
    pub email: String,
    /// Additional attributes, in insertion order
    pub extra_attributes: Vec<Attribute>,
}

impl ContactRecord {
    /// First attribute of the given kind, if any
    #[must_use]
    pub fn attribute(&self, kind: AttributeKind) -> Option<&str> {
        self.extra_attributes
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.value.as_str())
    }
}

/// Message direction relative to the device owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Received by the owner
    Incoming,
    /// Sent by the owner
    Outgoing,
}

impl Direction {
    /// Stable label used in storage and exports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "incoming" => Ok(Self::Incoming),
            "outgoing" => Ok(Self::Outgoing),
            other => Err(ExtractError::Other(format!("Unknown direction: {other}"))),
        }
    }
}

/// Read status of a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    /// Seen by the owner
    Read,
    /// Not yet seen by the owner
    Unread,
    /// Not recorded, or not meaningful for this message
    #[default]
    Unknown,
}

impl ReadStatus {
    /// Stable label used in storage and exports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Unread => "unread",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadStatus {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "unread" => Ok(Self::Unread),
            "unknown" => Ok(Self::Unknown),
            other => Err(ExtractError::Other(format!("Unknown read status: {other}"))),
        }
    }
}

/// A normalized message, fields in ingestion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Constant message-type label for this source
    pub type_label: String,
    /// Direction relative to the device owner
    pub direction: Direction,
    /// Sender identifier
    pub sender_id: String,
    /// Recipient identifier
    pub recipient_id: String,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Read status
    pub read_status: ReadStatus,
    /// Coarse content category ("text", "video", ...)
    pub subject: String,
    /// Human-readable body
    pub body: String,
    /// Conversation the message belongs to
    pub thread_id: String,
}

/// Account type registered with the case, shared by every artifact of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Case-assigned identifier
    pub id: i64,
    /// Account type name
    pub type_name: String,
    /// Human-readable name
    pub display_name: String,
}

/// Provenance attached to every artifact posted from one application database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSource {
    /// Parser name, e.g. "Tiktok Parser"
    pub parser_name: String,
    /// Parser version
    pub version: String,
    /// Application database the artifact came from
    pub source_file: PathBuf,
    /// Account type the artifact is linked to
    pub account: Account,
}

/// A contact as stored in the case database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredContact {
    /// Database primary key
    pub id: i64,
    /// Application database the contact came from
    pub source_file: String,
    /// The contact itself
    #[serde(flatten)]
    pub contact: ContactRecord,
}

/// A message as stored in the case database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Database primary key
    pub id: i64,
    /// Application database the message came from
    pub source_file: String,
    /// The message itself
    #[serde(flatten)]
    pub message: MessageRecord,
}

/// Row counts of the case database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtifactCounts {
    /// Number of contacts
    pub contacts: usize,
    /// Number of contact attributes
    pub attributes: usize,
    /// Number of messages
    pub messages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_storage_form() {
        for status in [ReadStatus::Read, ReadStatus::Unread, ReadStatus::Unknown] {
            assert_eq!(status.as_str().parse::<ReadStatus>().unwrap(), status);
        }
        assert_eq!("outgoing".parse::<Direction>().unwrap(), Direction::Outgoing);
        assert_eq!("user_id".parse::<AttributeKind>().unwrap(), AttributeKind::UserId);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_contact_defaults_are_empty() {
        let contact = ContactRecord {
            display_name: "Bob".to_string(),
            ..ContactRecord::default()
        };
        assert!(contact.phone.is_empty());
        assert!(contact.email.is_empty());
        assert_eq!(contact.attribute(AttributeKind::Url), None);
        assert_eq!(ReadStatus::default(), ReadStatus::Unknown);
    }
}
