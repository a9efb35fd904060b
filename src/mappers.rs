//! Row-to-record mapping for the TikTok schema.
//!
//! [`ContactMapper`] reads `SIMPLE_USER` rows from `db_im_xx`; [`MessageMapper`]
//! reads `msg` rows from a `<uid>_im.db`. Both only fill the fields the
//! schema actually has and leave everything else at the record's default.

use serde_json::Value;
use tracing::debug;

use crate::config::ParserConfig;
use crate::cursor::RowCursor;
use crate::decoder::{decode_body, subject_label};
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{Attribute, AttributeKind, ContactRecord, Direction, MessageRecord, ReadStatus};

/// Fixed contacts query
pub const CONTACTS_QUERY: &str = "select UID, UNIQUE_ID, NICK_NAME from SIMPLE_USER;";

/// Fixed messages query, oldest first
pub const MESSAGES_QUERY: &str = "select conversation_id, created_time, content, read_status, local_info, type, case when deleted=0 then 'Not deleted' when deleted=1 then 'Deleted' else deleted end, sender from msg order by created_time;";

/// Suffix stripped from a message database's file name to get the owner's uid
pub const MESSAGE_DB_SUFFIX: &str = "_im.db";

const PROFILE_URL_PREFIX: &str = "https://www.tiktok.com/@";

/// Owner uid encoded in a message database file name (`<uid>_im.db`).
///
/// Names without the suffix come back unchanged.
#[must_use]
pub fn owner_uid_from_file_name(file_name: &str) -> &str {
    file_name.split(MESSAGE_DB_SUFFIX).next().unwrap_or(file_name)
}

/// Profile URL for a TikTok handle
#[must_use]
pub fn profile_url(unique_id: &str) -> String {
    format!("{PROFILE_URL_PREFIX}{unique_id}")
}

/// Map a user id to what should be shown for it.
///
/// Currently the identity. The contacts table could turn numeric ids into
/// handles, but that lookup is not wired up.
#[must_use]
pub fn resolve_user_id(uid: &str) -> String {
    uid.to_string()
}

/// The two participant ids packed into a conversation id.
///
/// Conversation ids are colon-delimited; the participants sit at positions
/// 2 and 3, and each is only present when enough segments follow it. This
/// is positional parsing of an undocumented format and will break if TikTok
/// changes the layout.
#[must_use]
pub fn conversation_participants(conversation_id: &str) -> (String, String) {
    let segments: Vec<&str> = conversation_id.split(':').collect();
    let first = if segments.len() > 3 { segments[2] } else { "" };
    let second = if segments.len() > 4 { segments[3] } else { "" };
    (first.to_string(), second.to_string())
}

/// Outgoing iff the sender is the database owner
#[must_use]
pub fn message_direction(sender: &str, owner_uid: &str) -> Direction {
    if sender == owner_uid {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

/// Read status as stored for incoming messages; outgoing ones have none
#[must_use]
pub fn message_read_status(direction: Direction, read_status_column: i32) -> ReadStatus {
    match direction {
        Direction::Incoming if read_status_column == 0 => ReadStatus::Read,
        Direction::Incoming => ReadStatus::Unread,
        Direction::Outgoing => ReadStatus::default(),
    }
}

/// Epoch milliseconds to epoch seconds, truncating
#[must_use]
pub const fn millis_to_seconds(created_time: i64) -> i64 {
    created_time / 1000
}

/// Maps `SIMPLE_USER` rows to contacts
#[derive(Debug, Clone)]
pub struct ContactMapper {
    source_label: String,
}

impl ContactMapper {
    /// Mapper tagging attributes with `source_label`
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
        }
    }

    /// Map one row with columns `uid`, `unique_id`, `nick_name`
    pub fn map(&self, row: &RowCursor<'_, '_>) -> Result<ContactRecord> {
        let uid = row.get_string("uid")?;
        let unique_id = row.get_string("unique_id")?;

        Ok(ContactRecord {
            display_name: row.get_string("nick_name")?,
            extra_attributes: vec![
                Attribute::new(AttributeKind::Id, &self.source_label, uid),
                Attribute::new(AttributeKind::Url, &self.source_label, profile_url(&unique_id)),
                Attribute::new(AttributeKind::UserId, &self.source_label, unique_id),
            ],
            ..ContactRecord::default()
        })
    }
}

/// Maps `msg` rows of one owner's database to messages
#[derive(Debug, Clone)]
pub struct MessageMapper {
    owner_uid: String,
    type_label: String,
    metrics: MetricsCollector,
}

impl MessageMapper {
    /// Mapper for the database owned by `owner_uid`
    pub fn new(owner_uid: impl Into<String>, type_label: impl Into<String>) -> Self {
        Self {
            owner_uid: owner_uid.into(),
            type_label: type_label.into(),
            metrics: MetricsCollector::default(),
        }
    }

    /// Mapper for a message database, owner taken from its file name
    pub fn for_database(file_name: &str, config: &ParserConfig) -> Self {
        Self::new(owner_uid_from_file_name(file_name), &config.message_type_label)
    }

    /// Uid of the database owner
    #[must_use]
    pub fn owner_uid(&self) -> &str {
        &self.owner_uid
    }

    /// Map one row of [`MESSAGES_QUERY`]
    pub fn map(&self, row: &RowCursor<'_, '_>) -> Result<MessageRecord> {
        let conversation_id = row.get_string("conversation_id")?;
        let sender = row.get_long("sender")?.to_string();
        let message_type = row.get_long("type")?;

        let direction = message_direction(&sender, &self.owner_uid);
        let (first, second) = conversation_participants(&conversation_id);
        let recipient_id = if sender == first {
            resolve_user_id(&second)
        } else {
            resolve_user_id(&first)
        };

        let content = row.get_string("content")?;
        let body = Self::decode_content(message_type, &content).unwrap_or_else(|e| {
            debug!(message_type, error = %e, "Falling back to default message body");
            self.metrics.record_body_fallback(message_type);
            String::new()
        });

        Ok(MessageRecord {
            type_label: self.type_label.clone(),
            direction,
            sender_id: resolve_user_id(&row.get_string("sender")?),
            recipient_id,
            timestamp: millis_to_seconds(row.get_long("created_time")?),
            read_status: message_read_status(direction, row.get_int("read_status")?),
            subject: subject_label(message_type).to_string(),
            body,
            thread_id: conversation_id,
        })
    }

    /// Parse a `content` column and decode its body
    pub fn decode_content(message_type: i64, content: &str) -> Result<String> {
        let payload: Value = serde_json::from_str(content)?;
        decode_body(message_type, &payload)
    }
}
