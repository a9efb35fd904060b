use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::host::{ArtifactSink, CaseProvider};
use crate::models::{
    Account, ArtifactCounts, ArtifactSource, Attribute, ContactRecord, MessageRecord,
    StoredContact, StoredMessage,
};
use crate::schema::{account_types, contact_attributes, contacts, messages};

// Type alias for the database connection pool
pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Case database the extracted artifacts are ingested into
pub struct CaseDatabase {
    pool: DbPool,
}

fn persistence(err: impl Display) -> ExtractError {
    ExtractError::Persistence(err.to_string())
}

impl CaseDatabase {
    /// Open (or create) a case database file
    pub fn new(path: impl AsRef<Path>, pool_size: u32) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let manager = SqliteConnectionManager::file(path)
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let db = Self::from_manager(manager, pool_size)?;
        info!(path = %path.display(), "Opened case database");
        Ok(db)
    }

    /// Case database living only in memory, for tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        // Every pooled in-memory connection is its own database, so keep one.
        Self::from_manager(manager, 1)
    }

    fn from_manager(manager: SqliteConnectionManager, pool_size: u32) -> Result<Self> {
        let pool = Pool::builder().max_size(pool_size).build(manager)?;

        let conn = pool.get()?;
        Self::run_migrations(&conn)?;
        drop(conn);

        Ok(Self { pool })
    }

    /// Run database migrations
    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(include_str!("../migrations/0001_create_artifacts/up.sql"))?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn get_connection(&self) -> Result<DbConnection> {
        Ok(self.pool.get()?)
    }

    /// Look up a registered account type by name
    pub fn account_type(&self, type_name: &str) -> Result<Option<Account>> {
        let conn = self.get_connection()?;
        Self::find_account_type(&conn, type_name)
    }

    fn find_account_type(conn: &Connection, type_name: &str) -> Result<Option<Account>> {
        let account = conn
            .query_row(
                &format!(
                    "SELECT {}, {}, {} FROM {} WHERE {} = ?",
                    account_types::ID,
                    account_types::TYPE_NAME,
                    account_types::DISPLAY_NAME,
                    account_types::TABLE,
                    account_types::TYPE_NAME
                ),
                params![type_name],
                |row| {
                    Ok(Account {
                        id: row.get(0)?,
                        type_name: row.get(1)?,
                        display_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(account)
    }

    /// All contacts with their attributes, in ingestion order
    pub fn contacts(&self) -> Result<Vec<StoredContact>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {}, {}, {} FROM {} ORDER BY {}",
            contacts::ID,
            contacts::SOURCE_FILE,
            contacts::NAME,
            contacts::PHONE,
            contacts::HOME_PHONE,
            contacts::MOBILE_PHONE,
            contacts::EMAIL,
            contacts::TABLE,
            contacts::ID
        ))?;
        let rows = stmt.query_map([], Self::map_stored_contact)?;

        let mut results = Vec::new();
        for row in rows {
            let mut stored = row?;
            stored.contact.extra_attributes = Self::load_attributes(&conn, stored.id)?;
            results.push(stored);
        }
        Ok(results)
    }

    /// Attributes of one contact, in insertion order
    fn load_attributes(conn: &Connection, contact_id: i64) -> Result<Vec<Attribute>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {}, {} FROM {} WHERE {} = ? ORDER BY {}",
            contact_attributes::KIND,
            contact_attributes::SOURCE,
            contact_attributes::VALUE,
            contact_attributes::TABLE,
            contact_attributes::CONTACT_ID,
            contact_attributes::POSITION
        ))?;
        let rows = stmt.query_map(params![contact_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut attributes = Vec::new();
        for row in rows {
            let (kind, source, value) = row?;
            attributes.push(Attribute {
                kind: kind.parse()?,
                source,
                value,
            });
        }
        Ok(attributes)
    }

    /// All messages, oldest first
    pub fn messages(&self) -> Result<Vec<StoredMessage>> {
        let conn = self.get_connection()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {} FROM {} ORDER BY {}, {}",
            messages::ID,
            messages::SOURCE_FILE,
            messages::MESSAGE_TYPE,
            messages::DIRECTION,
            messages::SENDER,
            messages::RECIPIENT,
            messages::DATE_TIME,
            messages::READ_STATUS,
            messages::SUBJECT,
            messages::BODY,
            messages::THREAD_ID,
            messages::TABLE,
            messages::DATE_TIME,
            messages::ID
        ))?;
        let rows = stmt.query_map([], Self::map_stored_message)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Row counts per artifact table
    pub fn counts(&self) -> Result<ArtifactCounts> {
        let conn = self.get_connection()?;
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or_default())
        };

        Ok(ArtifactCounts {
            contacts: count(contacts::TABLE)?,
            attributes: count(contact_attributes::TABLE)?,
            messages: count(messages::TABLE)?,
        })
    }

    /// Map a database row to a StoredContact without attributes
    fn map_stored_contact(row: &Row) -> rusqlite::Result<StoredContact> {
        Ok(StoredContact {
            id: row.get(0)?,
            source_file: row.get(1)?,
            contact: ContactRecord {
                display_name: row.get(2)?,
                phone: row.get(3)?,
                home_phone: row.get(4)?,
                mobile_phone: row.get(5)?,
                email: row.get(6)?,
                extra_attributes: Vec::new(),
            },
        })
    }

    /// Map a database row to a StoredMessage
    fn map_stored_message(row: &Row) -> rusqlite::Result<StoredMessage> {
        Ok(StoredMessage {
            id: row.get(0)?,
            source_file: row.get(1)?,
            message: MessageRecord {
                type_label: row.get(2)?,
                direction: parse_column(row, 3)?,
                sender_id: row.get(4)?,
                recipient_id: row.get(5)?,
                timestamp: row.get(6)?,
                read_status: parse_column(row, 7)?,
                subject: row.get(8)?,
                body: row.get(9)?,
                thread_id: row.get(10)?,
            },
        })
    }
}

/// Parse a stored label column back into its enum
fn parse_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ExtractError>,
{
    let label: String = row.get(idx)?;
    label
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

impl ArtifactSink for CaseDatabase {
    fn register_account_type(&self, type_name: &str, display_name: &str) -> Result<Account> {
        let conn = self.get_connection().map_err(persistence)?;

        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?, ?)",
                account_types::TABLE,
                account_types::TYPE_NAME,
                account_types::DISPLAY_NAME
            ),
            params![type_name, display_name],
        )
        .map_err(persistence)?;

        Self::find_account_type(&conn, type_name)
            .map_err(persistence)?
            .ok_or_else(|| persistence(format!("account type {type_name} vanished after insert")))
    }

    fn add_contact(&self, source: &ArtifactSource, contact: &ContactRecord) -> Result<()> {
        let mut conn = self.get_connection().map_err(persistence)?;
        let tx = conn.transaction().map_err(persistence)?;

        tx.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                contacts::TABLE,
                contacts::ACCOUNT_TYPE_ID,
                contacts::PARSER_NAME,
                contacts::PARSER_VERSION,
                contacts::SOURCE_FILE,
                contacts::NAME,
                contacts::PHONE,
                contacts::HOME_PHONE,
                contacts::MOBILE_PHONE,
                contacts::EMAIL,
                contacts::INGESTED_AT
            ),
            params![
                source.account.id,
                source.parser_name,
                source.version,
                source.source_file.to_string_lossy(),
                contact.display_name,
                contact.phone,
                contact.home_phone,
                contact.mobile_phone,
                contact.email,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(persistence)?;
        let contact_id = tx.last_insert_rowid();

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES (?, ?, ?, ?, ?)",
                    contact_attributes::TABLE,
                    contact_attributes::CONTACT_ID,
                    contact_attributes::POSITION,
                    contact_attributes::KIND,
                    contact_attributes::SOURCE,
                    contact_attributes::VALUE
                ))
                .map_err(persistence)?;
            for (position, attribute) in contact.extra_attributes.iter().enumerate() {
                stmt.execute(params![
                    contact_id,
                    i64::try_from(position).unwrap_or(i64::MAX),
                    attribute.kind.as_str(),
                    attribute.source,
                    attribute.value
                ])
                .map_err(persistence)?;
            }
        }

        tx.commit().map_err(persistence)?;
        debug!(contact_id, name = %contact.display_name, "Stored contact");
        Ok(())
    }

    fn add_message(&self, source: &ArtifactSource, message: &MessageRecord) -> Result<()> {
        let conn = self.get_connection().map_err(persistence)?;

        conn.execute(
            &format!(
                "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                messages::TABLE,
                messages::ACCOUNT_TYPE_ID,
                messages::PARSER_NAME,
                messages::PARSER_VERSION,
                messages::SOURCE_FILE,
                messages::MESSAGE_TYPE,
                messages::DIRECTION,
                messages::SENDER,
                messages::RECIPIENT,
                messages::DATE_TIME,
                messages::READ_STATUS,
                messages::SUBJECT,
                messages::BODY,
                messages::THREAD_ID,
                messages::INGESTED_AT
            ),
            params![
                source.account.id,
                source.parser_name,
                source.version,
                source.source_file.to_string_lossy(),
                message.type_label,
                message.direction.as_str(),
                message.sender_id,
                message.recipient_id,
                message.timestamp,
                message.read_status.as_str(),
                message.subject,
                message.body,
                message.thread_id,
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(persistence)?;
        Ok(())
    }
}

impl CaseProvider for CaseDatabase {
    fn current_case(&self) -> Result<&dyn ArtifactSink> {
        Ok(self)
    }
}
