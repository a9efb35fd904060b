//! Seams to the host forensic platform.
//!
//! The extractor does not find databases or store artifacts itself. It talks
//! to three collaborators:
//!
//! - a [`DatabaseLocator`] that finds application databases on the image,
//! - a [`CaseProvider`] that yields the open case (or fails when none is open),
//! - the case's [`ArtifactSink`], which accepts normalized records.
//!
//! Discovery yields paths only. Each [`AppDatabase`] is opened when it is
//! about to be parsed and owns its connection; dropping it closes the
//! handle, so at most one application database is open at a time.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

use crate::error::{ExtractError, Result};
use crate::models::{Account, ArtifactSource, ContactRecord, MessageRecord};

/// An application SQLite database found on the image
#[derive(Debug)]
pub struct AppDatabase {
    path: PathBuf,
    conn: Connection,
}

impl AppDatabase {
    /// Open a database file read-only
    pub fn open_read_only(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { path, conn })
    }

    /// Wrap an already open connection, e.g. an in-memory fixture
    pub fn from_connection(path: impl Into<PathBuf>, conn: Connection) -> Self {
        Self {
            path: path.into(),
            conn,
        }
    }

    /// Path of the database file on the image
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name component of the path, empty if there is none
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Connection to run queries on
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the handle now, surfacing any close error
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ExtractError::Query(e))
    }
}

/// Finds application databases on a data source
pub trait DatabaseLocator {
    /// Paths of databases for `package` whose file name equals `pattern` when
    /// `exact` is set, or matches it as a SQL `LIKE` pattern otherwise.
    fn find_app_databases(&self, pattern: &str, exact: bool, package: &str) -> Result<Vec<PathBuf>>;

    /// Open one located database for reading
    fn open(&self, path: &Path) -> Result<AppDatabase> {
        AppDatabase::open_read_only(path)
    }
}

/// Generic artifact-ingestion API of the case
pub trait ArtifactSink {
    /// Register an account type, returning the existing one if already present
    fn register_account_type(&self, type_name: &str, display_name: &str) -> Result<Account>;

    /// Ingest one contact
    fn add_contact(&self, source: &ArtifactSource, contact: &ContactRecord) -> Result<()>;

    /// Ingest one message
    fn add_message(&self, source: &ArtifactSource, message: &MessageRecord) -> Result<()>;
}

/// Access to the currently open case
pub trait CaseProvider {
    /// The open case's sink, or [`ExtractError::NoCurrentCase`]
    fn current_case(&self) -> Result<&dyn ArtifactSink>;
}

impl<S: ArtifactSink> CaseProvider for Option<S> {
    fn current_case(&self) -> Result<&dyn ArtifactSink> {
        self.as_ref()
            .map(|sink| sink as &dyn ArtifactSink)
            .ok_or(ExtractError::NoCurrentCase)
    }
}
