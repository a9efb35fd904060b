//! Extraction orchestrator.
//!
//! [`TiktokAnalyzer`] drives one run: it finds the contact and message
//! databases of the TikTok package, drains each one through its mapper, and
//! hands every record to the open case. Databases are processed one at a
//! time, contacts first.
//!
//! Failure handling:
//! - no open case stops the run with [`ExtractError::NoCurrentCase`];
//! - an open, query or row-decoding failure abandons that database only;
//! - an ingestion failure skips that record only.
//!
//! Discovery only returns paths. Each database is opened right before it is
//! parsed and closed right after, so a run holds one application database
//! at a time and an early stop leaves nothing open.

use std::path::Path;

use tracing::{debug, error, info, warn};

use crate::config::ParserConfig;
use crate::cursor::RowCursor;
use crate::error::{ExtractError, Result, Severity};
use crate::host::{AppDatabase, ArtifactSink, CaseProvider, DatabaseLocator};
use crate::logging::OperationTimer;
use crate::mappers::{ContactMapper, MessageMapper, CONTACTS_QUERY, MESSAGES_QUERY};
use crate::metrics::MetricsCollector;
use crate::models::{Account, ArtifactSource};

/// What a run did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Contact databases found
    pub contact_databases: usize,
    /// Message databases found
    pub message_databases: usize,
    /// Databases abandoned because of an open, query or row error
    pub databases_failed: usize,
    /// Contacts accepted by the case
    pub contacts_ingested: usize,
    /// Messages accepted by the case
    pub messages_ingested: usize,
    /// Records the case refused
    pub rows_skipped: usize,
}

/// Extracts TikTok contacts and messages into the open case
#[derive(Debug)]
pub struct TiktokAnalyzer {
    config: ParserConfig,
    account: Account,
    metrics: MetricsCollector,
}

impl TiktokAnalyzer {
    /// Register the TikTok account type with the open case.
    pub fn new(case: &dyn CaseProvider, config: ParserConfig) -> Result<Self> {
        let sink = case.current_case()?;
        let account = sink.register_account_type(&config.account_type, &config.account_type)?;
        info!(
            account_type = %account.type_name,
            parser = %config.parser_name,
            version = %config.version,
            "Registered account type"
        );

        Ok(Self {
            config,
            account,
            metrics: MetricsCollector::default(),
        })
    }

    /// Account type all artifacts are linked to
    #[must_use]
    pub const fn account(&self) -> &Account {
        &self.account
    }

    /// Parser settings in use
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Run one extraction.
    pub fn analyze(
        &self,
        locator: &dyn DatabaseLocator,
        case: &dyn CaseProvider,
    ) -> Result<ExtractionReport> {
        let timer = OperationTimer::new("tiktok_extraction");
        let result = self.run(locator, case);

        match &result {
            Ok(report) => info!(
                contacts = report.contacts_ingested,
                messages = report.messages_ingested,
                failed_databases = report.databases_failed,
                skipped_rows = report.rows_skipped,
                "TikTok extraction finished"
            ),
            Err(ExtractError::NoCurrentCase) => {
                warn!("No case currently open.");
                self.metrics.record_error(Severity::Fatal);
            }
            Err(e) => error!(error = %e, "TikTok extraction aborted"),
        }
        timer.finish();
        result
    }

    fn run(&self, locator: &dyn DatabaseLocator, case: &dyn CaseProvider) -> Result<ExtractionReport> {
        let package = &self.config.package_name;
        let message_paths =
            locator.find_app_databases(&self.config.message_db_pattern, false, package)?;
        let contact_paths = locator.find_app_databases(&self.config.contact_db_name, true, package)?;

        let mut report = ExtractionReport {
            contact_databases: contact_paths.len(),
            message_databases: message_paths.len(),
            ..ExtractionReport::default()
        };
        info!(
            contact_dbs = report.contact_databases,
            message_dbs = report.message_databases,
            "Discovered TikTok databases"
        );

        for path in &contact_paths {
            let sink = case.current_case()?;
            if let Some(db) = self.open(locator, path, &mut report)? {
                self.parse_contacts(&db, sink, &mut report)?;
                Self::close(db);
            }
        }

        for path in &message_paths {
            let sink = case.current_case()?;
            if let Some(db) = self.open(locator, path, &mut report)? {
                self.parse_messages(&db, sink, &mut report)?;
                Self::close(db);
            }
        }

        Ok(report)
    }

    /// `None` when the database could not be opened; the failure is logged.
    fn open(
        &self,
        locator: &dyn DatabaseLocator,
        path: &Path,
        report: &mut ExtractionReport,
    ) -> Result<Option<AppDatabase>> {
        match locator.open(path) {
            Ok(db) => {
                debug!(db = %path.display(), "Opened application database");
                Ok(Some(db))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                report.databases_failed += 1;
                self.log_failure(&e, "Error opening the Tiktok database", path);
                Ok(None)
            }
        }
    }

    fn source_for(&self, db: &AppDatabase) -> ArtifactSource {
        ArtifactSource {
            parser_name: self.config.parser_name.clone(),
            version: self.config.version.clone(),
            source_file: db.path().to_path_buf(),
            account: self.account.clone(),
        }
    }

    fn close(db: AppDatabase) {
        let path = db.path().display().to_string();
        if let Err(e) = db.close() {
            warn!(db = %path, error = %e, "Error closing database");
        }
    }

    /// Only a fatal error comes back; everything else is logged here.
    fn parse_contacts(
        &self,
        db: &AppDatabase,
        sink: &dyn ArtifactSink,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let timer = OperationTimer::new("parse_contacts");
        let result = self.ingest_contacts(db, sink, report);
        self.metrics.record_database("contacts", timer.elapsed());

        match result {
            Ok(count) => {
                info!(db = %db.path().display(), contacts = count, "Parsed TikTok contacts");
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                report.databases_failed += 1;
                self.log_failure(&e, "Error querying the Tiktok database for contacts", db.path());
                Ok(())
            }
        }
    }

    fn ingest_contacts(
        &self,
        db: &AppDatabase,
        sink: &dyn ArtifactSink,
        report: &mut ExtractionReport,
    ) -> Result<usize> {
        let source = self.source_for(db);
        let mapper = ContactMapper::new(&self.config.parser_name);

        let mut stmt = db.connection().prepare(CONTACTS_QUERY)?;
        let mut rows = stmt.query([])?;

        let mut ingested = 0;
        while let Some(row) = rows.next()? {
            let contact = mapper.map(&RowCursor::new(row))?;
            match sink.add_contact(&source, &contact) {
                Ok(()) => {
                    ingested += 1;
                    report.contacts_ingested += 1;
                    self.metrics.record_contact();
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.rows_skipped += 1;
                    self.log_failure(&e, "Error adding Tiktok contact artifact", db.path());
                }
            }
        }
        Ok(ingested)
    }

    /// Only a fatal error comes back; everything else is logged here.
    fn parse_messages(
        &self,
        db: &AppDatabase,
        sink: &dyn ArtifactSink,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        let timer = OperationTimer::new("parse_messages");
        let result = self.ingest_messages(db, sink, report);
        self.metrics.record_database("messages", timer.elapsed());

        match result {
            Ok(count) => {
                info!(db = %db.path().display(), messages = count, "Parsed TikTok messages");
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                report.databases_failed += 1;
                self.log_failure(&e, "Error querying the Tiktok database for messages", db.path());
                Ok(())
            }
        }
    }

    fn ingest_messages(
        &self,
        db: &AppDatabase,
        sink: &dyn ArtifactSink,
        report: &mut ExtractionReport,
    ) -> Result<usize> {
        let source = self.source_for(db);
        let mapper = MessageMapper::for_database(&db.file_name(), &self.config);
        info!(db = %db.path().display(), owner = mapper.owner_uid(), "Parsing TikTok messages");

        let mut stmt = db.connection().prepare(MESSAGES_QUERY)?;
        let mut rows = stmt.query([])?;

        let mut ingested = 0;
        while let Some(row) = rows.next()? {
            let message = mapper.map(&RowCursor::new(row))?;
            match sink.add_message(&source, &message) {
                Ok(()) => {
                    ingested += 1;
                    report.messages_ingested += 1;
                    self.metrics.record_message();
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    report.rows_skipped += 1;
                    self.log_failure(&e, "Error adding Tiktok message artifact", db.path());
                }
            }
        }
        Ok(ingested)
    }

    fn log_failure(&self, err: &ExtractError, context: &str, db: &Path) {
        let severity = err.severity();
        self.metrics.record_error(severity);
        match severity {
            Severity::Fatal | Severity::Severe => {
                error!(db = %db.display(), error = %err, "{}", context);
            }
            Severity::Warning => {
                warn!(db = %db.display(), error = %err, "{}", context);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContactRecord, MessageRecord};
    use rusqlite::Connection;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingSink {
        contacts: RefCell<Vec<ContactRecord>>,
        messages: RefCell<Vec<MessageRecord>>,
        opens: Rc<Cell<usize>>,
        opens_at_ingest: RefCell<Vec<usize>>,
    }

    impl ArtifactSink for RecordingSink {
        fn register_account_type(&self, type_name: &str, display_name: &str) -> Result<Account> {
            Ok(Account {
                id: 1,
                type_name: type_name.to_string(),
                display_name: display_name.to_string(),
            })
        }

        fn add_contact(&self, _: &ArtifactSource, contact: &ContactRecord) -> Result<()> {
            self.opens_at_ingest.borrow_mut().push(self.opens.get());
            self.contacts.borrow_mut().push(contact.clone());
            Ok(())
        }

        fn add_message(&self, _: &ArtifactSource, message: &MessageRecord) -> Result<()> {
            self.messages.borrow_mut().push(message.clone());
            Ok(())
        }
    }

    /// Hands out in-memory databases built by the test, counting opens
    struct FixtureLocator {
        contacts: Vec<PathBuf>,
        messages: Vec<PathBuf>,
        databases: RefCell<HashMap<PathBuf, AppDatabase>>,
        opens: Rc<Cell<usize>>,
    }

    impl FixtureLocator {
        fn new(contacts: Vec<AppDatabase>, messages: Vec<AppDatabase>, opens: Rc<Cell<usize>>) -> Self {
            let contact_paths = contacts.iter().map(|db| db.path().to_path_buf()).collect();
            let message_paths = messages.iter().map(|db| db.path().to_path_buf()).collect();
            let databases = contacts
                .into_iter()
                .chain(messages)
                .map(|db| (db.path().to_path_buf(), db))
                .collect();
            Self {
                contacts: contact_paths,
                messages: message_paths,
                databases: RefCell::new(databases),
                opens,
            }
        }
    }

    impl DatabaseLocator for FixtureLocator {
        fn find_app_databases(&self, _: &str, exact: bool, _: &str) -> Result<Vec<PathBuf>> {
            Ok(if exact { self.contacts.clone() } else { self.messages.clone() })
        }

        fn open(&self, path: &Path) -> Result<AppDatabase> {
            self.opens.set(self.opens.get() + 1);
            self.databases
                .borrow_mut()
                .remove(path)
                .ok_or_else(|| ExtractError::Discovery(format!("No such database: {}", path.display())))
        }
    }

    fn contacts_db(path: &str, nick: &str) -> AppDatabase {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE SIMPLE_USER (UID TEXT, UNIQUE_ID TEXT, NICK_NAME TEXT);")
            .unwrap();
        conn.execute("INSERT INTO SIMPLE_USER VALUES ('5', 'abc', ?1)", [nick])
            .unwrap();
        AppDatabase::from_connection(path, conn)
    }

    #[test]
    fn test_no_case_fails_construction() {
        let closed: Option<RecordingSink> = None;
        let err = TiktokAnalyzer::new(&closed, ParserConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::NoCurrentCase));
    }

    #[test]
    fn test_contacts_are_ingested() {
        let case = Some(RecordingSink::default());
        let analyzer = TiktokAnalyzer::new(&case, ParserConfig::default()).unwrap();
        assert_eq!(analyzer.account().type_name, "Tiktok");

        let locator = FixtureLocator::new(
            vec![contacts_db("/img/com.zhiliaoapp.musically/databases/db_im_xx", "Bob")],
            Vec::new(),
            Rc::default(),
        );
        let report = analyzer.analyze(&locator, &case).unwrap();
        assert_eq!(report.contacts_ingested, 1);
        assert_eq!(report.databases_failed, 0);

        let sink = case.as_ref().unwrap();
        let contacts = sink.contacts.borrow();
        assert_eq!(contacts[0].display_name, "Bob");
        assert!(sink.messages.borrow().is_empty());
    }

    #[test]
    fn test_databases_are_opened_one_at_a_time() {
        let sink = RecordingSink::default();
        let opens = Rc::clone(&sink.opens);
        let case = Some(sink);
        let analyzer = TiktokAnalyzer::new(&case, ParserConfig::default()).unwrap();

        let locator = FixtureLocator::new(
            vec![
                contacts_db("/img/a/com.zhiliaoapp.musically/databases/db_im_xx", "Ann"),
                contacts_db("/img/b/com.zhiliaoapp.musically/databases/db_im_xx", "Bob"),
            ],
            Vec::new(),
            opens,
        );
        let report = analyzer.analyze(&locator, &case).unwrap();
        assert_eq!(report.contact_databases, 2);
        assert_eq!(report.contacts_ingested, 2);

        // Each database is opened only once the previous one is done
        let sink = case.as_ref().unwrap();
        assert_eq!(*sink.opens_at_ingest.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_unopenable_database_is_skipped() {
        let case = Some(RecordingSink::default());
        let analyzer = TiktokAnalyzer::new(&case, ParserConfig::default()).unwrap();

        let mut locator = FixtureLocator::new(
            vec![contacts_db("/img/com.zhiliaoapp.musically/databases/db_im_xx", "Bob")],
            Vec::new(),
            Rc::default(),
        );
        locator
            .contacts
            .insert(0, PathBuf::from("/img/com.zhiliaoapp.musically/databases/gone"));

        let report = analyzer.analyze(&locator, &case).unwrap();
        assert_eq!(report.contact_databases, 2);
        assert_eq!(report.databases_failed, 1);
        assert_eq!(report.contacts_ingested, 1);
    }

    #[test]
    fn test_missing_table_abandons_only_that_database() {
        let case = Some(RecordingSink::default());
        let analyzer = TiktokAnalyzer::new(&case, ParserConfig::default()).unwrap();

        let broken = AppDatabase::from_connection(
            "/img/com.zhiliaoapp.musically/databases/1_im.db",
            Connection::open_in_memory().unwrap(),
        );
        let locator = FixtureLocator::new(
            vec![contacts_db("/img/com.zhiliaoapp.musically/databases/db_im_xx", "Bob")],
            vec![broken],
            Rc::default(),
        );
        let report = analyzer.analyze(&locator, &case).unwrap();
        assert_eq!(report.databases_failed, 1);
        assert_eq!(report.contacts_ingested, 1);
        assert_eq!(report.messages_ingested, 0);
    }
}
