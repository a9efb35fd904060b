//! Case database schema definitions
//!
//! Constants for the table and column names of the case database the
//! extracted artifacts are stored in.

/// Account types table schema
pub mod account_types {
    /// Table name
    pub const TABLE: &str = "account_types";
    /// Primary key column
    pub const ID: &str = "id";
    /// Account type name column
    pub const TYPE_NAME: &str = "type_name";
    /// Display name column
    pub const DISPLAY_NAME: &str = "display_name";
}

/// Contacts table schema
pub mod contacts {
    /// Table name
    pub const TABLE: &str = "contacts";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to account types
    pub const ACCOUNT_TYPE_ID: &str = "account_type_id";
    /// Name of the parser that produced the row
    pub const PARSER_NAME: &str = "parser_name";
    /// Version of the parser that produced the row
    pub const PARSER_VERSION: &str = "parser_version";
    /// Application database the contact came from
    pub const SOURCE_FILE: &str = "source_file";
    /// Display name column
    pub const NAME: &str = "name";
    /// Phone number column
    pub const PHONE: &str = "phone";
    /// Home phone number column
    pub const HOME_PHONE: &str = "home_phone";
    /// Mobile phone number column
    pub const MOBILE_PHONE: &str = "mobile_phone";
    /// Email address column
    pub const EMAIL: &str = "email";
    /// Ingestion timestamp column
    pub const INGESTED_AT: &str = "ingested_at";
}

/// Contact attributes table schema
pub mod contact_attributes {
    /// Table name
    pub const TABLE: &str = "contact_attributes";
    /// Foreign key to contacts
    pub const CONTACT_ID: &str = "contact_id";
    /// Order of the attribute on its contact
    pub const POSITION: &str = "position";
    /// Attribute kind column
    pub const KIND: &str = "kind";
    /// Source label column
    pub const SOURCE: &str = "source";
    /// Attribute value column
    pub const VALUE: &str = "value";
}

/// Messages table schema
pub mod messages {
    /// Table name
    pub const TABLE: &str = "messages";
    /// Primary key column
    pub const ID: &str = "id";
    /// Foreign key to account types
    pub const ACCOUNT_TYPE_ID: &str = "account_type_id";
    /// Name of the parser that produced the row
    pub const PARSER_NAME: &str = "parser_name";
    /// Version of the parser that produced the row
    pub const PARSER_VERSION: &str = "parser_version";
    /// Application database the message came from
    pub const SOURCE_FILE: &str = "source_file";
    /// Message type label column
    pub const MESSAGE_TYPE: &str = "message_type";
    /// Direction column
    pub const DIRECTION: &str = "direction";
    /// Sender identifier column
    pub const SENDER: &str = "sender";
    /// Recipient identifier column
    pub const RECIPIENT: &str = "recipient";
    /// Seconds since epoch column
    pub const DATE_TIME: &str = "date_time";
    /// Read status column
    pub const READ_STATUS: &str = "read_status";
    /// Subject column
    pub const SUBJECT: &str = "subject";
    /// Body column
    pub const BODY: &str = "body";
    /// Thread identifier column
    pub const THREAD_ID: &str = "thread_id";
    /// Ingestion timestamp column
    pub const INGESTED_AT: &str = "ingested_at";
}
