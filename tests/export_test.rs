use std::fs;
use std::path::PathBuf;

use tempfile::tempdir;

use tiktok_im_extractor::export::{write_contacts, write_messages, ExportFormat};
use tiktok_im_extractor::host::ArtifactSink;
use tiktok_im_extractor::models::{
    ArtifactSource, Attribute, AttributeKind, ContactRecord, Direction, MessageRecord, ReadStatus,
};
use tiktok_im_extractor::CaseDatabase;

fn populated_case() -> CaseDatabase {
    let case = CaseDatabase::open_in_memory().expect("Failed to create case database");
    let account = case
        .register_account_type("Tiktok", "Tiktok")
        .expect("Failed to register account type");
    let source = ArtifactSource {
        parser_name: "Tiktok Parser".to_string(),
        version: "15.0.1".to_string(),
        source_file: PathBuf::from("/image/com.zhiliaoapp.musically/databases/111_im.db"),
        account,
    };

    let contact = ContactRecord {
        display_name: "Bob, the builder".to_string(),
        extra_attributes: vec![
            Attribute::new(AttributeKind::Id, "Tiktok Parser", "5"),
            Attribute::new(AttributeKind::Url, "Tiktok Parser", "https://www.tiktok.com/@abc"),
            Attribute::new(AttributeKind::UserId, "Tiktok Parser", "abc"),
        ],
        ..ContactRecord::default()
    };
    case.add_contact(&source, &contact).expect("Failed to add contact");

    let message = MessageRecord {
        type_label: "Tiktok Message".to_string(),
        direction: Direction::Incoming,
        sender_id: "222".to_string(),
        recipient_id: "111".to_string(),
        timestamp: 1_600_000_000,
        read_status: ReadStatus::Read,
        subject: "text".to_string(),
        body: "line one\nline \"two\"".to_string(),
        thread_id: "0:1:111:222:x".to_string(),
    };
    case.add_message(&source, &message).expect("Failed to add message");
    case
}

#[test]
fn test_csv_export() {
    let case = populated_case();
    let out = tempdir().expect("Failed to create temp directory");

    let contacts_path = write_contacts(&case.contacts().unwrap(), ExportFormat::Csv, out.path()).unwrap();
    assert_eq!(contacts_path, out.path().join("contacts.csv"));

    let mut reader = csv::Reader::from_path(&contacts_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[2], "Name");
    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][2], "Bob, the builder");
    assert_eq!(
        &records[0][7],
        "id=5; url=https://www.tiktok.com/@abc; user_id=abc"
    );

    let messages_path = write_messages(&case.messages().unwrap(), ExportFormat::Csv, out.path()).unwrap();
    let mut reader = csv::Reader::from_path(&messages_path).unwrap();
    let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][3], "incoming");
    assert_eq!(&records[0][6], "2020-09-13T12:26:40+00:00");
    assert_eq!(&records[0][7], "read");
    assert_eq!(&records[0][9], "line one\nline \"two\"");
}

#[test]
fn test_json_export() {
    let case = populated_case();
    let out = tempdir().expect("Failed to create temp directory");

    let path = write_messages(&case.messages().unwrap(), ExportFormat::Json, out.path()).unwrap();
    assert_eq!(path, out.path().join("messages.json"));

    let content = fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    let first = &parsed[0];
    assert_eq!(first["direction"], "incoming");
    assert_eq!(first["read_status"], "read");
    assert_eq!(first["thread_id"], "0:1:111:222:x");
    assert_eq!(first["timestamp"], 1_600_000_000);

    let path = write_contacts(&case.contacts().unwrap(), ExportFormat::Json, out.path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(parsed[0]["display_name"], "Bob, the builder");
    assert_eq!(parsed[0]["extra_attributes"][2]["kind"], "user_id");
}

#[test]
fn test_export_creates_output_directory() {
    let out = tempdir().expect("Failed to create temp directory");
    let nested = out.path().join("a/b");

    let path = write_contacts(&[], ExportFormat::Csv, &nested).unwrap();
    assert!(path.exists());
    let content = fs::read_to_string(path).unwrap();
    assert!(content.starts_with("ID,Source,Name"));
}
