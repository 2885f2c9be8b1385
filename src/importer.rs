use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use rusqlite::Connection;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::classifier::Classifier;
use crate::error::Result;
use crate::models::SmsMessage;
use crate::settings::Settings;

/// Failure reason recorded against a raw message no pattern could classify.
pub const NO_MATCH_REASON: &str = "no matching pattern";

// ---------------------------------------------------------------------------
// SMS backup XML
// ---------------------------------------------------------------------------

// Android SMS backup format: <smses><sms address=".." body=".." .../></smses>
#[derive(Debug, Deserialize)]
struct SmsBackup {
    #[serde(rename = "sms", default)]
    messages: Vec<SmsElement>,
}

#[derive(Debug, Deserialize)]
struct SmsElement {
    #[serde(rename = "@protocol")]
    protocol: Option<String>,
    #[serde(rename = "@address")]
    address: Option<String>,
    #[serde(rename = "@date")]
    date: Option<String>,
    #[serde(rename = "@type")]
    sms_type: Option<String>,
    #[serde(rename = "@body")]
    body: Option<String>,
    #[serde(rename = "@service_center")]
    service_center: Option<String>,
    #[serde(rename = "@date_sent")]
    date_sent: Option<String>,
    #[serde(rename = "@readable_date")]
    readable_date: Option<String>,
    #[serde(rename = "@contact_name")]
    contact_name: Option<String>,
}

impl From<SmsElement> for SmsMessage {
    fn from(el: SmsElement) -> Self {
        let int = |v: Option<String>| v.and_then(|s| s.parse::<i64>().ok()).unwrap_or(0);
        Self {
            protocol: el.protocol,
            address: el.address.unwrap_or_default(),
            date_ms: int(el.date),
            sms_type: int(el.sms_type),
            body: el.body.unwrap_or_default(),
            service_center: el.service_center,
            date_sent_ms: int(el.date_sent),
            readable_date: el.readable_date,
            contact_name: el.contact_name,
        }
    }
}

pub fn read_backup(file_path: &Path) -> Result<Vec<SmsMessage>> {
    let xml = std::fs::read_to_string(file_path)?;
    let backup: SmsBackup = quick_xml::de::from_str(&xml)?;
    Ok(backup.messages.into_iter().map(SmsMessage::from).collect())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn is_duplicate_message(conn: &Connection, msg: &SmsMessage) -> bool {
    let mut stmt = conn
        .prepare_cached(
            "SELECT 1 FROM sms_raw_data WHERE address = ?1 AND sms_date_ms = ?2 AND body = ?3",
        )
        .unwrap();
    stmt.exists(rusqlite::params![msg.address, msg.date_ms, msg.body])
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// import_file
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub total: i64,
    pub parsed: i64,
    pub failed: i64,
    pub skipped: i64,
    pub duplicate_file: bool,
    pub by_type: BTreeMap<&'static str, i64>,
}

/// Run one import over an SMS backup file. Fail-soft per message: a body
/// that classifies to nothing is recorded and counted, never fatal. Only
/// setup violations (missing categories, unusable storage) abort the run.
pub fn import_file(conn: &Connection, file_path: &Path, settings: &Settings) -> Result<ImportSummary> {
    let checksum = compute_checksum(file_path)?;
    {
        let mut stmt = conn
            .prepare("SELECT 1 FROM import_audit WHERE checksum = ?1 AND event = 'completed'")?;
        if stmt.exists([&checksum])? {
            return Ok(ImportSummary { duplicate_file: true, ..Default::default() });
        }
    }

    let messages = read_backup(file_path)?;
    let mut classifier = Classifier::new(conn, settings)?;

    let source_file = file_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    conn.execute(
        "INSERT INTO import_audit (event, source_file, checksum) VALUES ('started', ?1, ?2)",
        rusqlite::params![source_file, checksum],
    )?;

    let started = Instant::now();
    let mut summary = ImportSummary::default();

    for msg in &messages {
        if msg.address != settings.channel_address {
            continue;
        }
        summary.total += 1;

        if is_duplicate_message(conn, msg) {
            summary.skipped += 1;
            continue;
        }

        // Raw message first, so unclassifiable input is still retained.
        conn.execute(
            "INSERT INTO sms_raw_data (protocol, address, sms_date_ms, sms_type, body, service_center, date_sent_ms, readable_date, contact_name, is_processed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
            rusqlite::params![
                msg.protocol,
                msg.address,
                msg.date_ms,
                msg.sms_type,
                msg.body,
                msg.service_center,
                msg.date_sent_ms,
                msg.readable_date,
                msg.contact_name,
            ],
        )?;
        let raw_id = conn.last_insert_rowid();

        match classifier.classify(conn, &msg.body)? {
            Some(classified) => {
                conn.execute(
                    "UPDATE sms_raw_data SET is_processed = 1, transaction_id = ?1 WHERE id = ?2",
                    rusqlite::params![classified.transaction_id, raw_id],
                )?;
                summary.parsed += 1;
                *summary.by_type.entry(classified.pattern.key()).or_default() += 1;
            }
            None => {
                conn.execute(
                    "UPDATE sms_raw_data SET is_processed = 0, processing_error = ?1 WHERE id = ?2",
                    rusqlite::params![NO_MATCH_REASON, raw_id],
                )?;
                summary.failed += 1;
            }
        }
    }

    let elapsed_ms = started.elapsed().as_millis() as i64;
    conn.execute(
        "INSERT INTO import_audit (event, source_file, checksum, total, parsed, failed, skipped, elapsed_ms) \
         VALUES ('completed', ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            source_file,
            checksum,
            summary.total,
            summary.parsed,
            summary.failed,
            summary.skipped,
            elapsed_ms,
        ],
    )?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use std::path::PathBuf;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn incoming_body(n: u32) -> String {
        format!(
            "You have received 5,000 RWF from Jane Doe (**1234) at 2024-01-10 09:00:00. Your new balance: 15,000 RWF. Financial Transaction Id: 999{n:03}."
        )
    }

    fn write_backup(dir: &Path, name: &str, messages: &[(&str, i64, &str)]) -> PathBuf {
        let path = dir.join(name);
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<smses>\n");
        for (address, date, body) in messages {
            xml.push_str(&format!(
                "  <sms protocol=\"0\" address=\"{address}\" date=\"{date}\" type=\"1\" body=\"{body}\" date_sent=\"{date}\" readable_date=\"irrelevant\" />\n"
            ));
        }
        xml.push_str("</smses>\n");
        std::fs::write(&path, &xml).unwrap();
        path
    }

    #[test]
    fn test_import_classifies_and_links_raw_message() {
        let (dir, conn) = test_db();
        let body = incoming_body(1);
        let path = write_backup(dir.path(), "backup.xml", &[("M-Money", 1704877200000, &body)]);
        let summary = import_file(&conn, &path, &Settings::default()).unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.parsed, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.by_type.get("incoming_transfer"), Some(&1));

        let (processed, txn_id): (bool, Option<i64>) = conn
            .query_row(
                "SELECT is_processed, transaction_id FROM sms_raw_data LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(processed);
        assert!(txn_id.is_some());
    }

    #[test]
    fn test_unmatched_message_is_retained_with_reason() {
        let (dir, conn) = test_db();
        let path = write_backup(
            dir.path(),
            "backup.xml",
            &[("M-Money", 1, "Get 50% off all weekend bundles! Dial *123# now.")],
        );
        let summary = import_file(&conn, &path, &Settings::default()).unwrap();

        assert_eq!(summary.total, 1);
        assert_eq!(summary.parsed, 0);
        assert_eq!(summary.failed, 1);

        let (processed, reason): (bool, String) = conn
            .query_row(
                "SELECT is_processed, processing_error FROM sms_raw_data LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert!(!processed);
        assert_eq!(reason, "no matching pattern");
        let txns: i64 = conn
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(txns, 0);
    }

    #[test]
    fn test_non_channel_messages_are_not_counted() {
        let (dir, conn) = test_db();
        let body = incoming_body(2);
        let path = write_backup(
            dir.path(),
            "backup.xml",
            &[
                ("AIRTEL", 1, "Your Airtel balance is low."),
                ("M-Money", 2, &body),
            ],
        );
        let summary = import_file(&conn, &path, &Settings::default()).unwrap();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.parsed, 1);
        let raw_count: i64 = conn
            .query_row("SELECT count(*) FROM sms_raw_data", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw_count, 1);
    }

    #[test]
    fn test_batch_counts() {
        let (dir, conn) = test_db();
        let mut messages: Vec<(String, i64, String)> = Vec::new();
        for i in 0..60 {
            messages.push(("M-Money".to_string(), i, incoming_body(i as u32)));
        }
        for i in 60..70 {
            messages.push(("M-Money".to_string(), i, format!("Special offer number {i}, dial *123#.")));
        }
        for i in 70..100 {
            messages.push(("AIRTEL".to_string(), i, format!("Unrelated notification {i}.")));
        }
        let borrowed: Vec<(&str, i64, &str)> = messages
            .iter()
            .map(|(a, d, b)| (a.as_str(), *d, b.as_str()))
            .collect();
        let path = write_backup(dir.path(), "backup.xml", &borrowed);

        let summary = import_file(&conn, &path, &Settings::default()).unwrap();
        assert_eq!(summary.total, 70);
        assert_eq!(summary.parsed, 60);
        assert_eq!(summary.failed, 10);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.by_type.get("incoming_transfer"), Some(&60));
    }

    #[test]
    fn test_duplicate_file_short_circuits() {
        let (dir, conn) = test_db();
        let body = incoming_body(3);
        let path = write_backup(dir.path(), "backup.xml", &[("M-Money", 1, &body)]);
        let first = import_file(&conn, &path, &Settings::default()).unwrap();
        assert_eq!(first.parsed, 1);
        let second = import_file(&conn, &path, &Settings::default()).unwrap();
        assert!(second.duplicate_file);
        assert_eq!(second.total, 0);
        let raw_count: i64 = conn
            .query_row("SELECT count(*) FROM sms_raw_data", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw_count, 1);
    }

    #[test]
    fn test_duplicate_messages_are_skipped_not_reinserted() {
        let (dir, conn) = test_db();
        let body_a = incoming_body(4);
        let body_b = incoming_body(5);
        let first = write_backup(dir.path(), "first.xml", &[("M-Money", 10, &body_a)]);
        import_file(&conn, &first, &Settings::default()).unwrap();

        // Overlapping export: one already-stored message, one new.
        let second = write_backup(
            dir.path(),
            "second.xml",
            &[("M-Money", 10, &body_a), ("M-Money", 11, &body_b)],
        );
        let summary = import_file(&conn, &second, &Settings::default()).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.parsed, 1);

        let raw_count: i64 = conn
            .query_row("SELECT count(*) FROM sms_raw_data", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw_count, 2);
    }

    #[test]
    fn test_audit_rows_record_run() {
        let (dir, conn) = test_db();
        let body = incoming_body(6);
        let path = write_backup(dir.path(), "backup.xml", &[("M-Money", 1, &body)]);
        import_file(&conn, &path, &Settings::default()).unwrap();

        let started: i64 = conn
            .query_row(
                "SELECT count(*) FROM import_audit WHERE event = 'started' AND source_file = 'backup.xml'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(started, 1);

        let (total, parsed, failed, elapsed): (i64, i64, i64, i64) = conn
            .query_row(
                "SELECT total, parsed, failed, elapsed_ms FROM import_audit WHERE event = 'completed'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!((total, parsed, failed), (1, 1, 0));
        assert!(elapsed >= 0);
    }

    #[test]
    fn test_read_backup_parses_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_backup(
            dir.path(),
            "backup.xml",
            &[("M-Money", 1715351458724, "hello")],
        );
        let messages = read_backup(&path).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].address, "M-Money");
        assert_eq!(messages[0].date_ms, 1715351458724);
        assert_eq!(messages[0].body, "hello");
        assert_eq!(messages[0].contact_name, None);
    }
}
