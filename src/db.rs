use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    full_name TEXT NOT NULL,
    phone_number TEXT,
    masked_phone TEXT,
    account_number TEXT,
    user_type TEXT NOT NULL DEFAULT 'individual',
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);
CREATE INDEX IF NOT EXISTS idx_users_name ON users(full_name);
CREATE INDEX IF NOT EXISTS idx_users_phone ON users(phone_number);

CREATE TABLE IF NOT EXISTS transaction_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    code TEXT,
    description TEXT,
    is_debit INTEGER NOT NULL DEFAULT 1,
    fee_applicable INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    external_id TEXT,
    category_id INTEGER NOT NULL,
    amount TEXT NOT NULL CHECK (CAST(amount AS REAL) > 0),
    fee TEXT NOT NULL DEFAULT '0' CHECK (CAST(fee AS REAL) >= 0),
    balance_after TEXT,
    currency TEXT NOT NULL DEFAULT 'RWF',
    occurred_at TEXT NOT NULL,
    sender_message TEXT,
    merchant_code TEXT,
    status TEXT NOT NULL DEFAULT 'completed',
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (category_id) REFERENCES transaction_categories(id)
);
CREATE INDEX IF NOT EXISTS idx_txn_external_id ON transactions(external_id);
CREATE INDEX IF NOT EXISTS idx_txn_occurred_at ON transactions(occurred_at);

CREATE TABLE IF NOT EXISTS transaction_parties (
    id INTEGER PRIMARY KEY,
    transaction_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (transaction_id, user_id, role),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_party_transaction ON transaction_parties(transaction_id);
CREATE INDEX IF NOT EXISTS idx_party_user ON transaction_parties(user_id);

CREATE TABLE IF NOT EXISTS sms_raw_data (
    id INTEGER PRIMARY KEY,
    protocol TEXT,
    address TEXT NOT NULL,
    sms_date_ms INTEGER,
    sms_type INTEGER,
    body TEXT NOT NULL,
    service_center TEXT,
    date_sent_ms INTEGER,
    readable_date TEXT,
    contact_name TEXT,
    is_processed INTEGER DEFAULT 0,
    processing_error TEXT,
    transaction_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (transaction_id) REFERENCES transactions(id) ON DELETE SET NULL
);
CREATE INDEX IF NOT EXISTS idx_sms_processed ON sms_raw_data(is_processed);
CREATE INDEX IF NOT EXISTS idx_sms_date ON sms_raw_data(sms_date_ms);

CREATE TABLE IF NOT EXISTS import_audit (
    id INTEGER PRIMARY KEY,
    event TEXT NOT NULL,
    source_file TEXT,
    checksum TEXT,
    total INTEGER,
    parsed INTEGER,
    failed INTEGER,
    skipped INTEGER,
    elapsed_ms INTEGER,
    created_at TEXT DEFAULT (datetime('now'))
);
";

// (name, code, description, is_debit, fee_applicable)
const DEFAULT_CATEGORIES: &[(&str, Option<&str>, &str, bool, bool)] = &[
    ("Incoming Transfer", None, "Money received from another MoMo user", false, false),
    ("Outgoing Transfer", Some("*165*"), "Money sent to another MoMo user", true, true),
    ("Merchant Payment", None, "Payment to registered merchant", true, false),
    ("Bank Deposit", Some("*113*"), "Cash deposited via bank/agent", false, false),
    ("Airtime Purchase", Some("*162*"), "Mobile airtime top-up", true, false),
    ("Bundle Purchase", Some("*162*"), "Data/voice bundle purchase", true, false),
    ("Data Bundle", Some("*164*"), "Internet data subscription", true, false),
    ("Cash Withdrawal", Some("*165*"), "Cash withdrawn from agent", true, true),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 =
        conn.query_row("SELECT count(*) FROM transaction_categories", [], |row| row.get(0))?;
    if count == 0 {
        for cat in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO transaction_categories (name, code, description, is_debit, fee_applicable) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![cat.0, cat.1, cat.2, cat.3, cat.4],
            )?;
        }
    }
    Ok(())
}
