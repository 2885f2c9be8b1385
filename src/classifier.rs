use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};

use crate::error::{LedgerError, Result};
use crate::extract::TS_FORMAT;
use crate::models::{Category, NewTransaction, TransactionStatus};
use crate::patterns::{Catalog, Extracted, PatternKind, CATALOG};
use crate::resolver::IdentityResolver;
use crate::settings::Settings;

/// The outcome of a successful classification.
#[derive(Debug, Clone, Copy)]
pub struct Classified {
    pub transaction_id: i64,
    pub pattern: PatternKind,
}

/// Ordered pattern dispatch over one message body: first structural match
/// wins, a field-level extraction failure falls through to the next shape,
/// and a match ends with one transaction plus its party links persisted.
pub struct Classifier {
    catalog: Catalog,
    categories: HashMap<&'static str, Category>,
    resolver: IdentityResolver,
    owner_id: i64,
}

impl Classifier {
    /// Loads the category map and the owner identity. Every category the
    /// catalog maps to must already be seeded; a missing one is a setup
    /// error and fails the run immediately.
    pub fn new(conn: &Connection, settings: &Settings) -> Result<Self> {
        let mut categories = HashMap::new();
        for &kind in CATALOG {
            let name = kind.category();
            if categories.contains_key(name) {
                continue;
            }
            let category = conn
                .query_row(
                    "SELECT id, name, is_debit, fee_applicable FROM transaction_categories WHERE name = ?1",
                    [name],
                    |r| {
                        Ok(Category {
                            id: r.get(0)?,
                            name: r.get(1)?,
                            is_debit: r.get(2)?,
                            fee_applicable: r.get(3)?,
                        })
                    },
                )
                .optional()?
                .ok_or_else(|| LedgerError::MissingCategory(name.to_string()))?;
            categories.insert(name, category);
        }

        let resolver = IdentityResolver::new();
        let owner_id = resolver.owner(conn, settings)?;

        Ok(Self {
            catalog: Catalog::new(),
            categories,
            resolver,
            owner_id,
        })
    }

    /// Classify one body. `Ok(None)` means no pattern produced a complete
    /// transaction; nothing is written in that case.
    pub fn classify(&mut self, conn: &Connection, body: &str) -> Result<Option<Classified>> {
        let mut matched: Option<(PatternKind, Extracted)> = None;
        for (kind, re) in self.catalog.entries() {
            let Some(caps) = re.captures(body) else { continue };
            match kind.extract(&caps) {
                Ok(extracted) => {
                    matched = Some((*kind, extracted));
                    break;
                }
                // Malformed capture: same as a structural non-match here.
                Err(_) => continue,
            }
        }

        let Some((kind, extracted)) = matched else {
            return Ok(None);
        };
        let transaction_id = self.store(conn, kind, extracted)?;
        Ok(Some(Classified { transaction_id, pattern: kind }))
    }

    fn store(&mut self, conn: &Connection, kind: PatternKind, extracted: Extracted) -> Result<i64> {
        let category_id = self.categories[kind.category()].id;
        let txn = NewTransaction {
            external_id: extracted.external_id,
            category_id,
            amount: extracted.amount,
            fee: extracted.fee,
            balance_after: extracted.balance_after,
            timestamp: extracted.timestamp,
            sender_message: extracted.sender_message,
            merchant_code: extracted.merchant_code,
        };

        conn.execute(
            "INSERT INTO transactions (external_id, category_id, amount, fee, balance_after, occurred_at, sender_message, merchant_code, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                txn.external_id,
                txn.category_id,
                txn.amount.to_string(),
                txn.fee.to_string(),
                txn.balance_after.to_string(),
                txn.timestamp.format(TS_FORMAT).to_string(),
                txn.sender_message,
                txn.merchant_code,
                TransactionStatus::Completed.as_str(),
            ],
        )?;
        let transaction_id = conn.last_insert_rowid();

        conn.execute(
            "INSERT INTO transaction_parties (transaction_id, user_id, role) VALUES (?1, ?2, ?3)",
            rusqlite::params![transaction_id, self.owner_id, extracted.owner_role.as_str()],
        )?;

        if let Some(cp) = extracted.counterparty {
            let user_id = self.resolver.resolve(
                conn,
                &cp.name,
                cp.phone.as_deref(),
                cp.masked.as_deref(),
                cp.user_type,
            )?;
            conn.execute(
                "INSERT INTO transaction_parties (transaction_id, user_id, role) VALUES (?1, ?2, ?3)",
                rusqlite::params![transaction_id, user_id, cp.role.as_str()],
            )?;
        }

        Ok(transaction_id)
    }
}
