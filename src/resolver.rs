use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::UserType;
use crate::settings::Settings;

type CacheKey = (String, Option<String>, Option<String>);

/// Find-or-create lookup of party identities, with a cache scoped to one
/// import run. Not safe for concurrent writers against the same storage:
/// the find-or-create step is a read-then-write race.
pub struct IdentityResolver {
    cache: HashMap<CacheKey, i64>,
}

impl IdentityResolver {
    pub fn new() -> Self {
        Self { cache: HashMap::new() }
    }

    /// Resolve a (name, phone, masked) identity to a user id, creating the
    /// user on first encounter. Storage matching is exact on name, plus
    /// phone when one was captured; when several rows qualify the first is
    /// reused without disambiguation.
    pub fn resolve(
        &mut self,
        conn: &Connection,
        name: &str,
        phone: Option<&str>,
        masked: Option<&str>,
        user_type: UserType,
    ) -> Result<i64> {
        let key = (
            name.to_string(),
            phone.map(str::to_string),
            masked.map(str::to_string),
        );
        if let Some(&id) = self.cache.get(&key) {
            return Ok(id);
        }

        let existing: Option<i64> = match phone {
            Some(phone) => conn
                .query_row(
                    "SELECT id FROM users WHERE full_name = ?1 AND phone_number = ?2 ORDER BY id LIMIT 1",
                    rusqlite::params![name, phone],
                    |r| r.get(0),
                )
                .optional()?,
            None => conn
                .query_row(
                    "SELECT id FROM users WHERE full_name = ?1 ORDER BY id LIMIT 1",
                    [name],
                    |r| r.get(0),
                )
                .optional()?,
        };

        let id = match existing {
            Some(id) => id,
            None => {
                conn.execute(
                    "INSERT INTO users (full_name, phone_number, masked_phone, user_type) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![name, phone, masked, user_type.as_str()],
                )?;
                conn.last_insert_rowid()
            }
        };
        self.cache.insert(key, id);
        Ok(id)
    }

    /// The account holder, looked up by the configured account number and
    /// created from settings when absent. One side of every
    /// counterparty-bearing transaction.
    pub fn owner(&self, conn: &Connection, settings: &Settings) -> Result<i64> {
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM users WHERE account_number = ?1 ORDER BY id LIMIT 1",
                [&settings.owner_account],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(id) = existing {
            return Ok(id);
        }
        conn.execute(
            "INSERT INTO users (full_name, phone_number, account_number, user_type) VALUES (?1, ?2, ?3, 'individual')",
            rusqlite::params![settings.owner_name, settings.owner_phone, settings.owner_account],
        )?;
        Ok(conn.last_insert_rowid())
    }
}
