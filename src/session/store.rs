// Credential persistence
// Two fixed keys in a SQLite kv table; absence of either reads as logged out.

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::types::Credential;

const TOKEN_KEY: &str = "session:token";
const IDENTITY_KEY: &str = "session:identity";

/// Durable storage for the single credential pair
pub struct CredentialStore {
    conn: Mutex<Connection>,
}

impl CredentialStore {
    /// Open (and initialize) the store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open session store: {}", path.display()))?;
        Self::init(conn)
    }

    /// Open an in-memory store, for tests and ephemeral sessions
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory session store")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create session_kv table")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Session store mutex poisoned"))
    }

    /// Read the persisted credential.
    ///
    /// Returns None unless both fields are present and non-empty; a partial
    /// pair indicates a corrupt write and reads as logged out.
    pub fn load(&self) -> Result<Option<Credential>> {
        let conn = self.conn()?;

        let token = read_key(&conn, TOKEN_KEY)?;
        let identity = read_key(&conn, IDENTITY_KEY)?;

        match (token, identity) {
            (Some(token), Some(identity)) if !token.is_empty() && !identity.is_empty() => {
                Ok(Some(Credential { token, identity }))
            }
            _ => Ok(None),
        }
    }

    /// Persist the credential, replacing any previous pair
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let mut conn = self.conn()?;

        let tx = conn
            .transaction()
            .context("Failed to start session store transaction")?;
        tx.execute(
            "INSERT OR REPLACE INTO session_kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![TOKEN_KEY, credential.token],
        )
        .context("Failed to persist token")?;
        tx.execute(
            "INSERT OR REPLACE INTO session_kv (key, value) VALUES (?1, ?2)",
            rusqlite::params![IDENTITY_KEY, credential.identity],
        )
        .context("Failed to persist identity")?;
        tx.commit().context("Failed to commit credential")?;

        Ok(())
    }

    /// Remove the persisted credential. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM session_kv WHERE key IN (?1, ?2)",
            rusqlite::params![TOKEN_KEY, IDENTITY_KEY],
        )
        .context("Failed to clear persisted credential")?;

        Ok(())
    }
}

fn read_key(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM session_kv WHERE key = ?1",
        [key],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("Failed to read session store key: {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential {
            token: "tok-123".to_string(),
            identity: "alice".to_string(),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = CredentialStore::open_in_memory().unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));
    }

    #[test]
    fn test_save_overwrites_previous_pair() {
        let store = CredentialStore::open_in_memory().unwrap();
        store.save(&credential()).unwrap();

        let replacement = Credential {
            token: "tok-456".to_string(),
            identity: "bob".to_string(),
        };
        store.save(&replacement).unwrap();
        assert_eq!(store.load().unwrap(), Some(replacement));
    }

    #[test]
    fn test_partial_state_reads_as_absent() {
        let store = CredentialStore::open_in_memory().unwrap();
        {
            let conn = store.conn().unwrap();
            conn.execute(
                "INSERT INTO session_kv (key, value) VALUES (?1, ?2)",
                rusqlite::params![TOKEN_KEY, "orphan-token"],
            )
            .unwrap();
        }
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_empty_value_reads_as_absent() {
        let store = CredentialStore::open_in_memory().unwrap();
        store
            .save(&Credential {
                token: "".to_string(),
                identity: "alice".to_string(),
            })
            .unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = CredentialStore::open_in_memory().unwrap();
        store.clear().unwrap();

        store.save(&credential()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
