//! SQLite credential store

use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

use super::models::{normalize_email, Account};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection lock poisoned")]
    Poisoned,

    #[error("email {0} is already registered")]
    DuplicateEmail(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

const ACCOUNT_COLUMNS: &str = "id, full_name, email, password_hash, verified, admin, super_admin, created_at, updated_at";

/// One row per account; the single source of truth for identity and roles
pub struct CredentialStore {
    conn: Arc<Mutex<Connection>>,
}

impl CredentialStore {
    /// Open (or create) the database file and initialize tables
    pub fn open(path: &str) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_tables()?;
        Ok(store)
    }

    /// Create in-memory database (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn init_tables(&self) -> StoreResult<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT,
                verified INTEGER NOT NULL DEFAULT 0,
                admin INTEGER NOT NULL DEFAULT 0,
                super_admin INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_email ON accounts(email);
            "#,
        )?;

        Ok(())
    }

    /// Insert a new account; fails with `DuplicateEmail` when the address is taken
    pub fn create(&self, account: &Account) -> StoreResult<()> {
        let conn = self.lock()?;
        let email = normalize_email(&account.email);
        let result = conn.execute(
            "INSERT INTO accounts (id, full_name, email, password_hash, verified, admin, super_admin, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                account.id,
                account.full_name,
                email,
                account.password_hash,
                account.verified,
                account.admin,
                account.super_admin,
                account.created_at,
                account.updated_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::DuplicateEmail(email))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find account by email, case-insensitively
    pub fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM accounts WHERE email = ?1", ACCOUNT_COLUMNS);
        let account = conn
            .query_row(&sql, params![normalize_email(email)], account_from_row)
            .optional()?;
        Ok(account)
    }

    pub fn find_by_id(&self, id: &str) -> StoreResult<Option<Account>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM accounts WHERE id = ?1", ACCOUNT_COLUMNS);
        let account = conn.query_row(&sql, params![id], account_from_row).optional()?;
        Ok(account)
    }

    /// Persist every mutable field of an existing account and bump `updated_at`
    ///
    /// Returns `false` when no row with that id exists.
    pub fn save(&self, account: &mut Account) -> StoreResult<bool> {
        let conn = self.lock()?;
        account.updated_at = chrono::Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE accounts
             SET full_name = ?1, password_hash = ?2, verified = ?3, admin = ?4, super_admin = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                account.full_name,
                account.password_hash,
                account.verified,
                account.admin,
                account.super_admin,
                account.updated_at,
                account.id,
            ],
        )?;
        Ok(changed == 1)
    }

    /// All accounts, oldest first
    pub fn list(&self) -> StoreResult<Vec<Account>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM accounts ORDER BY created_at, id", ACCOUNT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let accounts = stmt
            .query_map([], account_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        verified: row.get(4)?,
        admin: row.get(5)?,
        super_admin: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Clone for CredentialStore {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
