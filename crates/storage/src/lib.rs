//! Sqlite-backed persistence: settings, local accounts and the current session.

use std::path::Path;

use aikesif_core::{Metadata, Settings, Theme};
use anyhow::Context as _;
use rusqlite::{Connection, OptionalExtension as _};

mod auth;

pub use auth::LocalAuth;

/// A stored account. `metadata` is the provider-side JSON bag.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub metadata: Metadata,
}

#[derive(Debug)]
pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let conn = Connection::open(path.as_ref())
            .with_context(|| format!("open sqlite db at {}", path.as_ref().display()))?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        let storage = Self { conn };
        storage.migrate()?;
        Ok(storage)
    }

    fn migrate(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA foreign_keys=ON;

            CREATE TABLE IF NOT EXISTS settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                theme TEXT NOT NULL,
                remember_session INTEGER NOT NULL
            );
            INSERT OR IGNORE INTO settings (id, theme, remember_session)
            VALUES (1, 'light', 1);

            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                salt TEXT NOT NULL,
                metadata_json TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL DEFAULT (unixepoch())
            );

            CREATE TABLE IF NOT EXISTS auth_session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                signed_in_at INTEGER NOT NULL DEFAULT (unixepoch())
            );
            "#,
        )?;

        self.add_column(
            "settings",
            "password_min_len INTEGER NOT NULL DEFAULT 6",
        )?;
        Ok(())
    }

    fn add_column(&self, table: &str, definition: &str) -> anyhow::Result<()> {
        let sql = format!("ALTER TABLE {table} ADD COLUMN {definition}");
        match self.conn.execute(&sql, []) {
            Ok(_) => Ok(()),
            Err(err) if err.to_string().contains("duplicate column name") => Ok(()),
            Err(err) => Err(err).with_context(|| format!("add {table} column: {definition}")),
        }
    }

    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let row = self
            .conn
            .query_row(
                "SELECT theme, remember_session, password_min_len FROM settings WHERE id = 1",
                [],
                |row| {
                    let theme: String = row.get(0)?;
                    let remember_session: bool = row.get(1)?;
                    let password_min_len: i64 = row.get(2)?;
                    Ok((theme, remember_session, password_min_len))
                },
            )
            .optional()?;

        let Some((theme, remember_session, password_min_len)) = row else {
            return Ok(Settings::default());
        };

        let defaults = Settings::default();
        let mut settings = Settings {
            theme: theme.parse::<Theme>().unwrap_or(defaults.theme),
            remember_session,
            password_min_len: usize::try_from(password_min_len)
                .unwrap_or(defaults.password_min_len),
        };
        settings.normalize();
        Ok(settings)
    }

    pub fn save_settings(&self, settings: &Settings) -> anyhow::Result<()> {
        let mut settings = settings.clone();
        settings.normalize();

        self.conn.execute(
            "UPDATE settings SET theme = ?, remember_session = ?, password_min_len = ? WHERE id = 1",
            (
                settings.theme.as_str(),
                settings.remember_session,
                settings.password_min_len as i64,
            ),
        )?;
        Ok(())
    }

    pub fn insert_user(&self, user: &UserRecord) -> anyhow::Result<()> {
        let metadata_json = serde_json::to_string(&user.metadata)?;
        self.conn
            .execute(
                "INSERT INTO users (id, email, password_hash, salt, metadata_json) VALUES (?, ?, ?, ?, ?)",
                (
                    &user.id,
                    &user.email,
                    &user.password_hash,
                    &user.salt,
                    metadata_json,
                ),
            )
            .with_context(|| format!("insert user {}", user.email))?;
        Ok(())
    }

    pub fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        self.find_user("email", email)
    }

    pub fn find_user_by_id(&self, id: &str) -> anyhow::Result<Option<UserRecord>> {
        self.find_user("id", id)
    }

    fn find_user(&self, column: &str, value: &str) -> anyhow::Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT id, email, password_hash, salt, metadata_json FROM users WHERE {column} = ?"
        );
        let row = self
            .conn
            .query_row(&sql, [value], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .optional()?;

        let Some((id, email, password_hash, salt, metadata_json)) = row else {
            return Ok(None);
        };
        let metadata: Metadata = serde_json::from_str(&metadata_json)
            .with_context(|| format!("parse metadata for user {id}"))?;
        Ok(Some(UserRecord {
            id,
            email,
            password_hash,
            salt,
            metadata,
        }))
    }

    pub fn update_user_metadata(&self, id: &str, metadata: &Metadata) -> anyhow::Result<()> {
        let metadata_json = serde_json::to_string(metadata)?;
        let changed = self.conn.execute(
            "UPDATE users SET metadata_json = ? WHERE id = ?",
            (metadata_json, id),
        )?;
        anyhow::ensure!(changed == 1, "no user with id {id}");
        Ok(())
    }

    pub fn set_auth_session(&self, user_id: &str) -> anyhow::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO auth_session (id, user_id, signed_in_at) VALUES (1, ?, unixepoch())
            ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id, signed_in_at = excluded.signed_in_at
            "#,
            [user_id],
        )?;
        Ok(())
    }

    pub fn auth_session_user(&self) -> anyhow::Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT user_id FROM auth_session WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?)
    }

    pub fn clear_auth_session(&self) -> anyhow::Result<()> {
        self.conn.execute("DELETE FROM auth_session", [])?;
        Ok(())
    }
}
