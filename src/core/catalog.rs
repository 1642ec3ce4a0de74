//! Collection catalog - SQLite backend for the in-process client kinds
//!
//! Records collection names, ids and metadata per tenant/database.
//! Vectors are not stored here.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde_json::{Map, Value};
use ulid::Ulid;

use crate::remote::Collection;

/// File name of the catalog inside a persistent data directory
pub const CATALOG_FILE: &str = "catalog.sqlite3";

/// Collection catalog scoped to one tenant/database
pub struct Catalog {
    conn: Connection,
    path: Option<PathBuf>,
    tenant: String,
    database: String,
}

impl Catalog {
    /// Open or create the catalog inside `data_dir`
    pub fn open(data_dir: &Path, tenant: &str, database: &str) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let path = data_dir.join(CATALOG_FILE);

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog {}", path.display()))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let catalog = Self {
            conn,
            path: Some(path),
            tenant: tenant.to_string(),
            database: database.to_string(),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    /// In-memory catalog, gone when dropped
    pub fn open_memory(tenant: &str, database: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let catalog = Self {
            conn,
            path: None,
            tenant: tenant.to_string(),
            database: database.to_string(),
        };
        catalog.init_schema()?;
        Ok(catalog)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS collections (
                id TEXT PRIMARY KEY,
                tenant TEXT NOT NULL,
                database TEXT NOT NULL,
                name TEXT NOT NULL,
                metadata TEXT,  -- JSON object
                created_at TEXT NOT NULL,
                UNIQUE (tenant, database, name)
            );

            CREATE INDEX IF NOT EXISTS idx_collections_scope
                ON collections(tenant, database);
            "#,
        )?;
        Ok(())
    }

    /// Database file, if persistent
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return the named collection, creating it with `metadata` if missing.
    /// An existing collection keeps its metadata. The flag is true when the
    /// collection was created by this call.
    pub fn get_or_create(&self, name: &str, metadata: &Map<String, Value>) -> Result<(Collection, bool)> {
        if let Some(existing) = self.get(name)? {
            return Ok((existing, false));
        }

        let id = Ulid::new().to_string();
        let meta_json = if metadata.is_empty() {
            None
        } else {
            Some(serde_json::to_string(metadata)?)
        };

        self.conn
            .execute(
                "INSERT INTO collections (id, tenant, database, name, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    self.tenant,
                    self.database,
                    name,
                    meta_json,
                    Utc::now().to_rfc3339()
                ],
            )
            .with_context(|| format!("Failed to create collection '{}'", name))?;

        let collection = Collection {
            id,
            name: name.to_string(),
            metadata: (!metadata.is_empty()).then(|| metadata.clone()),
            tenant: Some(self.tenant.clone()),
            database: Some(self.database.clone()),
        };
        Ok((collection, true))
    }

    pub fn get(&self, name: &str) -> Result<Option<Collection>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, metadata FROM collections
                 WHERE tenant = ?1 AND database = ?2 AND name = ?3",
                params![self.tenant, self.database, name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, name, meta)| self.to_collection(id, name, meta))
            .transpose()
    }

    /// Collections in creation order
    pub fn list(&self, limit: Option<usize>, offset: usize) -> Result<Vec<Collection>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(
            "SELECT id, name, metadata FROM collections
             WHERE tenant = ?1 AND database = ?2
             ORDER BY created_at, rowid
             LIMIT ?3 OFFSET ?4",
        )?;

        let rows = stmt.query_map(
            params![self.tenant, self.database, limit, offset as i64],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )?;

        let mut collections = Vec::new();
        for row in rows {
            let (id, name, meta) = row?;
            collections.push(self.to_collection(id, name, meta)?);
        }
        Ok(collections)
    }

    /// Returns whether a collection was removed
    pub fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.conn.execute(
            "DELETE FROM collections WHERE tenant = ?1 AND database = ?2 AND name = ?3",
            params![self.tenant, self.database, name],
        )?;
        Ok(removed > 0)
    }

    pub fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM collections WHERE tenant = ?1 AND database = ?2",
            params![self.tenant, self.database],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Drop every collection in every tenant/database
    pub fn reset(&self) -> Result<()> {
        self.conn.execute("DELETE FROM collections", [])?;
        Ok(())
    }

    fn to_collection(&self, id: String, name: String, meta: Option<String>) -> Result<Collection> {
        let metadata = meta
            .map(|m| serde_json::from_str::<Map<String, Value>>(&m))
            .transpose()
            .with_context(|| format!("Corrupt metadata for collection '{}'", name))?;
        Ok(Collection {
            id,
            name,
            metadata,
            tenant: Some(self.tenant.clone()),
            database: Some(self.database.clone()),
        })
    }
}

/// Check a collection name: 3-512 characters from `[a-zA-Z0-9._-]`,
/// starting and ending with an alphanumeric, no `..`.
pub fn validate_collection_name(name: &str) -> std::result::Result<(), String> {
    let len = name.chars().count();
    if !(3..=512).contains(&len) {
        return Err(format!("'{}' must be 3-512 characters long", name));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(format!(
            "'{}' may only contain letters, digits, '.', '_' and '-'",
            name
        ));
    }
    let bookends = [name.chars().next(), name.chars().last()];
    if !bookends
        .iter()
        .all(|c| c.is_some_and(|c| c.is_ascii_alphanumeric()))
    {
        return Err(format!("'{}' must start and end with a letter or digit", name));
    }
    if name.contains("..") {
        return Err(format!("'{}' must not contain '..'", name));
    }
    Ok(())
}
