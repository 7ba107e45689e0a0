use crate::traits::FileCatalog;
use crate::{CatalogError, FileListing, FileRecord, NewFile, PendingSummary, SearchHit};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;

pub const DEFAULT_CATALOG_PATH: &str = "data/workspace.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    path TEXT UNIQUE,
    extension TEXT,
    size INTEGER,
    modified TEXT,
    content TEXT,
    summary TEXT,
    category TEXT,
    summary_failures INTEGER NOT NULL DEFAULT 0
);";

/// Catalog of indexed files backed by a single SQLite connection.
///
/// Every statement runs in autocommit mode, so a write is durable once the
/// call returns. The connection closes when the handle is dropped.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(SCHEMA)?;
        add_failure_column(&conn)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> Result<u64, CatalogError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl FileCatalog for SqliteCatalog {
    fn upsert_file(&self, file: &NewFile) -> Result<i64, CatalogError> {
        self.conn.execute(
            "INSERT INTO files (name, path, extension, size, modified, content)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(path) DO UPDATE SET
                 name = excluded.name,
                 extension = excluded.extension,
                 size = excluded.size,
                 modified = excluded.modified,
                 content = excluded.content,
                 summary_failures = 0",
            params![
                file.name,
                file.path,
                file.extension,
                file.size as i64,
                file.modified.to_rfc3339(),
                file.content,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM files WHERE path = ?1",
            params![file.path],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn list_files(&self, limit: usize) -> Result<Vec<FileListing>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, size, category, path FROM files
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(FileListing {
                id: row.get(0)?,
                name: row.get(1)?,
                size: row.get::<_, i64>(2)? as u64,
                category: row.get(3)?,
                path: row.get(4)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn search_files(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let pattern = format!("%{}%", escape_like(query));
        let mut stmt = self.conn.prepare(
            "SELECT id, name, summary, path FROM files
             WHERE name LIKE ?1 ESCAPE '\\'
                OR summary LIKE ?1 ESCAPE '\\'
                OR content LIKE ?1 ESCAPE '\\'
             ORDER BY id DESC",
        )?;

        let rows = stmt.query_map(params![pattern], |row| {
            Ok(SearchHit {
                id: row.get(0)?,
                name: row.get(1)?,
                summary: row.get(2)?,
                path: row.get(3)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn pending_summaries(&self, limit: usize) -> Result<Vec<PendingSummary>, CatalogError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content FROM files
             WHERE (summary IS NULL OR summary = '')
             ORDER BY summary_failures ASC, id DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![sql_limit(limit)], |row| {
            Ok(PendingSummary {
                id: row.get(0)?,
                content: row.get(1)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn update_summary(
        &self,
        id: i64,
        summary: &str,
        category: Option<&str>,
    ) -> Result<(), CatalogError> {
        let changed = match category {
            Some(category) => self.conn.execute(
                "UPDATE files SET summary = ?1, category = ?2 WHERE id = ?3",
                params![summary, category, id],
            )?,
            None => self.conn.execute(
                "UPDATE files SET summary = ?1 WHERE id = ?2",
                params![summary, id],
            )?,
        };

        if changed == 0 {
            return Err(CatalogError::NotFound(id));
        }
        Ok(())
    }

    fn record_summary_failure(&self, id: i64) -> Result<(), CatalogError> {
        let changed = self.conn.execute(
            "UPDATE files SET summary_failures = summary_failures + 1 WHERE id = ?1",
            params![id],
        )?;

        if changed == 0 {
            return Err(CatalogError::NotFound(id));
        }
        Ok(())
    }

    fn get_file(&self, id: i64) -> Result<Option<FileRecord>, CatalogError> {
        let record = self
            .conn
            .query_row(
                "SELECT id, name, path, extension, size, modified, content, summary, category
                 FROM files WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }
}

// Catalogs created before failure tracking lack the column.
fn add_failure_column(conn: &Connection) -> Result<(), CatalogError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('files')")?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if !columns.iter().any(|column| column == "summary_failures") {
        conn.execute_batch(
            "ALTER TABLE files ADD COLUMN summary_failures INTEGER NOT NULL DEFAULT 0;",
        )?;
    }
    Ok(())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        path: row.get(2)?,
        extension: row.get(3)?,
        size: row.get::<_, i64>(4)? as u64,
        modified: row.get(5)?,
        content: row.get(6)?,
        summary: row.get(7)?,
        category: row.get(8)?,
    })
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Escapes `LIKE` wildcards so the query matches as a literal substring.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
