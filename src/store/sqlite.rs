//! SQLite store implementation
//!
//! This module provides a SQLite-based implementation of the ArticleStore trait.

use crate::article::ParsedArticle;
use crate::store::schema::initialize_schema;
use crate::store::traits::{ArticleStore, StoreError, StoreResult, StoreStats};
use crate::url::url_hash;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite article store
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteArticleStore)` - Successfully opened/created database
    /// * `Err(StoreError)` - Failed to open database
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }
}

impl ArticleStore for SqliteArticleStore {
    fn get(&self, canonical_url: &str) -> StoreResult<Option<ParsedArticle>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT resolved_url, title, text, authors, links, published, parsed_at
             FROM articles WHERE url = ?1",
        )?;

        let row = stmt
            .query_row(params![canonical_url], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .optional()?;

        let Some((url, title, text, authors, links, published, parsed_at)) = row else {
            return Ok(None);
        };

        let parsed_at_utc = DateTime::parse_from_rfc3339(&parsed_at)
            .map_err(|e| StoreError::InvalidValue(format!("parsed_at '{}': {}", parsed_at, e)))?
            .with_timezone(&Utc);

        Ok(Some(ParsedArticle {
            url,
            title,
            text,
            authors: serde_json::from_str(&authors)?,
            links: serde_json::from_str(&links)?,
            published,
            parsed_at_utc,
        }))
    }

    fn put(
        &self,
        canonical_url: &str,
        article: &ParsedArticle,
        parent_url: Option<&str>,
    ) -> StoreResult<()> {
        let authors = serde_json::to_string(&article.authors)?;
        let links = serde_json::to_string(&article.links)?;
        let now = Utc::now().to_rfc3339();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO articles (url, url_hash, resolved_url, title, text, authors, links, published, parsed_at, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(url) DO UPDATE SET
                resolved_url = excluded.resolved_url,
                title = excluded.title,
                text = excluded.text,
                authors = excluded.authors,
                links = excluded.links,
                published = excluded.published,
                parsed_at = excluded.parsed_at,
                stored_at = excluded.stored_at",
            params![
                canonical_url,
                url_hash(canonical_url),
                article.url,
                article.title,
                article.text,
                authors,
                links,
                article.published,
                article.parsed_at_utc.to_rfc3339(),
                now,
            ],
        )?;

        if let Some(parent) = parent_url {
            tx.execute(
                "INSERT OR IGNORE INTO citations (parent_url, child_url, discovered_at)
                 VALUES (?1, ?2, ?3)",
                params![parent, canonical_url, now],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn citing_urls(&self, canonical_url: &str) -> StoreResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT parent_url FROM citations WHERE child_url = ?1 ORDER BY parent_url",
        )?;
        let urls = stmt
            .query_map(params![canonical_url], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(urls)
    }

    fn stats(&self) -> StoreResult<StoreStats> {
        let conn = self.conn()?;
        let articles: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        let citations: i64 =
            conn.query_row("SELECT COUNT(*) FROM citations", [], |row| row.get(0))?;
        Ok(StoreStats {
            articles: articles as u64,
            citations: citations as u64,
        })
    }
}
