//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Articlesa store.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Parsed articles keyed by the canonical URL they were requested as;
-- resolved_url is where the article was served from
CREATE TABLE IF NOT EXISTS articles (
    url TEXT PRIMARY KEY,
    url_hash TEXT NOT NULL,
    resolved_url TEXT NOT NULL,
    title TEXT NOT NULL,
    text TEXT NOT NULL,
    authors TEXT NOT NULL,
    links TEXT NOT NULL,
    published TEXT,
    parsed_at TEXT NOT NULL,
    stored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_hash ON articles(url_hash);

-- Citation edges: parent_url links to child_url
CREATE TABLE IF NOT EXISTS citations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_url TEXT NOT NULL,
    child_url TEXT NOT NULL,
    discovered_at TEXT NOT NULL,
    UNIQUE(parent_url, child_url)
);

CREATE INDEX IF NOT EXISTS idx_citations_child ON citations(child_url);
"#;

/// Creates all tables and indexes if they do not exist
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
