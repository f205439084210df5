//! Snapshot loading.
//!
//! A snapshot is either an existing SQLite database, opened read-only, or a
//! `.sql` script executed into a private in-memory database. Either way the
//! schema catalog is read back as [`CatalogRow`]s for the core.

use std::path::Path;

use sqlitediff_core::{CatalogRow, SchemaModel};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::{DiffError, Result};

/// Reads the user objects of the catalog in declaration order.
pub const CATALOG_QUERY_SQL: &str = r"
SELECT type, name, tbl_name, sql
FROM sqlite_schema
WHERE name NOT LIKE 'sqlite_%' AND sql IS NOT NULL
ORDER BY rowid
";

/// Returns true if `path` should be treated as a SQL script.
#[must_use]
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"))
}

/// A schema snapshot backed by a SQLite connection pool.
pub struct Snapshot {
    pool: SqlitePool,
    from_script: bool,
}

impl Snapshot {
    /// Wraps an existing pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            from_script: false,
        }
    }

    /// Opens `path`, executing it first when it is a `.sql` script.
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DiffError::InputNotFound(path.to_path_buf()));
        }
        if is_script(path) {
            info!("Loading schema script {}", path.display());
            let sql = tokio::fs::read_to_string(path).await?;
            Self::from_script(&sql).await
        } else {
            info!("Opening database {}", path.display());
            Self::open_database(path).await
        }
    }

    /// Opens an existing database file without write access.
    pub async fn open_database(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Executes `sql` into a fresh in-memory database.
    pub async fn from_script(sql: &str) -> Result<Self> {
        // Every connection to an in-memory database sees its own empty
        // database, so the pool must keep exactly one alive.
        let options: SqliteConnectOptions = "sqlite::memory:".parse()?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        sqlx::raw_sql(sql).execute(&pool).await?;
        Ok(Self {
            pool,
            from_script: true,
        })
    }

    /// Returns the underlying pool.
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns true if the snapshot was built from a script.
    pub const fn is_from_script(&self) -> bool {
        self.from_script
    }

    /// Reads the catalog rows.
    pub async fn catalog_rows(&self) -> Result<Vec<CatalogRow>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(CATALOG_QUERY_SQL)
            .fetch_all(&self.pool)
            .await?;
        debug!("Read {} catalog rows", rows.len());
        Ok(rows
            .into_iter()
            .map(|(kind, name, tbl_name, sql)| CatalogRow::new(kind, name, tbl_name, sql))
            .collect())
    }

    /// Reads the catalog and builds the schema model.
    pub async fn schema(&self) -> Result<SchemaModel> {
        let rows = self.catalog_rows().await?;
        Ok(SchemaModel::build(rows)?)
    }

    /// Reads `PRAGMA foreign_keys`.
    ///
    /// Script snapshots always report `false`: the pragma describes the
    /// connection, not the schema, and the script ran on a private one.
    pub async fn foreign_keys_enabled(&self) -> Result<bool> {
        if self.from_script {
            return Ok(false);
        }
        let (enabled,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&self.pool)
            .await?;
        Ok(enabled != 0)
    }

    /// Closes the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlitediff_core::ObjectKind;

    const BLOG_SQL: &str = "
        CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
        CREATE TABLE posts (id INTEGER PRIMARY KEY AUTOINCREMENT, author INTEGER REFERENCES users(id));
        CREATE INDEX ix_posts_author ON posts(author);
        CREATE VIEW v_authors AS SELECT DISTINCT author FROM posts;
        CREATE TRIGGER tr_users AFTER DELETE ON users BEGIN DELETE FROM posts WHERE author = old.id; END;
    ";

    #[test]
    fn test_is_script() {
        assert!(is_script(Path::new("schema.sql")));
        assert!(is_script(Path::new("dir/SCHEMA.SQL")));
        assert!(!is_script(Path::new("app.db")));
        assert!(!is_script(Path::new("sql")));
    }

    #[tokio::test]
    async fn test_script_catalog_rows() {
        let snapshot = Snapshot::from_script(BLOG_SQL).await.unwrap();
        let rows = snapshot.catalog_rows().await.unwrap();

        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        // AUTOINCREMENT creates sqlite_sequence, which is skipped.
        assert_eq!(
            names,
            vec!["users", "posts", "ix_posts_author", "v_authors", "tr_users"]
        );
        assert_eq!(rows[2].tbl_name, "posts");
        assert_eq!(rows[4].kind, "trigger");
    }

    #[tokio::test]
    async fn test_script_schema() {
        let snapshot = Snapshot::from_script(BLOG_SQL).await.unwrap();
        let schema = snapshot.schema().await.unwrap();
        assert_eq!(schema.len(), 5);
        assert!(schema.table("posts").is_some());
        let dependents: Vec<ObjectKind> = schema.dependents_of("posts").map(|o| o.kind).collect();
        assert_eq!(dependents, vec![ObjectKind::Index]);
    }

    #[tokio::test]
    async fn test_script_reports_foreign_keys_off() {
        let snapshot = Snapshot::from_script(BLOG_SQL).await.unwrap();
        assert!(snapshot.is_from_script());
        assert!(!snapshot.foreign_keys_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_script() {
        let err = Snapshot::from_script("CREATE TABLE (").await.err().unwrap();
        assert!(matches!(err, DiffError::Database(_)));
    }

    #[tokio::test]
    async fn test_open_missing_file() {
        let err = Snapshot::open(Path::new("/nonexistent/schema.db"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DiffError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_open_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.db");

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(&path)
                    .create_if_missing(true),
            )
            .await
            .unwrap();
        sqlx::raw_sql(BLOG_SQL).execute(&pool).await.unwrap();
        pool.close().await;

        let snapshot = Snapshot::open(&path).await.unwrap();
        assert!(!snapshot.is_from_script());
        assert_eq!(snapshot.catalog_rows().await.unwrap().len(), 5);
        snapshot.close().await;
    }
}
