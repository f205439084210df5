//! Compare two SQLite schemas and generate a migration script.
//!
//! `sqlitediff` loads two schema snapshots, diffs them with
//! [`sqlitediff_core`], and renders the SQL that migrates the first into the
//! second. A snapshot is either:
//!
//! - an existing SQLite database file (opened read-only), or
//! - a `.sql` script, executed into an in-memory database first.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlitediff::prelude::*;
//!
//! let report = compare("old.db".as_ref(), "schema.sql".as_ref(), &CompareOptions::new()).await?;
//! print!("{}", report.format(OutputFormat::Text)?);
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the migration script
//! sqlitediff app.db schema.sql
//!
//! # JSON report, with diagnostics on stderr
//! sqlitediff -vv --format json app.db schema.sql
//! ```

pub mod error;
pub mod loader;
pub mod report;

use std::path::Path;

use sqlitediff_core::{diff, RenderOptions, SchemaModel, DEFAULT_TEMP_TABLE_PREFIX};
use tracing::{debug, info, warn};

use crate::error::{DiffError, Result};
use crate::loader::Snapshot;
use crate::report::DiffReport;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{DiffError, Result};
    pub use crate::loader::Snapshot;
    pub use crate::report::{DiffReport, OutputFormat};
    pub use crate::{compare, compare_snapshots, CompareOptions, ForeignKeysMode};
}

/// Which `PRAGMA foreign_keys` value the script restores at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ForeignKeysMode {
    /// Always re-enable foreign keys.
    On,
    /// Leave foreign keys disabled.
    Off,
    /// Use the setting of the FROM database, falling back to `on`.
    #[default]
    Auto,
}

/// Options for a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Prefix for temporary tables used when recreating a table.
    pub temp_prefix: String,
    /// Whether recommendations are rendered as a checklist.
    pub include_checklist: bool,
    /// How the final `PRAGMA foreign_keys` is chosen.
    pub foreign_keys: ForeignKeysMode,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            temp_prefix: DEFAULT_TEMP_TABLE_PREFIX.to_string(),
            include_checklist: true,
            foreign_keys: ForeignKeysMode::Auto,
        }
    }
}

impl CompareOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the temporary table prefix.
    #[must_use]
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Sets whether the checklist is rendered.
    #[must_use]
    pub const fn with_checklist(mut self, include: bool) -> Self {
        self.include_checklist = include;
        self
    }

    /// Sets the foreign key mode.
    #[must_use]
    pub const fn with_foreign_keys(mut self, mode: ForeignKeysMode) -> Self {
        self.foreign_keys = mode;
        self
    }
}

/// Loads both snapshots from disk and compares them.
pub async fn compare(from: &Path, to: &Path, options: &CompareOptions) -> Result<DiffReport> {
    let before = Snapshot::open(from).await?;
    let after = Snapshot::open(to).await?;
    let before_schema = load_schema(&before, from).await?;
    let after_schema = load_schema(&after, to).await?;
    let foreign_keys = resolve_foreign_keys(&before, options.foreign_keys).await?;
    before.close().await;
    after.close().await;

    Ok(compare_schemas(&before_schema, &after_schema, options, foreign_keys))
}

/// Compares two already opened snapshots.
pub async fn compare_snapshots(
    before: &Snapshot,
    after: &Snapshot,
    options: &CompareOptions,
) -> Result<DiffReport> {
    let before_schema = before.schema().await?;
    let after_schema = after.schema().await?;
    let foreign_keys = resolve_foreign_keys(before, options.foreign_keys).await?;
    Ok(compare_schemas(&before_schema, &after_schema, options, foreign_keys))
}

async fn load_schema(snapshot: &Snapshot, path: &Path) -> Result<SchemaModel> {
    let rows = snapshot.catalog_rows().await?;
    let schema = SchemaModel::build(rows).map_err(|source| DiffError::InvalidSchema {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Loaded {} objects from {}", schema.len(), path.display());
    Ok(schema)
}

async fn resolve_foreign_keys(before: &Snapshot, mode: ForeignKeysMode) -> Result<bool> {
    match mode {
        ForeignKeysMode::On => Ok(true),
        ForeignKeysMode::Off => Ok(false),
        ForeignKeysMode::Auto if before.is_from_script() => Ok(true),
        ForeignKeysMode::Auto => {
            let enabled = before.foreign_keys_enabled().await?;
            debug!("FROM database reports foreign_keys = {enabled}");
            Ok(enabled)
        }
    }
}

fn compare_schemas(
    before: &SchemaModel,
    after: &SchemaModel,
    options: &CompareOptions,
    foreign_keys: bool,
) -> DiffReport {
    let schema_diff = diff(before, after);
    info!("{} changed objects", schema_diff.change_count());
    for recommendation in &schema_diff.recommendations {
        warn!("{recommendation}");
    }

    let mut render_options = RenderOptions::new()
        .with_temp_table_prefix(options.temp_prefix.clone())
        .with_foreign_keys_enabled(foreign_keys);
    if !options.include_checklist {
        render_options = render_options.without_checklist();
    }
    let script = schema_diff.to_sql_with(&render_options);
    DiffReport::new(&schema_diff, script)
}
