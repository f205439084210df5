//! Output formatting.

use serde::Serialize;
use sqlitediff_core::SchemaDiff;

use crate::error::Result;

/// How the comparison result is written to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// The migration script as plain SQL.
    #[default]
    Text,
    /// A JSON object with the script, recommendations and change count.
    Json,
}

/// The result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    /// The rendered migration script.
    pub script: String,
    /// Human-readable recommendations, in the order they were found.
    pub recommendations: Vec<String>,
    /// Number of objects that are not unchanged.
    pub changes: usize,
}

impl DiffReport {
    /// Creates a report from a diff and its rendered script.
    #[must_use]
    pub fn new(diff: &SchemaDiff, script: String) -> Self {
        Self {
            script,
            recommendations: diff.recommendations.iter().map(ToString::to_string).collect(),
            changes: diff.change_count(),
        }
    }

    /// Formats the report.
    pub fn format(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.script.clone()),
            OutputFormat::Json => {
                let mut json = serde_json::to_string_pretty(self)?;
                json.push('\n');
                Ok(json)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlitediff_core::{diff, CatalogRow, SchemaModel};

    fn report(before: &str, after: &str) -> DiffReport {
        let before = SchemaModel::build(vec![CatalogRow::table("t", before)]).unwrap();
        let after = SchemaModel::build(vec![CatalogRow::table("t", after)]).unwrap();
        let d = diff(&before, &after);
        DiffReport::new(&d, d.to_sql())
    }

    #[test]
    fn test_text_is_the_script() {
        let r = report("CREATE TABLE t (a)", "CREATE TABLE t (a)");
        assert_eq!(r.changes, 0);
        assert_eq!(r.format(OutputFormat::Text).unwrap(), "-- No differences found\n");
    }

    #[test]
    fn test_json_report() {
        let r = report(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)",
            "CREATE TABLE t (id INTEGER PRIMARY KEY, title TEXT)",
        );
        let json: serde_json::Value =
            serde_json::from_str(&r.format(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["changes"], 1);
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 1);
        assert!(json["recommendations"][0]
            .as_str()
            .unwrap()
            .starts_with("column t.title is not a rename of t.name"));
        assert!(json["script"]
            .as_str()
            .unwrap()
            .contains("ALTER TABLE t ADD COLUMN title TEXT;"));
    }
}
