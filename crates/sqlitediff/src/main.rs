//! sqlitediff CLI
//!
//! Prints the SQL that migrates the FROM schema into the TO schema.

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use sqlitediff::prelude::*;

/// Compare two SQLite schemas and generate a migration script.
#[derive(Parser)]
#[command(name = "sqlitediff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Current schema: a SQLite database or a `.sql` script.
    #[arg(env = "SQLITEDIFF_FROM")]
    from: PathBuf,

    /// Target schema: a SQLite database or a `.sql` script.
    #[arg(env = "SQLITEDIFF_TO")]
    to: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Prefix for temporary tables created while recreating a table.
    #[arg(long, default_value = sqlitediff_core::DEFAULT_TEMP_TABLE_PREFIX)]
    temp_prefix: String,

    /// Do not print the checklist of recommendations.
    #[arg(long)]
    no_checklist: bool,

    /// Foreign key setting restored at the end of the script.
    #[arg(long, value_enum, default_value_t = ForeignKeysMode::Auto)]
    foreign_keys: ForeignKeysMode,
}

impl Cli {
    fn compare_options(&self) -> CompareOptions {
        CompareOptions::new()
            .with_temp_prefix(self.temp_prefix.clone())
            .with_checklist(!self.no_checklist)
            .with_foreign_keys(self.foreign_keys)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout carries the script
    let log_level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    debug!(
        "Comparing {} -> {}",
        cli.from.display(),
        cli.to.display()
    );
    let report = compare(&cli.from, &cli.to, &cli.compare_options()).await?;
    let output = report.format(cli.format)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["sqlitediff", "old.db", "new.sql"]).unwrap();
        assert_eq!(cli.from, PathBuf::from("old.db"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.compare_options(), CompareOptions::new());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "sqlitediff",
            "-vv",
            "--format",
            "json",
            "--temp-prefix",
            "tmp_",
            "--no-checklist",
            "--foreign-keys",
            "off",
            "a.db",
            "b.db",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        let options = cli.compare_options();
        assert_eq!(options.temp_prefix, "tmp_");
        assert!(!options.include_checklist);
        assert_eq!(options.foreign_keys, ForeignKeysMode::Off);
    }
}
