mod checksum;
mod cli;
mod config;
mod contents;
mod file_set;
mod manifest;
mod publish;
mod staleness;
mod update;

use cli::{Cli, Command, LogLevel};
use config::{ArchiveRoot, ContentsConfig, ManifestConfig};
use publish::PublishOutcome;
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use update::{UpdateOptions, UpdateOutcome, update_manifest};

struct ManifestExitCode;

impl ManifestExitCode {
    /// Exit code used for every failure (missing root, I/O errors, malformed manifest, etc.).
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return ManifestExitCode::any_error();
    }

    let result: anyhow::Result<()> = match cli.command {
        Command::Manifest { dry_run } => handle_manifest(cli.root, dry_run),
        Command::Contents { dry_run } => handle_contents(cli.root, dry_run),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ManifestExitCode::any_error()
        }
    }
}

fn manifest_status_line(outcome: UpdateOutcome, path: &std::path::Path) -> String {
    match outcome {
        UpdateOutcome::NoChanges => format!("No changes made to {}", path.display()),
        UpdateOutcome::Published(PublishOutcome::Created) => {
            format!("Wrote new manifest: {}", path.display())
        }
        UpdateOutcome::Published(PublishOutcome::Updated) => {
            format!("Updated manifest: {}", path.display())
        }
        UpdateOutcome::Published(PublishOutcome::Unchanged) => {
            format!("Manifest unchanged: {}", path.display())
        }
    }
}

fn contents_status_line(outcome: PublishOutcome, path: &std::path::Path) -> String {
    match outcome {
        PublishOutcome::Created => format!("New contents CSV written to: {}", path.display()),
        PublishOutcome::Updated => format!("Updated contents CSV written to: {}", path.display()),
        PublishOutcome::Unchanged => format!("No change to contents CSV: {}", path.display()),
    }
}

fn handle_manifest(root: Option<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    let root = ArchiveRoot::from_env(root)?;
    let config = ManifestConfig::from_root(&root)?;

    let result = update_manifest(&config, &UpdateOptions { dry_run })?;

    if dry_run {
        info!("DRY RUN - no files were modified");
    }

    info!(
        "Checksummed {} files, reused {} checksums",
        result.files_checksummed, result.files_reused
    );

    println!(
        "{}",
        manifest_status_line(result.outcome, &result.manifest_path)
    );

    Ok(())
}

fn handle_contents(root: Option<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    let root = ArchiveRoot::from_env(root)?;
    let config = ContentsConfig::from_root(&root);

    let result = contents::update_contents(&config, dry_run)?;

    if dry_run {
        info!("DRY RUN - no files were modified");
    }

    info!("Indexed {} items", result.rows);

    println!(
        "{}",
        contents_status_line(result.outcome, &result.destination)
    );

    Ok(())
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    // Explicit flags win over RUST_LOG.
    let explicit_level = match (log_level, verbose) {
        (Some(level), _) => Some(level.as_filter()),
        (None, 0) => None,
        (None, 1) => Some("info"),
        (None, _) => Some("debug"),
    };

    let filter = match explicit_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    let fmt_layer = tracing_fmt::layer()
        .event_format(formatter)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

struct EmojiFormatter {
    stderr_is_terminal: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn status_lines_distinguish_outcomes() {
        let path = Path::new("/archive/manifest-md5.txt");

        assert_eq!(
            manifest_status_line(UpdateOutcome::NoChanges, path),
            "No changes made to /archive/manifest-md5.txt"
        );
        assert_eq!(
            manifest_status_line(UpdateOutcome::Published(PublishOutcome::Created), path),
            "Wrote new manifest: /archive/manifest-md5.txt"
        );
        assert_eq!(
            manifest_status_line(UpdateOutcome::Published(PublishOutcome::Updated), path),
            "Updated manifest: /archive/manifest-md5.txt"
        );
        assert_eq!(
            manifest_status_line(UpdateOutcome::Published(PublishOutcome::Unchanged), path),
            "Manifest unchanged: /archive/manifest-md5.txt"
        );
    }

    #[test]
    fn contents_status_line_reports_unchanged() {
        assert_eq!(
            contents_status_line(PublishOutcome::Unchanged, Path::new("/d/0020_contents.csv")),
            "No change to contents CSV: /d/0020_contents.csv"
        );
    }
}

impl<S, N> FormatEvent<S, N> for EmojiFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        if self.stderr_is_terminal {
            match *event.metadata().level() {
                Level::DEBUG => write!(writer, "🔍 ")?,
                Level::INFO => write!(writer, "ℹ️ ")?,
                Level::WARN => write!(writer, "⚠️  ")?,
                Level::ERROR => write!(writer, "❌️ ")?,
                _ => {}
            }
        } else {
            match *event.metadata().level() {
                Level::TRACE => writer.write_str("TRACE: ")?,
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
