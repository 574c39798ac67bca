mod attributes;
mod checksum;
mod cli;
mod dir_list;
mod exclusion;
mod manifest;
mod reconcile;
mod report;
mod scan;
mod verify;

use attributes::NativeAttributes;
use cli::{Cli, Command, LogLevel, ScanArgs, WriteArgs};
use exclusion::ExclusionRules;
use reconcile::UpdatePolicy;
use report::ConsoleReporter;
use scan::{Mode, ScanOptions, ScanResult, scan_tree};
use std::fmt as stdfmt;
use std::io::{IsTerminal, stderr};
use std::process::ExitCode;
use tracing::{Event, Level, Subscriber, debug, error, info};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt as tracing_fmt;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

struct SumtreeExitCode;

impl SumtreeExitCode {
    /// Exit code used for errors that prevented the walk (missing root,
    /// invalid arguments, etc.). Findings never change the exit code.
    fn any_error() -> ExitCode {
        ExitCode::from(255)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_level);

    // Change working directory if -C was specified
    if let Some(directory) = cli.directory
        && let Err(e) = std::env::set_current_dir(&directory)
    {
        error!(
            "Failed to change directory to {}: {}",
            directory.display(),
            e
        );
        return SumtreeExitCode::any_error();
    }

    let result = match cli.command {
        Command::Create { scan, write } => handle_update(UpdatePolicy::Create, scan, write),
        Command::Refresh { scan, write } => handle_update(UpdatePolicy::Refresh, scan, write),
        Command::Reset { scan, write } => handle_update(UpdatePolicy::Reset, scan, write),
        Command::Verify { scan } => handle_verify(scan),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            SumtreeExitCode::any_error()
        }
    }
}

fn handle_update(policy: UpdatePolicy, scan: ScanArgs, write: WriteArgs) -> anyhow::Result<()> {
    let options = ScanOptions {
        mode: Mode::Update(policy),
        include_hidden: scan.include_hidden,
        dry_run: write.dry_run,
        protect: !write.no_protect,
    };

    let result = run_scan(&scan, options)?;

    if write.dry_run {
        info!("DRY RUN - no files were modified");
    }

    info!(
        "Hashed {} files in {} of {} directories, {} checksums added or changed",
        result.files_hashed,
        result.directories_processed,
        result.directories_visited,
        result.added
    );

    if !result.manifests_written.is_empty() {
        info!(
            "Updated {} checksum files:",
            result.manifests_written.len()
        );
        for manifest_path in &result.manifests_written {
            info!("  {}", manifest_path.display());
        }
    }

    if result.directories_untrusted > 0 {
        info!(
            "Left {} directories untouched because their checksum file could not be read",
            result.directories_untrusted
        );
    }

    log_problems(&result);
    Ok(())
}

fn handle_verify(scan: ScanArgs) -> anyhow::Result<()> {
    let options = ScanOptions {
        mode: Mode::Verify,
        include_hidden: scan.include_hidden,
        dry_run: false,
        protect: false,
    };

    let result = run_scan(&scan, options)?;

    if result.mismatched == 0 && result.missing == 0 && result.denied == 0 {
        info!(
            "Verification successful: {} files checked against {} checksum files",
            result.files_hashed, result.manifests_read
        );
    } else {
        info!(
            "Verification finished: {} files checked against {} checksum files, {} mismatched",
            result.files_hashed, result.manifests_read, result.mismatched
        );
        log_problems(&result);
    }

    Ok(())
}

fn run_scan(scan: &ScanArgs, options: ScanOptions) -> anyhow::Result<ScanResult> {
    let rules = ExclusionRules::with_extra(&scan.exclude_dir, &scan.exclude_file)?;
    debug!(
        "Excluding directories {:?} and files {:?}",
        rules.dirs.patterns(),
        rules.files.patterns()
    );
    let mut reporter = ConsoleReporter;

    let result = scan_tree(&scan.path, options, &rules, &NativeAttributes, &mut reporter)
        .map_err(|e| anyhow::anyhow!("Cannot process {}: {}", scan.path.display(), e))?;

    Ok(result)
}

fn log_problems(result: &ScanResult) {
    if result.missing > 0 {
        info!("{} files vanished during the run", result.missing);
    }
    if result.denied > 0 {
        info!("{} files could not be read or written", result.denied);
    }
}

/// Picks the filter directive from the command line, or `None` to defer to
/// `RUST_LOG`.
fn filter_directive(verbose: u8, log_level: Option<LogLevel>) -> Option<&'static str> {
    if let Some(level) = log_level {
        return Some(level.as_filter());
    }
    match verbose {
        0 => None,
        1 => Some("info"),
        _ => Some("debug"),
    }
}

fn init_tracing(verbose: u8, log_level: Option<LogLevel>) {
    let stderr_is_terminal = stderr().is_terminal();
    let formatter = EmojiFormatter { stderr_is_terminal };

    let filter = match filter_directive(verbose, log_level) {
        Some(directive) => EnvFilter::new(directive),
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
                Level::DEBUG => writer.write_str("DEBUG: ")?,
                Level::INFO => writer.write_str("INFO: ")?,
                Level::WARN => writer.write_str("WARN: ")?,
                Level::ERROR => writer.write_str("ERROR: ")?,
                _ => writer.write_str("TRACE: ")?,
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
