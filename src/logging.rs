//! Tracing initialization.
//!
//! Layers:
//! - console diagnostics: compact (or JSON) with timestamps, filtered by the log level,
//! - console report lines: events on target `katal::report`, printed bare (or JSON),
//! - optional log file: everything at the log level, through a non-blocking writer.
//!
//! `--quiet` lowers both console layers to errors; the file layer keeps its level.
//! File logging is refused if any ancestor of the file path is a symlink.

use anyhow::Result;
use chrono::Local;
use katal::config::{LogLevel, default_log_path, path_has_symlink_ancestor};
use katal::output as out;
use katal::platform::open_log_file_secure;
use std::fmt as stdfmt;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::Registry;
use tracing_subscriber::util::SubscriberInitExt;

const REPORT_TARGET: &str = "katal::report";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Human-friendly timestamp formatter (DD/MM/YY HH:MM:SS)
struct LocalHumanTime;
impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

#[inline]
fn to_level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn level_name(level_filter: LevelFilter) -> &'static str {
    match level_filter {
        LevelFilter::ERROR => "error",
        LevelFilter::WARN => "warn",
        LevelFilter::INFO => "info",
        LevelFilter::DEBUG => "debug",
        LevelFilter::TRACE => "trace",
        _ => "off",
    }
}

/// Everything at `level` except the report target.
fn diagnostics_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::new(format!("{},{REPORT_TARGET}=off", level_name(level)))
}

/// Open a non-blocking writer on the log file, or explain on stderr why not.
fn maybe_open_non_blocking_writer(path: &Path, overwrite: bool) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(true) => {
            out::print_warn(&format!(
                "Refusing to enable file logging: ancestor of {} is a symlink; proceeding without file logging.",
                path.display()
            ));
            return None;
        }
        Err(e) => {
            out::print_warn(&format!(
                "Error checking log path {} for symlinks: {e}; proceeding without file logging.",
                path.display()
            ));
            return None;
        }
        Ok(false) => {}
    }

    match open_log_file_secure(path, overwrite) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            out::print_warn(&format!("Failed to open log file {}: {e}", path.display()));
            None
        }
    }
}

fn console_layers(level: LevelFilter, quiet: bool, json: bool) -> Vec<BoxedLayer> {
    let console_level = if quiet { LevelFilter::ERROR } else { level };
    let report_level = if quiet { LevelFilter::OFF } else { LevelFilter::INFO };
    let report_filter = Targets::new().with_target(REPORT_TARGET, report_level);

    if json {
        vec![
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_filter(diagnostics_filter(console_level))
                .boxed(),
            tsfmt::layer()
                .event_format(tsfmt::format().json())
                .with_timer(LocalHumanTime)
                .with_target(true)
                .with_filter(report_filter)
                .boxed(),
        ]
    } else {
        vec![
            tsfmt::layer()
                .with_timer(LocalHumanTime)
                .with_level(true)
                .with_target(true)
                .compact()
                .with_filter(diagnostics_filter(console_level))
                .boxed(),
            tsfmt::layer()
                .without_time()
                .with_level(false)
                .with_target(false)
                .with_filter(report_filter)
                .boxed(),
        ]
    }
}

fn file_layer(writer: NonBlocking, level: LevelFilter, json: bool) -> BoxedLayer {
    if json {
        tsfmt::layer()
            .event_format(tsfmt::format().json())
            .with_timer(LocalHumanTime)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(level)
            .boxed()
    } else {
        tsfmt::layer()
            .with_timer(LocalHumanTime)
            .with_level(true)
            .with_target(true)
            .with_ansi(false)
            .compact()
            .with_writer(writer)
            .with_filter(level)
            .boxed()
    }
}

/// Install the global subscriber. The returned guard must live until exit
/// so the file writer gets flushed.
pub fn init_tracing(
    lvl: LogLevel,
    log_file: Option<&Path>,
    overwrite: bool,
    quiet: bool,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let level = to_level_filter(lvl);
    let mut layers = console_layers(level, quiet, json);
    let mut guard = None;

    if let Some(path) = log_file {
        match maybe_open_non_blocking_writer(path, overwrite) {
            Some((writer, g)) => {
                layers.push(file_layer(writer, level, json));
                guard = Some(g);
            }
            None => {
                out::print_warn(&format!(
                    "Requested file logging to '{}' was not enabled. Logs will continue on the console.",
                    path.display()
                ));
                if let Some(def) = default_log_path() {
                    out::print_info(&format!(
                        "You can try using the default log path instead: {}",
                        def.display()
                    ));
                }
            }
        }
    }

    registry().with(layers).try_init()?;
    Ok(guard)
}
