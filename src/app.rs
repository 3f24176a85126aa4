//! Application orchestrator.
//! Resolves and loads the config, initializes logging, validates paths,
//! then runs the requested actions (--infos, --select, --add).

use anyhow::{Context, Result};
use chrono::Local;
use std::time::Instant;
use tracing::{debug, error};

use katal::cli::Args;
use katal::config::{
    ConfigLocation, ConfigOrigin, create_template_config, load_config_from_xml_path,
    resolve_config_path,
};
use katal::output as out;
use katal::{Config, KatalError, Reporter, RunContext, TracingReporter, infos};

use crate::logging::init_tracing;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    let location = resolve_config_path(args.config.as_deref())?;

    // Handle --print-config before logging init
    if args.print_config {
        print_config_location(&location);
        return Ok(());
    }

    if !location.path.exists() {
        if location.origin == ConfigOrigin::Default {
            create_template_config(&location.path).with_context(|| {
                format!("create template config at {}", location.path.display())
            })?;
            out::print_success(&format!(
                "A template katal config was written to: {}",
                location.path.display()
            ));
            out::print_info(
                "Edit the file to set source/path, the sieves, target/path and target/name_of_target_files, then re-run this command.",
            );
            out::print_info("To use a different location pass --config or set KATAL_CONFIG.");
            return Ok(());
        }
        let err = KatalError::Config(format!(
            "config file not found: {}",
            location.path.display()
        ));
        out::print_error(&err.to_string());
        return Err(err.into());
    }

    let mut cfg = load_config_from_xml_path(&location.path).map_err(|e| {
        out::print_error(&e.to_string());
        e
    })?;
    args.apply_overrides(&mut cfg);

    // Guard must live until the end of run() so the file writer is flushed.
    let _guard = init_tracing(
        cfg.log_level,
        cfg.effective_log_file().map(|p| p.as_path()),
        cfg.log_overwrite,
        args.quiet,
        args.json,
    )
    .map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    debug!("Starting katal: {:?}", args);
    let started = Instant::now();
    let mut reporter = TracingReporter;
    reporter.report(&format!(
        "=== katal v.{} (launched at {}) ===",
        env!("CARGO_PKG_VERSION"),
        Local::now().format(TIMESTAMP_FORMAT)
    ));
    reporter.report(&format!(
        "  = using \"{}\" as config file",
        location.path.display()
    ));

    let result = run_actions(&args, cfg, &mut reporter);

    match &result {
        Ok(()) => reporter.report(&format!(
            "=== exit (stopped at {}; total duration time : {:.3?}) ===",
            Local::now().format(TIMESTAMP_FORMAT),
            started.elapsed()
        )),
        Err(e) => log_failure(e),
    }
    result
}

fn run_actions(args: &Args, mut cfg: Config, reporter: &mut dyn Reporter) -> Result<()> {
    cfg.validate_and_normalize()?;
    reporter.report(&format!(
        "  = source directory : \"{}\" =",
        cfg.source_path.display()
    ));
    reporter.report(&format!(
        "  = target directory : \"{}\" =",
        cfg.target_path.display()
    ));

    if !args.has_action() {
        reporter.report("  = nothing to do: use --infos, --select or --add =");
        return Ok(());
    }

    // --infos alone never creates a catalog
    if args.infos {
        report_infos(&cfg, reporter)?;
    }
    if !(args.select || args.add) {
        return Ok(());
    }

    let mut ctx = RunContext::open(cfg)?;

    if args.select {
        let outcome = ctx.select_and_report(reporter)?;
        if outcome.selection.is_empty() {
            return Ok(());
        }
        let add = if args.yes {
            true
        } else if args.quiet {
            false
        } else {
            out::confirm(&format!(
                "Do you want to add the selected files to the target directory (\"{}\") ?",
                ctx.config().target_path.display()
            ))
            .context("read answer from stdin")?
        };
        if add {
            ctx.commit(&outcome.selection, reporter)?;
            report_infos(ctx.config(), reporter)?;
        }
    }

    if args.add {
        let outcome = ctx.select_and_report(reporter)?;
        ctx.commit(&outcome.selection, reporter)?;
        report_infos(ctx.config(), reporter)?;
    }

    Ok(())
}

fn report_infos(cfg: &Config, reporter: &mut dyn Reporter) -> Result<()> {
    reporter.report("  = informations =");
    infos::report_source(&cfg.source_path, reporter)?;
    infos::report_target(
        &cfg.target_path,
        cfg.target_filename_max_length,
        cfg.source_filename_max_length,
        reporter,
    )?;
    Ok(())
}

fn print_config_location(location: &ConfigLocation) {
    let origin = match location.origin {
        ConfigOrigin::Flag => "--config (explicit)",
        ConfigOrigin::Env => "KATAL_CONFIG (explicit)",
        ConfigOrigin::Default => "default location",
    };
    out::print_info(&format!(
        "Using katal config from {origin}:\n  {}\n",
        location.path.display()
    ));
    if location.path.exists() {
        out::print_info("A config file already exists at that location.");
    } else if location.origin == ConfigOrigin::Default {
        out::print_info(
            "No config file exists there yet. Run without --print-config to create a template.",
        );
    } else {
        out::print_warn("No config file exists at that location.");
    }
}

/// One structured error line per failure, keyed by the error's code.
fn log_failure(e: &anyhow::Error) {
    let Some(ke) = e.downcast_ref::<KatalError>() else {
        error!(error = %format!("{e:#}"), "Run failed");
        return;
    };
    let code = ke.code();
    let kind = ke.kind();
    match ke {
        KatalError::InsufficientSpace {
            required,
            available,
            dest,
        } => {
            error!(code, kind, required = *required, available = *available, dest = %dest.display(), "Not enough free space; nothing was copied")
        }
        KatalError::CopyFailed {
            source_path,
            target,
            copied,
            total,
            reason,
        } => {
            error!(code, kind, source = %source_path.display(), target = %target.display(), copied = *copied, total = *total, %reason, "Commit aborted; catalog left unchanged")
        }
        KatalError::UnsafeTargetName { name } | KatalError::TargetNameCollision { name } => {
            error!(code, kind, %name, "Commit refused before any copy")
        }
        KatalError::FileIo { path, source } => {
            error!(code, kind, path = %path.display(), error = %source, "I/O failure")
        }
        KatalError::Catalog { path, source } => {
            error!(code, kind, path = %path.display(), error = %source, "Catalog failure")
        }
        _ => {
            error!(code, kind, error = %ke, "Configuration rejected")
        }
    }
}
