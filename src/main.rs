//! CLI entry point for the remote-file tool.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use remote_file::{HttpClient, RemoteFile, Status, WorkerPool, WriteMode};
use tracing::{debug, info, warn};

mod app_config;
mod cli;
mod progress;
mod targets;

use app_config::{apply_config_defaults, load_default_file_config};
use cli::{Args, parse_cli_with_sources};
use targets::{plan_targets, urls_from_text};

fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let (args, cli_sources) = parse_cli_with_sources();
    let loaded_config = load_default_file_config()?;
    let args = apply_config_defaults(args, &cli_sources, loaded_config.config.as_ref());

    init_tracing(&args);
    debug!(?args, config_path = ?loaded_config.path, "CLI arguments resolved");

    // Read input: from positional args or stdin
    let urls = if !args.urls.is_empty() {
        args.urls.clone()
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        urls_from_text(&buffer)
    } else {
        info!("No input provided. Pass URLs as arguments or pipe them via stdin.");
        info!("Example: remote-file https://example.com/file.pdf -o file.pdf");
        return Ok(ExitCode::SUCCESS);
    };

    if urls.is_empty() {
        info!("No URLs found in input");
        return Ok(ExitCode::SUCCESS);
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let targets = plan_targets(&urls, args.output.as_deref(), &output_dir)?;

    let client = HttpClient::with_timeouts(args.connect_timeout, args.read_timeout)
        .context("Failed to create HTTP client")?;
    let write_mode = if args.append {
        WriteMode::Append
    } else {
        WriteMode::Truncate
    };

    let files: Vec<Arc<RemoteFile>> = targets
        .into_iter()
        .map(|target| {
            Arc::new(RemoteFile::with_options(
                target.url,
                target.path,
                Some(client.clone()),
                write_mode,
            ))
        })
        .collect();

    let show_progress =
        !args.no_progress && !args.json && !args.quiet && io::stderr().is_terminal();
    let (progress_handle, stop_progress) =
        progress::spawn_progress_ui(show_progress, files.clone());

    let pool = WorkerPool::new(usize::from(args.jobs))?;
    for file in &files {
        pool.submit(file.clone())?;
    }
    let pool_stats = pool.join();

    stop_progress.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle
        && handle.join().is_err()
    {
        warn!("progress display thread panicked");
    }

    let loaded = report_results(&files, args.json)?;
    let failed = files.len() - loaded;

    info!(
        loaded,
        failed,
        panicked = pool_stats.panicked(),
        total = files.len(),
        "Download complete"
    );

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Determine log level based on verbose/quiet flags.
/// Priority: `RUST_LOG` env var > quiet flag > verbose flag > default (info)
fn init_tracing(args: &Args) {
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Prints per-file results and returns how many ended `Loaded`.
fn report_results(files: &[Arc<RemoteFile>], json: bool) -> Result<usize> {
    let mut loaded = 0;
    for file in files {
        let report = file.report();
        if report.status == Status::Loaded {
            loaded += 1;
        }
        if json {
            println!("{}", serde_json::to_string(&report)?);
        } else if report.status == Status::Loaded {
            info!(
                path = %report.path.display(),
                bytes = report.bytes_read,
                "saved"
            );
        }
    }
    Ok(loaded)
}
