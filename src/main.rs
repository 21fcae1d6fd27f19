use anyhow::{Context, Result};
use clap::Parser;
use jsonl_dedup::utils::{default_output_dir_for, format_elapsed, pick_default_input_dir};
use jsonl_dedup::{Args, BatchSummary, Mode, dedup_file, resolve_output_path, run_batch};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let args = Args::parse();
    let start = Instant::now();

    let code = match args.mode() {
        Mode::Single { input, output } => run_single(&args, &input, output.as_deref())?,
        Mode::Batch {
            input_dir,
            output_dir,
        } => run_all(&args, input_dir, output_dir)?,
    };

    info!("done in {}", format_elapsed(start.elapsed()));
    Ok(code)
}

fn run_single(args: &Args, input: &Path, output: Option<&Path>) -> Result<ExitCode> {
    let root = Path::new("");
    let default_dir = default_output_dir_for(pick_default_input_dir(root).as_deref(), root);
    let output = resolve_output_path(input, output, &default_dir);

    info!("deduplicating {} -> {}", input.display(), output.display());
    let stats = dedup_file(input, &output, &args.key_config())
        .with_context(|| format!("could not dedup {}", input.display()))?;

    println!("[dedup] {}", input.display());
    print!("{stats}");
    Ok(ExitCode::SUCCESS)
}

fn run_all(args: &Args, input_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Result<ExitCode> {
    let root = Path::new("");
    let input_dir = match input_dir {
        Some(dir) => dir,
        None => pick_default_input_dir(root).context(
            "no default input directory found (data_crawl or data_preprocessed); pass paths explicitly",
        )?,
    };
    let output_dir =
        output_dir.unwrap_or_else(|| default_output_dir_for(Some(input_dir.as_path()), root));

    let options = args.batch_options();
    info!(
        "deduplicating {} -> {} using {} thread(s)",
        input_dir.display(),
        output_dir.display(),
        options.threads
    );
    let summary = run_batch(&input_dir, &output_dir, &options)
        .with_context(|| format!("could not dedup directory {}", input_dir.display()))?;

    print_summary(&summary);
    if summary.succeeded() == 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_summary(summary: &BatchSummary) {
    for file in &summary.files {
        println!("[dedup] {}", file.input.display());
        match &file.result {
            Ok(stats) => print!("{stats}"),
            Err(err) => println!("  failed:           {}", err.describe()),
        }
    }
    println!("[summary]");
    print!("{}", summary.totals);
    println!("  files ok/failed:  {}/{}", summary.succeeded(), summary.failed());
}
