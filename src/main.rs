use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use phasescope::analyzer::{self, AnalyzerConfig, DEFAULT_PHASE_THRESHOLD};
use phasescope::cache;
use phasescope::format;
use phasescope::models::{BatchReport, FileReport};

#[derive(Parser)]
#[command(
    name = "phasescope",
    about = "Channel loudness and phase-cancellation inspector for audio files"
)]
struct Cli {
    /// Audio file, directory, or "-" for STDIN
    path: Option<String>,

    /// Format hint for STDIN (e.g. flac, wav, ogg)
    #[arg(long)]
    format: Option<String>,

    /// Output as JSON instead of table
    #[arg(long)]
    json: bool,

    /// Output as CSV instead of table
    #[arg(long, conflicts_with = "json")]
    csv: bool,

    /// Launch interactive TUI
    #[arg(long)]
    tui: bool,

    /// Number of parallel analysis jobs (default: number of CPU cores)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Re-analyze even if a cached report exists
    #[arg(long)]
    regenerate: bool,

    /// Write a text report (phase_report.txt) alongside JSON
    #[arg(long)]
    txt: bool,

    /// Mono ratio below which phase cancellation is reported
    #[arg(long, default_value_t = DEFAULT_PHASE_THRESHOLD)]
    threshold: f64,

    /// Include a peak waveform preview with this many bars per channel
    #[arg(long, value_name = "BARS")]
    waveform: Option<usize>,
}

fn print_benchmark(result: &BatchReport, elapsed: std::time::Duration) {
    let total_bytes: u64 = result.files.iter().map(|f| f.file_bytes).sum();
    let total_mb = total_bytes as f64 / (1024.0 * 1024.0);
    let secs = elapsed.as_secs_f64();
    let mb_per_sec = if secs > 0.0 { total_mb / secs } else { 0.0 };

    eprintln!(
        "Processed {} files ({:.1} MB) in {:.2}s | {:.1} MB/s",
        result.files.len(),
        total_mb,
        secs,
        mb_per_sec,
    );
}

fn print_single(cli: &Cli, report: &FileReport) {
    if cli.json {
        println!("{}", format::format_json_single(report));
    } else if cli.csv {
        print!("{}", format::format_csv_single(report));
    } else {
        println!("{}", format::format_table_single(report));
    }
}

fn print_batch(cli: &Cli, result: &BatchReport) {
    if cli.json {
        println!("{}", format::format_json(result));
    } else if cli.csv {
        print!("{}", format::format_csv(result));
    } else {
        println!("{}", format::format_table(result));
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    if !cli.threshold.is_finite() || cli.threshold < 0.0 {
        anyhow::bail!("--threshold must be a non-negative number");
    }
    if cli.waveform == Some(0) {
        anyhow::bail!("--waveform must be at least 1");
    }

    let config = AnalyzerConfig {
        phase_threshold: cli.threshold,
        waveform_width: cli.waveform,
    };
    let jobs = cli.jobs.unwrap_or_else(analyzer::default_jobs);
    let path_str = cli.path.as_deref().unwrap_or(".");

    // STDIN mode
    if path_str == "-" {
        let fmt = cli
            .format
            .as_deref()
            .context("--format is required when reading from STDIN (e.g. --format wav)")?;
        let result = analyzer::analyze_stdin(fmt, &config)?;
        print_single(&cli, &result);
        return Ok(());
    }

    let path = Path::new(path_str);

    if cli.tui {
        if !path.exists() {
            anyhow::bail!("Path '{}' does not exist", path_str);
        }
        return phasescope::tui::run(path, config);
    }

    // Single file mode
    if path.is_file() {
        let result = analyzer::analyze_file(path, &config)?;
        print_single(&cli, &result);
        return Ok(());
    }

    // Directory mode
    if path.is_dir() {
        // Reuse the cached report only if it was built with the same settings
        if !cli.regenerate {
            if let Some(cached) = cache::load_cached_report(path, &config) {
                eprintln!("(loaded from cached report)");
                print_batch(&cli, &cached);
                return Ok(());
            }
        }

        let start = Instant::now();
        let result = analyzer::analyze_directory(path, jobs, &config)?;
        let elapsed = start.elapsed();

        // Auto-save cache
        if let Err(e) = cache::save_report(path, &result) {
            eprintln!("Warning: failed to save cache: {}", e);
        }

        if cli.txt {
            if let Err(e) = cache::save_text_report(path, &format::format_table(&result)) {
                eprintln!("Warning: failed to save text report: {}", e);
            }
        }

        print_batch(&cli, &result);

        print_benchmark(&result, elapsed);

        return Ok(());
    }

    anyhow::bail!("Path '{}' is not a file or directory", path_str);
}
