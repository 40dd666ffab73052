use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::decode::{self, DecodedAudio};
use crate::downsample::{downsample, preview};
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, BatchReport, ChannelReport, FileReport, Inspection};
use crate::signal::{channel_label, Signal};

const AUDIO_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "wav", "ogg", "m4a", "opus", "wv", "aif", "aiff",
];

/// Volume buckets per second of audio.
const CHUNKS_PER_SECOND: f64 = 2000.0;
/// Extra buckets so near-empty inputs still get a handful.
const MIN_CHUNKS: f64 = 10.0;

/// Mono ratio below which a recording is flagged as phase-cancelled.
pub const DEFAULT_PHASE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub phase_threshold: f64,
    /// Bars per channel in report previews; `None` leaves them out.
    pub waveform_width: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            phase_threshold: DEFAULT_PHASE_THRESHOLD,
            waveform_width: None,
        }
    }
}

/// Check if a path has a recognized audio file extension.
fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a directory for audio files, sorted by filename.
pub fn scan_audio_files(path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_audio_file(p))
        .collect();
    files.sort();
    files
}

/// Number of volume buckets for a signal: two per millisecond plus ten,
/// clamped so the bucket width never truncates to zero.
pub fn chunk_count(signal: &Signal) -> usize {
    let target = (signal.duration_secs() * CHUNKS_PER_SECOND + MIN_CHUNKS).round() as usize;
    target.min(signal.frames()).max(1)
}

/// Sum-of-peaks loudness proxy for one channel.
///
/// The downsampler stores peaks signed, so magnitudes are summed here to
/// keep volumes non-negative.
pub fn channel_volume(samples: &[f32], chunks: usize) -> Result<f64, AnalysisError> {
    let peaks = downsample(samples, chunks)?;
    Ok(peaks.iter().map(|&p| (p as f64).abs()).sum())
}

/// Downmix a signal, measure every channel, and derive the mono ratio.
pub fn analyze(signal: &Signal, config: &AnalyzerConfig) -> Result<AnalysisResult, AnalysisError> {
    let downmix = signal.downmix();
    let chunks = chunk_count(signal);

    let mut channel_volumes = Vec::with_capacity(signal.channel_count() + 1);
    channel_volumes.push(channel_volume(&downmix.channels()[0], chunks)?);
    for channel in signal.channels() {
        channel_volumes.push(channel_volume(channel, chunks)?);
    }

    let sources = &channel_volumes[1..];
    let mean = sources.iter().sum::<f64>() / sources.len() as f64;
    let ratio = channel_volumes[0] / mean;

    // Silent sources say nothing about phase
    let (mono_ratio, phase_warning) = if mean > 0.0 && ratio.is_finite() {
        (ratio, ratio < config.phase_threshold)
    } else {
        (0.0, false)
    };

    log::debug!(
        "chunks={} volumes={:?} mono_ratio={:.3}",
        chunks,
        channel_volumes,
        mono_ratio
    );

    Ok(AnalysisResult {
        downmix,
        channel_volumes,
        mono_ratio,
        phase_warning,
        chunk_count: chunks,
    })
}

/// Peak previews of `width` bars for the downmix and then each source channel.
pub fn waveforms(signal: &Signal, result: &AnalysisResult, width: usize) -> Vec<Vec<f32>> {
    std::iter::once(&result.downmix.channels()[0])
        .chain(signal.channels())
        .map(|samples| preview(samples, width))
        .collect()
}

/// Turn an analysis into a serializable report.
pub fn build_report(
    title: String,
    filename: String,
    file_bytes: u64,
    signal: &Signal,
    result: &AnalysisResult,
    waveform_width: Option<usize>,
) -> FileReport {
    let mut previews = waveform_width
        .map(|width| waveforms(signal, result, width))
        .unwrap_or_default()
        .into_iter();

    let labels = std::iter::once("Downmix".to_string())
        .chain((0..signal.channel_count()).map(|i| channel_label(i, signal.channel_count())));

    let channels = labels
        .zip(&result.channel_volumes)
        .map(|(label, &volume)| ChannelReport {
            label,
            volume,
            waveform: previews.next().unwrap_or_default(),
        })
        .collect();

    FileReport {
        title,
        filename,
        sample_rate: signal.sample_rate(),
        channel_count: signal.channel_count(),
        duration_secs: signal.duration_secs(),
        channels,
        mono_ratio: result.mono_ratio,
        phase_warning: result.phase_warning,
        file_bytes,
    }
}

fn inspect_decoded(
    decoded: DecodedAudio,
    fallback_title: &str,
    filename: String,
    config: &AnalyzerConfig,
) -> Result<Inspection> {
    let result = analyze(&decoded.signal, config)?;
    if result.phase_warning {
        log::warn!(
            "{}: mono ratio {:.2} suggests phase cancellation",
            filename,
            result.mono_ratio
        );
    }
    let title = decoded
        .title
        .unwrap_or_else(|| fallback_title.to_string());
    let report = build_report(
        title,
        filename,
        decoded.source_bytes,
        &decoded.signal,
        &result,
        config.waveform_width,
    );
    Ok(Inspection {
        signal: decoded.signal,
        result,
        report,
    })
}

/// Decode and analyze a file, keeping the signal for later rendering.
pub fn inspect_file(
    path: &Path,
    config: &AnalyzerConfig,
    on_progress: impl Fn(f32),
) -> Result<Inspection> {
    let decoded = decode::decode_file_with_progress(path, on_progress)
        .with_context(|| format!("Failed to analyze {}", path.display()))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Unknown");
    let filename = path
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("unknown")
        .to_string();

    inspect_decoded(decoded, stem, filename, config)
}

/// Analyze a single audio file.
pub fn analyze_file(path: &Path, config: &AnalyzerConfig) -> Result<FileReport> {
    analyze_file_with_progress(path, config, |_| {})
}

/// Analyze a single audio file, reporting decode progress via callback.
pub fn analyze_file_with_progress(
    path: &Path,
    config: &AnalyzerConfig,
    on_progress: impl Fn(f32),
) -> Result<FileReport> {
    inspect_file(path, config, on_progress).map(|inspection| inspection.report)
}

/// Analyze audio from STDIN with a format hint.
pub fn analyze_stdin(format_hint: &str, config: &AnalyzerConfig) -> Result<FileReport> {
    let decoded =
        decode::decode_stdin(format_hint).context("Failed to analyze STDIN stream")?;
    inspect_decoded(decoded, "STDIN", "STDIN".to_string(), config).map(|i| i.report)
}

/// Return the default number of parallel jobs (number of CPU cores).
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Analyze all audio files in a directory in parallel.
pub fn analyze_directory(path: &Path, jobs: usize, config: &AnalyzerConfig) -> Result<BatchReport> {
    let files = scan_audio_files(path);
    if files.is_empty() {
        anyhow::bail!("No audio files found in {}", path.display());
    }

    let jobs = jobs.max(1);
    let files = Arc::new(files);
    let next_index = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..jobs.min(files.len()) {
        let files = Arc::clone(&files);
        let next_index = Arc::clone(&next_index);
        let config = config.clone();
        handles.push(std::thread::spawn(move || {
            let mut results = Vec::new();
            loop {
                let idx = next_index.fetch_add(1, Ordering::SeqCst);
                if idx >= files.len() {
                    break;
                }
                results.push((idx, analyze_file(&files[idx], &config)));
            }
            results
        }));
    }

    // Collect results from all threads and sort by original index
    let mut indexed_results: Vec<(usize, Result<FileReport>)> = Vec::new();
    for handle in handles {
        let results = handle
            .join()
            .map_err(|_| anyhow::anyhow!("analysis worker panicked"))?;
        indexed_results.extend(results);
    }
    indexed_results.sort_by_key(|(idx, _)| *idx);

    let mut reports = Vec::with_capacity(indexed_results.len());
    for (_, result) in indexed_results {
        reports.push(result?);
    }

    let warnings = reports.iter().filter(|r| r.phase_warning).count();
    log::info!(
        "Analyzed {} files in {}, {} with phase warnings",
        reports.len(),
        path.display(),
        warnings
    );

    Ok(BatchReport {
        files: reports,
        warnings,
        phase_threshold: config.phase_threshold,
        waveform_width: config.waveform_width,
    })
}
