use std::io;
use std::path::{Path, PathBuf};

use crate::analyzer::AnalyzerConfig;
use crate::format::ReportFormat;
use crate::models::BatchReport;

const CACHE_FILENAME: &str = "phase_report.json";
const TEXT_REPORT_FILENAME: &str = "phase_report.txt";

/// Load a cached batch report from `phase_report.json` in the given directory.
/// Returns `None` if the file is missing, cannot be parsed, or was built with a
/// different threshold or preview width than `config`.
pub fn load_cached_report(dir: &Path, config: &AnalyzerConfig) -> Option<BatchReport> {
    let path = dir.join(CACHE_FILENAME);
    let data = std::fs::read_to_string(&path).ok()?;
    let report: BatchReport = serde_json::from_str(&data).ok()?;
    if report.phase_threshold != config.phase_threshold
        || report.waveform_width != config.waveform_width
    {
        log::info!(
            "ignoring {}: built with threshold {} and waveform {:?}",
            path.display(),
            report.phase_threshold,
            report.waveform_width
        );
        return None;
    }
    Some(report)
}

/// Save a batch report as pretty-printed JSON to `phase_report.json` in the given directory.
pub fn save_report(dir: &Path, result: &BatchReport) -> io::Result<()> {
    let path = dir.join(CACHE_FILENAME);
    let json = serde_json::to_string_pretty(result).map_err(io::Error::other)?;
    std::fs::write(&path, json)
}

/// Save a text report to `phase_report.txt` in the given directory.
pub fn save_text_report(dir: &Path, content: &str) -> io::Result<()> {
    let path = dir.join(TEXT_REPORT_FILENAME);
    std::fs::write(&path, content)
}

/// Where a single-file export lands: next to the audio file, e.g. `song.phase.json`.
pub fn export_path(audio_file: &Path, format: ReportFormat) -> PathBuf {
    let stem = audio_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("report");
    audio_file.with_file_name(format!("{}.phase.{}", stem, format.extension()))
}
