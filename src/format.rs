use crate::models::{BatchReport, FileReport};

const SPARK_LEVELS: [char; 8] = [
    '\u{2581}', '\u{2582}', '\u{2583}', '\u{2584}', '\u{2585}', '\u{2586}', '\u{2587}', '\u{2588}',
];

/// Report formats offered for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ReportFormat::Text => "Text (channel table)",
            ReportFormat::Json => "JSON",
            ReportFormat::Csv => "CSV",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ReportFormat::Text => ReportFormat::Json,
            ReportFormat::Json => ReportFormat::Csv,
            ReportFormat::Csv => ReportFormat::Text,
        }
    }

    pub fn render_single(self, report: &FileReport) -> String {
        match self {
            ReportFormat::Text => format_table_single(report),
            ReportFormat::Json => format_json_single(report),
            ReportFormat::Csv => format_csv_single(report),
        }
    }
}

/// Format a duration in seconds as "M:SS".
pub fn format_duration(secs: f64) -> String {
    let total_secs = secs.round() as u64;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Render peak values as a row of block characters scaled to the largest magnitude.
pub fn sparkline(peaks: &[f32]) -> String {
    let max = peaks.iter().fold(0.0f32, |m, p| m.max(p.abs()));
    peaks
        .iter()
        .map(|p| {
            if max <= 0.0 {
                return SPARK_LEVELS[0];
            }
            let level = (p.abs() / max * (SPARK_LEVELS.len() - 1) as f32).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

fn verdict(report: &FileReport) -> &'static str {
    if report.phase_warning {
        "PHASE CANCELLATION"
    } else {
        "ok"
    }
}

/// Format a single file result as a per-channel table.
pub fn format_table_single(report: &FileReport) -> String {
    let separator = "\u{2500}".repeat(58);
    let mut output = String::new();

    output.push_str(&format!(
        "{}  ({} ch, {} Hz, {})\n",
        report.title,
        report.channel_count,
        report.sample_rate,
        format_duration(report.duration_secs),
    ));
    output.push_str(&format!("{:<10} {:>12}  {}\n", "Channel", "Volume", "Waveform"));
    output.push_str(&separator);
    output.push('\n');

    for channel in &report.channels {
        output.push_str(&format!(
            "{:<10} {:>12.2}  {}\n",
            channel.label,
            channel.volume,
            sparkline(&channel.waveform),
        ));
    }

    output.push_str(&separator);
    output.push('\n');
    output.push_str(&format!(
        "Mono ratio: {:.3}  {}",
        report.mono_ratio,
        verdict(report)
    ));

    output
}

/// Format a batch result as one row per file.
pub fn format_table(result: &BatchReport) -> String {
    let separator = "\u{2500}".repeat(58);
    let mut output = String::new();

    output.push_str(&format!(
        "{:<8} {:>4} {:>10}  {:<20} {}\n",
        "Ratio", "Ch", "Duration", "Status", "File"
    ));
    output.push_str(&separator);
    output.push('\n');

    for file in &result.files {
        output.push_str(&format!(
            "{:<8.3} {:>4} {:>10}  {:<20} {}\n",
            file.mono_ratio,
            file.channel_count,
            format_duration(file.duration_secs),
            verdict(file),
            file.title,
        ));
    }

    output.push_str(&separator);
    output.push('\n');

    output.push_str(&format!(
        "Number of files:  {}\n\
         Phase warnings:   {}",
        result.files.len(),
        result.warnings,
    ));

    output
}

/// Format a single file result as pretty-printed JSON.
pub fn format_json_single(report: &FileReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Format a batch result as pretty-printed JSON.
pub fn format_json(result: &BatchReport) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

/// Format a single file result as CSV, one row per channel.
pub fn format_csv_single(report: &FileReport) -> String {
    let mut output = String::from("Channel,Volume\n");
    for channel in &report.channels {
        output.push_str(&format!("{},{:.4}\n", channel.label, channel.volume));
    }
    output.push_str(&format!("Mono ratio,{:.4}\n", report.mono_ratio));
    output
}

/// Format a batch result as CSV.
pub fn format_csv(result: &BatchReport) -> String {
    let mut output = String::from("Mono ratio,Channels,Duration,Phase warning,File\n");
    for file in &result.files {
        output.push_str(&format!(
            "{:.4},{},{},{},{}\n",
            file.mono_ratio,
            file.channel_count,
            format_duration(file.duration_secs),
            file.phase_warning,
            file.filename,
        ));
    }
    output
}
