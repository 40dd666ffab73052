use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::session::SessionId;
use crate::signal::Signal;

/// Output of the channel analyzer for one signal.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Single-channel mix of the input, same rate and length.
    pub downmix: Signal,
    /// Downmix volume first, then each source channel in input order.
    pub channel_volumes: Vec<f64>,
    pub mono_ratio: f64,
    pub phase_warning: bool,
    /// Bucket count used for every volume pass.
    pub chunk_count: usize,
}

impl AnalysisResult {
    pub fn downmix_volume(&self) -> f64 {
        self.channel_volumes[0]
    }

    pub fn source_volumes(&self) -> &[f64] {
        &self.channel_volumes[1..]
    }
}

/// Everything one file's analysis produces.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub signal: Signal,
    pub result: AnalysisResult,
    pub report: FileReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReport {
    pub label: String,
    pub volume: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub waveform: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    pub title: String,
    pub filename: String,
    pub sample_rate: u32,
    pub channel_count: usize,
    pub duration_secs: f64,
    /// Downmix first, then source channels.
    pub channels: Vec<ChannelReport>,
    pub mono_ratio: f64,
    pub phase_warning: bool,
    #[serde(default)]
    pub file_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub warnings: usize,
    /// Threshold the warnings were computed with.
    #[serde(default)]
    pub phase_threshold: f64,
    /// Preview width the reports were built with.
    #[serde(default)]
    pub waveform_width: Option<usize>,
}

/// Sent from an analysis worker to the TUI
pub enum AnalysisEvent {
    Progress {
        session: SessionId,
        percent: f32,
    },
    Completed {
        session: SessionId,
        source: PathBuf,
        inspection: Box<Inspection>,
    },
    Failed {
        session: SessionId,
        message: String,
    },
}
