use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::analyzer::{self, AnalyzerConfig};
use crate::cache;
use crate::format::ReportFormat;
use crate::models::AnalysisEvent;
use crate::session::{SessionId, SessionRegistry};
use crate::throttle::Throttle;

/// Minimum spacing between waveform recomputations while the terminal is resized.
pub const RESIZE_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading { session: SessionId, percent: f32 },
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Main,
    About,
    Export,
}

pub struct App {
    pub files: Vec<PathBuf>,
    pub selected: usize,
    pub scroll_offset: usize,
    /// Visible height of the file list (updated each frame by the renderer)
    pub visible_rows: usize,
    pub view: View,
    pub status: LoadStatus,
    pub sessions: SessionRegistry,
    pub config: AnalyzerConfig,
    /// Peak previews for the current session, downmix first.
    pub waveforms: Vec<Vec<f32>>,
    /// Bar count the previews were computed for
    pub waveform_width: usize,
    pub resize: Throttle<usize>,
    pub export_format: ReportFormat,
    pub export_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(files: Vec<PathBuf>, config: AnalyzerConfig) -> Self {
        Self {
            files,
            selected: 0,
            scroll_offset: 0,
            visible_rows: 20,
            view: View::Main,
            status: LoadStatus::Idle,
            sessions: SessionRegistry::new(),
            config,
            waveforms: Vec::new(),
            waveform_width: 0,
            resize: Throttle::new(RESIZE_INTERVAL),
            export_format: ReportFormat::Text,
            export_message: None,
            should_quit: false,
        }
    }

    pub fn select_next(&mut self) {
        if !self.files.is_empty() {
            self.selected = (self.selected + 1).min(self.files.len() - 1);
            self.ensure_visible();
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
        self.ensure_visible();
    }

    /// Adjust scroll_offset so that self.selected is within the visible window.
    fn ensure_visible(&mut self) {
        if self.visible_rows == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + self.visible_rows {
            self.scroll_offset = self.selected - self.visible_rows + 1;
        }
    }

    /// Start analyzing the selected file. The returned session supersedes any
    /// load still in flight.
    pub fn begin_load(&mut self) -> Option<(SessionId, PathBuf)> {
        let path = self.files.get(self.selected)?.clone();
        let session = self.sessions.begin();
        self.status = LoadStatus::Loading {
            session,
            percent: 0.0,
        };
        self.export_message = None;
        Some((session, path))
    }

    /// Apply a worker event; events from superseded sessions are ignored.
    pub fn handle_event(&mut self, event: AnalysisEvent) {
        match event {
            AnalysisEvent::Progress { session, percent } => {
                if self.sessions.is_latest(session) {
                    self.status = LoadStatus::Loading { session, percent };
                }
            }
            AnalysisEvent::Completed {
                session,
                source,
                inspection,
            } => {
                if self.sessions.complete(session, source, *inspection) {
                    self.status = LoadStatus::Ready;
                    self.refresh_waveforms();
                }
            }
            AnalysisEvent::Failed { session, message } => {
                if self.sessions.is_latest(session) {
                    self.status = LoadStatus::Failed(message);
                }
            }
        }
    }

    /// Called by the renderer with the bar count that fits the waveform pane.
    pub fn request_width(&mut self, width: usize) {
        if width != self.waveform_width {
            self.resize.trigger(width);
        }
    }

    /// Recompute previews if a throttled resize is due.
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        match self.resize.poll(now) {
            Some(width) if width != self.waveform_width => {
                self.waveform_width = width;
                self.refresh_waveforms();
                true
            }
            _ => false,
        }
    }

    fn refresh_waveforms(&mut self) {
        self.waveforms = match self.sessions.current() {
            Some(session) => {
                analyzer::waveforms(&session.signal, &session.result, self.waveform_width)
            }
            None => Vec::new(),
        };
    }

    pub fn cycle_export_format(&mut self) {
        self.export_format = self.export_format.next();
    }

    /// Path the current session would export to in the selected format.
    pub fn export_target(&self) -> Option<PathBuf> {
        let session = self.sessions.current()?;
        Some(cache::export_path(&session.source, self.export_format))
    }

    /// Write the current session's report in the selected format.
    pub fn export_current(&mut self) -> Result<PathBuf, String> {
        let (id, target) = match self.sessions.current() {
            Some(session) => (
                session.id,
                cache::export_path(&session.source, self.export_format),
            ),
            None => return Err("Nothing to export yet".to_string()),
        };
        let content = self
            .sessions
            .export(id, self.export_format)
            .ok_or_else(|| "Session was released".to_string())?;
        std::fs::write(&target, content).map_err(|e| e.to_string())?;
        Ok(target)
    }

    /// Release every session before the UI exits.
    pub fn shutdown(&mut self) {
        self.sessions.release_all();
        self.waveforms.clear();
        self.should_quit = true;
    }
}
