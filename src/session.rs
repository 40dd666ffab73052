use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::format::ReportFormat;
use crate::models::{AnalysisResult, FileReport, Inspection};
use crate::signal::Signal;

/// Synthetic identifier for one decode + analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A completed analysis and the export payloads derived from it.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub source: PathBuf,
    pub signal: Signal,
    pub result: AnalysisResult,
    pub report: FileReport,
    exports: HashMap<ReportFormat, String>,
}

impl Session {
    #[cfg(test)]
    fn export_count(&self) -> usize {
        self.exports.len()
    }
}

/// Owns every live session. Newer requests supersede older ones: a completion
/// for anything but the latest request is dropped, and completing the latest
/// request releases all other sessions.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    next_id: u64,
    latest: Option<SessionId>,
    sessions: HashMap<SessionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, superseding any in-flight one.
    pub fn begin(&mut self) -> SessionId {
        self.next_id += 1;
        let id = SessionId(self.next_id);
        self.latest = Some(id);
        id
    }

    pub fn is_latest(&self, id: SessionId) -> bool {
        self.latest == Some(id)
    }

    /// Store a finished analysis. Returns `false` and drops the data if the
    /// request was superseded in the meantime.
    pub fn complete(&mut self, id: SessionId, source: PathBuf, inspection: Inspection) -> bool {
        if !self.is_latest(id) {
            log::debug!("discarding stale analysis {}", id);
            return false;
        }
        let released = self.sessions.len();
        self.sessions.clear();
        if released > 0 {
            log::debug!("released {} superseded session(s)", released);
        }
        self.sessions.insert(
            id,
            Session {
                id,
                source,
                signal: inspection.signal,
                result: inspection.result,
                report: inspection.report,
                exports: HashMap::new(),
            },
        );
        true
    }

    /// The session for the latest request, once it has completed.
    pub fn current(&self) -> Option<&Session> {
        self.latest.and_then(|id| self.sessions.get(&id))
    }

    #[cfg(test)]
    fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Render (once) and return the export payload for a session.
    pub fn export(&mut self, id: SessionId, format: ReportFormat) -> Option<&str> {
        let session = self.sessions.get_mut(&id)?;
        let report = &session.report;
        let payload = session
            .exports
            .entry(format)
            .or_insert_with(|| format.render_single(report));
        Some(payload.as_str())
    }

    /// Drop a session together with its exports.
    pub fn release(&mut self, id: SessionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Drop everything; used when the UI shuts down.
    pub fn release_all(&mut self) {
        self.sessions.clear();
        self.latest = None;
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
