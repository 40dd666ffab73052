pub mod app;
pub mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::analyzer::{self, scan_audio_files, AnalyzerConfig};
use crate::models::AnalysisEvent;
use crate::session::SessionId;

use app::{App, View};

const TICK: Duration = Duration::from_millis(100);

pub fn run(path: &Path, config: AnalyzerConfig) -> Result<()> {
    let files = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        scan_audio_files(path)
    };
    if files.is_empty() {
        anyhow::bail!("No audio files found in {}", path.display());
    }

    let mut app = App::new(files, config);
    let (tx, rx) = mpsc::channel::<AnalysisEvent>();

    // Load the first file right away
    start_load(&mut app, &tx);

    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &tx, rx);

    // Restore terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    app.shutdown();
    result
}

/// Spawn a worker for the selected file. Workers of superseded sessions keep
/// running to completion; their events are dropped by the app.
fn start_load(app: &mut App, tx: &mpsc::Sender<AnalysisEvent>) {
    let Some((session, path)) = app.begin_load() else {
        return;
    };
    let tx = tx.clone();
    let config = app.config.clone();
    std::thread::spawn(move || {
        let event = load(session, path, &config, &tx);
        let _ = tx.send(event);
    });
}

fn load(
    session: SessionId,
    path: PathBuf,
    config: &AnalyzerConfig,
    tx: &mpsc::Sender<AnalysisEvent>,
) -> AnalysisEvent {
    let inspected = analyzer::inspect_file(&path, config, |percent| {
        let _ = tx.send(AnalysisEvent::Progress { session, percent });
    });
    match inspected {
        Ok(inspection) => AnalysisEvent::Completed {
            session,
            source: path,
            inspection: Box::new(inspection),
        },
        Err(e) => AnalysisEvent::Failed {
            session,
            message: format!("{:#}", e),
        },
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tx: &mpsc::Sender<AnalysisEvent>,
    rx: mpsc::Receiver<AnalysisEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;
        // ui::render reports the waveform pane width; recompute at most once per interval
        if app.poll_resize(Instant::now()) {
            continue;
        }

        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }

        let timeout = app
            .resize
            .time_until_ready(Instant::now())
            .map_or(TICK, |wait| wait.min(TICK));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match app.view {
                    View::Main => match key.code {
                        KeyCode::Char('q') => {
                            app.should_quit = true;
                        }
                        KeyCode::Enter => {
                            start_load(app, tx);
                        }
                        KeyCode::Char('e') => {
                            if app.sessions.current().is_some() {
                                app.view = View::Export;
                                app.export_message = None;
                            }
                        }
                        KeyCode::Char('a') => {
                            app.view = View::About;
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            app.select_next();
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            app.select_prev();
                        }
                        _ => {}
                    },
                    View::About => {
                        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                            app.view = View::Main;
                        }
                    }
                    View::Export => match key.code {
                        KeyCode::Esc => {
                            app.view = View::Main;
                        }
                        KeyCode::Tab => {
                            app.cycle_export_format();
                            app.export_message = None;
                        }
                        KeyCode::Enter => {
                            app.export_message = Some(match app.export_current() {
                                Ok(path) => format!("Saved to {}", path.display()),
                                Err(e) => format!("Error: {}", e),
                            });
                        }
                        _ => {}
                    },
                },
                // Resizes need no handling: the next draw reports the new pane width
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
