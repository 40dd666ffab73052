use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use ratatui::Frame;

use super::app::{App, LoadStatus, View};
use crate::format::{format_duration, sparkline};

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const COMPLETE_COLOR: Color = Color::Green;
const ERROR_COLOR: Color = Color::Red;
const PROGRESS_COLOR: Color = Color::Yellow;

/// Columns reserved for the channel label in front of each waveform.
const LABEL_WIDTH: u16 = 9;

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Files + channels
            Constraint::Length(3), // Summary
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[1]);

    render_header(frame, app, chunks[0]);
    render_file_list(frame, app, body[0]);
    render_channels(frame, app, body[1]);
    render_summary(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    // Overlays
    match app.view {
        View::About => render_about_overlay(frame),
        View::Export => render_export_overlay(frame, app),
        View::Main => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (title, details) = match app.sessions.current() {
        Some(session) => (
            session.report.title.clone(),
            format!(
                "{} ch, {} Hz, {}",
                session.report.channel_count,
                session.report.sample_rate,
                format_duration(session.report.duration_secs)
            ),
        ),
        None => ("No file loaded".to_string(), String::new()),
    };

    let text = vec![Line::from(vec![
        Span::styled("File: ", Style::default().fg(DIM)),
        Span::styled(
            title,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(details, Style::default().fg(DIM)),
    ])];

    let block = Block::default()
        .title(Span::styled(
            " Phase Scope ",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let paragraph = Paragraph::new(text).block(block);
    frame.render_widget(paragraph, area);
}

fn render_file_list(frame: &mut Frame, app: &mut App, area: Rect) {
    // 2 for borders
    let inner_height = area.height.saturating_sub(2) as usize;
    app.visible_rows = inner_height;

    let end = (app.scroll_offset + inner_height).min(app.files.len());
    let loaded = app.sessions.current().map(|s| s.source.clone());

    let rows: Vec<Row> = app.files[app.scroll_offset..end]
        .iter()
        .enumerate()
        .map(|(vi, path)| {
            let actual_index = app.scroll_offset + vi;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let marker = if loaded.as_deref() == Some(path.as_path()) {
                Cell::from("\u{25b6}").style(Style::default().fg(COMPLETE_COLOR))
            } else {
                Cell::from("")
            };
            let style = if actual_index == app.selected {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![marker, Cell::from(name)]).style(style)
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Files ", Style::default().fg(DIM)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let table = Table::new(rows, [Constraint::Length(2), Constraint::Min(10)]).block(block);
    frame.render_widget(table, area);
}

fn render_channels(frame: &mut Frame, app: &mut App, area: Rect) {
    let bars = area.width.saturating_sub(2 + LABEL_WIDTH) as usize;
    app.request_width(bars.max(1));

    let block = Block::default()
        .title(Span::styled(" Channels ", Style::default().fg(DIM)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let lines: Vec<Line> = match (&app.status, app.sessions.current()) {
        (LoadStatus::Loading { percent, .. }, _) => {
            let bar_width = 20;
            let filled = ((percent * bar_width as f32) as usize).min(bar_width);
            vec![Line::from(Span::styled(
                format!(
                    "Decoding {}{} {:>3}%",
                    "\u{2588}".repeat(filled),
                    "\u{2591}".repeat(bar_width - filled),
                    (percent * 100.0) as u32
                ),
                Style::default().fg(PROGRESS_COLOR),
            ))]
        }
        (LoadStatus::Failed(message), _) => vec![Line::from(Span::styled(
            message.as_str(),
            Style::default().fg(ERROR_COLOR),
        ))],
        (_, Some(session)) => session
            .report
            .channels
            .iter()
            .enumerate()
            .flat_map(|(i, channel)| {
                let peaks = app.waveforms.get(i).map(Vec::as_slice).unwrap_or(&[]);
                let color = if i == 0 { ACCENT } else { Color::White };
                vec![
                    Line::from(vec![
                        Span::styled(
                            format!("{:<width$}", channel.label, width = LABEL_WIDTH as usize),
                            Style::default().fg(DIM),
                        ),
                        Span::styled(sparkline(peaks), Style::default().fg(color)),
                    ]),
                    Line::from(Span::styled(
                        format!(
                            "{:<width$}volume {:.2}",
                            "",
                            channel.volume,
                            width = LABEL_WIDTH as usize
                        ),
                        Style::default().fg(DIM),
                    )),
                ]
            })
            .collect(),
        _ => vec![Line::from(Span::styled(
            "Select a file and press Enter",
            Style::default().fg(DIM),
        ))],
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match app.sessions.current() {
        Some(session) if session.report.phase_warning => (
            format!(
                "Mono ratio: {:.3}  likely phase cancellation (threshold {:.2})",
                session.report.mono_ratio, app.config.phase_threshold
            ),
            ERROR_COLOR,
        ),
        Some(session) => (
            format!("Mono ratio: {:.3}  ok", session.report.mono_ratio),
            COMPLETE_COLOR,
        ),
        None => ("Mono ratio: --".to_string(), DIM),
    };

    let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(color)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT)),
        );
    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keys = match app.view {
        View::Main => "[Enter] load  [e]xport  [a]bout  [q]uit",
        View::About | View::Export => "[Esc] close",
    };
    let footer = Paragraph::new(keys)
        .style(Style::default().fg(DIM))
        .alignment(Alignment::Center);
    frame.render_widget(footer, area);
}

fn render_about_overlay(frame: &mut Frame) {
    let area = centered_rect(46, 10, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from(Span::styled(
            "Phase Scope",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Version {}", env!("CARGO_PKG_VERSION"))),
        Line::from(""),
        Line::from("Per-channel loudness and downmix check."),
        Line::from("Flags channels that cancel when summed."),
        Line::from(""),
        Line::from(Span::styled("[Esc] close", Style::default().fg(DIM))),
    ];

    let block = Block::default()
        .title(" About ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_export_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 12, frame.area());
    frame.render_widget(Clear, area);

    let output = app
        .export_target()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "--".to_string());

    let mut text = vec![
        Line::from(Span::styled(
            "Export Report",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Format: ", Style::default().fg(DIM)),
            Span::styled(app.export_format.name(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Output: ", Style::default().fg(DIM)),
            Span::styled(output, Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "[Tab] cycle format  [Enter] save  [Esc] cancel",
            Style::default().fg(DIM),
        )),
    ];

    if let Some(ref msg) = app.export_message {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            msg.as_str(),
            Style::default().fg(COMPLETE_COLOR),
        )));
    }

    let block = Block::default()
        .title(" Export ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));

    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(paragraph, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
