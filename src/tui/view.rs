// Renders one frame of DisplayState: status screen, region strip, pad grid.
// Pure function of the snapshot; nothing in here mutates app state.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::pads::PAD_KEYS;
use crate::shared::DisplayState;

const COLS: usize = 4;
const ROWS: usize = 4;

// alternating region tints on the strip
const REGION_COLORS: [Color; 3] = [Color::Blue, Color::DarkGray, Color::Green];

pub fn render(frame: &mut Frame, area: Rect, ds: &DisplayState, zoom: f64, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),  // status screen
            Constraint::Length(3),  // region strip
            Constraint::Min(12),    // pad grid
        ])
        .split(area);

    draw_screen(frame, sections[0], ds, blink_on);
    draw_strip(frame, sections[1], ds, zoom);
    draw_keypad(frame, sections[2], ds);
}

fn format_time(t: f64) -> String {
    let t = t.max(0.0);
    let mins = (t / 60.0) as u64;
    let secs = t % 60.0;
    format!("{mins:02}:{secs:04.1}")
}

fn draw_screen(frame: &mut Frame, area: Rect, ds: &DisplayState, blink_on: bool) {
    let title = if ds.track_name.is_empty() {
        "no track — drop wavs in the project dir".to_string()
    } else {
        ds.track_name.clone()
    };

    let clock = match ds.duration {
        Some(d) => format!("{} / {}", format_time(ds.current_time), format_time(d)),
        None => "--:-- / --:--".to_string(),
    };

    let mut meta = Vec::new();
    if let Some(bpm) = ds.bpm {
        meta.push(format!("{bpm:.0} BPM"));
    }
    if let Some(genre) = &ds.genre {
        meta.push(genre.clone());
    }

    let status_style = if ds.processing && !blink_on {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Yellow)
    };

    let lines = vec![
        Line::from(vec![
            Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(ds.state_label, Style::default().fg(Color::Cyan)),
        ]),
        Line::from(clock),
        Line::from(meta.join("  ")),
        Line::from(Span::styled(ds.status_message.clone(), status_style)),
    ];

    let screen = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("slicepad"));
    frame.render_widget(screen, area);
}

// One terminal column per (1/zoom) seconds, window scrolled to keep the
// playhead visible. This is the stand-in for a waveform: it shows where the
// regions are, not what the audio looks like.
fn draw_strip(frame: &mut Frame, area: Rect, ds: &DisplayState, zoom: f64) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let Some(duration) = ds.duration else {
        let msg = Paragraph::new("waveform pending...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, inner);
        return;
    };

    let cols = inner.width as usize;
    let visible = cols as f64 / zoom; // seconds on screen
    let mut window_start = ds.current_time - visible / 2.0;
    window_start = window_start.clamp(0.0, (duration - visible).max(0.0));

    let playhead_col = ((ds.current_time - window_start) * zoom) as usize;

    let mut spans = Vec::with_capacity(cols);
    for x in 0..cols {
        let t = window_start + x as f64 / zoom;
        let region = ds.regions.iter().find(|r| t >= r.start && t < r.end);
        let style = match region {
            Some(r) if x == playhead_col => Style::default()
                .fg(Color::White)
                .bg(REGION_COLORS[r.index % REGION_COLORS.len()]),
            Some(r) => Style::default().fg(REGION_COLORS[r.index % REGION_COLORS.len()]),
            None if x == playhead_col => Style::default().fg(Color::White),
            None => Style::default().fg(Color::Black),
        };
        let glyph = if x == playhead_col {
            "▌"
        } else if t < duration {
            "▇"
        } else {
            " "
        };
        spans.push(Span::styled(glyph, style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_keypad(frame: &mut Frame, area: Rect, ds: &DisplayState) {
    let row_constraints = [Constraint::Percentage(25); ROWS];
    let col_constraints = [Constraint::Percentage(25); COLS];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(row_constraints)
        .split(area);

    for (row_idx, row_area) in rows.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(col_constraints)
            .split(*row_area);

        for (col_idx, cell_area) in cols.iter().enumerate() {
            let pad = row_idx * COLS + col_idx;
            let live = ds.pads_live[pad];
            let flashing = ds.flash_pad == Some(pad as u8);

            let style = if flashing {
                Style::default().fg(Color::Black).bg(Color::LightMagenta)
            } else if live {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            let label = Line::from(vec![
                Span::styled(
                    format!("{:>2} ", pad + 1),
                    style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(PAD_KEYS[pad].to_ascii_uppercase().to_string(), style),
            ]);

            let cell = Paragraph::new(label)
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).border_style(style));
            frame.render_widget(cell, *cell_area);
        }
    }
}
