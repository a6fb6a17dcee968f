use narrate_playback_core::{PlayerState, format_time};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};

use crate::app::App;
use crate::sink::TextView;

pub fn draw(frame: &mut Frame, app: &App, view: &TextView) {
    let [header, body, gauge, help] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header, app);
    draw_text(frame, body, view);
    draw_gauge(frame, gauge, app);

    frame.render_widget(
        Paragraph::new(
            "space play/pause  esc stop  ←/→ nudge  [/] seek  +/- rate  v voice  q quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
        help,
    );
}

fn state_color(state: PlayerState) -> Color {
    match state {
        PlayerState::Playing => Color::Green,
        PlayerState::Paused => Color::Yellow,
        PlayerState::Loading => Color::Cyan,
        PlayerState::Error => Color::Red,
        PlayerState::Idle | PlayerState::Finished => Color::Gray,
    }
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            app.status.clone(),
            Style::default()
                .fg(state_color(app.state))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {}  {:.1}x", app.voice.label(), app.rate)),
    ];
    if let Some((chunk, chunks)) = app.chunk {
        spans.push(Span::raw(format!("  chunk {chunk}/{chunks}")));
    }
    if let Some(error) = &app.error {
        spans.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

/// Lays the words out in rows of at most `width` columns, following the
/// line breaks in each word's leading whitespace, and reports the row
/// holding `scroll_to`. Wrapping here keeps scroll offsets in screen rows.
fn text_rows(view: &TextView, width: usize) -> (Vec<Line<'static>>, usize) {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut used = 0;
    let mut focus_row = 0;

    for word in &view.words {
        let mut parts = word.leading.split('\n');
        let mut gap = parts.next().unwrap_or_default();
        for rest in parts {
            rows.push(Line::from(std::mem::take(&mut current)));
            used = 0;
            gap = rest;
        }

        let text = Span::styled(word.text.clone(), word_style(view, word.index));
        let gap = Span::raw(gap.to_string());
        if used > 0 && used + gap.width() + text.width() > width {
            rows.push(Line::from(std::mem::take(&mut current)));
            used = 0;
        } else if !gap.content.is_empty() && (used > 0 || word.leading.contains('\n')) {
            used += gap.width();
            current.push(gap);
        }

        if view.scroll_to == Some(word.index) {
            focus_row = rows.len();
        }
        used += text.width();
        current.push(text);
    }
    rows.push(Line::from(current));

    (rows, focus_row)
}

fn word_style(view: &TextView, index: usize) -> Style {
    if view.highlighted.contains(&index) {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if view.in_chunk(index) {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_text(frame: &mut Frame, area: Rect, view: &TextView) {
    let block = Block::default().borders(Borders::ALL).title(" text ");
    let inner = block.inner(area);
    let (rows, focus_row) = text_rows(view, inner.width as usize);
    let offset = focus_row.saturating_sub(inner.height as usize / 3);

    frame.render_widget(
        Paragraph::new(rows)
            .block(block)
            .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0)),
        area,
    );
}

fn draw_gauge(frame: &mut Frame, area: Rect, app: &App) {
    let label = format!(
        "{} / {}",
        format_time(app.progress.elapsed),
        format_time(app.progress.total)
    );
    frame.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(app.progress.fraction())
            .label(label),
        area,
    );
}
