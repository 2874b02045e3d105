//! Rendering
//!
//! Pure view code: takes the current `App` state and draws one frame.
//! Nothing in here mutates the app or talks to the backend.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Tabs};
use ratatui::Frame;

use vision_core::RunnerState;

use crate::app::{App, Tab};

/// Draw one frame
pub fn draw(frame: &mut Frame, app: &App) {
    let mut constraints = vec![Constraint::Length(3)];
    if app.backend_warning.is_some() {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let mut row = 0;
    draw_tab_bar(frame, rows[row], app);
    row += 1;

    if let Some(warning) = &app.backend_warning {
        let line = Paragraph::new(Line::from(Span::styled(
            warning.as_str(),
            Style::default().fg(Color::Yellow),
        )));
        frame.render_widget(line, rows[row]);
        row += 1;
    }

    match app.active_tab {
        Tab::Prompt => draw_prompt_tab(frame, rows[row], app),
        Tab::Vision => draw_vision_tab(frame, rows[row], app),
    }
    row += 1;

    draw_status_line(frame, rows[row], app);
}

fn draw_tab_bar(frame: &mut Frame, area: Rect, app: &App) {
    let tabs = Tabs::new(Tab::TITLES.to_vec())
        .select(app.active_tab.index())
        .block(Block::default().borders(Borders::ALL).title(" ollama-vision "))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(tabs, area);
}

fn draw_prompt_tab(frame: &mut Frame, area: Rect, app: &App) {
    let mut constraints = vec![Constraint::Length(3)];
    if app.prompt.show_system {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Min(3));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let mut row = 0;
    draw_model_picker(frame, rows[row], app, app.prompt.view.model_index);
    row += 1;

    if app.prompt.show_system {
        let focused = app.prompt.editing_system;
        draw_input(
            frame,
            rows[row],
            " System instruction (Ctrl-E to edit) ",
            &app.prompt.system,
            focused,
        );
        row += 1;
    }

    let question_focused = !(app.prompt.show_system && app.prompt.editing_system);
    draw_input(
        frame,
        rows[row],
        " Question (Enter to send) ",
        &app.prompt.question,
        question_focused,
    );
    row += 1;

    draw_progress(frame, rows[row], &app.prompt.view.slot.state(), app.prompt.view.slot.progress());
    row += 1;

    draw_result(frame, rows[row], " Response ", &app.prompt.view.result);
}

fn draw_vision_tab(frame: &mut Frame, area: Rect, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    draw_model_picker(frame, rows[0], app, app.vision.view.model_index);
    draw_input(
        frame,
        rows[1],
        " Image path (Enter to send) ",
        &app.vision.image_path,
        true,
    );
    draw_progress(frame, rows[2], &app.vision.view.slot.state(), app.vision.view.slot.progress());
    draw_result(frame, rows[3], " Extracted text ", &app.vision.view.result);
}

fn draw_model_picker(frame: &mut Frame, area: Rect, app: &App, index: usize) {
    let text = match app.catalog.get(index) {
        Some(name) => format!("{name}  ({}/{})", index + 1, app.catalog.len()),
        None => "no models - is Ollama running? (F5 to reload)".to_string(),
    };
    let style = if app.catalog.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Green)
    };
    let picker = Paragraph::new(Span::styled(text, style)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Model (Up/Down) "),
    );
    frame.render_widget(picker, area);
}

fn draw_input(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input = Paragraph::new(value).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    );
    frame.render_widget(input, area);
}

fn draw_progress(frame: &mut Frame, area: Rect, state: &RunnerState, progress: u8) {
    let color = match state {
        RunnerState::Failed => Color::Red,
        RunnerState::Completed => Color::Green,
        _ => Color::Cyan,
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(progress))
        .label(format!("{progress}%"));
    frame.render_widget(gauge, area);
}

fn draw_result(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    // Wrap to the inner width so long replies stay readable
    let inner_width = area.width.saturating_sub(2).max(1) as usize;
    let wrapped = textwrap::fill(text, inner_width);
    let result = Paragraph::new(wrapped)
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(result, area);
}

fn draw_status_line(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.active_state();
    let notice = match app.active_tab {
        Tab::Prompt => app.prompt.view.notice.as_deref(),
        Tab::Vision => app.vision.view.notice.as_deref(),
    };

    let mut spans = vec![
        Span::styled(
            format!(" {} ", state.label()),
            match state {
                RunnerState::Failed => Style::default().fg(Color::Red),
                RunnerState::Completed => Style::default().fg(Color::Green),
                RunnerState::Running => Style::default().fg(Color::Yellow),
                RunnerState::Idle => Style::default().fg(Color::DarkGray),
            },
        ),
        Span::raw("| Tab: switch | Enter: send | F5: models | Ctrl-R: clear | Esc: quit"),
    ];
    if let Some(notice) = notice {
        spans.push(Span::styled(
            format!("  {notice}"),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Left),
        area,
    );
}
