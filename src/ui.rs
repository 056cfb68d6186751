use crate::app::{App, Focus};
use crate::blocks;
use crate::controller::RunPhase;
use crate::render::CellPaint;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),  // Status
            Constraint::Length(11), // Parameters
            Constraint::Length(3),  // Color ramp
            Constraint::Min(6),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_ramp_box(frame, sections[2], app);
    render_controls_box(frame, sections[3], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Sandpile ");
    let controller = &app.controller;
    let pile = controller.sandpile();

    let phase = controller.phase();
    let status_color = match phase {
        RunPhase::Idle => DIM_TEXT_COLOR,
        RunPhase::Running => BORDER_COLOR,
        RunPhase::Stopped => Color::Green,
    };
    let text = Style::default().fg(TEXT_COLOR);

    let mut content = vec![
        Line::from(Span::styled(phase.name(), Style::default().fg(status_color))),
        Line::from(Span::styled(format!("Steps: {}", controller.steps()), text)),
        Line::from(Span::styled(format!("Cells: {}", pile.active_len()), text)),
        Line::from(Span::styled(format!("Grains: {}", pile.total_grains()), text)),
        Line::from(Span::styled(format!("Toppled: {}", pile.last_step().toppled), text)),
        Line::from(Span::styled(
            format!("Grid: {}x{}", pile.grid_width, pile.grid_height),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];

    if let Some(message) = &app.message {
        content.push(Line::from(Span::styled(message.clone(), Style::default().fg(HIGHLIGHT_COLOR))));
    } else if let Some(report) = controller.last_report() {
        content.push(Line::from(Span::styled(
            format!("{} steps / {} ms", report.steps, report.elapsed.as_millis()),
            Style::default().fg(Color::Green),
        )));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let on_off = |b: bool| if b { "on" } else { "off" }.to_string();
    let settings = &app.settings;

    let content = vec![
        make_line("Adaptive", on_off(settings.adaptive_color), app.focus == Focus::Adaptive),
        make_line("Boundary", settings.boundary.name().to_string(), app.focus == Focus::Boundary),
        make_line(
            "Delay",
            if settings.is_fast_forward() {
                "instant".to_string()
            } else {
                format!("{}ms", settings.step_delay_ms)
            },
            app.focus == Focus::Delay,
        ),
        make_line("Draw FF", on_off(settings.draw_on_fast_forward), app.focus == Focus::DrawFastForward),
        make_line("Grains", settings.initial_grains.to_string(), app.focus == Focus::Grains),
        make_line(
            "Offset",
            format!("{:#04x}", settings.adaptive_color_offset),
            app.focus == Focus::Offset,
        ),
        make_line("Point", format!("{}px", settings.point_size), app.focus == Focus::PointSize),
        make_line("Spawn", settings.spawn_rule.name().to_string(), app.focus == Focus::Spawn),
        make_line("Threshold", settings.threshold.to_string(), app.focus == Focus::Threshold),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

/// One swatch per color bucket, brightest first
fn render_ramp_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Colors ");
    let line = match &app.controller.renderer().paint {
        CellPaint::Adaptive(mapper) => {
            let width = area.width.saturating_sub(2) as usize;
            let buckets = mapper.buckets();
            let stride = buckets.len().div_ceil(width.max(1)).max(1);
            Line::from(
                buckets
                    .iter()
                    .step_by(stride)
                    .map(|c| Span::styled("\u{2588}", Style::default().fg(Color::from(*c))))
                    .collect::<Vec<_>>(),
            )
        }
        CellPaint::Fixed(color) => Line::from(vec![
            Span::styled("\u{2588}", Style::default().fg(Color::from(*color))),
            Span::styled(format!(" {}", color.to_hex()), Style::default().fg(DIM_TEXT_COLOR)),
        ]),
    };
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, _app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "start/stop"),
        make_control("R", "re-init"),
        make_control("Tab", "select param"),
        make_control("↑/↓", "adjust param"),
        make_control("+/-", "speed"),
        make_control("A", "adaptive color"),
        make_control("P", "save png"),
        make_control("V", "fullscreen"),
        make_control("H", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = blocks::render_to_lines(&app.surface, inner.width, inner.height);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Center the help dialog within the canvas
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = Style::default().fg(HIGHLIGHT_COLOR);
    let label = Style::default().fg(TEXT_COLOR);
    let content = vec![
        Line::from(""),
        Line::from(Span::styled("ABELIAN SANDPILE", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Grains start on the center cell. Any cell holding at least the threshold topples: it loses threshold grains and feeds its four neighbors. The run stops once a step topples nothing."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, ↑/↓):", heading)),
        Line::from(""),
        Line::from(Span::styled("Grains / Threshold", label)),
        Line::from("Seed size and the count at which a cell topples"),
        Line::from(""),
        Line::from(Span::styled("Delay", label)),
        Line::from("Milliseconds between steps; 0 runs straight to the stable pile"),
        Line::from(""),
        Line::from(Span::styled("Boundary", label)),
        Line::from("Inclusive keeps one row and column past the edge, Strict drops grains at the edge"),
        Line::from(""),
        Line::from(Span::styled("Spawn", label)),
        Line::from("Single: empty neighbors get 1 grain. Share: they get threshold/4"),
        Line::from(""),
        Line::from(Span::styled("Adaptive / Offset", label)),
        Line::from("Gray ramp by grain count, offset darkens the lightest shade"),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", heading)),
        Line::from("Space=Start/Stop, R=Re-init, +/-=Speed, A=Adaptive, P=PNG, V=Fullscreen, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_canvas_size_excludes_sidebar() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(get_canvas_size(area, false), (100 - SIDEBAR_WIDTH - 2, 38));
        assert_eq!(get_canvas_size(area, true), (98, 38));
    }

    #[test]
    fn test_render_shows_status() {
        let backend = TestBackend::new(100, 40);
        let mut terminal = Terminal::new(backend).unwrap();
        let (w, h) = get_canvas_size(Rect::new(0, 0, 100, 40), false);
        let app = App::new(w, h, Settings::default()).unwrap();

        terminal.draw(|frame| render(frame, &app)).unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("IDLE"));
        assert!(text.contains("Grains: 100"));
        assert!(text.contains("Threshold: 4"));
    }
}
