//! Terminal rendering.
//!
//! One pure `render` function draws the whole frame from `App` state:
//! header bar, message thread, query input, status bar, plus the modal
//! overlays for credentials and model selection.

pub mod theme;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

use crate::app::{App, CredentialField, FocusArea, OverlayState};
use crate::chat::{Role, TurnPhase};

const MIN_WIDTH: u16 = 60;
const MIN_HEIGHT: u16 = 14;

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let notice = Paragraph::new(format!(
            "Terminal too small, need at least {MIN_WIDTH}x{MIN_HEIGHT}"
        ))
        .style(Style::default().fg(theme::FG_PRIMARY).bg(theme::BG_PRIMARY))
        .alignment(Alignment::Center);
        frame.render_widget(notice, area);
        return;
    }

    let show_banner = !app.credentials_configured();
    let mut constraints = vec![Constraint::Length(1)];
    if show_banner {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(3));
    constraints.push(Constraint::Length(3));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);
    let mut next = 0usize;
    let header_area = rows[next];
    next += 1;
    let banner_area = if show_banner {
        let r = rows[next];
        next += 1;
        Some(r)
    } else {
        None
    };
    let thread_area = rows[next];
    let input_area = rows[next + 1];
    let status_area = rows[next + 2];

    draw_header(frame, app, header_area);
    if let Some(banner) = banner_area {
        draw_banner(frame, banner);
    }
    draw_thread(frame, app, thread_area);
    draw_input(frame, app, input_area);
    draw_status(frame, app, status_area);

    match app.overlay.as_ref() {
        Some(OverlayState::Credentials(form)) => draw_credentials_form(frame, form, area),
        Some(OverlayState::ModelPicker(picker)) => draw_model_picker(frame, app, picker, area),
        None => {}
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = " Bedrock Chat ";
    let model = format!(" {} ", app.selected_model_label());
    let pad = (area.width as usize)
        .saturating_sub(title.width())
        .saturating_sub(model.width());
    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(pad)),
        Span::raw(model),
    ]);
    let bar = Paragraph::new(line).style(Style::default().fg(theme::BAR_TEXT).bg(theme::BAR_BG));
    frame.render_widget(bar, area);
}

fn draw_banner(frame: &mut Frame, area: Rect) {
    let banner = Paragraph::new(" No AWS credentials configured. Press Ctrl+E to set them up.")
        .style(Style::default().fg(theme::ERROR_FG).bg(theme::BG_PANEL));
    frame.render_widget(banner, area);
}

fn draw_thread(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == FocusArea::Thread && app.overlay.is_none();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Conversation ")
        .border_style(Style::default().fg(if focused {
            theme::BORDER_FOCUS
        } else {
            theme::BORDER_IDLE
        }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.max(1) as usize;
    let lines = thread_lines(app, width);

    // Scroll is measured in lines up from the bottom of the thread.
    let total = lines.len() as u16;
    let height = inner.height;
    let max_scroll = total.saturating_sub(height);
    let offset = max_scroll.saturating_sub(app.thread_scroll.min(max_scroll));

    let body = Paragraph::new(lines)
        .style(Style::default().fg(theme::FG_PRIMARY).bg(theme::BG_PRIMARY))
        .scroll((offset, 0));
    frame.render_widget(body, inner);
}

/// Builds the full thread as pre-wrapped lines so the scroll offset can be
/// computed against the real rendered height.
fn thread_lines(app: &App, width: usize) -> Vec<Line<'static>> {
    let messages = app.conversation.messages();
    let mut lines: Vec<Line<'static>> = Vec::new();

    if messages.is_empty() {
        lines.push(Line::from(Span::styled(
            "Ask anything about AWS. Answers may suggest follow-up questions.",
            Style::default().fg(theme::FG_DIM),
        )));
        return lines;
    }

    for (index, message) in messages.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        let (label, label_style) = match message.role {
            Role::User => ("You", Style::default().fg(theme::USER_FG)),
            Role::Assistant if message.is_error() => {
                ("Assistant", Style::default().fg(theme::ERROR_FG))
            }
            Role::Assistant => ("Assistant", Style::default().fg(theme::ASSISTANT_FG)),
        };
        lines.push(Line::from(vec![
            Span::styled(label, label_style.add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", message.timestamp.format("%H:%M:%S")),
                Style::default().fg(theme::FG_DIM),
            ),
        ]));

        let last = index == messages.len() - 1;
        let body_style = if message.is_error() {
            Style::default().fg(theme::ERROR_FG)
        } else {
            Style::default().fg(theme::FG_PRIMARY)
        };
        if message.content.is_empty() && last && app.conversation.phase() == TurnPhase::Pending {
            lines.push(Line::from(Span::styled(
                "...",
                Style::default().fg(theme::FG_DIM),
            )));
        } else {
            for row in wrap_text(&message.content, width) {
                lines.push(Line::from(Span::styled(row, body_style)));
            }
            if last && app.conversation.phase() == TurnPhase::Streaming {
                lines.push(Line::from(Span::styled(
                    "▌",
                    Style::default().fg(theme::FG_DIM),
                )));
            }
        }

        if last {
            if let Some(follow_ups) = message.follow_up_questions.as_deref() {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    "Suggested questions (press 1-4):",
                    Style::default()
                        .fg(theme::SUGGESTION_FG)
                        .add_modifier(Modifier::BOLD),
                )));
                for (number, question) in follow_ups.iter().enumerate() {
                    for row in wrap_text(&format!("{}. {}", number + 1, question), width) {
                        lines.push(Line::from(Span::styled(
                            row,
                            Style::default().fg(theme::SUGGESTION_FG),
                        )));
                    }
                }
            }
        }
    }

    lines
}

/// Display-width aware wrapping. Splits at character boundaries, which is
/// good enough for chat text and keeps the line count exact.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for source in text.lines() {
        if source.is_empty() {
            rows.push(String::new());
            continue;
        }
        let mut row = String::new();
        let mut used = 0usize;
        for ch in source.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                used = 0;
            }
            row.push(ch);
            used += w;
        }
        rows.push(row);
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let disabled = app.input_disabled();
    let focused = app.focus == FocusArea::Input && app.overlay.is_none();
    let title = if disabled {
        " Waiting for response... "
    } else {
        " Message (Enter to send) "
    };
    let border = if disabled {
        theme::FG_DIM
    } else if focused {
        theme::BORDER_FOCUS
    } else {
        theme::BORDER_IDLE
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let style = if disabled {
        Style::default().fg(theme::FG_DIM)
    } else {
        Style::default().fg(theme::FG_PRIMARY)
    };
    let text = Paragraph::new(app.input.buffer()).style(style);
    frame.render_widget(text, inner);

    if focused && !disabled {
        let prefix_width = app.input.buffer()[..app.input.cursor()].width() as u16;
        frame.set_cursor(
            inner.x + prefix_width.min(inner.width.saturating_sub(1)),
            inner.y,
        );
    }
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    let left = format!(" {}", app.status_message);
    let right = " Ctrl+E creds | Ctrl+P models | Ctrl+Q quit ";
    let pad = (area.width as usize)
        .saturating_sub(left.width())
        .saturating_sub(right.width());
    let line = Line::from(vec![
        Span::raw(left),
        Span::raw(" ".repeat(pad)),
        Span::styled(right, Style::default().fg(theme::FG_DIM)),
    ]);
    let bar = Paragraph::new(line).style(Style::default().fg(theme::FG_PRIMARY).bg(theme::BG_PANEL));
    frame.render_widget(bar, area);
}

fn draw_credentials_form(
    frame: &mut Frame,
    form: &crate::app::CredentialsFormState,
    area: Rect,
) {
    let popup = centered_rect(area, 56, 16);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" AWS Credentials ")
        .style(Style::default().bg(theme::OVERLAY_BG));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();
    for field in CredentialField::ALL {
        let focused = form.focused == field;
        let marker = if focused { "> " } else { "  " };
        lines.push(Line::from(Span::styled(
            format!("{marker}{}", field.label()),
            if focused {
                Style::default()
                    .fg(theme::BAR_TEXT)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme::FG_DIM)
            },
        )));
        let value = form.field(field);
        let shown = if field.is_secret() {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let value_style = if focused {
            Style::default()
                .fg(theme::FG_PRIMARY)
                .bg(theme::FIELD_FOCUS_BG)
        } else {
            Style::default().fg(theme::FG_PRIMARY)
        };
        lines.push(Line::from(Span::styled(format!("  {shown} "), value_style)));

        let error = match field {
            CredentialField::AccessKeyId => form.errors.access_key_id,
            CredentialField::SecretAccessKey => form.errors.secret_access_key,
            _ => None,
        };
        if let Some(error) = error {
            lines.push(Line::from(Span::styled(
                format!("  {error}"),
                Style::default().fg(theme::ERROR_FG),
            )));
        }
    }
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Enter save | Tab next field | Esc cancel",
        Style::default().fg(theme::FG_DIM),
    )));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_model_picker(
    frame: &mut Frame,
    app: &App,
    picker: &crate::app::ModelPickerState,
    area: Rect,
) {
    let popup = centered_rect(area, 64, area.height.saturating_sub(4).clamp(10, 24));
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Select Model ")
        .style(Style::default().bg(theme::OVERLAY_BG));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let mut lines: Vec<Line> = Vec::new();
    if app.directory_loading && picker.rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "Loading available models...",
            Style::default().fg(theme::FG_DIM),
        )));
    } else if let Some(error) = app.directory_error.as_deref() {
        for row in wrap_text(error, inner.width.max(1) as usize) {
            lines.push(Line::from(Span::styled(
                row,
                Style::default().fg(theme::ERROR_FG),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Press r to retry.",
            Style::default().fg(theme::FG_DIM),
        )));
        lines.push(Line::default());
    }

    let mut provider: Option<&str> = None;
    let mut selected_line = 0usize;
    for (index, model) in picker.rows.iter().enumerate() {
        if provider != Some(model.provider_name.as_str()) {
            provider = Some(model.provider_name.as_str());
            lines.push(Line::from(Span::styled(
                model.provider_name.clone(),
                Style::default()
                    .fg(theme::FG_DIM)
                    .add_modifier(Modifier::BOLD),
            )));
        }
        let selected = index == picker.selected;
        if selected {
            selected_line = lines.len();
        }
        let current = if model.model_id == app.selected_model_id {
            " (current)"
        } else {
            ""
        };
        let style = if selected {
            Style::default()
                .fg(theme::PICKER_HIGHLIGHT_TEXT)
                .bg(theme::PICKER_HIGHLIGHT_BG)
        } else {
            Style::default().fg(theme::FG_PRIMARY)
        };
        lines.push(Line::from(Span::styled(
            format!("  {}{current}", model.model_name),
            style,
        )));
    }

    if picker.rows.is_empty() && !app.directory_loading && app.directory_error.is_none() {
        lines.push(Line::from(Span::styled(
            "No models available.",
            Style::default().fg(theme::FG_DIM),
        )));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Enter select | Up/Down move | r reload | Esc close",
        Style::default().fg(theme::FG_DIM),
    )));

    // Keep the highlighted row visible.
    let height = inner.height as usize;
    let offset = if height == 0 {
        0
    } else {
        selected_line.saturating_sub(height.saturating_sub(3)) as u16
    };
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), inner);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping_respects_display_width() {
        let rows = wrap_text("abcdef", 3);
        assert_eq!(rows, vec!["abc", "def"]);

        // Wide characters count double.
        let rows = wrap_text("你好世界", 4);
        assert_eq!(rows, vec!["你好", "世界"]);
    }

    #[test]
    fn wrapping_preserves_blank_lines() {
        let rows = wrap_text("a\n\nb", 10);
        assert_eq!(rows, vec!["a", "", "b"]);
    }

    #[test]
    fn centered_rect_never_exceeds_the_area() {
        let area = Rect::new(0, 0, 40, 10);
        let popup = centered_rect(area, 100, 100);
        assert_eq!(popup.width, 40);
        assert_eq!(popup.height, 10);
    }
}
