//! Terminal UI rendering — status bar, conversation, activity log, input.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::constants::ACTIVITY_PANEL_HEIGHT;

use super::App;
use super::session::{Message, Role};

const EMPTY_CONVERSATION: &str = "No messages yet. Start typing!";
const THINKING: &str = "🤖 Thinking...";

impl App {
    /// Render the full TUI frame: status bar, conversation, activity log,
    /// and input prompt.
    pub fn draw(&mut self, frame: &mut Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(ACTIVITY_PANEL_HEIGHT),
                Constraint::Length(3),
            ])
            .split(frame.area());

        // ── Status bar ───────────────────────────────────────────────
        let header_line = Line::from(vec![
            Span::styled("Agent: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                self.active_agent.clone(),
                Style::default().fg(Color::Magenta),
            ),
            Span::styled("  Endpoint: ", Style::default().fg(Color::DarkGray)),
            Span::raw(self.client.base_url.to_string()),
            Span::styled("  State: ", Style::default().fg(Color::DarkGray)),
            Span::styled(self.state_label(), Style::default().fg(self.state_color())),
            Span::styled(
                format!("  Messages: {}", self.session.messages().len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(header_line), chunks[0]);

        // ── Conversation ─────────────────────────────────────────────
        let inner_width = chunks[1].width.saturating_sub(2);
        let inner_height = chunks[1].height.saturating_sub(2) as usize;

        let conversation = Paragraph::new(Text::from(self.conversation_lines()))
            .wrap(Wrap { trim: false });

        let total_visual = conversation.line_count(inner_width);
        let max_scroll = total_visual.saturating_sub(inner_height);

        // Clamp scroll_offset (lines from the bottom) to valid range.
        if (self.scroll_offset as usize) > max_scroll {
            self.scroll_offset = max_scroll as u16;
        }
        let top_row = max_scroll.saturating_sub(self.scroll_offset as usize) as u16;

        let title = if self.scroll_offset > 0 {
            format!(" Chat [↑{}] ", self.scroll_offset)
        } else {
            " Chat ".to_string()
        };
        let conversation_panel = conversation
            .block(Block::default().borders(Borders::ALL).title(title))
            .scroll((top_row, 0));
        frame.render_widget(conversation_panel, chunks[1]);

        // ── Activity log (always pinned to the latest entries) ───────
        let log_width = chunks[2].width.saturating_sub(2);
        let log_height = chunks[2].height.saturating_sub(2) as usize;
        let log_lines: Vec<Line> = self.logs.iter().map(|l| l.render()).collect();
        let log_paragraph = Paragraph::new(Text::from(log_lines)).wrap(Wrap { trim: true });
        let log_top = log_paragraph
            .line_count(log_width)
            .saturating_sub(log_height) as u16;
        let log_panel = log_paragraph
            .block(Block::default().borders(Borders::ALL).title(" Activity "))
            .scroll((log_top, 0));
        frame.render_widget(log_panel, chunks[2]);

        // ── Input prompt ─────────────────────────────────────────────
        let input_panel = Paragraph::new(self.input.as_str())
            .block(Block::default().borders(Borders::ALL).title("Type a message..."));
        frame.render_widget(input_panel, chunks[3]);

        let input_width = chunks[3].width.saturating_sub(2) as usize;
        let cursor = self.cursor.min(input_width);
        frame.set_cursor_position(Position::new(
            chunks[3].x + 1 + cursor as u16,
            chunks[3].y + 1,
        ));
    }

    /// Every message, plus the placeholder or loading line.
    fn conversation_lines(&self) -> Vec<Line<'static>> {
        let messages = self.session.messages();
        let mut lines: Vec<Line<'static>> = Vec::with_capacity(messages.len() + 1);

        if messages.is_empty() {
            lines.push(Line::styled(
                EMPTY_CONVERSATION,
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.extend(messages.iter().flat_map(message_lines));
        if self.session.is_in_flight() {
            lines.push(Line::styled(THINKING, Style::default().fg(Color::Yellow)));
        }
        lines
    }

    // ── Status-bar helpers ───────────────────────────────────────────

    fn state_label(&self) -> String {
        match (self.session.is_in_flight(), self.session.queued()) {
            (false, _) => "idle".to_string(),
            (true, 0) => "sending".to_string(),
            (true, queued) => format!("sending (+{queued} queued)"),
        }
    }

    fn state_color(&self) -> Color {
        if self.session.is_in_flight() {
            Color::Yellow
        } else {
            Color::Green
        }
    }
}

/// One `Line` per line of content; the role label prefixes the first.
fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let color = match message.role {
        Role::User => Color::Cyan,
        Role::Bot => Color::Green,
    };
    let mut content = message.content.lines();
    let first = content.next().unwrap_or_default();

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{}:", message.role),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::raw(first.to_string()),
    ])];
    lines.extend(content.map(|line| Line::raw(line.to_string())));
    lines
}
