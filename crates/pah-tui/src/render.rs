//! Pure view functions.
//!
//! Everything here takes `&TuiState` and draws to a ratatui frame.
//! Feed content is pre-wrapped into styled lines before this module
//! touches the terminal, so scrolling is plain line slicing.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style as RatStyle};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::features::feed::{SPINNER_FRAMES, render_feed};
use crate::state::TuiState;
use crate::style::{Style, StyledLine};
use pah_core::feed::TurnPhase;

const INPUT_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 1;

/// Horizontal padding on each side of the feed.
const FEED_MARGIN: u16 = 1;

/// Renders the whole UI: feed, composer, status line.
pub fn render(state: &TuiState, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    render_feed_pane(state, frame, chunks[0]);
    render_input_pane(state, frame, chunks[1]);
    render_status_pane(state, frame, chunks[2]);
}

/// Lines the feed pane can show, for scroll clamping in the reducer's
/// callers.
pub fn feed_viewport_height(terminal_height: u16) -> usize {
    terminal_height.saturating_sub(INPUT_HEIGHT + STATUS_HEIGHT) as usize
}

fn render_feed_pane(state: &TuiState, frame: &mut Frame, area: Rect) {
    let width = area.width.saturating_sub(FEED_MARGIN * 2) as usize;
    let height = area.height as usize;

    let all_lines = render_feed(
        &state.feed,
        &state.feed_ui,
        &state.registry,
        width,
        state.spinner_frame,
    );
    let total = all_lines.len();

    // offset 0 follows the bottom of the stream
    let max_offset = total.saturating_sub(height);
    let offset_from_bottom = state.scroll.offset_from_bottom.min(max_offset);
    let start = max_offset - offset_from_bottom;
    let end = (start + height).min(total);

    let content: Vec<Line<'static>> = all_lines
        .into_iter()
        .skip(start)
        .take(end - start)
        .map(convert_styled_line)
        .collect();

    // Bottom-align short transcripts.
    let visible: Vec<Line<'static>> = if content.len() < height {
        let mut padded = vec![Line::default(); height - content.len()];
        padded.extend(content);
        padded
    } else {
        content
    };

    let feed_area = Rect {
        x: area.x + FEED_MARGIN,
        y: area.y,
        width: area.width.saturating_sub(FEED_MARGIN * 2),
        height: area.height,
    };
    // No .wrap(): lines are pre-wrapped to the pane width.
    frame.render_widget(Paragraph::new(visible), feed_area);
}

fn render_input_pane(state: &TuiState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(RatStyle::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let input = Paragraph::new(Line::from(Span::raw(state.input.text().to_owned())))
        .block(block)
        .scroll((0, input_scroll(state, inner.width)));
    frame.render_widget(input, area);

    let cursor_x = state.input.cursor_column() as u16;
    let scroll = input_scroll(state, inner.width);
    frame.set_cursor_position(Position {
        x: inner.x + cursor_x.saturating_sub(scroll),
        y: inner.y,
    });
}

/// Horizontal scroll keeping the cursor inside the composer.
fn input_scroll(state: &TuiState, inner_width: u16) -> u16 {
    let cursor = state.input.cursor_column() as u16;
    if inner_width == 0 {
        return 0;
    }
    cursor.saturating_sub(inner_width.saturating_sub(1))
}

fn render_status_pane(state: &TuiState, frame: &mut Frame, area: Rect) {
    let mut spans: Vec<Span<'static>> = Vec::new();

    if state.status.is_connected() {
        spans.push(Span::styled("●", RatStyle::default().fg(Color::Green)));
        spans.push(Span::raw(" hub "));
    } else {
        spans.push(Span::styled("○", RatStyle::default().fg(Color::Yellow)));
        spans.push(Span::styled(
            " reconnecting ",
            RatStyle::default().fg(Color::Yellow),
        ));
    }

    if let Some(notice) = state.status.notice() {
        let color = if notice.is_error {
            Color::Red
        } else {
            Color::Cyan
        };
        spans.push(Span::styled(
            notice.text.clone(),
            RatStyle::default().fg(color),
        ));
    } else {
        match state.feed.phase() {
            TurnPhase::Idle => {
                spans.extend([
                    Span::styled("Enter", RatStyle::default().fg(Color::DarkGray)),
                    Span::raw(" send  "),
                    Span::styled("Ctrl+C", RatStyle::default().fg(Color::DarkGray)),
                    Span::raw(" quit"),
                ]);
            }
            TurnPhase::Submitted | TurnPhase::Streaming => {
                let spinner = SPINNER_FRAMES[state.spinner_frame % SPINNER_FRAMES.len()];
                spans.extend([
                    Span::styled(spinner, RatStyle::default().fg(Color::Cyan)),
                    Span::styled(" Streaming...", RatStyle::default().fg(Color::Cyan)),
                    Span::raw("  "),
                    Span::styled("Esc", RatStyle::default().fg(Color::DarkGray)),
                    Span::raw(" to cancel"),
                ]);
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn convert_styled_line(line: StyledLine) -> Line<'static> {
    let spans: Vec<Span<'static>> = line
        .spans
        .into_iter()
        .map(|s| Span::styled(s.text, convert_style(s.style)))
        .collect();
    Line::from(spans)
}

fn convert_style(style: Style) -> RatStyle {
    match style {
        Style::Plain => RatStyle::default(),
        Style::UserPrefix => RatStyle::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Style::User => RatStyle::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        Style::Assistant => RatStyle::default().fg(Color::White),
        Style::StreamingCursor => RatStyle::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::SLOW_BLINK),
        Style::ThinkingPrefix => RatStyle::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::DIM),
        Style::Thinking => RatStyle::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::ITALIC),
        Style::Timing => RatStyle::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM | Modifier::ITALIC),
        Style::ToolBracket => RatStyle::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::DIM),
        Style::ToolStatus => RatStyle::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
        Style::ToolError => RatStyle::default().fg(Color::Red),
        Style::ToolRunning => RatStyle::default().fg(Color::Cyan),
        Style::ToolSuccess => RatStyle::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        Style::Notice => RatStyle::default().fg(Color::Cyan),
        Style::NoticeError => RatStyle::default().fg(Color::Red),

        Style::CardBorder => RatStyle::default().fg(Color::DarkGray),
        Style::CardTitle => RatStyle::default()
            .fg(Color::Magenta)
            .add_modifier(Modifier::BOLD),
        Style::CardLabel => RatStyle::default().fg(Color::DarkGray),
        Style::CardValue => RatStyle::default().fg(Color::White),
        Style::CardAction => RatStyle::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Style::CardDone => RatStyle::default().fg(Color::Green),
        Style::CardMuted => RatStyle::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::DIM),

        Style::CodeInline => RatStyle::default().fg(Color::Cyan),
        Style::CodeBlock => RatStyle::default().fg(Color::Cyan),
        Style::CodeFence => RatStyle::default().fg(Color::DarkGray),
        Style::Emphasis => RatStyle::default().add_modifier(Modifier::ITALIC),
        Style::Strong => RatStyle::default().add_modifier(Modifier::BOLD),
        Style::H1 => RatStyle::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        Style::H2 => RatStyle::default().add_modifier(Modifier::BOLD),
        Style::H3 => RatStyle::default()
            .add_modifier(Modifier::ITALIC)
            .fg(Color::White),
        Style::Link => RatStyle::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::UNDERLINED),
        Style::BlockQuote => RatStyle::default()
            .fg(Color::Green)
            .add_modifier(Modifier::ITALIC),
        Style::ListBullet => RatStyle::default().fg(Color::Yellow),
        Style::ListNumber => RatStyle::default().fg(Color::Yellow),
    }
}
