use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use time::{macros::format_description, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::buffer::TextBuffer;
use crate::app::link::{LinkEntryFlow, LinkField};
use crate::app::list::{scroll_offset, visible_rows};
use crate::app::session::{EditorFields, FocusField, NoteEditSession};
use crate::app::state::{AppState, EditorScreen, Mode};
use crate::app::view::ViewModeController;
use crate::config::themes::ThemePalette;
use crate::config::ListOptions;
use crate::storage::{Note, Priority};

pub const OBSCURED_PLACEHOLDER: &str = "<obscured>";

/// Colours resolved from a palette once per frame.
struct Theme {
    primary: Color,
    secondary: Color,
    danger: Color,
    warning: Color,
    success: Color,
    info: Color,
    muted: Color,
    priority: [Color; 4],
}

impl Theme {
    fn from_palette(palette: &ThemePalette) -> Self {
        Self {
            primary: hex(&palette.primary),
            secondary: hex(&palette.secondary),
            danger: hex(&palette.danger),
            warning: hex(&palette.warning),
            success: hex(&palette.success),
            info: hex(&palette.info),
            muted: Color::Gray,
            priority: [
                hex(&palette.priority_high),
                hex(&palette.priority_medium),
                hex(&palette.priority_low),
                hex(&palette.priority_none),
            ],
        }
    }

    fn priority(&self, priority: Priority) -> Color {
        self.priority[usize::from(priority.rank() - 1)]
    }
}

fn hex(value: &str) -> Color {
    value.parse().unwrap_or(Color::Reset)
}

pub fn draw_app(frame: &mut Frame, state: &AppState, palette: &ThemePalette, list: &ListOptions) {
    let theme = Theme::from_palette(palette);
    match state.mode() {
        Mode::List => draw_list(frame, state, &theme, list),
        Mode::DeleteConfirm(note) => {
            draw_list(frame, state, &theme, list);
            draw_delete_confirm(frame, note, &theme);
        }
        Mode::Edit(EditorScreen::View(view)) => draw_view(frame, state, view, &theme),
        Mode::Edit(EditorScreen::Edit(session)) => draw_editor(frame, state, session, &theme),
    }
}

fn screen_layout(area: Rect) -> (Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(area);
    (rows[0], rows[1], rows[2])
}

fn draw_list(frame: &mut Frame, state: &AppState, theme: &Theme, options: &ListOptions) {
    let size = frame.size();
    let (header, body, footer) = screen_layout(size);

    let visible = visible_rows(size.height, options.chrome_rows);
    let offset = scroll_offset(state.selected_index(), state.len(), visible);
    let mut header_spans = vec![
        Span::styled(
            "Terminal Notes",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ({})", state.len()),
            Style::default().fg(theme.muted),
        ),
    ];
    if state.len() > visible {
        header_spans.push(Span::styled(
            format!(" [{}/{}]", state.selected_index() + 1, state.len()),
            Style::default().fg(theme.muted),
        ));
    }
    header_spans.push(Span::raw("  Sort: "));
    header_spans.push(Span::styled(
        state.sort_mode().label(),
        Style::default().fg(theme.secondary),
    ));
    frame.render_widget(Paragraph::new(Line::from(header_spans)), header);

    let content_width = usize::from(
        size.width
            .saturating_sub(options.reserved_columns)
            .max(options.min_content_width),
    );

    if state.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No notes yet. Press 'i' to create your first note.",
                Style::default().fg(theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Notes"));
        frame.render_widget(empty, body);
    } else {
        let items: Vec<ListItem> = state
            .notes()
            .iter()
            .map(|note| ListItem::new(list_row(note, content_width, theme)))
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Notes"))
            .highlight_style(
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED),
            )
            .highlight_symbol("▸ ");
        let mut list_state = ListState::default()
            .with_offset(offset)
            .with_selected(Some(state.selected_index()));
        frame.render_stateful_widget(list, body, &mut list_state);
    }

    draw_footer(
        frame,
        footer,
        state,
        theme,
        "j/k move • Enter view • e edit • i add • d delete • 1-4 priority • x obscure • s sort • q quit",
    );
}

fn list_row<'a>(note: &'a Note, content_width: usize, theme: &Theme) -> Line<'a> {
    let content = if note.obscured {
        OBSCURED_PLACEHOLDER.to_string()
    } else {
        truncate_content(&note.content, content_width)
    };
    Line::from(vec![
        Span::styled(
            format!("[{}] ", note.priority.badge()),
            Style::default()
                .fg(theme.priority(note.priority))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            note.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - ", Style::default().fg(theme.muted)),
        Span::raw(content),
        Span::styled(
            format!("  {}", format_date(note.created_at)),
            Style::default().fg(theme.muted),
        ),
    ])
}

/// Single-line preview: newlines folded to spaces, cut to `max_width`
/// columns with a trailing ellipsis.
pub fn truncate_content(content: &str, max_width: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if UnicodeWidthStr::width(flat.as_str()) <= max_width {
        return flat;
    }
    let mut out = String::new();
    let mut width = 0;
    for grapheme in flat.graphemes(true) {
        let glyph = UnicodeWidthStr::width(grapheme);
        if width + glyph > max_width {
            break;
        }
        width += glyph;
        out.push_str(grapheme);
    }
    out.push_str("...");
    out
}

pub fn format_date(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn format_timestamp(dt: OffsetDateTime) -> String {
    dt.format(&format_description!(
        "[year]-[month]-[day] [hour]:[minute] UTC"
    ))
    .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme, hints: &str) {
    let status = match state.status_message() {
        Some(message) => Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(theme.warning),
        )),
        None => Line::from(""),
    };
    let paragraph = Paragraph::new(vec![
        status,
        Line::from(Span::styled(hints.to_string(), Style::default().fg(theme.muted))),
    ]);
    frame.render_widget(paragraph, area);
}

fn draw_delete_confirm(frame: &mut Frame, note: &Note, theme: &Theme) {
    let area = centered_rect(50, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Delete "),
            Span::styled(
                format!("\"{}\"", note.title),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("?"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "d/y confirm • n/Esc cancel",
            Style::default().fg(theme.muted),
        )),
    ])
    .block(
        Block::default()
            .title("Delete Note")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.danger)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn draw_view(frame: &mut Frame, state: &AppState, view: &ViewModeController, theme: &Theme) {
    let (header, body, footer) = screen_layout(frame.size());
    let note = view.note();

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(
                note.title.as_str(),
                Style::default()
                    .fg(theme.primary)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                note.priority.to_string(),
                Style::default().fg(theme.priority(note.priority)),
            ),
        ])),
        header,
    );

    let link_rows = if note.links.is_empty() {
        0
    } else {
        note.links.len() as u16 + 2
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(link_rows.min(body.height / 2)),
            Constraint::Length(1),
        ])
        .split(body);

    let content = if note.obscured {
        Text::from(Span::styled(
            OBSCURED_PLACEHOLDER,
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Text::from(note.content.as_str())
    };
    frame.render_widget(
        Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL).title("Content"))
            .wrap(Wrap { trim: false }),
        sections[0],
    );

    if !note.links.is_empty() {
        let items: Vec<ListItem> = note
            .links
            .iter()
            .map(|link| {
                ListItem::new(Line::from(vec![
                    Span::styled(link.title.as_str(), Style::default().fg(theme.info)),
                    Span::styled(
                        format!("  {}", link.url),
                        Style::default().fg(theme.muted),
                    ),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Links"))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("▸ ");
        let mut list_state = ListState::default().with_selected(Some(view.selected_link()));
        frame.render_stateful_widget(list, sections[1], &mut list_state);
    }

    frame.render_widget(
        Paragraph::new(Span::styled(
            format!(
                "Created {} • Updated {}",
                format_timestamp(note.created_at),
                format_timestamp(note.updated_at)
            ),
            Style::default().fg(theme.muted),
        )),
        sections[2],
    );

    draw_footer(
        frame,
        footer,
        state,
        theme,
        "Enter edit • ↑/↓ select link • o open • d remove link • x obscure • Esc back",
    );
}

fn draw_editor(frame: &mut Frame, state: &AppState, session: &NoteEditSession, theme: &Theme) {
    let (header, body, footer) = screen_layout(frame.size());
    let draft = session.draft();
    let fields = session.fields();

    let mut header_spans = vec![Span::styled(
        if session.note_id().is_some() {
            "Edit Note"
        } else {
            "New Note"
        },
        Style::default()
            .fg(theme.primary)
            .add_modifier(Modifier::BOLD),
    )];
    if session.is_dirty() {
        header_spans.push(Span::styled(" *", Style::default().fg(theme.warning)));
    }
    if fields.contains(EditorFields::OBSCURED) && draft.obscured {
        header_spans.push(Span::styled(
            "  [obscured]",
            Style::default().fg(theme.secondary),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(header_spans)), header);

    let show_priority = fields.contains(EditorFields::PRIORITY);
    let show_links = fields.contains(EditorFields::LINKS);
    let link_rows = if show_links {
        draft.links.len().max(1) as u16 + 2
    } else {
        0
    };
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(if show_priority { 3 } else { 0 }),
            Constraint::Min(3),
            Constraint::Length(link_rows.min(body.height / 3)),
        ])
        .split(body);

    let focus_style = |field: FocusField| {
        if session.focus() == field {
            Style::default().fg(theme.primary)
        } else {
            Style::default().fg(theme.muted)
        }
    };

    frame.render_widget(
        Paragraph::new(draft.title.text()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title")
                .border_style(focus_style(FocusField::Title)),
        ),
        sections[0],
    );

    if show_priority {
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::raw("◀ "),
                Span::styled(
                    draft.priority.to_string(),
                    Style::default()
                        .fg(theme.priority(draft.priority))
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw(" ▶"),
            ]))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Priority")
                    .border_style(focus_style(FocusField::Priority)),
            ),
            sections[1],
        );
    }

    let content_area = sections[2];
    let content_scroll = vertical_scroll(&draft.content, content_area);
    frame.render_widget(
        Paragraph::new(draft.content.text())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Content")
                    .border_style(focus_style(FocusField::Content)),
            )
            .scroll((content_scroll, 0)),
        content_area,
    );

    if show_links {
        let lines: Vec<Line> = if draft.links.is_empty() {
            vec![Line::from(Span::styled(
                "No links. Ctrl+L to add one.",
                Style::default().fg(theme.muted),
            ))]
        } else {
            draft
                .links
                .iter()
                .map(|link| {
                    Line::from(vec![
                        Span::styled("• ", Style::default().fg(theme.muted)),
                        Span::styled(link.title.as_str(), Style::default().fg(theme.info)),
                        Span::styled(
                            format!("  {}", link.url),
                            Style::default().fg(theme.muted),
                        ),
                    ])
                })
                .collect()
        };
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Links")),
            sections[3],
        );
    }

    let mut hints = String::from("Ctrl+S save • Esc cancel • ↑/↓ switch field");
    if show_priority {
        hints.push_str(" • Tab priority");
    }
    if show_links {
        hints.push_str(" • Ctrl+L link");
    }
    if fields.contains(EditorFields::OBSCURED) {
        hints.push_str(" • Ctrl+X obscure");
    }
    if !session.can_save() {
        hints.push_str(" (title and content required)");
    }
    draw_footer(frame, footer, state, theme, &hints);

    if let Some(flow) = session.link_flow() {
        draw_link_flow(frame, flow, theme);
        return;
    }

    let cursor = match session.focus() {
        FocusField::Title => cursor_position(&draft.title, sections[0], 0),
        FocusField::Content => cursor_position(&draft.content, content_area, content_scroll),
        FocusField::Priority => None,
    };
    if let Some((x, y)) = cursor {
        frame.set_cursor(x, y);
    }
}

fn draw_link_flow(frame: &mut Frame, flow: &LinkEntryFlow, theme: &Theme) {
    let area = centered_rect(60, 40, frame.size());
    frame.render_widget(Clear, area);
    let block = Block::default()
        .title("Add Link")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.info));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(inner);

    let field_style = |field: LinkField| {
        if flow.field() == field {
            Style::default().fg(theme.primary)
        } else {
            Style::default().fg(theme.muted)
        }
    };
    frame.render_widget(
        Paragraph::new(flow.url().text()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("URL")
                .border_style(field_style(LinkField::Url)),
        ),
        rows[0],
    );
    if let Some(hint) = flow.url_hint() {
        frame.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(theme.danger))),
            rows[1],
        );
    } else if flow.field() == LinkField::Title {
        frame.render_widget(
            Paragraph::new(Span::styled("✓ valid", Style::default().fg(theme.success))),
            rows[1],
        );
    }
    frame.render_widget(
        Paragraph::new(flow.title().text()).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title (optional)")
                .border_style(field_style(LinkField::Title)),
        ),
        rows[2],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter next/save • Esc cancel",
            Style::default().fg(theme.muted),
        )),
        rows[3],
    );

    let target = match flow.field() {
        LinkField::Url => rows[0],
        LinkField::Title => rows[2],
    };
    if let Some((x, y)) = cursor_position(flow.focused(), target, 0) {
        frame.set_cursor(x, y);
    }
}

/// Rows to scroll a bordered text area so the cursor line stays visible.
fn vertical_scroll(buffer: &TextBuffer, area: Rect) -> u16 {
    let inner_height = usize::from(area.height.saturating_sub(2)).max(1);
    let line = buffer.cursor_line();
    u16::try_from(line.saturating_sub(inner_height - 1)).unwrap_or(u16::MAX)
}

fn cursor_position(buffer: &TextBuffer, area: Rect, scroll: u16) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }
    let col = UnicodeWidthStr::width(buffer.line_prefix_before_cursor());
    let col = u16::try_from(col).unwrap_or(u16::MAX).min(inner_width - 1);
    let row = u16::try_from(buffer.cursor_line())
        .unwrap_or(u16::MAX)
        .saturating_sub(scroll)
        .min(inner_height - 1);
    Some((area.x + 1 + col, area.y + 1 + row))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorLayout, SortMode};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn render(state: &AppState, width: u16, height: u16) -> anyhow::Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(width, height))?;
        terminal.draw(|frame| {
            draw_app(
                frame,
                state,
                &ThemePalette::default(),
                &ListOptions::default(),
            )
        })?;
        let buffer = terminal.backend().buffer();
        Ok(buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>())
    }

    fn note(title: &str, content: &str, obscured: bool) -> Note {
        Note {
            id: title.to_lowercase(),
            title: title.to_string(),
            content: content.to_string(),
            priority: Priority::Medium,
            links: Vec::new(),
            obscured,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn default_chrome_matches_list_area() {
        let chrome = ListOptions::default().chrome_rows;
        for height in [8u16, 24, 50] {
            let (_, body, _) = screen_layout(Rect::new(0, 0, 80, height));
            // List block borders take one row above and below.
            assert_eq!(visible_rows(height, chrome), usize::from(body.height - 2));
        }
    }

    #[test]
    fn truncation_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("line one\nline two", 40), "line one line two");
        assert_eq!(truncate_content("abcdefghijkl", 10), "abcdefghij...");
        assert_eq!(truncate_content("日本語テキスト", 5), "日本...");
    }

    #[test]
    fn empty_list_shows_affordance() -> anyhow::Result<()> {
        let state = AppState::new(Vec::new(), SortMode::default(), EditorLayout::Extended.into());
        let screen = render(&state, 80, 12)?;
        assert!(screen.contains("No notes yet. Press 'i' to create your first note."));
        assert!(screen.contains("Terminal Notes (0)"));
        Ok(())
    }

    #[test]
    fn obscured_content_is_hidden_in_list() -> anyhow::Result<()> {
        let state = AppState::new(
            vec![
                note("Secret", "pin 1234", true),
                note("Open", "visible text", false),
            ],
            SortMode::default(),
            EditorLayout::Extended.into(),
        );
        let screen = render(&state, 100, 12)?;
        assert!(screen.contains(OBSCURED_PLACEHOLDER));
        assert!(!screen.contains("pin 1234"));
        assert!(screen.contains("visible text"));
        assert!(screen.contains("1970-01-01"));
        Ok(())
    }

    #[test]
    fn editor_renders_each_field() -> anyhow::Result<()> {
        let mut state = AppState::new(
            vec![note("Plan", "first\nsecond", false)],
            SortMode::default(),
            EditorLayout::Extended.into(),
        );
        state.handle_key(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::NONE));
        let screen = render(&state, 80, 24)?;
        assert!(screen.contains("Edit Note"));
        assert!(screen.contains("Priority"));
        assert!(screen.contains("medium"));
        assert!(screen.contains("No links. Ctrl+L to add one."));
        Ok(())
    }

    #[test]
    fn scroll_keeps_cursor_line_visible() {
        let buffer = TextBuffer::new("1\n2\n3\n4\n5\n6");
        let area = Rect::new(0, 0, 20, 5);
        assert_eq!(vertical_scroll(&buffer, area), 3);
        assert_eq!(cursor_position(&buffer, area, 3), Some((2, 3)));
    }
}
