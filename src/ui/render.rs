use crate::dom::{Document, Node, NodeId, NodeKind};
use crate::modal::{CONTENT_CLASS, TITLE_ID};
use crate::ui::app::{App, Prompt};
use crate::ui::paint::{DECK_DELETE_CLASS, FLIPPED_CLASS};
use crate::ui::theme::Theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Tags that start a new line when a dialog is flattened to text.
const BLOCK_TAGS: [&str; 9] = ["div", "p", "ul", "ol", "li", "form", "label", "h2", "h3"];

/// Screen regions of clickable document nodes in the last drawn frame.
/// Regions pushed later sit on top of earlier ones.
#[derive(Debug, Clone, Default)]
pub struct HitMap {
    regions: Vec<(Rect, NodeId)>,
}

impl HitMap {
    fn push(&mut self, rect: Rect, node: NodeId) {
        if !rect.is_empty() {
            self.regions.push((rect, node));
        }
    }

    fn clear(&mut self) {
        self.regions.clear();
    }

    /// Topmost node drawn at the given cell.
    pub fn node_at(&self, column: u16, row: u16) -> Option<NodeId> {
        let position = Position::new(column, row);
        self.regions
            .iter()
            .rev()
            .find(|(rect, _)| rect.contains(position))
            .map(|(_, node)| *node)
    }
}

/// Colors for one frame. Everything behind an open dialog is drawn dim.
struct Palette<'a> {
    theme: &'a Theme,
    dimmed: bool,
}

impl Palette<'_> {
    fn text(&self) -> Style {
        let fg = if self.dimmed {
            self.theme.fg_dim
        } else {
            self.theme.fg
        };
        Style::default().fg(fg)
    }

    fn muted(&self) -> Style {
        Style::default().fg(self.theme.fg_dim)
    }

    fn accent(&self) -> Style {
        if self.dimmed {
            self.muted()
        } else {
            Style::default().fg(self.theme.accent)
        }
    }

    fn secondary(&self) -> Style {
        if self.dimmed {
            self.muted()
        } else {
            Style::default().fg(self.theme.secondary)
        }
    }

    fn focused(&self) -> Style {
        Style::default()
            .fg(self.theme.fg)
            .bg(self.theme.focus_bg)
            .add_modifier(Modifier::BOLD)
    }
}

/// Draw the app and return where its clickable nodes ended up. While a
/// dialog is open only the dialog and its overlay can be clicked.
pub fn render(frame: &mut Frame, app: &App) -> HitMap {
    let area = frame.area();
    let mut hits = HitMap::default();
    let palette = Palette {
        theme: app.theme,
        dimmed: app.doc.attribute(app.layout.app_root, "aria-hidden") == Some("true"),
    };

    frame.render_widget(Block::default().style(Style::default().bg(app.theme.bg)), area);

    // Main layout: Header + Body + Footer
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(area);

    render_header(frame, app, &palette, main_chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_deck_list(frame, app, &palette, body_chunks[0], &mut hits);
    render_card_pane(frame, app, &palette, body_chunks[1], &mut hits);
    render_footer(frame, app, main_chunks[2]);

    if let Some(dialog) = app.modal.dialog() {
        hits.clear();
        if let Some(overlay) = app.modal.overlay() {
            hits.push(area, overlay);
        }
        let rect = dialog_area(area);
        hits.push(rect, dialog);
        render_dialog(frame, &app.doc, app.theme, dialog, rect, &mut hits);
    }
    if let Some(prompt) = &app.prompt {
        render_prompt(frame, app.theme, prompt, area);
    }
    hits
}

/// Screen area of an open dialog. Clicks outside it land on the overlay.
fn dialog_area(area: Rect) -> Rect {
    centered_rect(60, 60, area)
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

fn is_focused(doc: &Document, node: NodeId) -> bool {
    doc.active_element() == Some(node)
}

/// Where a one-line paragraph of `width` cells starts when centered in `area`.
fn centered_x(area: Rect, width: u16) -> u16 {
    area.x + area.width.saturating_sub(width) / 2
}

fn cells(text: &str) -> u16 {
    u16::try_from(Span::raw(text).width()).unwrap_or(u16::MAX)
}

fn render_header(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut spans = vec![Span::styled(
        format!("  {}  ", app.doc.text_content(app.layout.deck_title)),
        palette.accent().add_modifier(Modifier::BOLD),
    )];
    if app.study.is_studying() {
        spans.push(Span::styled("[STUDY]", palette.secondary()));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" flashdeck ")
            .border_style(palette.accent()),
    );
    frame.render_widget(header, area);
}

fn render_deck_list(frame: &mut Frame, app: &App, palette: &Palette, area: Rect, hits: &mut HitMap) {
    let doc = &app.doc;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Decks ")
        .border_style(palette.accent());
    let inner = block.inner(chunks[0]);

    let items: Vec<ListItem> = doc
        .node(app.layout.deck_list)
        .map(Node::children)
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(row, &li)| {
            let name = doc
                .descendants(li)
                .into_iter()
                .find(|n| doc.has_class(*n, "deck-name"))
                .map(|n| doc.text_content(n))
                .unwrap_or_default();
            let marker = if doc.has_class(li, "active") { "▶ " } else { "  " };
            let style = if is_focused(doc, li) {
                palette.focused()
            } else if doc.has_class(li, "active") {
                palette.accent().add_modifier(Modifier::BOLD)
            } else {
                palette.text()
            };
            let delete = doc
                .descendants(li)
                .into_iter()
                .find(|n| doc.has_class(*n, DECK_DELETE_CLASS));
            let delete_style = if delete.is_some_and(|n| is_focused(doc, n)) {
                palette.focused()
            } else {
                palette.muted()
            };
            let label = format!("{marker}{name} ");

            let y = u16::try_from(row).map_or(u16::MAX, |row| inner.y.saturating_add(row));
            if y < inner.bottom() {
                hits.push(Rect::new(inner.x, y, inner.width, 1), li);
                if let Some(delete) = delete {
                    let x = inner.x.saturating_add(cells(&label));
                    hits.push(Rect::new(x, y, 1, 1).intersection(inner), delete);
                }
            }
            ListItem::new(Line::from(vec![
                Span::styled(label, style),
                Span::styled("✕", delete_style),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), chunks[0]);

    let style = if is_focused(doc, app.layout.new_deck_button) {
        palette.focused()
    } else {
        palette.secondary()
    };
    let label = format!("[ {} ]", doc.text_content(app.layout.new_deck_button));
    let width = cells(&label);
    hits.push(
        Rect::new(centered_x(chunks[1], width), chunks[1].y, width, 1).intersection(chunks[1]),
        app.layout.new_deck_button,
    );
    frame.render_widget(
        Paragraph::new(Span::styled(label, style)).alignment(Alignment::Center),
        chunks[1],
    );
}

fn render_card_pane(frame: &mut Frame, app: &App, palette: &Palette, area: Rect, hits: &mut HitMap) {
    let doc = &app.doc;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search
            Constraint::Min(5),    // Card
            Constraint::Length(1), // Counter
            Constraint::Length(1), // Controls
        ])
        .split(area);

    let input = app.layout.search_input;
    let value = doc.value(input);
    let search_text = if value.is_empty() && !is_focused(doc, input) {
        Span::styled(
            doc.attribute(input, "placeholder").unwrap_or_default().to_string(),
            palette.muted(),
        )
    } else {
        Span::styled(value.to_string(), palette.secondary())
    };
    let status = doc.text_content(app.layout.search_status);
    let border = if is_focused(doc, input) {
        palette.accent()
    } else {
        palette.muted()
    };
    let search = Paragraph::new(Line::from(vec![
        search_text,
        Span::raw("  "),
        Span::styled(status, palette.secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Search ")
            .border_style(border),
    );
    frame.render_widget(search, chunks[0]);
    hits.push(chunks[0], input);

    let flipped = doc.has_class(app.layout.card, FLIPPED_CLASS);
    let (face, title, style) = if flipped {
        (app.layout.card_back, " Back ", palette.secondary())
    } else {
        (app.layout.card_front, " Front ", palette.text())
    };
    let card = Paragraph::new(doc.text_content(face))
        .style(style.add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(palette.accent()),
        );
    frame.render_widget(card, chunks[1]);

    frame.render_widget(
        Paragraph::new(doc.text_content(app.layout.card_counter))
            .style(palette.muted())
            .alignment(Alignment::Center),
        chunks[2],
    );

    let controls = doc
        .node(app.layout.controls)
        .map(Node::children)
        .unwrap_or_default();
    let buttons: Vec<Span> = controls
        .iter()
        .flat_map(|&button| {
            let style = if is_focused(doc, button) {
                palette.focused()
            } else {
                palette.text()
            };
            [
                Span::styled(format!("[ {} ]", doc.text_content(button)), style),
                Span::raw(" "),
            ]
        })
        .collect();
    let line = Line::from(buttons);

    let row = chunks[3];
    let mut x = centered_x(row, u16::try_from(line.width()).unwrap_or(u16::MAX));
    for (&button, span) in controls.iter().zip(line.spans.iter().step_by(2)) {
        let width = u16::try_from(span.width()).unwrap_or(u16::MAX);
        hits.push(Rect::new(x, row.y, width, 1).intersection(row), button);
        x = x.saturating_add(width).saturating_add(1);
    }
    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), row);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.prompt.is_some() {
        "[Enter/y] Confirm  [Esc/n] Cancel"
    } else if app.modal.is_open() {
        "[Tab/Shift+Tab] Move  [Enter] Activate  [Esc] Close"
    } else if app.study.is_studying() {
        "[←→] Previous/Next  [Space] Flip  [Esc] Exit study"
    } else {
        "[Tab] Focus  [jk] Deck  [hl] Card  [f] Flip  [/] Search  [s] Study  [?] Help  [q] Quit"
    };

    let footer = Paragraph::new(help_text).style(Style::default().fg(app.theme.fg_dim));
    frame.render_widget(footer, area);
}

fn render_dialog(
    frame: &mut Frame,
    doc: &Document,
    theme: &Theme,
    dialog: NodeId,
    area: Rect,
    hits: &mut HitMap,
) {
    let title = doc
        .find_by_id(TITLE_ID)
        .filter(|t| doc.is_inclusive_ancestor(dialog, *t))
        .map(|t| format!(" {} ", doc.text_content(t)))
        .unwrap_or_default();

    let palette = Palette {
        theme,
        dimmed: false,
    };
    let mut flattener = Flattener {
        doc,
        palette: &palette,
        lines: Vec::new(),
        current: Vec::new(),
        targets: Vec::new(),
    };
    for child in doc.node(dialog).map(Node::children).unwrap_or_default() {
        if doc.attribute(*child, "id") != Some(TITLE_ID) {
            flattener.walk(*child);
        }
    }
    let (lines, targets) = flattener.finish();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(area);

    // Positions are exact until the first line that wraps.
    let mut y = inner.y;
    for (line, line_targets) in lines.iter().zip(&targets) {
        if y >= inner.bottom() || line.width() > usize::from(inner.width) {
            break;
        }
        for target in line_targets {
            let rect = Rect::new(inner.x.saturating_add(target.offset), y, target.width, 1);
            hits.push(rect.intersection(inner), target.node);
        }
        y += 1;
    }

    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().fg(theme.fg).bg(theme.bg))
        .block(block);
    frame.render_widget(paragraph, area);
}

/// A clickable control inside one flattened dialog line.
struct Target {
    node: NodeId,
    offset: u16,
    width: u16,
}

/// Turns a dialog subtree into wrapped terminal lines.
struct Flattener<'a> {
    doc: &'a Document,
    palette: &'a Palette<'a>,
    lines: Vec<(Line<'static>, Vec<Target>)>,
    current: Vec<Span<'static>>,
    targets: Vec<Target>,
}

impl Flattener<'_> {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let line = Line::from(std::mem::take(&mut self.current));
            self.lines.push((line, std::mem::take(&mut self.targets)));
        }
    }

    fn finish(mut self) -> (Vec<Line<'static>>, Vec<Vec<Target>>) {
        self.flush();
        self.lines.into_iter().unzip()
    }

    /// Add a span for a clickable control.
    fn push_target(&mut self, node: NodeId, span: Span<'static>) {
        let offset: usize = self.current.iter().map(Span::width).sum();
        self.targets.push(Target {
            node,
            offset: u16::try_from(offset).unwrap_or(u16::MAX),
            width: u16::try_from(span.width()).unwrap_or(u16::MAX),
        });
        self.current.push(span);
    }

    fn walk(&mut self, node: NodeId) {
        let doc = self.doc;
        let Some(n) = doc.node(node) else {
            return;
        };
        let tag = match n.kind() {
            NodeKind::Text(text) => {
                self.current
                    .push(Span::styled(text.clone(), self.palette.text()));
                return;
            }
            NodeKind::Element(tag) => tag.as_str(),
        };
        if doc.client_rect_count(node) == 0 {
            return;
        }
        let focused = is_focused(doc, node);

        match tag {
            "br" => self.flush(),
            "input" | "textarea" => {
                let value = n.value();
                let style = if focused {
                    self.palette.focused()
                } else {
                    self.palette.secondary()
                };
                let caret = if focused { "▏" } else { " " };
                self.push_target(node, Span::styled(format!("[{value}{caret}]"), style));
            }
            "button" => {
                let style = if focused {
                    self.palette.focused()
                } else {
                    self.palette.accent()
                };
                self.push_target(
                    node,
                    Span::styled(format!("[ {} ]", doc.text_content(node)), style),
                );
            }
            _ => {
                let block = BLOCK_TAGS.contains(&tag) || n.has_class(CONTENT_CLASS);
                if block {
                    self.flush();
                }
                if tag == "li" {
                    self.current.push(Span::styled("• ", self.palette.muted()));
                }
                for child in n.children() {
                    self.walk(*child);
                }
                if block {
                    self.flush();
                }
            }
        }
    }
}

fn render_prompt(frame: &mut Frame, theme: &Theme, prompt: &Prompt, area: Rect) {
    let (message, hint, border) = match prompt {
        Prompt::Alert(message) => (message.as_str(), "[Enter] OK", theme.accent),
        Prompt::Confirm { message, .. } => (message.as_str(), "[y] Yes  [n] No", theme.error),
    };
    let popup = centered_rect(40, 20, area);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(theme.fg_dim))),
    ];

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().bg(theme.bg))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border)),
            ),
        popup,
    );
}
