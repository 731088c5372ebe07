use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::TVConfig;
use crate::model::{Model, UIData};

pub const CMDLINE_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const SELECTION_COLUMN_WIDTH: u16 = 3;
const POPUP_WIDTH_PERCENT: u16 = 60;
const POPUP_HEIGHT_PERCENT: u16 = 80;

#[derive(Debug)]
pub struct TableUI {
    max_column_width: u16,
}

impl TableUI {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            max_column_width: u16::try_from(cfg.max_column_width).unwrap_or(u16::MAX),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [table_area, status_area, cmd_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(STATUSLINE_HEIGHT),
            Constraint::Length(CMDLINE_HEIGHT),
        ])
        .areas(frame.area());

        self.draw_table(&uidata, frame, table_area);
        self.draw_statusline(&uidata, frame, status_area);
        self.draw_cmdline(&uidata, frame, cmd_area);

        if uidata.show_popup {
            self.draw_popup(&uidata, frame);
        }
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let marker = if uidata.all_visible_selected { "[x]" } else { "[ ]" };
        let mut header_cells = Vec::with_capacity(uidata.headers.len() + 1);
        header_cells.push(Cell::from(marker));
        header_cells.extend(uidata.headers.iter().map(|h| {
            let mut label = h.label.clone();
            if let Some(arrow) = h.sort_marker {
                label.push_str(arrow);
            }
            let style = if h.filter.is_some() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Cell::from(label).style(style)
        }));
        let header = Row::new(header_cells)
            .style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray));

        let rows: Vec<Row> = uidata
            .rows
            .iter()
            .map(|r| {
                let mut cells = Vec::with_capacity(r.cells.len() + 1);
                cells.push(Cell::from(if r.selected { " ✓ " } else { "   " }));
                cells.extend(r.cells.iter().map(|c| Cell::from(c.as_str())));
                let row = Row::new(cells);
                if r.selected {
                    row.style(Style::default().fg(Color::Green))
                } else {
                    row
                }
            })
            .collect();

        let mut widths = Vec::with_capacity(uidata.headers.len() + 1);
        widths.push(Constraint::Length(SELECTION_COLUMN_WIDTH));
        widths.extend(uidata.headers.iter().map(|h| {
            let width = u16::try_from(h.width).unwrap_or(u16::MAX);
            Constraint::Length(width.min(self.max_column_width))
        }));

        let filters: Vec<String> = uidata
            .headers
            .iter()
            .filter_map(|h| h.filter.as_ref().map(|f| format!("{}~{}", h.label, f)))
            .collect();
        let mut title = vec![Span::from(format!(" {} ", uidata.name)).bold()];
        if !filters.is_empty() {
            title.push(Span::from(format!("[{}] ", filters.join(", "))).yellow());
        }

        let empty_message = if uidata.loading {
            "Loading ..."
        } else {
            "No data available"
        };
        let block = Block::bordered()
            .title(Line::from(title))
            .border_set(border::THICK);

        if uidata.rows.is_empty() {
            frame.render_widget(Paragraph::new(empty_message).centered().block(block), area);
            return;
        }

        // Column 0 holds the selection markers
        let mut state = TableState::default()
            .with_selected(Some(uidata.selected_row))
            .with_selected_column(Some(uidata.selected_column + 1));
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(Style::default().bg(Color::Blue))
            .cell_highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::from(uidata.page_info.clone()).blue()];
        if let Some(message) = &uidata.status_message {
            spans.push(Span::from(" | "));
            spans.push(Span::from(message.clone()));
        }
        spans.push(Span::from("  ? help").dark_gray());
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_cmdline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if !uidata.active_cmdinput {
            return;
        }
        let prompt = uidata.cmd_mode.map(|m| m.prompt()).unwrap_or("> ");
        let line = Line::from(vec![
            Span::from(prompt).bold(),
            Span::from(uidata.cmdinput.input.clone()),
        ]);
        frame.render_widget(Paragraph::new(line), area);

        let cursor_x = area.x
            + u16::try_from(prompt.chars().count() + uidata.cmdinput.cursor_pos)
                .unwrap_or(area.width);
        frame.set_cursor_position((cursor_x.min(area.right().saturating_sub(1)), area.y));
    }

    fn draw_popup(&self, uidata: &UIData, frame: &mut Frame) {
        let area = centered_rect(frame.area(), POPUP_WIDTH_PERCENT, POPUP_HEIGHT_PERCENT);
        let popup = Paragraph::new(uidata.popup_message.as_str())
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title(Line::from(" Help ".bold()).centered())
                    .title_bottom(Line::from(" <Esc> close ").centered())
                    .border_set(border::THICK),
            );
        frame.render_widget(Clear, area);
        frame.render_widget(popup, area);
    }
}

fn centered_rect(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
