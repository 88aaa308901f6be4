use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState};

use crate::tui::explorer::RegionEntry;

/// Render the country list; circuit hosts are highlighted
pub fn render(
    frame: &mut Frame,
    area: Rect,
    regions: &[RegionEntry],
    cursor: usize,
    selected_id: Option<&str>,
    hosts_only: bool,
) {
    let title = if hosts_only {
        format!(" Circuit Countries ({}) ", regions.len())
    } else {
        format!(" Countries ({}) ", regions.len())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let items: Vec<ListItem> = regions
        .iter()
        .map(|r| {
            let marker = if Some(r.region_id.as_str()) == selected_id {
                Span::styled("● ", Style::default().fg(Color::Red))
            } else {
                Span::raw("  ")
            };
            let style = if r.hosts {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Gray)
            };
            ListItem::new(Line::from(vec![marker, Span::styled(r.name.as_str(), style)]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray).bold())
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected((!regions.is_empty()).then_some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}
