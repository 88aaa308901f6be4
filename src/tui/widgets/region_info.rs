use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::resolver::RegionInfo;

/// Render the country label and the circuits / winners / fastest laps lists
pub fn render(frame: &mut Frame, area: Rect, info: Option<&RegionInfo>, ready: bool) {
    let country = match info {
        Some(info) if info.is_resolved() => info.country_name.clone(),
        Some(info) => format!("Unknown region {}", info.region_id),
        None => String::from("No country selected"),
    };

    let block = Block::default()
        .title(format!(" {} ", country))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(info) = info else {
        let hint = if ready {
            "Select a country with Enter or click a circuit on the map"
        } else {
            "Loading datasets..."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray).italic(),
        )));
        frame.render_widget(paragraph, inner);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(35),
            Constraint::Percentage(20),
        ])
        .split(inner);

    let mut circuits: Vec<Line> = Vec::new();
    let mut winners: Vec<Line> = Vec::new();
    let mut laps: Vec<Line> = Vec::new();

    if info.circuits.is_empty() {
        circuits.push(Line::from(Span::styled(
            "No circuits",
            Style::default().fg(Color::DarkGray),
        )));
    }

    // One row per circuit in every column, a dash where no race resolved
    for circuit in &info.circuits {
        let mut spans = vec![Span::styled(
            circuit.name.as_str(),
            Style::default().fg(Color::White),
        )];
        if let Some(location) = &circuit.location {
            spans.push(Span::styled(
                format!(" ({})", location),
                Style::default().fg(Color::DarkGray),
            ));
        }
        circuits.push(Line::from(spans));

        match &circuit.latest {
            Some(latest) => {
                winners.push(Line::from(vec![
                    Span::styled(
                        latest.winner.display_name.as_str(),
                        Style::default().fg(Color::Magenta).bold(),
                    ),
                    Span::styled(
                        format!(" ({})", latest.winner.year),
                        Style::default().fg(Color::Gray),
                    ),
                ]));
                let time = if latest.fastest_lap.time.is_empty() {
                    "-"
                } else {
                    latest.fastest_lap.time.as_str()
                };
                laps.push(Line::from(Span::styled(time, Style::default().fg(Color::Cyan))));
            }
            None => {
                winners.push(placeholder());
                laps.push(placeholder());
            }
        }
    }

    render_column(frame, columns[0], "Circuits", circuits);
    render_column(frame, columns[1], "Latest winner", winners);
    render_column(frame, columns[2], "Fastest lap", laps);
}

fn placeholder() -> Line<'static> {
    Line::from(Span::styled("-", Style::default().fg(Color::DarkGray)))
}

/// Rows are not wrapped so each line stays level with its circuit
fn render_column(frame: &mut Frame, area: Rect, heading: &str, mut lines: Vec<Line>) {
    lines.insert(
        0,
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(Color::Gray).underlined(),
        )),
    );
    let paragraph = Paragraph::new(lines);
    frame.render_widget(paragraph, area);
}
