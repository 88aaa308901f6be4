use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{Canvas, Circle, Map, MapResolution, Points};
use ratatui::widgets::{Block, Borders};

use crate::resolver::{Dataset, RegionInfo};
use crate::viewport::Viewport;

/// Render the world map with circuit markers; returns the inner drawing area
/// so mouse clicks can be mapped back to coordinates.
pub fn render(
    frame: &mut Frame,
    area: Rect,
    viewport: Viewport,
    dataset: Option<&Dataset>,
    selected: Option<&RegionInfo>,
) -> Rect {
    let title = match selected {
        Some(info) if info.is_resolved() => format!(" World Map - {} ", info.country_name),
        _ => String::from(" World Map "),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);

    // Clone data for the closure
    let hosts: Vec<(f64, f64)> = dataset
        .map(|d| d.circuit_markers().filter_map(|c| c.coords()).collect())
        .unwrap_or_default();
    let highlighted: Vec<(String, f64, f64)> = selected
        .map(|info| {
            info.circuits
                .iter()
                .filter_map(|c| c.coords.map(|(x, y)| (c.name.clone(), x, y)))
                .collect()
        })
        .unwrap_or_default();

    let zoom = viewport.scale;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds(viewport.x_bounds())
        .y_bounds(viewport.y_bounds())
        .paint(move |ctx| {
            // Draw world map
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();

            // Every circuit
            ctx.draw(&Points {
                coords: &hosts,
                color: Color::Yellow,
            });

            // Circuits of the selected country
            for (name, lon, lat) in &highlighted {
                ctx.draw(&Circle {
                    x: *lon,
                    y: *lat,
                    radius: 1.5 / zoom,
                    color: Color::Red,
                });

                // Circuit label (offset above marker)
                let label_y = lat + 3.0 / zoom;
                ctx.print(
                    *lon,
                    label_y,
                    Span::styled(name.clone(), Style::default().fg(Color::White)),
                );
            }
        });

    frame.render_widget(canvas, area);
    inner
}
