use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::app::{AppState, LoadState, Settings};
use crate::error::TuiError;
use crate::resolver::Dataset;
use crate::tasks::LoaderCommand;

use super::explorer::Explorer;
use super::widgets::{region_info, region_list, world_map};

/// Rows skipped by PageUp/PageDown
const PAGE: isize = 10;

/// TUI application state
pub struct TuiApp {
    state: Arc<AppState>,
    cmd_tx: mpsc::Sender<LoaderCommand>,
    terminal: Terminal<CrosstermBackend<Stdout>>,

    explorer: Explorer,
    /// Map drawing area from the last frame, for mouse hit-testing
    map_area: Rect,
    last_error: Option<LastError>,
}

/// Most recent load failure shown in the footer
struct LastError {
    message: String,
    recoverable: bool,
}

impl TuiApp {
    /// Create a new TUI application
    pub fn new(
        state: Arc<AppState>,
        cmd_tx: mpsc::Sender<LoaderCommand>,
    ) -> Result<Self, TuiError> {
        // Set up terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            state,
            cmd_tx,
            terminal,
            explorer: Explorer::new(),
            map_area: Rect::default(),
            last_error: None,
        })
    }

    /// Restore terminal state
    fn restore_terminal(&mut self) -> Result<(), TuiError> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// A reload started
    pub fn set_loading(&mut self) {
        self.last_error = None;
    }

    /// Datasets are in; interaction is enabled from here on
    pub async fn set_dataset(&mut self, dataset: Arc<Dataset>) {
        let hosts_only = self.state.settings.read().await.hosts_only;
        self.explorer.set_dataset(dataset, hosts_only);
        self.last_error = None;
    }

    /// Update display with error
    pub fn set_error(&mut self, message: String, recoverable: bool) {
        self.last_error = Some(LastError {
            message,
            recoverable,
        });
    }

    /// Draw the TUI
    pub fn draw(&mut self, settings: &Settings) -> Result<(), TuiError> {
        let load_state = self.state.load_state();
        let explorer = &self.explorer;
        let last_error = self.last_error.as_ref();
        let mut map_area = self.map_area;

        self.terminal.draw(|frame| {
            let area = frame.area();

            // Main layout: header, body, footer
            let main_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header
                    Constraint::Min(10),   // Body
                    Constraint::Length(3), // Footer
                ])
                .split(area);

            render_header(frame, main_chunks[0], &load_state, settings);

            // Body layout: country list (25%) + map and details (75%)
            let body_chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
                .split(main_chunks[1]);

            let right_chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(10),    // Map
                    Constraint::Length(10), // Region details
                ])
                .split(body_chunks[1]);

            let selected = explorer.selected();
            region_list::render(
                frame,
                body_chunks[0],
                explorer.regions(),
                explorer.cursor(),
                selected.map(|info| info.region_id.as_str()),
                settings.hosts_only,
            );
            map_area = world_map::render(
                frame,
                right_chunks[0],
                explorer.viewport(),
                explorer.dataset().map(Arc::as_ref),
                selected,
            );
            region_info::render(
                frame,
                right_chunks[1],
                selected,
                load_state.dataset().is_some(),
            );

            // Render footer with controls and any error
            render_footer(frame, main_chunks[2], last_error);
        })?;

        self.map_area = map_area;
        Ok(())
    }

    /// Handle keyboard and mouse input (non-blocking)
    pub async fn handle_input(&mut self) -> Result<bool, TuiError> {
        // Poll for events with a short timeout
        if !event::poll(Duration::from_millis(50))? {
            return Ok(false);
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse).await;
                Ok(false)
            }
            _ => Ok(false),
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Result<bool, TuiError> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                info!("Interrupt requested");
                self.state.quit();
                let _ = self.cmd_tx.send(LoaderCommand::Quit).await;
                return Ok(true);
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                info!("Quit requested");
                self.state.quit();
                let _ = self.cmd_tx.send(LoaderCommand::Quit).await;
                return Ok(true); // Signal quit
            }
            KeyCode::Up | KeyCode::Char('k') => self.explorer.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.explorer.move_cursor(1),
            KeyCode::PageUp => self.explorer.move_cursor(-PAGE),
            KeyCode::PageDown => self.explorer.move_cursor(PAGE),
            KeyCode::Enter => {
                let settings = self.state.settings.read().await.clone();
                self.explorer
                    .select_cursor(settings.current_year, settings.winner_rule);
            }
            KeyCode::Char('0') => {
                debug!("Reset zoom");
                self.explorer.reset_view();
            }
            KeyCode::Char('h') => {
                debug!("Toggle hosts-only list");
                let mut settings = self.state.settings.write().await;
                settings.toggle_hosts_only();
                self.explorer.rebuild_regions(settings.hosts_only);
            }
            KeyCode::Char('w') => {
                debug!("Toggle winner rule");
                let mut settings = self.state.settings.write().await;
                settings.toggle_winner_rule();
                self.explorer
                    .refresh(settings.current_year, settings.winner_rule);
            }
            KeyCode::Char('r') => {
                debug!("Reload requested");
                let _ = self.cmd_tx.send(LoaderCommand::Reload).await;
            }
            _ => {}
        }

        Ok(false)
    }

    /// A left click on the map selects the country of the nearest circuit
    async fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }

        let viewport = self.explorer.viewport();
        let Some((lon, lat)) = viewport.cell_to_geo(self.map_area, mouse.column, mouse.row) else {
            return;
        };

        debug!(lon, lat, "Map click");
        let settings = self.state.settings.read().await.clone();
        self.explorer
            .click(lon, lat, settings.current_year, settings.winner_rule);
    }

    /// Run cleanup on drop
    pub fn cleanup(&mut self) {
        if let Err(e) = self.restore_terminal() {
            error!(error = %e, "Failed to restore terminal");
        }
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Render the header bar
fn render_header(frame: &mut Frame, area: Rect, load_state: &LoadState, settings: &Settings) {
    let status_color = match load_state {
        LoadState::Loading => Color::Yellow,
        LoadState::Ready(_) => Color::Green,
        LoadState::Error => Color::Red,
    };

    let title = Line::from(vec![
        Span::styled(" circuitmap ", Style::default().bold().fg(Color::Cyan)),
        Span::raw("| "),
        Span::styled(load_state.status_text(), Style::default().fg(status_color)),
        Span::raw(" | races before "),
        Span::styled(settings.current_year.to_string(), Style::default().fg(Color::Yellow)),
        Span::raw(" | winner: "),
        Span::styled(settings.winner_rule.label(), Style::default().fg(Color::Yellow)),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(title).block(block).centered();
    frame.render_widget(paragraph, area);
}

/// Render the footer with controls
fn render_footer(frame: &mut Frame, area: Rect, error: Option<&LastError>) {
    let controls = if let Some(err) = error {
        let hint = if err.recoverable { ":retry" } else { ":reload" };
        Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::styled(err.message.as_str(), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(hint),
        ])
    } else {
        Line::from(vec![
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(":quit  "),
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(":move  "),
            Span::styled("enter/click", Style::default().fg(Color::Yellow)),
            Span::raw(":select  "),
            Span::styled("0", Style::default().fg(Color::Yellow)),
            Span::raw(":world  "),
            Span::styled("h", Style::default().fg(Color::Yellow)),
            Span::raw(":hosts  "),
            Span::styled("w", Style::default().fg(Color::Yellow)),
            Span::raw(":winner  "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(":reload"),
        ])
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(controls).block(block).centered();
    frame.render_widget(paragraph, area);
}
