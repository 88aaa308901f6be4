use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Datelike;
use tokio::sync::{watch, RwLock};

use crate::cli::Args;
use crate::resolver::{Dataset, WinnerRule};

/// User-configurable settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Exclusive upper bound for "most recent race"
    pub current_year: i32,
    pub winner_rule: WinnerRule,
    /// Only list countries that host a circuit
    pub hosts_only: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            current_year: args.year.unwrap_or_else(current_year),
            winner_rule: args.winner_rule,
            hosts_only: !args.all_countries,
        }
    }

    pub fn toggle_winner_rule(&mut self) {
        self.winner_rule = self.winner_rule.toggle();
    }

    pub fn toggle_hosts_only(&mut self) {
        self.hosts_only = !self.hosts_only;
    }
}

/// Calendar year from the local clock
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Dataset lifecycle
#[derive(Clone)]
pub enum LoadState {
    /// Fetch in progress, interaction disabled
    Loading,
    Ready(Arc<Dataset>),
    /// Last load failed; the TUI shows why
    Error,
}

impl LoadState {
    pub fn dataset(&self) -> Option<&Arc<Dataset>> {
        match self {
            LoadState::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }

    /// Get status string for display
    pub fn status_text(&self) -> &'static str {
        match self {
            LoadState::Loading => "LOADING",
            LoadState::Ready(_) => "READY",
            LoadState::Error => "ERROR",
        }
    }
}

/// Shared application state
pub struct AppState {
    /// User settings (modifiable via TUI)
    pub settings: RwLock<Settings>,
    /// Current load state (watch channel for TUI updates)
    load_tx: watch::Sender<LoadState>,
    load_rx: watch::Receiver<LoadState>,
    /// Shutdown flag
    pub should_quit: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(settings: Settings) -> Arc<Self> {
        let (load_tx, load_rx) = watch::channel(LoadState::Loading);

        Arc::new(Self {
            settings: RwLock::new(settings),
            load_tx,
            load_rx,
            should_quit: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Update load state
    pub fn set_load_state(&self, state: LoadState) {
        let _ = self.load_tx.send(state);
    }

    /// Get current load state
    pub fn load_state(&self) -> LoadState {
        self.load_rx.borrow().clone()
    }

    /// Signal shutdown
    pub fn quit(&self) {
        self.should_quit.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown requested
    pub fn is_quitting(&self) -> bool {
        self.should_quit.load(Ordering::SeqCst)
    }
}
