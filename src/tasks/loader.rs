use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::app::{AppState, LoadState};
use crate::data::DataService;
use crate::resolver::Dataset;

use super::channels::{LoaderCommand, LoaderEvent};

/// Background task that loads the datasets once, and again on request
pub struct Loader {
    data: DataService,
    state: Arc<AppState>,
    cmd_rx: mpsc::Receiver<LoaderCommand>,
    event_tx: mpsc::Sender<LoaderEvent>,
}

impl Loader {
    pub fn new(
        data: DataService,
        state: Arc<AppState>,
        cmd_rx: mpsc::Receiver<LoaderCommand>,
        event_tx: mpsc::Sender<LoaderEvent>,
    ) -> Self {
        Self {
            data,
            state,
            cmd_rx,
            event_tx,
        }
    }

    /// Run the loader task
    #[instrument(skip(self), name = "loader")]
    pub async fn run(mut self) {
        info!("Loader starting");

        self.load().await;

        loop {
            tokio::select! {
                // Handle commands from TUI
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(LoaderCommand::Reload) => {
                            debug!("Received Reload command");
                            self.load().await;
                        }
                        Some(LoaderCommand::Quit) | None => {
                            info!("Received Quit command");
                            break;
                        }
                    }
                }

                // Check for shutdown
                _ = tokio::time::sleep(Duration::from_millis(100)) => {
                    if self.state.is_quitting() {
                        break;
                    }
                }
            }
        }

        info!("Loader shutting down");
        let _ = self.event_tx.send(LoaderEvent::Shutdown).await;
    }

    /// Fetch, parse and index every table
    async fn load(&mut self) {
        self.state.set_load_state(LoadState::Loading);
        let _ = self.event_tx.send(LoaderEvent::Loading).await;

        match self.data.load().await {
            Ok(tables) => {
                let dataset = Arc::new(Dataset::new(tables));
                info!("Dataset ready");
                self.state.set_load_state(LoadState::Ready(Arc::clone(&dataset)));
                let _ = self.event_tx.send(LoaderEvent::Ready(dataset)).await;
            }
            Err(e) => {
                error!(error = %e, "Failed to load datasets");
                let message = format!("Load error: {}", e);
                let recoverable = e.is_recoverable();
                self.state.set_load_state(LoadState::Error);
                let _ = self
                    .event_tx
                    .send(LoaderEvent::Error {
                        message,
                        recoverable,
                    })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Settings;
    use crate::data::{fixtures, DataSources};
    use crate::resolver::WinnerRule;
    use crate::tasks::Channels;

    fn state() -> Arc<AppState> {
        AppState::new(Settings {
            current_year: 2022,
            winner_rule: WinnerRule::FirstRow,
            hosts_only: true,
        })
    }

    fn service(dir: &std::path::Path) -> DataService {
        let names = dir.join("names.tsv");
        let sources = DataSources::new(dir.to_str().unwrap(), names.to_str().unwrap()).unwrap();
        DataService::new(sources, Duration::from_secs(5), None).unwrap()
    }

    #[tokio::test]
    async fn test_loads_then_quits() {
        let dir = tempfile::tempdir().unwrap();
        fixtures::write_dataset(dir.path());

        let state = state();
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = Channels::new().split();
        let loader = Loader::new(service(dir.path()), Arc::clone(&state), cmd_rx, event_tx);
        let handle = tokio::spawn(loader.run());

        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Loading)));
        match event_rx.recv().await {
            Some(LoaderEvent::Ready(dataset)) => assert!(dataset.hosts_circuits("380")),
            _ => panic!("expected Ready"),
        }
        assert_eq!(state.load_state().status_text(), "READY");

        cmd_tx.send(LoaderCommand::Quit).await.unwrap();
        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Shutdown)));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_load_reports_error_and_reloads() {
        let dir = tempfile::tempdir().unwrap();

        let state = state();
        let (cmd_tx, cmd_rx, event_tx, mut event_rx) = Channels::new().split();
        let loader = Loader::new(service(dir.path()), Arc::clone(&state), cmd_rx, event_tx);
        let handle = tokio::spawn(loader.run());

        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Loading)));
        match event_rx.recv().await {
            Some(LoaderEvent::Error { recoverable, .. }) => assert!(!recoverable),
            _ => panic!("expected Error"),
        }
        assert_eq!(state.load_state().status_text(), "ERROR");

        fixtures::write_dataset(dir.path());
        cmd_tx.send(LoaderCommand::Reload).await.unwrap();
        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Loading)));
        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Ready(_))));

        drop(cmd_tx);
        assert!(matches!(event_rx.recv().await, Some(LoaderEvent::Shutdown)));
        handle.await.unwrap();
    }
}
