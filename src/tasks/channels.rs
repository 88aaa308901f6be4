use std::sync::Arc;

use tokio::sync::mpsc;

use crate::resolver::Dataset;

/// Commands from TUI/input to the loader task
#[derive(Debug)]
pub enum LoaderCommand {
    /// Fetch every dataset again
    Reload,
    /// Shutdown the loader
    Quit,
}

/// Messages from the loader to the main loop
pub enum LoaderEvent {
    /// A load started
    Loading,
    /// All tables fetched, parsed and indexed
    Ready(Arc<Dataset>),
    /// The load failed as a whole
    Error { message: String, recoverable: bool },
    /// Loader is shutting down
    Shutdown,
}

/// Channel bundle for communication
pub struct Channels {
    /// Commands to loader
    pub cmd_tx: mpsc::Sender<LoaderCommand>,
    pub cmd_rx: mpsc::Receiver<LoaderCommand>,

    /// Events from loader
    pub event_tx: mpsc::Sender<LoaderEvent>,
    pub event_rx: mpsc::Receiver<LoaderEvent>,
}

impl Channels {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::channel(8);

        Self {
            cmd_tx,
            cmd_rx,
            event_tx,
            event_rx,
        }
    }

    /// Split into sender/receiver pairs
    pub fn split(
        self,
    ) -> (
        mpsc::Sender<LoaderCommand>,
        mpsc::Receiver<LoaderCommand>,
        mpsc::Sender<LoaderEvent>,
        mpsc::Receiver<LoaderEvent>,
    ) {
        (self.cmd_tx, self.cmd_rx, self.event_tx, self.event_rx)
    }
}

impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}
