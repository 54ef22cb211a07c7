pub mod comm_log;
pub mod program;

pub use comm_log::{CommLog, LogEntry, LogKind};
pub use program::ProgramStore;

use std::sync::Arc;

use crate::config::ConfigStore;
use crate::serial::SerialTransport;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigStore,
    pub program: ProgramStore,
    pub comm_log: CommLog,
    pub transport: Arc<SerialTransport>,
}

impl AppState {
    pub fn new(transport: SerialTransport) -> Self {
        Self {
            config: ConfigStore::new(),
            program: ProgramStore::new(),
            comm_log: CommLog::new(),
            transport: Arc::new(transport),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SerialTransport::system())
    }
}
