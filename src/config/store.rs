use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Result, SerialConfig, SerialConfigUpdate};

/// Process-wide serial configuration, shared by every request handler.
#[derive(Clone)]
pub struct ConfigStore {
    current: Arc<RwLock<SerialConfig>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::with_config(SerialConfig::default())
    }

    pub fn with_config(config: SerialConfig) -> Self {
        Self {
            current: Arc::new(RwLock::new(config)),
        }
    }

    /// Snapshot of the current configuration
    pub async fn get(&self) -> SerialConfig {
        self.current.read().await.clone()
    }

    /// Validate `update` and merge its present fields.
    ///
    /// Nothing is written when validation fails.
    pub async fn update(&self, update: &SerialConfigUpdate) -> Result<SerialConfig> {
        update.validate()?;

        let mut current = self.current.write().await;
        update.apply_to(&mut current);

        log::info!(
            "Serial config updated: Port={}, Baud={}, Data={}, Parity={:?}, Stop={}, Flow={:?}",
            current.port_name,
            current.baud_rate,
            current.data_bits,
            current.parity,
            current.stop_bits,
            current.flow_control
        );
        Ok(current.clone())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
