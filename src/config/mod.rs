pub mod settings;
pub mod store;

pub use settings::ServerSettings;
pub use store::ConfigStore;

use serde::{Deserialize, Serialize};

/// Parity mode of the serial line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Flow control of the serial line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    #[default]
    None,
    RtsCts,
    XonXoff,
}

/// Active serial line parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: "COM1".to_string(),
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

/// Partial configuration as posted by clients.
///
/// Numeric fields are kept signed and wide so out-of-range values reach
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfigUpdate {
    pub port_name: Option<String>,
    pub baud_rate: Option<i64>,
    pub data_bits: Option<i64>,
    pub parity: Option<Parity>,
    pub stop_bits: Option<i64>,
    pub flow_control: Option<FlowControl>,
}

impl SerialConfigUpdate {
    /// Check every present numeric field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        if let Some(baud) = self.baud_rate {
            if baud <= 0 || baud > i64::from(u32::MAX) {
                return Err(ConfigError::InvalidBaudRate(baud));
            }
        }
        if let Some(bits) = self.data_bits {
            if !(5..=8).contains(&bits) {
                return Err(ConfigError::InvalidDataBits(bits));
            }
        }
        if let Some(bits) = self.stop_bits {
            if bits != 1 && bits != 2 {
                return Err(ConfigError::InvalidStopBits(bits));
            }
        }
        Ok(())
    }

    /// Merge the present fields into `cfg`. Call [`validate`](Self::validate) first.
    fn apply_to(&self, cfg: &mut SerialConfig) {
        if let Some(name) = self.port_name.as_deref().filter(|n| !n.is_empty()) {
            cfg.port_name = name.to_string();
        }
        if let Some(baud) = self.baud_rate.and_then(|b| u32::try_from(b).ok()) {
            cfg.baud_rate = baud;
        }
        if let Some(bits) = self.data_bits.and_then(|b| u8::try_from(b).ok()) {
            cfg.data_bits = bits;
        }
        if let Some(parity) = self.parity {
            cfg.parity = parity;
        }
        if let Some(bits) = self.stop_bits.and_then(|b| u8::try_from(b).ok()) {
            cfg.stop_bits = bits;
        }
        if let Some(flow) = self.flow_control {
            cfg.flow_control = flow;
        }
    }
}

impl From<SerialConfig> for SerialConfigUpdate {
    fn from(cfg: SerialConfig) -> Self {
        Self {
            port_name: Some(cfg.port_name),
            baud_rate: Some(i64::from(cfg.baud_rate)),
            data_bits: Some(i64::from(cfg.data_bits)),
            parity: Some(cfg.parity),
            stop_bits: Some(i64::from(cfg.stop_bits)),
            flow_control: Some(cfg.flow_control),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid baud rate: {0}")]
    InvalidBaudRate(i64),

    #[error("invalid data bits: {0} (must be 5-8)")]
    InvalidDataBits(i64),

    #[error("invalid stop bits: {0} (must be 1 or 2)")]
    InvalidStopBits(i64),

    #[error("settings error: {0}")]
    Settings(#[from] Box<figment::Error>),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
