use super::{Result, SerialError};

/// Lists the serial ports currently visible to the host.
pub trait PortEnumerator: Send + Sync {
    fn list(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortEnumerator;

impl PortEnumerator for SystemPortEnumerator {
    fn list(&self) -> Result<Vec<String>> {
        let ports = serialport::available_ports().map_err(SerialError::Enumeration)?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

/// List ports for diagnostics, falling back to an empty list on failure.
pub fn list_or_empty(enumerator: &dyn PortEnumerator) -> Vec<String> {
    match enumerator.list() {
        Ok(ports) => {
            log::info!("Available ports: {:?}", ports);
            ports
        }
        Err(e) => {
            log::warn!("Error listing ports: {}", e);
            Vec::new()
        }
    }
}
