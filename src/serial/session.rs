use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::normalize::LINE_TERMINATOR;
use super::ports::list_or_empty;
use super::{
    build_port_list, normalize_line_endings, open_available_port, PortEnumerator, PortOpener, Result,
    SerialError, SerialLink, SystemPortEnumerator, SystemPortOpener,
};
use crate::config::SerialConfig;

/// How long to wait for the controller's reply after a write.
pub const READ_TIMEOUT: Duration = Duration::from_secs(2);
pub const REPLY_BUFFER_SIZE: usize = 1024;

/// Outcome of one send operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialResult {
    pub result: String,
    pub length: usize,
    pub serial_port: String,
    pub serial_written: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_reply: Option<String>,
}

/// Sends programs to the controller: resolves candidates, opens a port,
/// writes, reads one reply and closes the port again.
///
/// All methods block; call them from a blocking-capable thread.
#[derive(Clone)]
pub struct SerialTransport {
    opener: Arc<dyn PortOpener>,
    enumerator: Arc<dyn PortEnumerator>,
}

impl SerialTransport {
    pub fn new(opener: Arc<dyn PortOpener>, enumerator: Arc<dyn PortEnumerator>) -> Self {
        Self { opener, enumerator }
    }

    /// Transport over the host's real serial ports
    pub fn system() -> Self {
        Self::new(Arc::new(SystemPortOpener), Arc::new(SystemPortEnumerator))
    }

    pub fn list_ports(&self) -> Result<Vec<String>> {
        self.enumerator.list()
    }

    /// Send `program` using `config`.
    ///
    /// A non-empty `port_override` replaces `config.port_name` as the
    /// preferred port. Only open and write failures are errors; a missing
    /// reply is reported as `serial_reply: None`.
    pub fn send(&self, program: &str, config: &SerialConfig, port_override: Option<&str>) -> Result<SerialResult> {
        let ports = list_or_empty(self.enumerator.as_ref());

        log::info!(
            "Using serial config: Port={}, Baud={}, Data={}, Parity={:?}, Stop={}",
            config.port_name,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits
        );

        let preferred = port_override
            .filter(|p| !p.is_empty())
            .unwrap_or(&config.port_name);
        let try_ports = build_port_list(preferred, &ports);

        let (mut link, opened_port) = open_available_port(&try_ports, config, self.opener.as_ref())?;

        let payload = format!("{}{}", normalize_line_endings(program), LINE_TERMINATOR);
        log::info!("Writing to {} (baud={}): {:?}", opened_port, config.baud_rate, payload);

        let written = link.write(payload.as_bytes()).map_err(SerialError::Write)?;
        if let Err(e) = link.flush() {
            log::warn!("Failed to flush {}: {}", opened_port, e);
        }
        log::info!("Wrote {} bytes to {}", written, opened_port);

        let serial_reply = read_reply(link.as_mut());
        drop(link);

        Ok(SerialResult {
            result: "sent".to_string(),
            length: program.chars().count(),
            serial_port: opened_port,
            serial_written: written,
            serial_reply,
        })
    }
}

fn read_reply(link: &mut dyn SerialLink) -> Option<String> {
    if let Err(e) = link.set_read_timeout(READ_TIMEOUT) {
        log::warn!("Failed to set read timeout on {}: {}", link.name(), e);
        return None;
    }

    let mut buffer = [0u8; REPLY_BUFFER_SIZE];
    match link.read(&mut buffer) {
        Ok(0) => None,
        Ok(n) => {
            let reply = String::from_utf8_lossy(&buffer[..n]).into_owned();
            log::info!("Serial response: {:?}", reply);
            Some(reply)
        }
        Err(e) if e.kind() == ErrorKind::TimedOut => {
            log::debug!("No reply from {} within {:?}", link.name(), READ_TIMEOUT);
            None
        }
        Err(e) => {
            log::warn!("Failed to read reply from {}: {}", link.name(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::mock::{MockPortEnumerator, MockPortOpener};

    fn transport(opener: &MockPortOpener, enumerator: MockPortEnumerator) -> SerialTransport {
        SerialTransport::new(Arc::new(opener.clone()), Arc::new(enumerator))
    }

    #[test]
    fn test_send_writes_normalized_program() {
        let opener = MockPortOpener::new(&["COM1"]).with_reply(b"OK\r");
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));
        let program = "00 sp 50\r\n\r\n00 ho\n";

        let result = transport.send(program, &SerialConfig::default(), None).unwrap();

        assert_eq!(opener.written(), b"00 sp 50\r00 ho\r".to_vec());
        assert_eq!(result.result, "sent");
        assert_eq!(result.serial_port, "COM1");
        assert_eq!(result.serial_written, "00 sp 50\r00 ho\r".len());
        assert_eq!(result.length, program.chars().count());
        assert_eq!(result.serial_reply.as_deref(), Some("OK\r"));
        assert_eq!(opener.read_timeouts(), vec![READ_TIMEOUT]);
        assert_eq!(opener.closed_count(), 1);
    }

    #[test]
    fn test_length_counts_characters() {
        let opener = MockPortOpener::new(&["COM1"]);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));

        let result = transport.send("é\n", &SerialConfig::default(), None).unwrap();
        assert_eq!(result.length, 2);
        assert_eq!(result.serial_written, "é\r".len());
    }

    #[test]
    fn test_timeout_yields_no_reply() {
        let opener = MockPortOpener::new(&["COM1"]);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));

        let result = transport.send("00 rd 1", &SerialConfig::default(), None).unwrap();
        assert_eq!(result.serial_reply, None);

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("serial_reply").is_none());
        assert_eq!(opener.closed_count(), 1);
    }

    #[test]
    fn test_no_port_available() {
        let opener = MockPortOpener::new(&[]);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&["COM4"]));

        let err = transport.send("00 ho", &SerialConfig::default(), None).unwrap_err();
        assert!(matches!(err, SerialError::NoPortAvailable { .. }));
        assert!(opener.written().is_empty());
        assert_eq!(opener.attempts(), vec!["COM1", "COM2", "COM4"]);
        assert_eq!(opener.closed_count(), 0);
    }

    #[test]
    fn test_write_failure_closes_port() {
        let opener = MockPortOpener::new(&["COM1"]).with_failing_writes();
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));

        let err = transport.send("00 ho", &SerialConfig::default(), None).unwrap_err();
        assert!(matches!(err, SerialError::Write(_)));
        assert_eq!(opener.closed_count(), 1);
    }

    #[test]
    fn test_short_write_reported_verbatim() {
        let opener = MockPortOpener::new(&["COM1"]).with_short_writes(4);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));

        let result = transport.send("00 sp 50", &SerialConfig::default(), None).unwrap();
        assert_eq!(result.serial_written, 4);
        assert_eq!(opener.written(), b"00 s".to_vec());
    }

    #[test]
    fn test_override_takes_precedence() {
        let opener = MockPortOpener::new(&["COM7", "COM1"]);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&[]));

        let result = transport.send("00 ho", &SerialConfig::default(), Some("COM7")).unwrap();
        assert_eq!(result.serial_port, "COM7");
        assert_eq!(opener.attempts(), vec!["COM7"]);

        let result = transport.send("00 ho", &SerialConfig::default(), Some("")).unwrap();
        assert_eq!(result.serial_port, "COM1");
    }

    #[test]
    fn test_enumeration_failure_is_tolerated() {
        let opener = MockPortOpener::new(&["COM2"]);
        let transport = transport(&opener, MockPortEnumerator::failing());
        let config = SerialConfig {
            port_name: "COM3".to_string(),
            ..SerialConfig::default()
        };

        let result = transport.send("00 ho", &config, None).unwrap();
        assert_eq!(result.serial_port, "COM2");
        assert_eq!(opener.attempts(), vec!["COM3", "COM1", "COM2"]);
    }

    #[test]
    fn test_falls_back_to_enumerated_port() {
        let opener = MockPortOpener::new(&["/dev/ttyUSB0"]);
        let transport = transport(&opener, MockPortEnumerator::with_ports(&["/dev/ttyUSB0"]));
        let config = SerialConfig {
            port_name: "COM3".to_string(),
            baud_rate: 115200,
            ..SerialConfig::default()
        };

        let result = transport.send("00 ho", &config, None).unwrap();
        assert_eq!(result.serial_port, "/dev/ttyUSB0");
        assert_eq!(opener.opened_with(), vec![config]);
    }
}
