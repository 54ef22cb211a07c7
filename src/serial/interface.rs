use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, SerialPort, StopBits};

use crate::config::{FlowControl, Parity, SerialConfig};

/// Bound applied to blocking writes until the session sets its read timeout.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// An opened serial port, owned by exactly one send operation.
///
/// Dropping the link closes the port.
pub trait SerialLink: Send {
    fn name(&self) -> &str;

    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    fn flush(&mut self) -> io::Result<()>;

    fn set_read_timeout(&mut self, timeout: Duration) -> serialport::Result<()>;

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
}

/// Opens a port by name with the given line parameters.
pub trait PortOpener: Send + Sync {
    fn open(&self, port_name: &str, config: &SerialConfig) -> serialport::Result<Box<dyn SerialLink>>;
}

/// [`PortOpener`] backed by the host's serial ports.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(&self, port_name: &str, config: &SerialConfig) -> serialport::Result<Box<dyn SerialLink>> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(data_bits(config.data_bits))
            .parity(parity(config.parity))
            .stop_bits(stop_bits(config.stop_bits))
            .flow_control(flow_control(config.flow_control))
            .timeout(WRITE_TIMEOUT)
            .open()?;

        Ok(Box::new(SystemLink {
            port,
            name: port_name.to_string(),
        }))
    }
}

struct SystemLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink for SystemLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.port.set_timeout(timeout)
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        self.port.read(buffer)
    }
}

impl Drop for SystemLink {
    fn drop(&mut self) {
        log::debug!("Closing serial port {}", self.name);
    }
}

pub(crate) fn data_bits(bits: u8) -> DataBits {
    match bits {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

pub(crate) fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
        Parity::None => serialport::Parity::None,
    }
}

pub(crate) fn stop_bits(bits: u8) -> StopBits {
    if bits == 2 {
        StopBits::Two
    } else {
        StopBits::One
    }
}

pub(crate) fn flow_control(flow: FlowControl) -> serialport::FlowControl {
    match flow {
        FlowControl::None => serialport::FlowControl::None,
        FlowControl::RtsCts => serialport::FlowControl::Hardware,
        FlowControl::XonXoff => serialport::FlowControl::Software,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_parameter_mapping() {
        assert_eq!(data_bits(5), DataBits::Five);
        assert_eq!(data_bits(7), DataBits::Seven);
        assert_eq!(data_bits(8), DataBits::Eight);
        assert_eq!(parity(Parity::Even), serialport::Parity::Even);
        assert_eq!(parity(Parity::Odd), serialport::Parity::Odd);
        assert_eq!(parity(Parity::None), serialport::Parity::None);
        assert_eq!(stop_bits(2), StopBits::Two);
        assert_eq!(stop_bits(1), StopBits::One);
        assert_eq!(flow_control(FlowControl::RtsCts), serialport::FlowControl::Hardware);
        assert_eq!(flow_control(FlowControl::XonXoff), serialport::FlowControl::Software);
    }

    #[test]
    fn test_open_missing_port_fails() {
        let result = SystemPortOpener.open("/dev/cosirob-does-not-exist", &SerialConfig::default());
        assert!(result.is_err());
    }
}
