use super::{PortOpener, Result, SerialError, SerialLink};
use crate::config::SerialConfig;

/// Try each candidate in order and return the first port that opens.
///
/// Blank names are skipped. When nothing opens, the error carries the last
/// underlying failure; earlier ones are only logged.
pub fn open_available_port(
    try_ports: &[String],
    config: &SerialConfig,
    opener: &dyn PortOpener,
) -> Result<(Box<dyn SerialLink>, String)> {
    let mut last_error: Option<SerialError> = None;

    for port_name in try_ports {
        if port_name.trim().is_empty() {
            log::warn!("Skipping empty port name");
            continue;
        }

        log::info!(
            "Attempting to open {} with baud={}, data={}, parity={:?}, stop={}",
            port_name,
            config.baud_rate,
            config.data_bits,
            config.parity,
            config.stop_bits
        );

        match opener.open(port_name, config) {
            Ok(link) => {
                log::info!("Successfully opened {} with baud rate {}", port_name, config.baud_rate);
                return Ok((link, port_name.clone()));
            }
            Err(source) => {
                log::warn!("Failed to open {}: {}", port_name, source);
                last_error = Some(SerialError::Open {
                    port: port_name.clone(),
                    source,
                });
            }
        }
    }

    match last_error {
        Some(last) => Err(SerialError::NoPortAvailable { last: Box::new(last) }),
        None => Err(SerialError::NoCandidates),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::mock::MockPortOpener;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_success_short_circuits() {
        let opener = MockPortOpener::new(&["COM2", "COM5"]);
        let (link, name) =
            open_available_port(&names(&["COM3", "COM2", "COM5"]), &SerialConfig::default(), &opener).unwrap();

        assert_eq!(name, "COM2");
        assert_eq!(link.name(), "COM2");
        assert_eq!(opener.attempts(), names(&["COM3", "COM2"]));
    }

    #[test]
    fn test_all_fail_reports_last_error() {
        let opener = MockPortOpener::new(&[]);
        let err = open_available_port(&names(&["COM3", "COM1"]), &SerialConfig::default(), &opener)
            .err()
            .unwrap();

        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert!(cause.is_some_and(|c| c.starts_with("failed to open COM1")));
        match err {
            SerialError::NoPortAvailable { last } => match *last {
                SerialError::Open { ref port, ref source } => {
                    assert_eq!(port, "COM1");
                    assert_eq!(source.kind, serialport::ErrorKind::NoDevice);
                }
                other => panic!("last failure should be an open error: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(opener.attempts(), names(&["COM3", "COM1"]));
    }

    #[test]
    fn test_empty_candidate_is_skipped() {
        let opener = MockPortOpener::new(&["COM1"]);
        let (_, name) = open_available_port(&names(&["", "COM1"]), &SerialConfig::default(), &opener).unwrap();

        assert_eq!(name, "COM1");
        assert_eq!(opener.attempts(), names(&["COM1"]));
    }

    #[test]
    fn test_only_empty_candidates() {
        let opener = MockPortOpener::new(&[]);
        let err = open_available_port(&names(&[""]), &SerialConfig::default(), &opener)
            .err()
            .unwrap();
        assert!(matches!(err, SerialError::NoCandidates));
        assert!(opener.attempts().is_empty());
    }
}
