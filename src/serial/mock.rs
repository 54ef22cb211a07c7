//! In-memory port backends for exercising the transport without hardware.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{PortEnumerator, PortOpener, Result, SerialError, SerialLink};
use crate::config::SerialConfig;

#[derive(Debug, Default)]
struct MockState {
    attempts: Vec<String>,
    opened_with: Vec<SerialConfig>,
    written: Vec<u8>,
    read_timeouts: Vec<Duration>,
}

/// Opens only the ports it was told about; every opened link shares state
/// with the opener so tests can inspect writes and closes afterwards.
#[derive(Clone, Default)]
pub struct MockPortOpener {
    openable: Vec<String>,
    reply: Option<Vec<u8>>,
    fail_writes: bool,
    max_write: Option<usize>,
    state: Arc<Mutex<MockState>>,
    closed: Arc<AtomicUsize>,
}

impl MockPortOpener {
    pub fn new(openable: &[&str]) -> Self {
        Self {
            openable: openable.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Bytes returned by the first read on an opened link.
    pub fn with_reply(mut self, reply: &[u8]) -> Self {
        self.reply = Some(reply.to_vec());
        self
    }

    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Accept at most `max` bytes per write call.
    pub fn with_short_writes(mut self, max: usize) -> Self {
        self.max_write = Some(max);
        self
    }

    pub fn attempts(&self) -> Vec<String> {
        self.lock().attempts.clone()
    }

    pub fn opened_with(&self) -> Vec<SerialConfig> {
        self.lock().opened_with.clone()
    }

    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    pub fn read_timeouts(&self) -> Vec<Duration> {
        self.lock().read_timeouts.clone()
    }

    /// Number of links that have been dropped.
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PortOpener for MockPortOpener {
    fn open(&self, port_name: &str, config: &SerialConfig) -> serialport::Result<Box<dyn SerialLink>> {
        {
            let mut state = self.lock();
            state.attempts.push(port_name.to_string());
            if !self.openable.iter().any(|p| p == port_name) {
                return Err(serialport::Error::new(
                    serialport::ErrorKind::NoDevice,
                    format!("{port_name} not present"),
                ));
            }
            state.opened_with.push(config.clone());
        }

        Ok(Box::new(MockLink {
            name: port_name.to_string(),
            opener: self.clone(),
            pending_reply: self.reply.clone(),
        }))
    }
}

struct MockLink {
    name: String,
    opener: MockPortOpener,
    pending_reply: Option<Vec<u8>>,
}

impl SerialLink for MockLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if self.opener.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        let n = self.opener.max_write.map_or(data.len(), |max| data.len().min(max));
        self.opener.lock().written.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> serialport::Result<()> {
        self.opener.lock().read_timeouts.push(timeout);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match self.pending_reply.take() {
            Some(reply) => {
                let n = reply.len().min(buffer.len());
                buffer[..n].copy_from_slice(&reply[..n]);
                Ok(n)
            }
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "Operation timed out")),
        }
    }
}

impl Drop for MockLink {
    fn drop(&mut self) {
        self.opener.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fixed enumeration result.
#[derive(Debug, Clone, Default)]
pub struct MockPortEnumerator {
    ports: Option<Vec<String>>,
}

impl MockPortEnumerator {
    pub fn with_ports(ports: &[&str]) -> Self {
        Self {
            ports: Some(ports.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn failing() -> Self {
        Self { ports: None }
    }
}

impl PortEnumerator for MockPortEnumerator {
    fn list(&self) -> Result<Vec<String>> {
        self.ports.clone().ok_or_else(|| {
            SerialError::Enumeration(serialport::Error::new(
                serialport::ErrorKind::Unknown,
                "enumeration unavailable",
            ))
        })
    }
}
