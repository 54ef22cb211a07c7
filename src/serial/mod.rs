pub mod interface;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod normalize;
pub mod opener;
pub mod ports;
pub mod resolver;
pub mod session;

pub use interface::{PortOpener, SerialLink, SystemPortOpener};
pub use normalize::normalize_line_endings;
pub use opener::open_available_port;
pub use ports::{PortEnumerator, SystemPortEnumerator};
pub use resolver::build_port_list;
pub use session::{SerialResult, SerialTransport};

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("no port available: {last}")]
    NoPortAvailable {
        #[source]
        last: Box<SerialError>,
    },

    #[error("no port available: no candidate ports to try")]
    NoCandidates,

    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("failed to write to serial port: {0}")]
    Write(#[source] std::io::Error),

    #[error("port enumeration failed: {0}")]
    Enumeration(#[source] serialport::Error),
}

pub type Result<T> = std::result::Result<T, SerialError>;
