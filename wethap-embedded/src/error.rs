use core::fmt;

/// Failures a task recovers from by retrying on its own cadence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    NetworkUnavailable,
    NetworkError,
    LinkError,
    HandshakeClosed,
    HandshakeTimeout,
    IdleTimeout,
    NotConnected,
    SerializationError,
    InvalidMessage,
    TimeSyncFailed,
    StorageError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NetworkUnavailable => write!(f, "Network unavailable"),
            Error::NetworkError => write!(f, "Network error"),
            Error::LinkError => write!(f, "Link error"),
            Error::HandshakeClosed => write!(f, "Link closed during handshake"),
            Error::HandshakeTimeout => write!(f, "Handshake timed out"),
            Error::IdleTimeout => write!(f, "No traffic within idle timeout"),
            Error::NotConnected => write!(f, "Not connected"),
            Error::SerializationError => write!(f, "Serialization error"),
            Error::InvalidMessage => write!(f, "Invalid message"),
            Error::TimeSyncFailed => write!(f, "Time sync failed"),
            Error::StorageError => write!(f, "Storage error"),
        }
    }
}

/// Faults the supervisor answers with a board reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalDeviceError {
    SensorMissing,
    SensorFailure,
    InvalidConfig(&'static str),
}

impl fmt::Display for FatalDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalDeviceError::SensorMissing => write!(f, "No sensor detected"),
            FatalDeviceError::SensorFailure => write!(f, "Sensor read failed"),
            FatalDeviceError::InvalidConfig(field) => write!(f, "Invalid config: {}", field),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Recoverable(Error),
    Fatal(FatalDeviceError),
}

impl From<Error> for Fault {
    fn from(e: Error) -> Self {
        Fault::Recoverable(e)
    }
}

impl From<FatalDeviceError> for Fault {
    fn from(e: FatalDeviceError) -> Self {
        Fault::Fatal(e)
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Recoverable(e) => e.fmt(f),
            Fault::Fatal(e) => write!(f, "fatal: {}", e),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;
