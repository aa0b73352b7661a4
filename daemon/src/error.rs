use thiserror::Error;

use crate::mode::ModeLabelError;

/// Fatal daemon errors. None of these are retried; `main` reports the cause and exits.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid mode label in configuration: {0}")]
    Mode(#[from] ModeLabelError),

    #[error("could not open serial port {port}: {source}")]
    ChannelOpen {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("could not enumerate running processes: {0}")]
    Snapshot(String),

    #[error("failed to write {payload:?} to serial port: {source}")]
    Write {
        payload: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read from serial port: {0}")]
    Read(#[source] std::io::Error),
}
