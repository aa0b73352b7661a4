/// Serial link to the light controller.
///
/// Framing is fixed: even parity, one stop bit, no flow control and a one-second
/// timeout. Baud rate, data bits and the port name come from the config.
use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{FlowControl, Parity, SerialPort, StopBits};

use crate::config::SerialSettings;
use crate::error::DaemonError;
use crate::mode::ModeLabel;

pub const READ_TIMEOUT: Duration = Duration::from_secs(1);
/// Longest line `read_line` returns; the rest stays unread for the next call.
pub const MAX_LINE_LEN: usize = 256;

/// Write side of the link used by the mode loop. Exactly one owner writes.
pub trait ModeChannel {
    /// Sends the raw ASCII bytes of `mode`, unframed.
    fn write_mode(&mut self, mode: &ModeLabel) -> Result<(), DaemonError>;
}

pub struct SerialChannel {
    port: Box<dyn SerialPort>,
}

impl SerialChannel {
    /// Opens the configured port. There is no retry; a missing or busy port is fatal.
    pub fn open(settings: &SerialSettings) -> Result<Self, DaemonError> {
        let port = serialport::new(settings.port.as_str(), settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(Parity::Even)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| DaemonError::ChannelOpen {
                port: settings.port.clone(),
                source,
            })?;

        let mut channel = Self { port };
        channel
            .port
            .flush()
            .map_err(|source| DaemonError::ChannelOpen {
                port: settings.port.clone(),
                source: source.into(),
            })?;
        Ok(channel)
    }

    /// Writes `payload` as-is and flushes it out of the OS buffer.
    pub fn write_raw(&mut self, payload: &[u8]) -> io::Result<()> {
        self.port.write_all(payload)?;
        self.port.flush()
    }

    /// Reads one newline-terminated line, or whatever arrived before the timeout.
    pub fn read_line(&mut self) -> Result<String, DaemonError> {
        read_line_from(&mut self.port).map_err(DaemonError::Read)
    }
}

impl ModeChannel for SerialChannel {
    fn write_mode(&mut self, mode: &ModeLabel) -> Result<(), DaemonError> {
        self.write_raw(mode.as_bytes())
            .map_err(|source| DaemonError::Write {
                payload: mode.to_string(),
                source,
            })
    }
}

/// Reads bytes until `\n`, a timeout or [`MAX_LINE_LEN`] bytes, then strips
/// trailing CR/LF. A timeout is not an error: the partial line (possibly empty)
/// is returned.
pub fn read_line_from<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while line.len() < MAX_LINE_LEN {
        match reader.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    while line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
