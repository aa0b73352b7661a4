use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::DaemonError;
use crate::mode::{ModeLabel, ProcessMode, ProcessModeTable};

pub const DEFAULT_PORT: &str = "COM6";
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_DATA_BITS: u8 = 8;
pub const DEFAULT_IDLE_MODE: &str = "off";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Processes tracked when the config file has no `[[processes]]` entries.
const DEFAULT_PROCESSES: &[(&str, &str)] = &[
    ("hl.exe", "orange"),
    ("bms.exe", "orange"),
    ("hl2.exe", "orange"),
];

/// Root configuration structure, as written in config.toml.
/// Validated once at startup into [`Settings`].
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    /// Mode sent at startup and whenever no tracked process is running.
    #[serde(default = "default_idle_mode")]
    pub idle_mode: String,
    /// Seconds to sleep between process snapshots.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Enables per-poll diagnostic logging.
    #[serde(default)]
    pub verbose: bool,
    /// Tracked processes in priority order; the first running one wins.
    #[serde(default = "default_processes")]
    pub processes: Vec<ProcessEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            idle_mode: default_idle_mode(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            verbose: false,
            processes: default_processes(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SerialConfig {
    /// Port name, e.g. "COM6" or "/dev/ttyACM0".
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Bits per character, 5 through 8.
    #[serde(default = "default_data_bits")]
    pub data_bits: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DEFAULT_DATA_BITS,
        }
    }
}

/// One `[[processes]]` table.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessEntry {
    /// Executable name exactly as it appears in the OS process list.
    pub name: String,
    pub mode: String,
}

/// Serial parameters the channel is opened with. Parity, stop bits and the
/// read timeout are fixed by the channel itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
}

/// Immutable runtime configuration handed to the mode loop.
#[derive(Debug, Clone)]
pub struct Settings {
    pub serial: SerialSettings,
    pub idle_mode: ModeLabel,
    pub poll_interval: Duration,
    pub verbose: bool,
    pub table: ProcessModeTable,
}

impl Config {
    /// Checks every value and converts the file representation into [`Settings`].
    pub fn into_settings(self) -> Result<Settings, DaemonError> {
        if self.serial.port.trim().is_empty() {
            return Err(DaemonError::Config("serial.port must not be empty".into()));
        }
        if self.serial.baud_rate == 0 {
            return Err(DaemonError::Config("serial.baud_rate must be positive".into()));
        }
        let data_bits = data_bits_from(self.serial.data_bits)?;
        if self.poll_interval_secs == 0 {
            return Err(DaemonError::Config("poll_interval_secs must be positive".into()));
        }

        let idle_mode = ModeLabel::new(&self.idle_mode)?;
        let entries = self
            .processes
            .into_iter()
            .map(|entry| {
                if entry.name.is_empty() {
                    return Err(DaemonError::Config("process name must not be empty".into()));
                }
                Ok(ProcessMode {
                    mode: ModeLabel::new(&entry.mode)?,
                    process_name: entry.name,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Settings {
            serial: SerialSettings {
                port: self.serial.port,
                baud_rate: self.serial.baud_rate,
                data_bits,
            },
            idle_mode,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            verbose: self.verbose,
            table: ProcessModeTable::new(entries),
        })
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn data_bits_from(bits: u8) -> Result<serialport::DataBits, DaemonError> {
    match bits {
        5 => Ok(serialport::DataBits::Five),
        6 => Ok(serialport::DataBits::Six),
        7 => Ok(serialport::DataBits::Seven),
        8 => Ok(serialport::DataBits::Eight),
        other => Err(DaemonError::Config(format!(
            "serial.data_bits must be between 5 and 8, got {other}"
        ))),
    }
}

fn default_port() -> String {
    DEFAULT_PORT.to_string()
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_data_bits() -> u8 {
    DEFAULT_DATA_BITS
}

fn default_idle_mode() -> String {
    DEFAULT_IDLE_MODE.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_processes() -> Vec<ProcessEntry> {
    DEFAULT_PROCESSES
        .iter()
        .map(|(name, mode)| ProcessEntry {
            name: name.to_string(),
            mode: mode.to_string(),
        })
        .collect()
}
