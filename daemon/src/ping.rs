/// Wiring check for the serial link.
///
/// Sends "ping", prints the controller's reply, then once per interval sends
/// the current local time and checks that the controller echoes it back.
/// Replies are newline-terminated, unlike mode writes, so this must run on
/// its own port instance and never alongside the mode loop.
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::channel::SerialChannel;
use crate::config::SerialSettings;
use crate::error::DaemonError;
use crate::monitor::pause;

pub const PING_PAYLOAD: &[u8] = b"ping";
pub const ECHO_INTERVAL: Duration = Duration::from_secs(1);

/// Running tally of echo round-trips.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EchoStats {
    pub sent: u64,
    pub matched: u64,
}

impl EchoStats {
    /// Records one round-trip and returns whether the reply matched.
    pub fn record(&mut self, tx: &str, rx: &str) -> bool {
        self.sent += 1;
        let ok = tx == rx;
        if ok {
            self.matched += 1;
        }
        ok
    }

    pub fn mismatched(&self) -> u64 {
        self.sent - self.matched
    }
}

/// Runs the echo check until `stop` flips to `true`.
pub async fn run(
    settings: &SerialSettings,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) -> Result<EchoStats, DaemonError> {
    let mut channel = SerialChannel::open(settings)?;
    info!("Found device at {}.", settings.port);

    channel
        .write_raw(PING_PAYLOAD)
        .map_err(|source| DaemonError::Write {
            payload: "ping".to_string(),
            source,
        })?;
    let reply = channel.read_line()?;
    info!("{reply}");

    let mut stats = EchoStats::default();
    let mut stop_open = true;
    loop {
        if *stop.borrow_and_update() {
            break;
        }

        let tx = chrono::Local::now()
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string();
        info!("TX \"{tx}\"");
        channel
            .write_raw(tx.as_bytes())
            .map_err(|source| DaemonError::Write {
                payload: tx.clone(),
                source,
            })?;

        let rx = channel.read_line()?;
        if stats.record(&tx, &rx) {
            info!("RX \"{rx}\" (RX == TX)");
        } else {
            warn!("RX \"{rx}\" (RX != TX) ERROR");
        }

        pause(interval, &mut stop, &mut stop_open).await;
    }

    info!(
        sent = stats.sent,
        mismatched = stats.mismatched(),
        "Echo check finished"
    );
    Ok(stats)
}
