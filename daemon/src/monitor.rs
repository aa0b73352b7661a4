use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::channel::ModeChannel;
use crate::error::DaemonError;
use crate::mode::{ModeLabel, ProcessModeTable};
use crate::snapshot::ProcessSnapshot;

/// Polls running processes and pushes the resolved mode to the channel,
/// writing only when the mode actually changes.
///
/// `current` always equals the last mode written to the channel.
pub struct ModeMonitor<S, C> {
    table: ProcessModeTable,
    idle: ModeLabel,
    current: ModeLabel,
    snapshot: S,
    channel: C,
}

impl<S: ProcessSnapshot, C: ModeChannel> ModeMonitor<S, C> {
    /// Writes the idle mode unconditionally so the controller starts from a
    /// known state, whatever it was showing before.
    pub fn start(
        table: ProcessModeTable,
        idle: ModeLabel,
        snapshot: S,
        mut channel: C,
    ) -> Result<Self, DaemonError> {
        channel.write_mode(&idle)?;
        Ok(Self {
            table,
            current: idle.clone(),
            idle,
            snapshot,
            channel,
        })
    }

    #[cfg(test)]
    pub fn current(&self) -> &ModeLabel {
        &self.current
    }

    /// Takes one snapshot and switches mode if needed.
    /// Returns the new mode when a write happened.
    pub fn poll(&mut self) -> Result<Option<ModeLabel>, DaemonError> {
        let names = self.snapshot.snapshot()?;
        debug!(processes = names.len(), "Got running processes");

        match self.table.first_match(&names) {
            Some(entry) => {
                debug!(process = %entry.process_name, mode = %entry.mode, "Found tracked process")
            }
            None => debug!("No tracked process found"),
        }
        let next = self.table.resolve(&names, &self.idle);

        if next == self.current {
            return Ok(None);
        }

        info!("Switching mode: {} -> {}", self.current, next);
        self.channel.write_mode(&next)?;
        self.current = next.clone();
        Ok(Some(next))
    }

    /// Polls every `interval` until `stop` flips to `true`.
    ///
    /// The stop flag is only checked between polls, so a write is never cut
    /// short. Returns `Ok(())` on cancellation; any snapshot or write error
    /// ends the loop. A dropped sender is not a stop request: no stop can
    /// arrive any more, so polling just continues.
    pub async fn run(
        &mut self,
        interval: Duration,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), DaemonError> {
        info!("Watching processes...");
        let mut stop_open = true;
        loop {
            if *stop.borrow_and_update() {
                return Ok(());
            }

            self.poll()?;

            pause(interval, &mut stop, &mut stop_open).await;
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (S, C) {
        (self.snapshot, self.channel)
    }
}

/// Waits `interval`, returning early if a stop request arrives.
///
/// A closed channel is not a stop request. It clears `stop_open` and the full
/// interval is still waited, so callers keep their pace.
pub async fn pause(interval: Duration, stop: &mut watch::Receiver<bool>, stop_open: &mut bool) {
    tokio::select! {
        _ = tokio::time::sleep(interval) => {}
        res = stop.changed(), if *stop_open => {
            if res.is_err() {
                warn!("Stop signal source went away; only a fatal error will end the loop now");
                *stop_open = false;
                tokio::time::sleep(interval).await;
            }
        }
    }
}
