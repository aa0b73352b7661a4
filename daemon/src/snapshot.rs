use sysinfo::{ProcessesToUpdate, System};

use crate::error::DaemonError;
use crate::mode::ProcessNameSet;

/// Source of point-in-time process listings.
pub trait ProcessSnapshot {
    /// Returns the names of all processes running right now.
    fn snapshot(&mut self) -> Result<ProcessNameSet, DaemonError>;
}

/// Process listing backed by `sysinfo`. Keeps one `System` alive so refreshes
/// only update what changed.
pub struct SystemSnapshot {
    sys: System,
}

impl SystemSnapshot {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl ProcessSnapshot for SystemSnapshot {
    fn snapshot(&mut self) -> Result<ProcessNameSet, DaemonError> {
        // Dead processes must be dropped or an exited game would keep its mode.
        self.sys.refresh_processes(ProcessesToUpdate::All, true);

        let names: ProcessNameSet = self
            .sys
            .processes()
            .values()
            .map(|p| p.name().to_string_lossy().into_owned())
            .collect();

        // At minimum the daemon itself is running.
        if names.is_empty() {
            return Err(DaemonError::Snapshot(
                "process list is empty".to_string(),
            ));
        }
        Ok(names)
    }
}
