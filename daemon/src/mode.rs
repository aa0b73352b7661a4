/// Display modes and the priority table that maps running processes onto them.
///
/// A mode is sent to the microcontroller as its raw ASCII bytes with no framing,
/// so every label must be non-empty ASCII without line terminators.
use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// Names of the processes observed in a single snapshot.
pub type ProcessNameSet = HashSet<String>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModeLabelError {
    #[error("mode label is empty")]
    Empty,
    #[error("mode label {0:?} contains non-ASCII characters")]
    NonAscii(String),
    #[error("mode label {0:?} contains a line terminator")]
    LineTerminator(String),
}

/// A short ASCII token identifying a display mode (e.g. "off", "orange").
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModeLabel(String);

impl ModeLabel {
    pub fn new(label: &str) -> Result<Self, ModeLabelError> {
        if label.is_empty() {
            return Err(ModeLabelError::Empty);
        }
        if !label.is_ascii() {
            return Err(ModeLabelError::NonAscii(label.to_string()));
        }
        if label.contains(['\r', '\n']) {
            return Err(ModeLabelError::LineTerminator(label.to_string()));
        }
        Ok(Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The exact payload written to the serial channel.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ModeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked process and the mode it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessMode {
    pub process_name: String,
    pub mode: ModeLabel,
}

/// Ordered process → mode table. Earlier entries take priority when several
/// tracked processes are running at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessModeTable {
    entries: Vec<ProcessMode>,
}

impl ProcessModeTable {
    pub fn new(entries: Vec<ProcessMode>) -> Self {
        Self { entries }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[ProcessMode] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the first entry whose process is in `names`, if any.
    pub fn first_match(&self, names: &ProcessNameSet) -> Option<&ProcessMode> {
        self.entries
            .iter()
            .find(|entry| names.contains(&entry.process_name))
    }

    /// Maps a process snapshot to the mode that should be displayed.
    /// Falls back to `idle` when no tracked process is running.
    pub fn resolve(&self, names: &ProcessNameSet, idle: &ModeLabel) -> ModeLabel {
        self.first_match(names)
            .map(|entry| entry.mode.clone())
            .unwrap_or_else(|| idle.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> ModeLabel {
        ModeLabel::new(s).unwrap()
    }

    fn names(list: &[&str]) -> ProcessNameSet {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn table(pairs: &[(&str, &str)]) -> ProcessModeTable {
        ProcessModeTable::new(
            pairs
                .iter()
                .map(|(name, mode)| ProcessMode {
                    process_name: name.to_string(),
                    mode: label(mode),
                })
                .collect(),
        )
    }

    // ── ModeLabel ─────────────────────────────────────────────────────────────

    #[test]
    fn label_accepts_plain_ascii() {
        let l = label("orange");
        assert_eq!(l.as_str(), "orange");
        assert_eq!(l.as_bytes(), b"orange");
        assert_eq!(l.to_string(), "orange");
    }

    #[test]
    fn label_rejects_empty() {
        assert_eq!(ModeLabel::new(""), Err(ModeLabelError::Empty));
    }

    #[test]
    fn label_rejects_non_ascii() {
        assert!(matches!(ModeLabel::new("grün"), Err(ModeLabelError::NonAscii(_))));
    }

    #[test]
    fn label_rejects_line_terminators() {
        assert!(matches!(ModeLabel::new("off\n"), Err(ModeLabelError::LineTerminator(_))));
        assert!(matches!(ModeLabel::new("o\rff"), Err(ModeLabelError::LineTerminator(_))));
    }

    // ── resolve ───────────────────────────────────────────────────────────────

    #[test]
    fn resolve_empty_snapshot_is_idle() {
        let t = table(&[("hl.exe", "orange")]);
        assert_eq!(t.resolve(&ProcessNameSet::new(), &label("off")), label("off"));
    }

    #[test]
    fn resolve_empty_table_is_idle() {
        let t = ProcessModeTable::default();
        assert_eq!(t.resolve(&names(&["hl.exe"]), &label("off")), label("off"));
    }

    #[test]
    fn resolve_untracked_processes_are_idle() {
        let t = table(&[("hl.exe", "orange"), ("bms.exe", "orange")]);
        let result = t.resolve(&names(&["explorer.exe", "svchost.exe"]), &label("off"));
        assert_eq!(result, label("off"));
    }

    #[test]
    fn resolve_single_match() {
        let t = table(&[("hl.exe", "orange"), ("steam.exe", "rainbow")]);
        let result = t.resolve(&names(&["explorer.exe", "steam.exe"]), &label("off"));
        assert_eq!(result, label("rainbow"));
    }

    #[test]
    fn resolve_first_table_entry_wins_when_several_run() {
        // Launcher and game running together: table order decides, not the snapshot.
        let t = table(&[("game.exe", "orange"), ("launcher.exe", "rainbow")]);
        let running = names(&["launcher.exe", "game.exe"]);
        assert_eq!(t.resolve(&running, &label("off")), label("orange"));

        let reversed = table(&[("launcher.exe", "rainbow"), ("game.exe", "orange")]);
        assert_eq!(reversed.resolve(&running, &label("off")), label("rainbow"));
    }

    #[test]
    fn resolve_duplicate_entries_use_earliest() {
        let t = table(&[("hl.exe", "orange"), ("hl.exe", "rainbow")]);
        assert_eq!(t.resolve(&names(&["hl.exe"]), &label("off")), label("orange"));
    }

    #[test]
    fn resolve_matches_exact_name_only() {
        let t = table(&[("hl.exe", "orange")]);
        assert_eq!(t.resolve(&names(&["HL.EXE"]), &label("off")), label("off"));
        assert_eq!(t.resolve(&names(&["hl.exe.bak"]), &label("off")), label("off"));
    }

    #[test]
    fn first_match_reports_entry() {
        let t = table(&[("hl.exe", "orange"), ("bms.exe", "orange")]);
        let entry = t.first_match(&names(&["bms.exe"])).unwrap();
        assert_eq!(entry.process_name, "bms.exe");
        assert!(t.first_match(&names(&["explorer.exe"])).is_none());
    }
}
