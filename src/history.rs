use crate::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

// Durable log of command texts the operator sent through the executor,
// distinct from the conversation context. Capped; rewritten on every
// mutation so an abrupt exit loses nothing.
pub struct SessionHistory {
    entries: Vec<String>,
    cap: usize,
    path: PathBuf,
}

impl SessionHistory {
    pub fn load(path: PathBuf, cap: usize) -> Self {
        let mut entries: Vec<String> = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        if entries.len() > cap {
            entries.drain(..entries.len() - cap);
        }
        Self { entries, cap, path }
    }

    // Appends and persists. A write failure degrades the session to
    // in-memory history instead of ending it.
    pub fn record(&mut self, command: impl Into<String>) {
        self.entries.push(command.into());
        if self.entries.len() > self.cap {
            self.entries.drain(..self.entries.len() - self.cap);
        }
        if let Err(e) = self.save() {
            warn!("history not persisted: {e}");
        }
    }

    // Whole-file rewrite through a sibling temp file so a crash mid-write
    // never truncates the log.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_persist_and_reload_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = SessionHistory::load(path.clone(), 20);
        history.record("df -h");
        history.record("uptime");
        drop(history);

        let reloaded = SessionHistory::load(path, 20);
        assert_eq!(reloaded.entries(), &["df -h", "uptime"]);
    }

    #[test]
    fn overflow_drops_the_oldest_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = SessionHistory::load(path.clone(), 3);
        for i in 0..5 {
            history.record(format!("cmd {i}"));
        }
        assert_eq!(history.entries(), &["cmd 2", "cmd 3", "cmd 4"]);

        let reloaded = SessionHistory::load(path, 3);
        assert_eq!(reloaded.entries(), &["cmd 2", "cmd 3", "cmd 4"]);
    }

    #[test]
    fn reload_with_a_smaller_cap_keeps_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let mut history = SessionHistory::load(path.clone(), 10);
        for i in 0..6 {
            history.record(format!("cmd {i}"));
        }
        drop(history);

        let reloaded = SessionHistory::load(path, 4);
        assert_eq!(reloaded.entries(), &["cmd 2", "cmd 3", "cmd 4", "cmd 5"]);
    }

    #[test]
    fn missing_or_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = SessionHistory::load(dir.path().join("none.json"), 5);
        assert!(missing.entries().is_empty());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "not json").unwrap();
        let corrupt = SessionHistory::load(bad, 5);
        assert!(corrupt.entries().is_empty());
    }
}
