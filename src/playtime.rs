use crate::storage::{read_json_or_default, write_json_logged};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// A span of play, in milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Playtime(pub(crate) u64);

impl fmt::Display for Playtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / 1000;
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;
        write!(
            f,
            "{days} days, {hours:02} hours, {minutes:02} minutes, {seconds:02} seconds"
        )
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
struct Entry {
    duration: u64,
}

/// Append-only log of finished sessions.
pub(crate) struct PlaytimeLog {
    path: PathBuf,
}

impl PlaytimeLog {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn entries(&self) -> Vec<Entry> {
        read_json_or_default(&self.path)
    }

    pub(crate) fn append(&self, duration_ms: u64) {
        let mut entries = self.entries();
        entries.push(Entry {
            duration: duration_ms,
        });
        write_json_logged(&self.path, &entries);
        tracing::debug!(duration_ms, sessions = entries.len(), "playtime recorded");
    }

    /// Sum of every logged session plus the one in progress, if any.
    pub(crate) fn total(&self, current_ms: Option<u64>) -> Playtime {
        let logged: u64 = self.entries().iter().map(|e| e.duration).sum();
        Playtime(logged.saturating_add(current_ms.unwrap_or(0)))
    }

    /// Mean session length. A session in progress counts as one more session.
    pub(crate) fn average(&self, current_ms: Option<u64>) -> Playtime {
        let entries = self.entries();
        let count = entries.len() as u64 + u64::from(current_ms.is_some());
        if count == 0 {
            return Playtime::default();
        }
        let sum: u64 = entries.iter().map(|e| e.duration).sum();
        Playtime(sum.saturating_add(current_ms.unwrap_or(0)) / count)
    }
}
