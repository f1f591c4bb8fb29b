use crate::error::WindowError;
use crate::storage::{read_json_or_default, write_json_logged};
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// A time-of-day interval during which play is allowed. Both ends are
/// inclusive; `start > end` means the window runs past midnight.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccessWindow {
    pub(crate) start_hour: u32,
    pub(crate) start_min: u32,
    pub(crate) end_hour: u32,
    pub(crate) end_min: u32,
}

impl AccessWindow {
    pub(crate) fn new(
        start_hour: u32,
        start_min: u32,
        end_hour: u32,
        end_min: u32,
    ) -> Result<Self, WindowError> {
        check_range("start hour", start_hour, 23)?;
        check_range("start minute", start_min, 59)?;
        check_range("end hour", end_hour, 23)?;
        check_range("end minute", end_min, 59)?;
        Ok(Self {
            start_hour,
            start_min,
            end_hour,
            end_min,
        })
    }

    fn start(&self) -> u32 {
        self.start_hour * 60 + self.start_min
    }

    fn end(&self) -> u32 {
        self.end_hour * 60 + self.end_min
    }

    pub(crate) fn contains(&self, now: NaiveTime) -> bool {
        let now = now.hour() * 60 + now.minute();
        let (start, end) = (self.start(), self.end());
        if start <= end {
            start <= now && now <= end
        } else {
            now >= start || now <= end
        }
    }
}

fn check_range(field: &'static str, value: u32, max: u32) -> Result<(), WindowError> {
    if value <= max {
        Ok(())
    } else {
        Err(WindowError::Range { field, value })
    }
}

impl FromStr for AccessWindow {
    type Err = WindowError;

    /// Parses `H:M-H:M` with one or two digits per field.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || WindowError::Format(s.to_string());
        let (from, to) = s.trim().split_once('-').ok_or_else(bad)?;
        let (sh, sm) = parse_clock(from).ok_or_else(bad)?;
        let (eh, em) = parse_clock(to).ok_or_else(bad)?;
        AccessWindow::new(sh, sm, eh, em)
    }
}

fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    Some((parse_field(h)?, parse_field(m)?))
}

fn parse_field(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for AccessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_hour, self.start_min, self.end_hour, self.end_min
        )
    }
}

/// No windows at all means no restriction.
pub(crate) fn can_access(windows: &[AccessWindow], now: NaiveTime) -> bool {
    windows.is_empty() || windows.iter().any(|w| w.contains(now))
}

pub(crate) struct AccessStore {
    path: PathBuf,
}

impl AccessStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn load(&self) -> Vec<AccessWindow> {
        read_json_or_default(&self.path)
    }

    pub(crate) fn append(&self, window: AccessWindow) {
        let mut windows = self.load();
        windows.push(window);
        write_json_logged(&self.path, &windows);
        tracing::info!(%window, total = windows.len(), "access window added");
    }

    pub(crate) fn can_access_at(&self, now: NaiveTime) -> bool {
        can_access(&self.load(), now)
    }
}
