use crate::storage::{read_json_or_default, write_json_atomic};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) tick_ms: u64,
    pub(crate) autosave_secs: u64,
    pub(crate) enable_color: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            autosave_secs: 10,
            enable_color: true,
        }
    }
}

impl Settings {
    pub(crate) fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(10))
    }

    pub(crate) fn autosave_every(&self) -> Duration {
        Duration::from_secs(self.autosave_secs.max(1))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Paths {
    pub(crate) dir: PathBuf,
    pub(crate) settings_path: PathBuf,
    pub(crate) pets_path: PathBuf,
    pub(crate) food_path: PathBuf,
    pub(crate) gifts_path: PathBuf,
    pub(crate) access_path: PathBuf,
    pub(crate) playtime_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

impl Paths {
    pub(crate) fn in_dir(dir: PathBuf) -> Self {
        Self {
            settings_path: dir.join("settings.json"),
            pets_path: dir.join("pets.json"),
            food_path: dir.join("food.json"),
            gifts_path: dir.join("gifts.json"),
            access_path: dir.join("access.json"),
            playtime_path: dir.join("playtime.json"),
            log_path: dir.join("petpal.log"),
            dir,
        }
    }
}

/// Resolve the data directory: an explicit override wins, otherwise the
/// platform's local data dir.
pub(crate) fn project_paths(data_dir: Option<PathBuf>) -> Result<Paths> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => ProjectDirs::from("com", "petpal", "Petpal")
            .context("could not resolve project directories")?
            .data_local_dir()
            .to_path_buf(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create data dir {}", dir.display()))?;
    Ok(Paths::in_dir(dir))
}

pub(crate) fn load_settings(path: &Path) -> Settings {
    read_json_or_default(path)
}

pub(crate) fn save_settings(path: &Path, s: &Settings) -> Result<()> {
    write_json_atomic(path, s).with_context(|| format!("could not write {}", path.display()))
}
