use crate::error::{check_slot, SlotError};
use crate::inventory::into_slots;
use crate::model::Pet;
use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::Path, path::PathBuf};

pub(crate) const ROSTER_SLOTS: usize = 3;

/// Missing and corrupt files both read as "nothing stored yet".
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let s = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "store not readable, starting empty");
            return T::default();
        }
    };
    match serde_json::from_str::<T>(&s) {
        Ok(v) => v,
        Err(err) => {
            tracing::debug!(path = %path.display(), %err, "store not parseable, starting empty");
            T::default()
        }
    }
}

pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // rename over an existing file fails on Windows
    if cfg!(windows) && to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}

/// Fire-and-forget write: failures are logged, never retried or returned.
pub(crate) fn write_json_logged<T: Serialize + ?Sized>(path: &Path, value: &T) {
    if let Err(err) = write_json_atomic(path, value) {
        tracing::warn!(path = %path.display(), error = %err, "failed to write store");
    }
}

/// Up to three pets, addressed by slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PetRoster {
    slots: [Option<Pet>; ROSTER_SLOTS],
}

impl PetRoster {
    pub(crate) fn slots(&self) -> &[Option<Pet>; ROSTER_SLOTS] {
        &self.slots
    }

    pub(crate) fn get(&self, index: usize) -> Result<Option<&Pet>, SlotError> {
        check_slot(index, ROSTER_SLOTS)?;
        Ok(self.slots[index].as_ref())
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Result<Option<&mut Pet>, SlotError> {
        check_slot(index, ROSTER_SLOTS)?;
        Ok(self.slots[index].as_mut())
    }

    pub(crate) fn put(&mut self, index: usize, pet: Pet) -> Result<(), SlotError> {
        check_slot(index, ROSTER_SLOTS)?;
        self.slots[index] = Some(pet);
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<Option<Pet>, SlotError> {
        check_slot(index, ROSTER_SLOTS)?;
        Ok(self.slots[index].take())
    }

    pub(crate) fn find_by_name(&self, name: &str) -> Option<&Pet> {
        self.slots.iter().flatten().find(|p| p.name == name)
    }

    pub(crate) fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.name == name))
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.find_by_name(name).is_some()
    }
}

/// The whole roster is one JSON array, overwritten on every save.
pub(crate) struct PetStore {
    path: PathBuf,
}

impl PetStore {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub(crate) fn load(&self) -> PetRoster {
        let mut loaded: Vec<Option<Pet>> = read_json_or_default(&self.path);
        // hand-edited records may sit outside the species bounds
        for pet in loaded.iter_mut().flatten() {
            pet.clamp_stats();
        }
        PetRoster {
            slots: into_slots(loaded),
        }
    }

    pub(crate) fn save(&self, roster: &PetRoster) {
        write_json_logged(&self.path, &roster.slots);
    }
}
