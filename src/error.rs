use thiserror::Error;

/// Rejected access-window input. Nothing is written when one of these is
/// returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum WindowError {
    #[error("expected HH:MM-HH:MM, got {0:?}")]
    Format(String),
    #[error("{field} out of range: {value}")]
    Range { field: &'static str, value: u32 },
}

/// Fixed-size slot or catalog access outside its bounds.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SlotError {
    #[error("slot {index} out of range (capacity {capacity})")]
    OutOfRange { index: usize, capacity: usize },
    #[error("no catalog entry at index {index} (catalog has {len})")]
    UnknownItem { index: usize, len: usize },
}

pub(crate) fn check_slot(index: usize, capacity: usize) -> Result<(), SlotError> {
    if index < capacity {
        Ok(())
    } else {
        Err(SlotError::OutOfRange { index, capacity })
    }
}
