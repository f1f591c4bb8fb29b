use crate::error::{check_slot, SlotError};
use crate::model::{Food, FoodKind, Gift, GiftKind, Pet};
use crate::storage::{read_json_or_default, write_json_logged};
use std::path::PathBuf;

pub(crate) const INVENTORY_SLOTS: usize = 6;

/// Six food slots and six gift slots; `None` is an empty slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Inventory {
    pub(crate) food: [Option<Food>; INVENTORY_SLOTS],
    pub(crate) gifts: [Option<Gift>; INVENTORY_SLOTS],
}

impl Inventory {
    pub(crate) fn add_food(&mut self, food: Food) -> bool {
        fill_first_empty(&mut self.food, food)
    }

    pub(crate) fn add_gift(&mut self, gift: Gift) -> bool {
        fill_first_empty(&mut self.gifts, gift)
    }

    pub(crate) fn remove_food(&mut self, index: usize) -> Result<(), SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        self.food[index] = None;
        Ok(())
    }

    pub(crate) fn remove_gift(&mut self, index: usize) -> Result<(), SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        self.gifts[index] = None;
        Ok(())
    }

    /// Feed the pet from a slot. Returns whether anything was eaten.
    pub(crate) fn give_food(&mut self, index: usize, pet: &mut Pet) -> Result<bool, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        let Some(food) = self.food[index].take() else {
            return Ok(false);
        };
        pet.fullness += food.rating;
        pet.clamp_stats();
        Ok(true)
    }

    pub(crate) fn give_gift(&mut self, index: usize, pet: &mut Pet) -> Result<bool, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        let Some(gift) = self.gifts[index].take() else {
            return Ok(false);
        };
        pet.happiness += gift.rating;
        pet.clamp_stats();
        Ok(true)
    }

    pub(crate) fn is_food_slot_empty(&self, index: usize) -> Result<bool, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        Ok(self.food[index].is_none())
    }

    pub(crate) fn is_gift_slot_empty(&self, index: usize) -> Result<bool, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        Ok(self.gifts[index].is_none())
    }

    pub(crate) fn food_kind_at(&self, index: usize) -> Result<Option<FoodKind>, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        Ok(self.food[index].and_then(|f| f.kind))
    }

    pub(crate) fn gift_kind_at(&self, index: usize) -> Result<Option<GiftKind>, SlotError> {
        check_slot(index, INVENTORY_SLOTS)?;
        Ok(self.gifts[index].and_then(|g| g.kind))
    }

    pub(crate) fn first_food(&self) -> Option<usize> {
        self.food.iter().position(Option::is_some)
    }

    pub(crate) fn first_gift(&self) -> Option<usize> {
        self.gifts.iter().position(Option::is_some)
    }
}

fn fill_first_empty<T>(slots: &mut [Option<T>], item: T) -> bool {
    match slots.iter_mut().find(|s| s.is_none()) {
        Some(slot) => {
            *slot = Some(item);
            true
        }
        None => false,
    }
}

/// Pads or truncates a loaded array to exactly `N` slots.
pub(crate) fn into_slots<T, const N: usize>(loaded: Vec<Option<T>>) -> [Option<T>; N] {
    let mut it = loaded.into_iter();
    std::array::from_fn(|_| it.next().flatten())
}

/// Food and gifts live in two separate JSON arrays.
pub(crate) struct InventoryStore {
    food_path: PathBuf,
    gift_path: PathBuf,
}

impl InventoryStore {
    pub(crate) fn new(food_path: PathBuf, gift_path: PathBuf) -> Self {
        Self {
            food_path,
            gift_path,
        }
    }

    pub(crate) fn load(&self) -> Inventory {
        let food: Vec<Option<Food>> = read_json_or_default(&self.food_path);
        let gifts: Vec<Option<Gift>> = read_json_or_default(&self.gift_path);
        Inventory {
            food: into_slots(food),
            gifts: into_slots(gifts),
        }
    }

    pub(crate) fn save(&self, inv: &Inventory) {
        write_json_logged(&self.food_path, &inv.food);
        write_json_logged(&self.gift_path, &inv.gifts);
    }
}
