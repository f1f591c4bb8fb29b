use crate::error::SlotError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Health lost the moment a pet collapses into sleep.
pub(crate) const COLLAPSE_PENALTY: i32 = 15;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Species {
    #[default]
    Default,
    Cat,
    Fox,
    Owl,
}

impl Species {
    /// Unknown names fall back to the default species.
    pub(crate) fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "cat" => Species::Cat,
            "fox" => Species::Fox,
            "owl" => Species::Owl,
            _ => Species::Default,
        }
    }

    pub(crate) fn maxima(self) -> VitalMax {
        match self {
            Species::Default => VitalMax {
                health: 50,
                happiness: 50,
                fullness: 50,
                sleep: 50,
            },
            Species::Cat => VitalMax {
                health: 50,
                happiness: 75,
                fullness: 100,
                sleep: 75,
            },
            Species::Fox => VitalMax {
                health: 75,
                happiness: 100,
                fullness: 75,
                sleep: 50,
            },
            Species::Owl => VitalMax {
                health: 100,
                happiness: 50,
                fullness: 75,
                sleep: 100,
            },
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Species::Default => "default",
            Species::Cat => "cat",
            Species::Fox => "fox",
            Species::Owl => "owl",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct VitalMax {
    pub(crate) health: i32,
    pub(crate) happiness: i32,
    pub(crate) fullness: i32,
    pub(crate) sleep: i32,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum PetState {
    #[default]
    Default,
    Asleep,
    Hungry,
    Angry,
    Dead,
}

impl fmt::Display for PetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PetState::Default => "default",
            PetState::Asleep => "asleep",
            PetState::Hungry => "hungry",
            PetState::Angry => "angry",
            PetState::Dead => "dead",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Pet {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) species: Species,
    pub(crate) health: i32,
    pub(crate) happiness: i32,
    pub(crate) fullness: i32,
    pub(crate) sleep: i32,
    #[serde(default)]
    pub(crate) state: PetState,
    #[serde(default)]
    pub(crate) score: i32,
    #[serde(default)]
    pub(crate) cooldown: i32,
}

impl Pet {
    pub(crate) fn new(name: impl Into<String>, species: Species) -> Self {
        let max = species.maxima();
        Self {
            name: name.into(),
            species,
            health: max.health,
            happiness: max.happiness,
            fullness: max.fullness,
            sleep: max.sleep,
            state: PetState::Default,
            score: 0,
            cooldown: 0,
        }
    }

    pub(crate) fn max(&self) -> VitalMax {
        self.species.maxima()
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.state == PetState::Dead
    }

    /// Back to full vitals and the default state. Score survives.
    pub(crate) fn revive(&mut self) {
        let max = self.max();
        self.health = max.health;
        self.happiness = max.happiness;
        self.fullness = max.fullness;
        self.sleep = max.sleep;
        self.cooldown = 0;
        self.state = PetState::Default;
    }

    /// Pull every vital into `[0, species max]` and the score up to zero.
    ///
    /// Each vital is capped against its own maximum; an overflowing
    /// happiness, fullness or sleep never touches health.
    pub(crate) fn clamp_stats(&mut self) {
        let max = self.max();
        self.health = self.health.clamp(0, max.health);
        self.happiness = self.happiness.clamp(0, max.happiness);
        self.fullness = self.fullness.clamp(0, max.fullness);
        self.sleep = self.sleep.clamp(0, max.sleep);
        self.score = self.score.max(0);
    }

    /// State entry from `Default` (first match wins: asleep, hungry, angry),
    /// then the death check, which applies from any state.
    ///
    /// Non-default states are left alone here; leaving them is the job of
    /// the exit checks run by the decay clock.
    pub(crate) fn evaluate_state(&mut self) {
        if self.state == PetState::Default {
            if self.sleep < 1 {
                self.state = PetState::Asleep;
                self.health = (self.health - COLLAPSE_PENALTY).max(0);
            } else if self.fullness < 1 {
                self.state = PetState::Hungry;
            } else if self.happiness < 1 {
                self.state = PetState::Angry;
            }
        }
        if self.health < 1 {
            self.state = PetState::Dead;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) enum FoodKind {
    Biscuit,
    Meat,
    Bread,
}

impl FoodKind {
    pub(crate) const CATALOG: [FoodKind; 3] = [FoodKind::Biscuit, FoodKind::Meat, FoodKind::Bread];

    pub(crate) fn rating(self) -> i32 {
        match self {
            FoodKind::Biscuit => 12,
            FoodKind::Meat => 6,
            FoodKind::Bread => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) enum GiftKind {
    Toy,
    Bone,
    Ball,
}

impl GiftKind {
    pub(crate) const CATALOG: [GiftKind; 3] = [GiftKind::Toy, GiftKind::Bone, GiftKind::Ball];

    pub(crate) fn rating(self) -> i32 {
        match self {
            GiftKind::Toy => 12,
            GiftKind::Bone => 6,
            GiftKind::Ball => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Food {
    #[serde(rename = "type")]
    pub(crate) kind: Option<FoodKind>,
    pub(crate) rating: i32,
}

impl Food {
    pub(crate) fn from_index(index: usize) -> Result<Self, SlotError> {
        let kind = FoodKind::CATALOG
            .get(index)
            .copied()
            .ok_or(SlotError::UnknownItem {
                index,
                len: FoodKind::CATALOG.len(),
            })?;
        Ok(Self {
            kind: Some(kind),
            rating: kind.rating(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct Gift {
    #[serde(rename = "type")]
    pub(crate) kind: Option<GiftKind>,
    pub(crate) rating: i32,
}

impl Gift {
    pub(crate) fn from_index(index: usize) -> Result<Self, SlotError> {
        let kind = GiftKind::CATALOG
            .get(index)
            .copied()
            .ok_or(SlotError::UnknownItem {
                index,
                len: GiftKind::CATALOG.len(),
            })?;
        Ok(Self {
            kind: Some(kind),
            rating: kind.rating(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pet_starts_at_species_maxima() {
        for species in [Species::Default, Species::Cat, Species::Fox, Species::Owl] {
            let pet = Pet::new("Buddy", species);
            let max = species.maxima();
            assert_eq!(pet.health, max.health);
            assert_eq!(pet.happiness, max.happiness);
            assert_eq!(pet.fullness, max.fullness);
            assert_eq!(pet.sleep, max.sleep);
            assert_eq!(pet.state, PetState::Default);
            assert_eq!(pet.score, 0);
        }
    }

    #[test]
    fn cat_maxima_match_table() {
        let pet = Pet::new("Buddy", Species::Cat);
        assert_eq!(
            (pet.health, pet.happiness, pet.fullness, pet.sleep),
            (50, 75, 100, 75)
        );
    }

    #[test]
    fn unknown_species_name_is_default() {
        assert_eq!(Species::from_name("Owl"), Species::Owl);
        assert_eq!(Species::from_name("dragon"), Species::Default);
    }

    #[test]
    fn clamp_pulls_everything_into_range() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.health = 200;
        pet.happiness = -10;
        pet.fullness = 150;
        pet.sleep = -5;
        pet.score = -3;
        pet.clamp_stats();
        assert_eq!(pet.health, 50);
        assert_eq!(pet.happiness, 0);
        assert_eq!(pet.fullness, 100);
        assert_eq!(pet.sleep, 0);
        assert_eq!(pet.score, 0);
    }

    #[test]
    fn overflowing_happiness_does_not_leak_into_health() {
        let mut pet = Pet::new("Buddy", Species::Fox);
        pet.health = 10;
        pet.happiness = 500;
        pet.clamp_stats();
        assert_eq!(pet.happiness, 100);
        assert_eq!(pet.health, 10);
    }

    #[test]
    fn score_has_no_upper_bound() {
        let mut pet = Pet::new("Buddy", Species::Default);
        pet.score = 1_000_000;
        pet.clamp_stats();
        assert_eq!(pet.score, 1_000_000);
    }

    #[test]
    fn sleep_wins_state_priority_ties() {
        let mut pet = Pet::new("Buddy", Species::Owl);
        pet.sleep = 0;
        pet.fullness = 0;
        pet.happiness = 0;
        pet.evaluate_state();
        assert_eq!(pet.state, PetState::Asleep);
        assert_eq!(pet.health, 100 - COLLAPSE_PENALTY);
    }

    #[test]
    fn hungry_beats_angry() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.fullness = 0;
        pet.happiness = 0;
        pet.evaluate_state();
        assert_eq!(pet.state, PetState::Hungry);
    }

    #[test]
    fn collapse_penalty_can_kill() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.health = 10;
        pet.sleep = 0;
        pet.evaluate_state();
        assert_eq!(pet.health, 0);
        assert_eq!(pet.state, PetState::Dead);
    }

    #[test]
    fn entry_only_runs_from_default() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.state = PetState::Asleep;
        pet.fullness = 0;
        pet.evaluate_state();
        assert_eq!(pet.state, PetState::Asleep);
    }

    #[test]
    fn death_overrides_any_state() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.state = PetState::Angry;
        pet.health = 0;
        pet.evaluate_state();
        assert_eq!(pet.state, PetState::Dead);
    }

    #[test]
    fn revive_restores_dead_pet() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.health = 0;
        pet.happiness = 20;
        pet.fullness = 30;
        pet.sleep = 40;
        pet.score = 12;
        pet.state = PetState::Dead;
        pet.revive();
        assert_eq!(
            (pet.health, pet.happiness, pet.fullness, pet.sleep),
            (50, 75, 100, 75)
        );
        assert_eq!(pet.state, PetState::Default);
        assert_eq!(pet.score, 12);
    }

    #[test]
    fn catalog_lookup() {
        let food = Food::from_index(0).unwrap();
        assert_eq!(food.kind, Some(FoodKind::Biscuit));
        assert_eq!(food.rating, 12);
        let gift = Gift::from_index(2).unwrap();
        assert_eq!(gift.kind, Some(GiftKind::Ball));
        assert_eq!(gift.rating, 3);
        assert_eq!(
            Food::from_index(3),
            Err(SlotError::UnknownItem { index: 3, len: 3 })
        );
    }

    #[test]
    fn empty_item_has_no_kind() {
        let food = Food::default();
        assert_eq!(food.kind, None);
        assert_eq!(food.rating, 0);
        let json = serde_json::to_string(&food).unwrap();
        assert_eq!(json, r#"{"type":null,"rating":0}"#);
    }
}
