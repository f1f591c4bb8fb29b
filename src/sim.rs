use crate::model::{Pet, PetState};

/// Every `SLOW_CADENCE`th tick applies the slow decay and scoring.
pub(crate) const SLOW_CADENCE: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PetAction {
    Sleep,
    Vet,
    Play,
    Exercise,
    Revive,
}

impl Pet {
    pub(crate) fn apply(&mut self, action: PetAction) {
        match action {
            PetAction::Sleep => {
                self.sleep = self.max().sleep;
                self.score += 1;
            }
            PetAction::Vet => {
                self.health = self.max().health;
                self.score -= 10;
                self.clamp_stats();
            }
            PetAction::Play => {
                self.happiness += 5;
                self.sleep -= 2;
                self.fullness -= 2;
                self.clamp_stats();
                self.score += 1;
            }
            PetAction::Exercise => {
                self.health += 4;
                self.sleep -= 2;
                self.fullness -= 2;
                self.clamp_stats();
                self.score += 1;
            }
            PetAction::Revive => self.revive(),
        }
    }

    /// Leave a non-default state once its trigger has cleared.
    fn exit_resolved_state(&mut self) {
        let max = self.max();
        let resolved = match self.state {
            PetState::Asleep => self.sleep == max.sleep,
            PetState::Hungry => self.fullness > 0,
            PetState::Angry => self.happiness > max.happiness / 2,
            PetState::Default | PetState::Dead => false,
        };
        if resolved {
            self.state = PetState::Default;
        }
    }
}

/// What a single tick did to the pet's lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TickReport {
    pub(crate) tick: u64,
    pub(crate) from: PetState,
    pub(crate) to: PetState,
}

impl TickReport {
    pub(crate) fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Ages a pet one tick at a time and derives its state from its vitals.
#[derive(Clone, Debug, Default)]
pub(crate) struct DecayClock {
    ticks: u64,
}

impl DecayClock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ticks(&self) -> u64 {
        self.ticks
    }

    pub(crate) fn tick(&mut self, pet: &mut Pet) -> TickReport {
        self.ticks += 1;
        let from = pet.state;
        let slow = self.ticks % SLOW_CADENCE == 0;

        if pet.state == PetState::Asleep {
            pet.sleep += 1;
        }
        if pet.state == PetState::Hungry && slow {
            pet.happiness -= 2;
            pet.health -= 2;
        }
        if slow {
            pet.score += 5;
            if pet.state != PetState::Asleep {
                pet.sleep -= 4;
            }
            pet.happiness -= 2;
            pet.fullness -= 1;
        }

        pet.clamp_stats();
        pet.exit_resolved_state();
        pet.evaluate_state();

        TickReport {
            tick: self.ticks,
            from,
            to: pet.state,
        }
    }
}
