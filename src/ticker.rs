use crate::model::Pet;
use crate::sim::{DecayClock, TickReport};
use anyhow::{Context, Result};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// The one pet record shared by the decay thread and the input loop.
pub(crate) type SharedPet = Arc<Mutex<Pet>>;

/// All pet mutation goes through this guard.
pub(crate) fn lock_pet(shared: &SharedPet) -> MutexGuard<'_, Pet> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs a [`DecayClock`] against a shared pet at a fixed rate on its own
/// thread. State transitions are published on the channel returned by
/// [`Ticker::spawn`].
pub(crate) struct Ticker {
    stop_tx: Sender<()>,
    handle: JoinHandle<DecayClock>,
}

impl Ticker {
    pub(crate) fn spawn(shared: SharedPet, period: Duration) -> Result<(Self, Receiver<TickReport>)> {
        let (stop_tx, stop_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("decay".to_string())
            .spawn(move || run(shared, period, stop_rx, event_tx))
            .context("could not start decay thread")?;
        tracing::debug!(period_ms = period.as_millis() as u64, "decay ticker started");
        Ok((Self { stop_tx, handle }, event_rx))
    }

    /// Signal the thread and wait for it. Returns how many ticks ran.
    pub(crate) fn stop(self) -> u64 {
        let _ = self.stop_tx.send(());
        match self.handle.join() {
            Ok(clock) => {
                tracing::debug!(ticks = clock.ticks(), "decay ticker stopped");
                clock.ticks()
            }
            Err(_) => {
                tracing::error!("decay thread panicked");
                0
            }
        }
    }
}

fn run(
    shared: SharedPet,
    period: Duration,
    stop_rx: Receiver<()>,
    event_tx: Sender<TickReport>,
) -> DecayClock {
    let mut clock = DecayClock::new();
    let mut next = Instant::now();

    loop {
        let (report, name) = {
            let mut pet = lock_pet(&shared);
            (clock.tick(&mut pet), pet.name.clone())
        };
        if report.changed() {
            tracing::info!(pet = %name, tick = report.tick, from = %report.from, to = %report.to, "state changed");
            // nobody listening is fine
            let _ = event_tx.send(report);
        }

        // deadlines advance from the previous deadline so slow ticks do not drift
        next += period;
        let wait = next.saturating_duration_since(Instant::now());
        match stop_rx.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    clock
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PetState, Species};
    use crate::sim::PetAction;

    #[test]
    fn publishes_transitions() {
        let mut pet = Pet::new("Buddy", Species::Cat);
        pet.state = PetState::Asleep;
        pet.sleep = 74;
        let shared: SharedPet = Arc::new(Mutex::new(pet));

        let (ticker, events) = Ticker::spawn(shared.clone(), Duration::from_millis(50)).unwrap();
        let report = events.recv_timeout(Duration::from_secs(2)).unwrap();
        let ticks = ticker.stop();

        assert_eq!(report.from, PetState::Asleep);
        assert_eq!(report.to, PetState::Default);
        assert!(ticks >= 1);
        assert_eq!(lock_pet(&shared).state, PetState::Default);
    }

    #[test]
    fn actions_and_ticks_share_one_lock() {
        let shared: SharedPet = Arc::new(Mutex::new(Pet::new("Buddy", Species::Fox)));
        let (ticker, _events) = Ticker::spawn(shared.clone(), Duration::from_millis(1)).unwrap();

        for i in 0..200 {
            let mut pet = lock_pet(&shared);
            let action = if i % 2 == 0 { PetAction::Play } else { PetAction::Exercise };
            pet.apply(action);
            let max = pet.max();
            assert!((0..=max.health).contains(&pet.health));
            assert!((0..=max.happiness).contains(&pet.happiness));
            assert!((0..=max.fullness).contains(&pet.fullness));
            assert!((0..=max.sleep).contains(&pet.sleep));
            drop(pet);
            thread::yield_now();
        }

        assert!(ticker.stop() >= 1);
        assert!(lock_pet(&shared).score >= 200);
    }
}
