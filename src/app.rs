use crate::access::AccessStore;
use crate::config::{Paths, Settings};
use crate::input::{collect_input_nonblocking, map_key, Command};
use crate::inventory::{Inventory, InventoryStore};
use crate::model::{Pet, PetState};
use crate::playtime::PlaytimeLog;
use crate::render::{draw_panel, PanelView, Terminal};
use crate::sim::{PetAction, TickReport};
use crate::storage::PetStore;
use crate::ticker::{lock_pet, SharedPet, Ticker};
use anyhow::{bail, Context};
use std::sync::{mpsc::Receiver, Arc, Mutex};
use std::time::{Duration, Instant};

/// All file-backed stores under one data directory.
pub(crate) struct Stores {
    pub(crate) pets: PetStore,
    pub(crate) inventory: InventoryStore,
    pub(crate) access: AccessStore,
    pub(crate) playtime: PlaytimeLog,
}

impl Stores {
    pub(crate) fn open(paths: &Paths) -> Self {
        Self {
            pets: PetStore::new(paths.pets_path.clone()),
            inventory: InventoryStore::new(paths.food_path.clone(), paths.gifts_path.clone()),
            access: AccessStore::new(paths.access_path.clone()),
            playtime: PlaytimeLog::new(paths.playtime_path.clone()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// One pet being played with: the shared record plus what the player holds.
pub(crate) struct Session {
    pub(crate) shared: SharedPet,
    pub(crate) inventory: Inventory,
    pub(crate) inventory_dirty: bool,
    pub(crate) status: String,
}

impl Session {
    pub(crate) fn new(pet: Pet, inventory: Inventory) -> Self {
        let status = format!("Say hi to {}!", pet.name);
        Self {
            shared: Arc::new(Mutex::new(pet)),
            inventory,
            inventory_dirty: false,
            status,
        }
    }

    pub(crate) fn snapshot(&self) -> Pet {
        lock_pet(&self.shared).clone()
    }

    pub(crate) fn handle(&mut self, cmd: Command) -> Flow {
        let mut pet = lock_pet(&self.shared);
        match cmd {
            Command::Quit => return Flow::Quit,
            Command::Pet(PetAction::Revive) => {
                if pet.is_dead() {
                    pet.apply(PetAction::Revive);
                    self.status = action_message(PetAction::Revive, &pet.name);
                } else {
                    self.status = format!("{} is alive and well.", pet.name);
                }
            }
            _ if pet.is_dead() => {
                self.status = format!("{} has passed on. Press r to revive.", pet.name);
            }
            Command::Pet(action) => {
                pet.apply(action);
                self.status = action_message(action, &pet.name);
            }
            Command::Feed => {
                self.status = match self.inventory.first_food() {
                    Some(slot) => {
                        let kind = self.inventory.food_kind_at(slot).ok().flatten();
                        if let Ok(true) = self.inventory.give_food(slot, &mut pet) {
                            self.inventory_dirty = true;
                        }
                        format!("{} ate the {}.", pet.name, item_name(kind))
                    }
                    None => "No food left.".to_string(),
                };
            }
            Command::Gift => {
                self.status = match self.inventory.first_gift() {
                    Some(slot) => {
                        let kind = self.inventory.gift_kind_at(slot).ok().flatten();
                        if let Ok(true) = self.inventory.give_gift(slot, &mut pet) {
                            self.inventory_dirty = true;
                        }
                        format!("{} got a {}.", pet.name, item_name(kind))
                    }
                    None => "No gifts left.".to_string(),
                };
            }
        }
        tracing::debug!(?cmd, state = %pet.state, "command handled");
        Flow::Continue
    }

    pub(crate) fn note_transition(&mut self, report: TickReport) {
        let name = lock_pet(&self.shared).name.clone();
        self.status = match report.to {
            PetState::Default => format!("{name} is feeling fine again."),
            PetState::Asleep => format!("{name} collapsed from exhaustion."),
            PetState::Hungry => format!("{name} is hungry!"),
            PetState::Angry => format!("{name} is angry!"),
            PetState::Dead => format!("{name} has died. Press r to revive."),
        };
    }
}

fn action_message(action: PetAction, name: &str) -> String {
    match action {
        PetAction::Sleep => format!("{name} had a good nap."),
        PetAction::Vet => format!("{name} saw the vet."),
        PetAction::Play => format!("{name} loved playing."),
        PetAction::Exercise => format!("{name} went for a run."),
        PetAction::Revive => format!("{name} is back!"),
    }
}

fn item_name<K: std::fmt::Debug>(kind: Option<K>) -> String {
    kind.map_or_else(|| "thing".to_string(), |k| format!("{k:?}"))
}

struct App {
    settings: Settings,
    stores: Stores,
    slot: usize,
    session: Session,
    term: Terminal,
    autosave_at: Instant,
}

impl App {
    fn run(&mut self, events: &Receiver<TickReport>) -> anyhow::Result<()> {
        let frame_dt = Duration::from_millis(33);
        loop {
            self.term.resize_if_needed()?;

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(cmd) = map_key(ev) {
                    if self.session.handle(cmd) == Flow::Quit {
                        return Ok(());
                    }
                }
            }
            while let Ok(report) = events.try_recv() {
                self.session.note_transition(report);
            }

            self.render_frame()?;

            if Instant::now() >= self.autosave_at {
                self.save_now();
                self.autosave_at = Instant::now() + self.settings.autosave_every();
            }

            spin_sleep(frame_dt, Instant::now());
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let pet = self.session.snapshot();
        self.term.cur.clear();
        draw_panel(
            &mut self.term.cur,
            &PanelView {
                pet: &pet,
                inventory: &self.session.inventory,
                status: &self.session.status,
                color: self.settings.enable_color,
            },
        );
        self.term.present()
    }

    fn save_now(&mut self) {
        save_session(&self.stores, self.slot, &mut self.session);
    }
}

fn save_session(stores: &Stores, slot: usize, session: &mut Session) {
    let pet = session.snapshot();
    let mut roster = stores.pets.load();
    match roster.put(slot, pet) {
        Ok(()) => stores.pets.save(&roster),
        Err(err) => tracing::warn!(%err, "could not store pet"),
    }
    if session.inventory_dirty {
        stores.inventory.save(&session.inventory);
        session.inventory_dirty = false;
    }
}

/// Interactive session for the pet in `slot`.
pub(crate) fn play(paths: &Paths, settings: Settings, slot: usize) -> anyhow::Result<()> {
    let stores = Stores::open(paths);

    let now = chrono::Local::now().time();
    if !stores.access.can_access_at(now) {
        let windows: Vec<String> = stores.access.load().iter().map(|w| w.to_string()).collect();
        bail!(
            "play is not allowed at {}; allowed windows: {}",
            now.format("%H:%M"),
            windows.join(", ")
        );
    }

    let roster = stores.pets.load();
    let Some(pet) = roster.get(slot)?.cloned() else {
        bail!("slot {slot} is empty; create a pet with `petpal pets new --slot {slot} --name <name>`");
    };
    tracing::info!(pet = %pet.name, slot, state = %pet.state, "session started");

    let session = Session::new(pet, stores.inventory.load());
    let (ticker, events) = Ticker::spawn(session.shared.clone(), settings.tick_period())?;
    let started = Instant::now();

    let term = match Terminal::begin() {
        Ok(term) => term,
        Err(err) => {
            ticker.stop();
            return Err(err.context("could not open terminal"));
        }
    };
    let mut app = App {
        autosave_at: Instant::now() + settings.autosave_every(),
        settings,
        stores,
        slot,
        session,
        term,
    };

    let result = app.run(&events);
    let ticks = ticker.stop();
    let ended = app.term.end().context("could not restore terminal");

    app.save_now();
    let played = started.elapsed().as_millis() as u64;
    app.stores.playtime.append(played);
    tracing::info!(ticks, played_ms = played, "session ended");

    result.and(ended)
}

fn spin_sleep(target: Duration, now: Instant) {
    let end = now + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Food, Gift, Species};

    fn session_with_food() -> Session {
        let mut inventory = Inventory::default();
        inventory.add_food(Food::from_index(1).unwrap());
        inventory.add_gift(Gift::from_index(0).unwrap());
        Session::new(Pet::new("Miso", Species::Cat), inventory)
    }

    #[test]
    fn feeding_uses_first_food_slot() {
        let mut session = session_with_food();
        lock_pet(&session.shared).fullness = 0;
        assert_eq!(session.handle(Command::Feed), Flow::Continue);
        assert_eq!(session.snapshot().fullness, 6);
        assert!(session.inventory_dirty);
        assert!(session.inventory.first_food().is_none());

        session.handle(Command::Feed);
        assert_eq!(session.status, "No food left.");
    }

    #[test]
    fn gift_raises_happiness() {
        let mut session = session_with_food();
        lock_pet(&session.shared).happiness = 10;
        session.handle(Command::Gift);
        assert_eq!(session.snapshot().happiness, 22);
    }

    #[test]
    fn dead_pet_only_accepts_revive() {
        let mut session = session_with_food();
        {
            let mut pet = lock_pet(&session.shared);
            pet.health = 0;
            pet.state = PetState::Dead;
        }
        session.handle(Command::Pet(PetAction::Play));
        session.handle(Command::Feed);
        assert_eq!(session.snapshot().score, 0);
        assert!(!session.inventory_dirty);

        session.handle(Command::Pet(PetAction::Revive));
        let pet = session.snapshot();
        assert_eq!(pet.state, PetState::Default);
        assert_eq!(pet.health, 50);
    }

    #[test]
    fn revive_is_refused_for_living_pet() {
        let mut session = session_with_food();
        lock_pet(&session.shared).health = 10;
        session.handle(Command::Pet(PetAction::Revive));
        assert_eq!(session.snapshot().health, 10);
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut session = session_with_food();
        assert_eq!(session.handle(Command::Quit), Flow::Quit);
    }

    #[test]
    fn saving_writes_pet_and_dirty_inventory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let stores = Stores::open(&Paths::in_dir(dir.path().to_path_buf()));
        let mut session = session_with_food();
        session.handle(Command::Pet(PetAction::Play));
        session.handle(Command::Feed);

        save_session(&stores, 1, &mut session);
        let roster = stores.pets.load();
        assert_eq!(roster.get(1).unwrap().map(|p| p.score), Some(1));
        assert!(stores.inventory.load().first_food().is_none());
        assert!(!session.inventory_dirty);
    }

    #[test]
    fn play_refuses_outside_access_windows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Paths::in_dir(dir.path().to_path_buf());
        let stores = Stores::open(&paths);
        // a one-minute window that cannot contain "now" for both lookups
        let now = chrono::Local::now().time();
        let far = (now + chrono::Duration::hours(12)).format("%H:%M").to_string();
        stores.access.append(format!("{far}-{far}").parse().unwrap());

        let err = play(&paths, Settings::default(), 0).unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn play_refuses_empty_slot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Paths::in_dir(dir.path().to_path_buf());
        let err = play(&paths, Settings::default(), 2).unwrap_err();
        assert!(err.to_string().contains("slot 2 is empty"));

        let err = play(&paths, Settings::default(), 7).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
