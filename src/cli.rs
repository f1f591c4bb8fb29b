use crate::access::AccessWindow;
use crate::app::{self, Stores};
use crate::config::{load_settings, project_paths, save_settings, Paths};
use crate::model::{Food, Gift, Pet, Species};
use crate::sim::PetAction;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "petpal")]
#[command(about = "A virtual pet that lives in your terminal")]
pub(crate) struct Cli {
    /// Directory for saves and settings (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Cmd {
    /// Play with a pet (the default)
    Play {
        #[arg(long, default_value_t = 0)]
        slot: usize,
    },
    /// Manage the three pet slots
    #[command(subcommand)]
    Pets(PetsCmd),
    /// Manage food and gifts
    #[command(subcommand)]
    Inventory(InventoryCmd),
    /// Time-of-day play restrictions
    #[command(subcommand)]
    Access(AccessCmd),
    /// Time spent playing
    #[command(subcommand)]
    Playtime(PlaytimeCmd),
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum PetsCmd {
    List,
    New {
        #[arg(long)]
        slot: usize,
        #[arg(long)]
        name: String,
        /// default, cat, fox or owl
        #[arg(long, default_value = "default")]
        species: String,
        /// Overwrite an occupied slot
        #[arg(long, default_value_t = false)]
        replace: bool,
    },
    Remove {
        #[arg(long)]
        slot: usize,
    },
    Revive {
        #[arg(long)]
        slot: usize,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum InventoryCmd {
    List,
    /// Catalog index: 0 Biscuit, 1 Meat, 2 Bread
    AddFood { index: usize },
    /// Catalog index: 0 Toy, 1 Bone, 2 Ball
    AddGift { index: usize },
    RemoveFood { slot: usize },
    RemoveGift { slot: usize },
    /// Feed the pet in `pet` from food slot `slot`
    Feed {
        #[arg(long)]
        pet: usize,
        slot: usize,
    },
    /// Give the pet in `pet` the gift in slot `slot`
    Give {
        #[arg(long)]
        pet: usize,
        slot: usize,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum AccessCmd {
    /// Allow play during HH:MM-HH:MM (may span midnight)
    Add { window: String },
    List,
    /// Is play allowed right now?
    Check,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum PlaytimeCmd {
    Total,
    Average,
}

pub(crate) fn run(cli: Cli) -> Result<()> {
    let paths = project_paths(cli.data_dir)?;
    let command = cli.command.unwrap_or(Cmd::Play { slot: 0 });
    init_logging(&paths, matches!(command, Cmd::Play { .. }));
    tracing::debug!(dir = %paths.dir.display(), "using data directory");

    let settings = load_settings(&paths.settings_path);
    if !paths.settings_path.exists() {
        save_settings(&paths.settings_path, &settings)?;
    }

    match command {
        Cmd::Play { slot } => app::play(&paths, settings, slot),
        other => execute(other, &paths, &mut io::stdout().lock()),
    }
}

/// While the panel owns the terminal, logs go to a file instead of stderr.
fn init_logging(paths: &Paths, to_file: bool) {
    let default = if to_file { "petpal=info" } else { "petpal=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into());

    let file = if to_file {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&paths.log_path)
            .ok()
    } else {
        None
    };

    let _ = match file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init(),
    };
}

fn execute(cmd: Cmd, paths: &Paths, out: &mut impl Write) -> Result<()> {
    let stores = Stores::open(paths);
    match cmd {
        Cmd::Play { .. } => bail!("play needs a terminal"),
        Cmd::Pets(cmd) => pets(cmd, &stores, out),
        Cmd::Inventory(cmd) => inventory(cmd, &stores, out),
        Cmd::Access(cmd) => access(cmd, &stores, out),
        Cmd::Playtime(cmd) => {
            let shown = match cmd {
                PlaytimeCmd::Total => stores.playtime.total(None),
                PlaytimeCmd::Average => stores.playtime.average(None),
            };
            writeln!(out, "{shown}")?;
            Ok(())
        }
    }
}

fn pets(cmd: PetsCmd, stores: &Stores, out: &mut impl Write) -> Result<()> {
    let mut roster = stores.pets.load();
    match cmd {
        PetsCmd::List => {
            for (i, slot) in roster.slots().iter().enumerate() {
                match slot {
                    Some(p) => writeln!(
                        out,
                        "{i}: {} the {} [{}] health {} happiness {} fullness {} sleep {} score {}",
                        p.name, p.species, p.state, p.health, p.happiness, p.fullness, p.sleep, p.score
                    )?,
                    None => writeln!(out, "{i}: (empty)")?,
                }
            }
            return Ok(());
        }
        PetsCmd::New {
            slot,
            name,
            species,
            replace,
        } => {
            let name = name.trim();
            if name.is_empty() {
                bail!("pet name cannot be empty");
            }
            if let Some(existing) = roster.get(slot)? {
                if !replace {
                    bail!("slot {slot} holds {}; pass --replace to overwrite", existing.name);
                }
            }
            if let Some(other) = roster.slot_of(name).filter(|&i| i != slot) {
                bail!("a pet named {name} already lives in slot {other}");
            }
            let pet = Pet::new(name, Species::from_name(&species));
            writeln!(out, "{} the {} moved into slot {slot}", pet.name, pet.species)?;
            roster.put(slot, pet)?;
        }
        PetsCmd::Remove { slot } => match roster.remove(slot)? {
            Some(p) => writeln!(out, "{} left slot {slot}", p.name)?,
            None => writeln!(out, "slot {slot} was already empty")?,
        },
        PetsCmd::Revive { slot } => {
            let Some(pet) = roster.get_mut(slot)? else {
                bail!("slot {slot} is empty");
            };
            pet.apply(PetAction::Revive);
            writeln!(out, "{} is back to full health", pet.name)?;
        }
    }
    stores.pets.save(&roster);
    Ok(())
}

fn inventory(cmd: InventoryCmd, stores: &Stores, out: &mut impl Write) -> Result<()> {
    let mut inv = stores.inventory.load();
    match cmd {
        InventoryCmd::List => {
            for i in 0..inv.food.len() {
                let food = inv.food_kind_at(i)?.map_or("-".to_string(), |k| format!("{k:?}"));
                let gift = inv.gift_kind_at(i)?.map_or("-".to_string(), |k| format!("{k:?}"));
                writeln!(out, "{i}: food {food:<8} gift {gift}")?;
            }
            return Ok(());
        }
        InventoryCmd::AddFood { index } => {
            if !inv.add_food(Food::from_index(index)?) {
                bail!("no empty food slot");
            }
        }
        InventoryCmd::AddGift { index } => {
            if !inv.add_gift(Gift::from_index(index)?) {
                bail!("no empty gift slot");
            }
        }
        InventoryCmd::RemoveFood { slot } => inv.remove_food(slot)?,
        InventoryCmd::RemoveGift { slot } => inv.remove_gift(slot)?,
        InventoryCmd::Feed { pet, slot } | InventoryCmd::Give { pet, slot } => {
            let feeding = matches!(cmd, InventoryCmd::Feed { .. });
            let mut roster = stores.pets.load();
            let Some(target) = roster.get_mut(pet)? else {
                bail!("slot {pet} is empty");
            };
            let given = if feeding {
                inv.give_food(slot, target)?
            } else {
                inv.give_gift(slot, target)?
            };
            if !given {
                bail!("inventory slot {slot} is empty");
            }
            writeln!(
                out,
                "{}: fullness {} happiness {}",
                target.name, target.fullness, target.happiness
            )?;
            stores.pets.save(&roster);
        }
    }
    stores.inventory.save(&inv);
    Ok(())
}

fn access(cmd: AccessCmd, stores: &Stores, out: &mut impl Write) -> Result<()> {
    match cmd {
        AccessCmd::Add { window } => {
            let window: AccessWindow = window.parse()?;
            stores.access.append(window);
            writeln!(out, "added play window {window}")?;
        }
        AccessCmd::List => {
            let windows = stores.access.load();
            if windows.is_empty() {
                writeln!(out, "no restrictions")?;
            }
            for w in windows {
                writeln!(out, "{w}")?;
            }
        }
        AccessCmd::Check => {
            let now = chrono::Local::now().time();
            let verdict = if stores.access.can_access_at(now) {
                "allowed"
            } else {
                "not allowed"
            };
            writeln!(out, "play is {verdict} at {}", now.format("%H:%M"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PetState;

    fn run_cmd(args: &[&str], paths: &Paths) -> Result<String> {
        let mut argv = vec!["petpal"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        execute(cli.command.expect("subcommand"), paths, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn temp_paths() -> (tempfile::TempDir, Paths) {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Paths::in_dir(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn play_is_the_default_command() {
        let cli = Cli::try_parse_from(["petpal", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));

        let cli = Cli::try_parse_from(["petpal", "play", "--slot", "2"]).unwrap();
        assert_eq!(cli.command, Some(Cmd::Play { slot: 2 }));
    }

    #[test]
    fn create_list_and_revive_pets() {
        let (_dir, paths) = temp_paths();
        let out = run_cmd(&["pets", "new", "--slot", "1", "--name", "Miso", "--species", "cat"], &paths).unwrap();
        assert!(out.contains("Miso the cat"));

        let err = run_cmd(&["pets", "new", "--slot", "1", "--name", "Tofu"], &paths).unwrap_err();
        assert!(err.to_string().contains("--replace"));

        let stores = Stores::open(&paths);
        let mut roster = stores.pets.load();
        {
            let pet = roster.get_mut(1).unwrap().unwrap();
            pet.health = 0;
            pet.state = PetState::Dead;
        }
        stores.pets.save(&roster);

        run_cmd(&["pets", "revive", "--slot", "1"], &paths).unwrap();
        let listing = run_cmd(&["pets", "list"], &paths).unwrap();
        assert!(listing.contains("0: (empty)"));
        assert!(listing.contains("1: Miso the cat [default] health 50"));

        let out = run_cmd(&["pets", "remove", "--slot", "1"], &paths).unwrap();
        assert!(out.contains("Miso left slot 1"));
    }

    #[test]
    fn names_stay_unique_across_slots() {
        let (_dir, paths) = temp_paths();
        run_cmd(&["pets", "new", "--slot", "0", "--name", "Miso"], &paths).unwrap();
        run_cmd(&["pets", "new", "--slot", "1", "--name", "Tofu"], &paths).unwrap();

        let err = run_cmd(&["pets", "new", "--slot", "2", "--name", "Miso"], &paths).unwrap_err();
        assert!(err.to_string().contains("slot 0"));
        let err = run_cmd(
            &["pets", "new", "--slot", "1", "--name", "Miso", "--replace"],
            &paths,
        )
        .unwrap_err();
        assert!(err.to_string().contains("already lives in slot 0"));

        // replacing a pet with a namesake in its own slot is fine
        run_cmd(
            &["pets", "new", "--slot", "0", "--name", "Miso", "--species", "owl", "--replace"],
            &paths,
        )
        .unwrap();
        let listing = run_cmd(&["pets", "list"], &paths).unwrap();
        assert!(listing.contains("0: Miso the owl"));
        assert!(listing.contains("1: Tofu the default"));
    }

    #[test]
    fn out_of_range_slot_is_an_error() {
        let (_dir, paths) = temp_paths();
        let err = run_cmd(&["pets", "remove", "--slot", "3"], &paths).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        let err = run_cmd(&["inventory", "remove-food", "6"], &paths).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn feed_pet_from_inventory() {
        let (_dir, paths) = temp_paths();
        run_cmd(&["pets", "new", "--slot", "0", "--name", "Hoot", "--species", "owl"], &paths).unwrap();
        run_cmd(&["inventory", "add-food", "0"], &paths).unwrap();
        run_cmd(&["inventory", "add-gift", "1"], &paths).unwrap();

        let listing = run_cmd(&["inventory", "list"], &paths).unwrap();
        assert!(listing.contains("0: food Biscuit  gift Bone"));

        let stores = Stores::open(&paths);
        let mut roster = stores.pets.load();
        roster.get_mut(0).unwrap().unwrap().fullness = 10;
        stores.pets.save(&roster);

        let out = run_cmd(&["inventory", "feed", "--pet", "0", "0"], &paths).unwrap();
        assert!(out.contains("fullness 22"));
        let err = run_cmd(&["inventory", "feed", "--pet", "0", "0"], &paths).unwrap_err();
        assert!(err.to_string().contains("is empty"));

        assert!(stores.inventory.load().is_food_slot_empty(0).unwrap());
        assert!(!stores.inventory.load().is_gift_slot_empty(0).unwrap());
    }

    #[test]
    fn unknown_catalog_item_is_rejected() {
        let (_dir, paths) = temp_paths();
        assert!(run_cmd(&["inventory", "add-gift", "3"], &paths).is_err());
    }

    #[test]
    fn access_windows_are_validated_before_saving() {
        let (_dir, paths) = temp_paths();
        assert!(run_cmd(&["access", "add", "25:00-05:00"], &paths).is_err());
        assert!(run_cmd(&["access", "add", "noon"], &paths).is_err());
        assert_eq!(run_cmd(&["access", "list"], &paths).unwrap(), "no restrictions\n");

        run_cmd(&["access", "add", "23:00-5:00"], &paths).unwrap();
        assert_eq!(run_cmd(&["access", "list"], &paths).unwrap(), "23:00-05:00\n");
        assert!(run_cmd(&["access", "check"], &paths).unwrap().starts_with("play is "));
    }

    #[test]
    fn playtime_reports() {
        let (_dir, paths) = temp_paths();
        let stores = Stores::open(&paths);
        stores.playtime.append(3_600_000);
        stores.playtime.append(1_800_000);
        assert_eq!(
            run_cmd(&["playtime", "total"], &paths).unwrap(),
            "0 days, 01 hours, 30 minutes, 00 seconds\n"
        );
        assert_eq!(
            run_cmd(&["playtime", "average"], &paths).unwrap(),
            "0 days, 00 hours, 45 minutes, 00 seconds\n"
        );
    }
}
