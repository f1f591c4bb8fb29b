use crate::sim::PetAction;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Pet(PetAction),
    Feed,
    Gift,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<KeyEvent>> {
    let mut out = Vec::new();

    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        if let Event::Key(k) = event::read()? {
            if k.kind == KeyEventKind::Press {
                out.push(k);
                if out.len() >= 32 {
                    break;
                }
            }
        }
    }
    Ok(out)
}

pub(crate) fn map_key(ev: KeyEvent) -> Option<Command> {
    if ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Command::Quit);
    }
    let KeyCode::Char(ch) = ev.code else {
        return match ev.code {
            KeyCode::Esc => Some(Command::Quit),
            _ => None,
        };
    };
    match ch.to_ascii_lowercase() {
        's' => Some(Command::Pet(PetAction::Sleep)),
        'v' => Some(Command::Pet(PetAction::Vet)),
        'p' => Some(Command::Pet(PetAction::Play)),
        'e' => Some(Command::Pet(PetAction::Exercise)),
        'r' => Some(Command::Pet(PetAction::Revive)),
        'f' => Some(Command::Feed),
        'g' => Some(Command::Gift),
        'q' => Some(Command::Quit),
        _ => None,
    }
}
