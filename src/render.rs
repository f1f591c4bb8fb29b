use crate::inventory::Inventory;
use crate::model::{Pet, PetState};
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }
    #[cfg(test)]
    pub(crate) fn row(&self, y: u16) -> String {
        (0..self.w).map(|x| self.cells[self.idx(x, y)].ch).collect()
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    /// Write only the cells that changed since the last frame.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/// Everything one frame needs, copied out from under the pet lock.
pub(crate) struct PanelView<'a> {
    pub(crate) pet: &'a Pet,
    pub(crate) inventory: &'a Inventory,
    pub(crate) status: &'a str,
    pub(crate) color: bool,
}

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg: Color::Black,
            },
        );
    }
}

fn bar(value: i32, max: i32, width: usize) -> String {
    let filled = if max > 0 {
        ((value.clamp(0, max) as usize) * width + (max as usize) / 2) / (max as usize)
    } else {
        0
    };
    let mut s = String::with_capacity(width + 2);
    s.push('[');
    s.extend(std::iter::repeat('#').take(filled));
    s.extend(std::iter::repeat('.').take(width - filled));
    s.push(']');
    s
}

fn meter_color(value: i32, max: i32, color: bool) -> Color {
    if !color {
        return Color::White;
    }
    match value * 4 {
        v if v <= max => Color::Red,
        v if v <= max * 2 => Color::Yellow,
        _ => Color::Green,
    }
}

fn state_color(state: PetState, color: bool) -> Color {
    if !color {
        return Color::White;
    }
    match state {
        PetState::Default => Color::Green,
        PetState::Asleep => Color::Blue,
        PetState::Hungry => Color::Yellow,
        PetState::Angry => Color::Magenta,
        PetState::Dead => Color::Red,
    }
}

pub(crate) fn draw_panel(buf: &mut CellBuffer, view: &PanelView<'_>) {
    let fg = Color::White;
    let pet = view.pet;
    let max = pet.max();

    let title = format!("petpal  |  {} the {}  |  score {}", pet.name, pet.species, pet.score);
    draw_text(buf, 1, 0, &title, fg);
    draw_text(
        buf,
        1,
        1,
        &format!("state: {}", pet.state),
        state_color(pet.state, view.color),
    );

    let meters = [
        ("Health   ", pet.health, max.health),
        ("Happiness", pet.happiness, max.happiness),
        ("Fullness ", pet.fullness, max.fullness),
        ("Sleep    ", pet.sleep, max.sleep),
    ];
    for (i, (name, val, cap)) in meters.iter().enumerate() {
        let line = format!("{name} {} {:>3}/{:<3}", bar(*val, *cap, 20), val, cap);
        draw_text(buf, 1, 3 + i as u16, &line, meter_color(*val, *cap, view.color));
    }

    let food: Vec<String> = view
        .inventory
        .food
        .iter()
        .map(|s| s.and_then(|f| f.kind).map_or("-".to_string(), |k| format!("{k:?}")))
        .collect();
    let gifts: Vec<String> = view
        .inventory
        .gifts
        .iter()
        .map(|s| s.and_then(|g| g.kind).map_or("-".to_string(), |k| format!("{k:?}")))
        .collect();
    draw_text(buf, 1, 8, &format!("Food:  {}", food.join(" ")), fg);
    draw_text(buf, 1, 9, &format!("Gifts: {}", gifts.join(" ")), fg);

    draw_text(buf, 1, 11, view.status, fg);

    let help = if pet.is_dead() {
        "r revive | q quit"
    } else {
        "s sleep | v vet | p play | e exercise | f feed | g gift | q quit"
    };
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg);
}
