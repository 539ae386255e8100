use std::io::{self, Stdout};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use beep::beep;
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use log::warn;
use nanorand::{rand::pcg64::Pcg64 as Rng, RNG};
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

use plum8::{Context, FrameView, HEIGHT, WIDTH};

const BEEP_PITCH: u16 = 2093; // C

/// Terminals report key presses only, never releases, so a pressed key is
/// kept down for this many clock cycles after its last press event.
const KEY_HOLD_TICKS: u8 = 40;

/// Left-hand side of a qwerty keyboard mapped onto the 4x4 keypad
const KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0A),
    ('c', 0x0B),
    ('4', 0x0C),
    ('r', 0x0D),
    ('f', 0x0E),
    ('v', 0x0F),
];

/// Host-side requests read from the keyboard alongside keypad input
pub enum Control {
    Quit,
    TogglePause,
}

/// `Context` backed by a raw-mode terminal, rendered with tui's canvas
pub struct TermContext {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    keys: [bool; 16],
    held: [u8; 16],
    rng: Rng,
}

impl TermContext {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Ok(Self {
            terminal,
            keys: [false; 16],
            held: [0; 16],
            rng: Rng::new_seed(seed),
        })
    }

    /// Drain pending terminal events into the keypad state
    ///
    /// Meant to be called once per clock cycle; key-hold decay is counted
    /// here. Quit and pause requests are reported to the caller instead of
    /// being mapped onto the keypad.
    pub fn pump_events(&mut self) -> io::Result<Option<Control>> {
        self.decay_held();
        let mut control = None;
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                match evt.code {
                    KeyCode::Esc => control = Some(Control::Quit),
                    KeyCode::Char(' ') => control = Some(Control::TogglePause),
                    KeyCode::Char(c) => match Self::map_key(c) {
                        Some(key) => self.press(key),
                        None => warn!("no keypad mapping for {:?}", c),
                    },
                    _ => {}
                }
            }
        }
        Ok(control)
    }

    fn map_key(c: char) -> Option<u8> {
        KEYMAP
            .iter()
            .find(|&&(mapped, _)| mapped == c)
            .map(|&(_, key)| key)
    }

    fn press(&mut self, key: u8) {
        self.keys[key as usize] = true;
        self.held[key as usize] = KEY_HOLD_TICKS;
    }

    fn decay_held(&mut self) {
        for (key, ticks) in self.held.iter_mut().enumerate() {
            if *ticks > 0 {
                *ticks -= 1;
                if *ticks == 0 {
                    self.keys[key] = false;
                }
            }
        }
    }
}

impl Drop for TermContext {
    fn drop(&mut self) {
        let _ = beep(0);
        let _ = terminal::disable_raw_mode();
        let _ = self.terminal.show_cursor();
    }
}

impl Context for TermContext {
    fn on_frame(&mut self, frame: FrameView<'_>) {
        let mut lit = Vec::with_capacity(WIDTH * HEIGHT / 8);
        for (y, row) in frame.iter_rows_as_bitslices().enumerate() {
            for (x, bit) in row.iter().enumerate() {
                if *bit {
                    // canvas y grows upwards, frame y grows downwards
                    lit.push((x as f64, -(y as f64)));
                }
            }
        }
        let result = self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + WIDTH as u16, 2 + HEIGHT as u16);
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("plum8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds([0.0, (WIDTH - 1) as f64])
                .y_bounds([-((HEIGHT - 1) as f64), 0.0])
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        });
        if let Err(e) = result {
            warn!("failed to draw frame: {}", e);
        }
    }

    fn sound_on(&mut self) {
        if let Err(e) = beep(BEEP_PITCH) {
            warn!("sound unavailable: {}", e);
        }
    }

    fn sound_off(&mut self) {
        let _ = beep(0);
    }

    fn get_keys(&mut self) -> &[bool; 16] {
        &self.keys
    }

    fn gen_random(&mut self) -> u8 {
        self.rng.generate::<u8>()
    }
}
