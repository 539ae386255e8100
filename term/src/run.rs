use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info};
use spin_sleep::SpinSleeper;

use plum8::{nb, Builder};

use crate::context::{Control, TermContext};

pub fn run(rom: &Path, clock_hz: u32) -> Result<(), Box<dyn Error>> {
    let rom = fs::read(rom)?;
    info!("running {} byte program at {} Hz", rom.len(), clock_hz);

    let ctx = TermContext::new()?;
    let mut chip = Builder::new()
        .with_program(&rom)
        .with_clock_hz(clock_hz)
        .build(ctx)
        .map_err(|e| e.to_string())?;

    let sleeper = SpinSleeper::default();
    let period = Duration::from_nanos(1_000_000_000u64 / u64::from(clock_hz.max(1)));
    let mut next = Instant::now() + period;
    let mut paused = false;
    loop {
        match chip.context_mut().pump_events()? {
            Some(Control::Quit) => break,
            Some(Control::TogglePause) => {
                paused = !paused;
                debug!("{}", if paused { "paused" } else { "resumed" });
            }
            None => {}
        }
        if !paused {
            match chip.tick() {
                Ok(()) => {}
                // a key wait is pending, keep polling the keyboard
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(e.to_string().into()),
            }
        }
        sleeper.sleep(next.saturating_duration_since(Instant::now()));
        next += period;
    }
    Ok(())
}
