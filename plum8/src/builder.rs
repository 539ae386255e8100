use crate::context::Context;
use crate::error::Error;
use crate::plum::{Plum8, DEFAULT_CLOCK_HZ};

/// Builder for the `Plum8` machine
///
/// ```no_run
/// # use plum8::{Builder, Context, FrameView};
/// # struct Ctx;
/// # impl Context for Ctx {
/// #     fn on_frame(&mut self, _: FrameView<'_>) {}
/// #     fn sound_on(&mut self) {}
/// #     fn sound_off(&mut self) {}
/// #     fn get_keys(&mut self) -> &[bool; 16] { &[false; 16] }
/// #     fn gen_random(&mut self) -> u8 { 4 }
/// # }
/// # let rom = [0u8; 2];
/// let mut chip = Builder::new()
///     .with_program(&rom)
///     .with_clock_hz(700)
///     .build(Ctx)
///     .unwrap();
/// ```
pub struct Builder<'a> {
    program: Option<&'a [u8]>,
    clock_hz: u32,
}

impl<'a> Builder<'a> {
    pub fn new() -> Self {
        Self {
            program: None,
            clock_hz: DEFAULT_CLOCK_HZ,
        }
    }

    pub fn with_program(mut self, program: &'a [u8]) -> Self {
        self.program = Some(program);
        self
    }

    /// Rate at which the caller intends to tick the machine
    ///
    /// Only used to derive the timer cadence; the builder does no pacing.
    pub fn with_clock_hz(mut self, clock_hz: u32) -> Self {
        self.clock_hz = clock_hz;
        self
    }

    pub fn build<C: Context>(self, ctx: C) -> Result<Plum8<C>, Error> {
        if self.clock_hz == 0 {
            return Err(Error::Config("clock rate must be nonzero"));
        }
        let program = self.program.ok_or(Error::Config("no program loaded"))?;
        let mut chip = Plum8::with_clock_hz(ctx, self.clock_hz);
        chip.load_program(program)?;
        Ok(chip)
    }
}

impl<'a> Default for Builder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::TestingContext;
    use crate::plum::State;

    #[test]
    fn builds_a_running_machine() {
        let mut chip = Builder::new()
            .with_program(&[0x6Au8, 0x07])
            .build(TestingContext::new(0))
            .unwrap();
        assert_eq!(chip.state(), State::Running);
        chip.tick().unwrap();
        assert_eq!(chip.registers()[0xA], 0x07u8);
    }

    #[test]
    fn rejects_zero_clock_rate() {
        let result = Builder::new()
            .with_program(&[0x00u8, 0xE0])
            .with_clock_hz(0)
            .build(TestingContext::new(0));
        assert_eq!(result.err(), Some(Error::Config("clock rate must be nonzero")));
    }

    #[test]
    fn rejects_missing_program() {
        let result = Builder::new().build(TestingContext::new(0));
        assert_eq!(result.err(), Some(Error::Config("no program loaded")));
    }

    #[test]
    fn propagates_oversized_program() {
        let prog = [0u8; 0xE01];
        let result = Builder::new()
            .with_program(&prog)
            .build(TestingContext::new(0));
        assert_eq!(result.err(), Some(Error::ProgramTooLarge { len: 0xE01 }));
    }
}
