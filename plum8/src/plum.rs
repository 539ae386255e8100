use core::convert::TryFrom;

use heapless::{consts::U16, Vec};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{Frame, FrameView};
use crate::opcode::OpCode;
use crate::timer::{Timer, TimerState};

pub const MEM_SIZE: usize = 4096;
pub const PROG_START: u16 = 0x200;
pub const DEFAULT_CLOCK_HZ: u32 = 500;

const ADDR_MASK: u16 = 0x0FFF;
const TIMER_HZ: u32 = 60;
const FONT_GLYPH_LEN: u16 = 5;

const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Execution state of the machine
///
/// `AwaitingKey` is entered by the wait-for-key instruction and left on the
/// next observed key press; no other instruction executes in between.
/// `Halted` is terminal and entered on any fatal condition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    Running,
    AwaitingKey { x: u8 },
    Halted,
}

pub struct Plum8<C: Context> {
    ctx: C,
    v: [u8; 16],
    i: u16,
    pc: u16,
    memory: [u8; MEM_SIZE],
    frame: Frame,
    stack: Vec<u16, U16>,
    delay_timer: Timer,
    sound_timer: Timer,
    state: State,
    cycles_per_timer_tick: u32,
    cycle: u32,
}

impl<C: Context> Plum8<C> {
    pub fn new(ctx: C) -> Self {
        Self::with_clock_hz(ctx, DEFAULT_CLOCK_HZ)
    }

    pub(crate) fn with_clock_hz(ctx: C, clock_hz: u32) -> Self {
        let mut memory = [0u8; MEM_SIZE];
        memory[..FONT.len()].copy_from_slice(&FONT);
        Self {
            ctx,
            v: [0; 16],
            i: 0,
            pc: PROG_START,
            memory,
            frame: Frame::new(),
            stack: Vec::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            state: State::Running,
            cycles_per_timer_tick: (clock_hz / TIMER_HZ).max(1),
            cycle: 0,
        }
    }

    /// Create a machine with `prog` loaded at the start address
    pub fn load(ctx: C, prog: &[u8]) -> Result<Self, Error> {
        let mut chip = Self::new(ctx);
        chip.load_program(prog)?;
        Ok(chip)
    }

    /// Load program from slice of bytes to memory from 0x200 (_start address)
    pub fn load_program(&mut self, prog: &[u8]) -> Result<(), Error> {
        if prog.len() > MEM_SIZE - PROG_START as usize {
            return Err(Error::ProgramTooLarge { len: prog.len() });
        }
        let start = PROG_START as usize;
        self.memory[start..start + prog.len()].copy_from_slice(prog);
        log::debug!("loaded {} byte program", prog.len());
        Ok(())
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn frame(&self) -> FrameView<'_> {
        self.frame.view()
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    /// Advance the machine by one clock cycle
    ///
    /// Executes a single instruction, or polls the keyboard while a key wait
    /// is pending, in which case `WouldBlock` is returned. Both timers
    /// decrement once per `clock_hz / 60` cycles, counted here, so the 60 Hz
    /// cadence stays in lockstep with execution no matter how the caller
    /// paces its calls. Fatal conditions halt the machine permanently.
    pub fn tick(&mut self) -> nb::Result<(), Error> {
        if self.state == State::Halted {
            return Err(nb::Error::Other(Error::Halted));
        }
        let result = match self.state {
            State::Running => self.step().map_err(|e| {
                log::error!("halting: {}", e);
                self.state = State::Halted;
                nb::Error::Other(e)
            }),
            State::AwaitingKey { x } => self.resume_on_key(x),
            State::Halted => unreachable!(),
        };
        self.cycle += 1;
        if self.cycle == self.cycles_per_timer_tick {
            self.cycle = 0;
            self.tick_timers();
        }
        result
    }

    fn step(&mut self) -> Result<(), Error> {
        let addr = self.pc;
        let raw = self.fetch(addr);
        let opcode = OpCode::try_from(raw).map_err(|opcode| Error::UnknownOpcode { addr, opcode })?;
        log::trace!("{:#05x}: {:?}", addr, opcode);
        self.execute(opcode)
    }

    fn fetch(&self, addr: u16) -> u16 {
        let hi = self.memory[addr as usize & ADDR_MASK as usize] as u16;
        let lo = self.memory[(addr as usize + 1) & ADDR_MASK as usize] as u16;
        hi << 8 | lo
    }

    fn resume_on_key(&mut self, x: u8) -> nb::Result<(), Error> {
        match self.ctx.get_keys().iter().position(|&k| k) {
            Some(key) => {
                log::trace!("key {:#x} ends wait", key);
                self.v[x as usize] = key as u8;
                self.state = State::Running;
                self.pc_advance();
                Ok(())
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    fn tick_timers(&mut self) {
        self.delay_timer.decrement();
        if self.sound_timer.decrement() == TimerState::Finished {
            self.ctx.sound_off();
        }
    }

    fn pc_advance(&mut self) {
        self.pc = (self.pc + 2) & ADDR_MASK;
    }
}

// OpCodes impls
impl<C: Context> Plum8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> Result<(), Error> {
        match opcode {
            // no host machine code to jump into; treat as a decode failure
            OpCode::_0NNN { nnn }     => return Err(Error::UnknownOpcode { addr: self.pc, opcode: nnn }),
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => return self.subroutine_return(),
            OpCode::_1NNN { nnn }     => return self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, y: _ } => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, y: _ } => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => return self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => return self.wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_sprite_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }
        self.pc_advance();
        Ok(())
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) {
        self.frame.clear();
        self.ctx.on_frame(self.frame.view());
    }

    /// Return from a subroutine
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<(), Error> {
        let ret = self
            .stack
            .pop()
            .ok_or(Error::StackUnderflow { pc: self.pc })?;
        self.pc = ret;
        Ok(())
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        let ret = (self.pc + 2) & ADDR_MASK;
        self.stack.push(ret).map_err(|_| Error::StackOverflow {
            pc: self.pc,
            depth: self.stack.len(),
        })?;
        self.pc = nnn;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) {
        if self.v[x as usize] == nn {
            self.pc_advance();
        }
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) {
        if self.v[x as usize] != nn {
            self.pc_advance();
        }
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_advance();
        }
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = nn;
    }

    /// Add the value NN to register VX
    ///
    /// VF is left untouched; only the register-register add sets the carry.
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] = self.v[y as usize];
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] |= self.v[y as usize];
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] &= self.v[y as usize];
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) {
        self.v[x as usize] ^= self.v[y as usize];
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    ///
    /// The flag write comes last, so VF as a destination holds the flag.
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) {
        let (value, overflow) = self.v[x as usize].overflowing_add(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = overflow as u8;
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) {
        let (value, borrow) = self.v[x as usize].overflowing_sub(self.v[y as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = !borrow as u8;
    }

    /// Shift VX right one bit, Set register VF to the least significant bit prior to the shift
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) {
        let lsb = self.v[x as usize] & 1u8;
        self.v[x as usize] >>= 1;
        self.v[0xF] = lsb;
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) {
        let (value, borrow) = self.v[y as usize].overflowing_sub(self.v[x as usize]);
        self.v[x as usize] = value;
        self.v[0xF] = !borrow as u8;
    }

    /// Shift VX left one bit, Set register VF to the most significant bit prior to the shift
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) {
        let msb = self.v[x as usize] >> 7;
        self.v[x as usize] <<= 1;
        self.v[0xF] = msb;
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_advance();
        }
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) {
        self.i = nnn;
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        let addr = nnn + self.v[0] as u16;
        if addr > ADDR_MASK {
            log::warn!("jump target {:#06x} wraps around address space", addr);
        }
        self.pc = addr & ADDR_MASK;
        Ok(())
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) {
        self.v[x as usize] = self.ctx.gen_random() & nn;
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    /// DXYN { x: u8, y: u8, n: u8 },
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) {
        let from = self.i as usize;
        let n = n as usize;
        if from + n > MEM_SIZE {
            log::warn!("sprite read at i={:#05x}, n={} wraps around address space", from, n);
        }
        let mut sprite = [0u8; 15];
        for row in 0..n {
            sprite[row] = self.memory[(from + row) & ADDR_MASK as usize];
        }
        let collision = self
            .frame
            .draw_sprite(&sprite[..n], self.v[x as usize], self.v[y as usize]);
        self.v[0xF] = collision as u8;
        self.ctx.on_frame(self.frame.view());
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) {
        let key = (self.v[x as usize] & 0x0F) as usize;
        let pressed = self.ctx.get_keys()[key];
        if pressed {
            self.pc_advance();
        }
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) {
        let key = (self.v[x as usize] & 0x0F) as usize;
        let pressed = self.ctx.get_keys()[key];
        if !pressed {
            self.pc_advance();
        }
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) {
        self.v[x as usize] = self.delay_timer.load();
    }

    /// Wait for a keypress and store the result in register VX
    ///
    /// Suspends execution; the program counter stays on this instruction and
    /// is advanced once a key press resumes the machine.
    /// FX0A { x: u8 },
    fn wait_for_key(&mut self, x: u8) -> Result<(), Error> {
        log::trace!("awaiting key into V{:X}", x);
        self.state = State::AwaitingKey { x };
        Ok(())
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) {
        self.delay_timer.store(self.v[x as usize]);
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) {
        let value = self.v[x as usize];
        let previous = self.sound_timer.load();
        self.sound_timer.store(value);
        if previous == 0 && value > 0 {
            self.ctx.sound_on();
        } else if previous > 0 && value == 0 {
            self.ctx.sound_off();
        }
    }

    /// Add the value stored in register VX to register I
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) {
        let sum = self.i + self.v[x as usize] as u16;
        if sum > ADDR_MASK {
            log::warn!("i {:#06x} wraps around address space", sum);
        }
        self.i = sum & ADDR_MASK;
    }

    /// Set I to the memory address of the sprite data corresponding to the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_sprite_vx(&mut self, x: u8) {
        self.i = (self.v[x as usize] & 0x0F) as u16 * FONT_GLYPH_LEN;
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) {
        let value = self.v[x as usize];
        let i = self.i as usize;
        if i + 2 >= MEM_SIZE {
            log::warn!("bcd write at i={:#05x} wraps around address space", i);
        }
        self.memory[i] = value / 100u8;
        self.memory[(i + 1) & ADDR_MASK as usize] = value % 100 / 10u8;
        self.memory[(i + 2) & ADDR_MASK as usize] = value % 10u8;
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    ///
    /// I is left unmodified.
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) {
        let i = self.i as usize;
        if i + x as usize >= MEM_SIZE {
            log::warn!("register store at i={:#05x}, x={} wraps around address space", i, x);
        }
        for idx in 0..=x as usize {
            self.memory[(i + idx) & ADDR_MASK as usize] = self.v[idx];
        }
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    ///
    /// I is left unmodified.
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) {
        let i = self.i as usize;
        if i + x as usize >= MEM_SIZE {
            log::warn!("register load at i={:#05x}, x={} wraps around address space", i, x);
        }
        for idx in 0..=x as usize {
            self.v[idx] = self.memory[(i + idx) & ADDR_MASK as usize];
        }
    }
}
