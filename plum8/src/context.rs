//! Context for accessing functionalities of the platform that `Plum8` is
//! emulated on.
//!
//! The machine core is strictly single-threaded and calls these hooks as
//! plain synchronous functions; implementors need no internal locking.

use crate::frame::FrameView;

/// Trait aggregating platform functionalities
pub trait Context {
    /// Draw current frame to the screen
    ///
    /// Called after every instruction that mutates the frame, with the
    /// whole grid. No partial-update contract is assumed.
    fn on_frame(&mut self, frame: FrameView<'_>);
    /// Turn sound on
    ///
    /// Called once per transition of the sound timer into a nonzero value
    fn sound_on(&mut self);
    /// Turn sound off
    ///
    /// Called once when the sound timer runs out or is overwritten with zero
    fn sound_off(&mut self);
    /// Get state of each key on the 4x4 keyboard
    ///
    /// Called on key-conditional instructions and while a key wait is pending
    fn get_keys(&mut self) -> &[bool; 16];
    /// Generate random 8-bit number
    ///
    /// Called whenever requested by the executing program
    fn gen_random(&mut self) -> u8;
}

#[cfg(test)]
pub mod testing {
    use super::*;

    use nanorand::{rand::pcg64::Pcg64 as Rng, RNG};

    use crate::frame::Frame;

    pub struct TestingContext {
        sound: bool,
        frame: Option<Frame>,
        keys: [bool; 16],
        rng: Rng,
    }

    impl TestingContext {
        pub fn new(seed: u128) -> Self {
            Self {
                sound: false,
                frame: None,
                keys: [false; 16],
                rng: Rng::new_seed(seed),
            }
        }

        pub fn is_sound_on(&self) -> bool {
            self.sound
        }

        pub fn get_frame(&self) -> Option<&Frame> {
            self.frame.as_ref()
        }

        pub fn set_key(&mut self, n: u8) {
            self.keys[n as usize] = true;
        }

        pub fn reset_key(&mut self, n: u8) {
            self.keys[n as usize] = false;
        }
    }

    impl Context for TestingContext {
        fn on_frame(&mut self, frame: FrameView<'_>) {
            self.frame = Some(frame.copy_frame());
        }

        fn sound_on(&mut self) {
            self.sound = true;
        }

        fn sound_off(&mut self) {
            self.sound = false;
        }

        fn gen_random(&mut self) -> u8 {
            self.rng.generate::<u8>()
        }

        fn get_keys(&mut self) -> &[bool; 16] {
            &self.keys
        }
    }

    #[test]
    fn testing_context() {
        let mut ctx = TestingContext::new(0);

        let mut frame = Frame::new();
        frame.as_raw_mut()[0] = 0b1010_0000;
        ctx.on_frame(frame.view());
        assert_eq!(ctx.get_frame(), Some(&frame));

        ctx.sound_on();
        assert!(ctx.is_sound_on());

        ctx.sound_off();
        assert!(!ctx.is_sound_on());

        ctx.set_key(0x01u8);
        ctx.set_key(0x0Fu8);
        assert_eq!(ctx.get_keys().iter().filter(|&&k| k == true).count(), 2);
        assert_eq!((ctx.keys[0x01], ctx.keys[0x0F]), (true, true));

        ctx.reset_key(0x0Fu8);
        assert_eq!(ctx.get_keys().iter().filter(|&&k| k == true).count(), 1);
        assert_eq!((ctx.keys[0x01], ctx.keys[0x0F]), (true, false));
    }
}
