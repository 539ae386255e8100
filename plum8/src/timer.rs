/// Transition report of a countdown step, used to fire the sound hooks
/// exactly once per on/off edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TimerState {
    On,
    Off,
    Finished,
}

/// An 8-bit countdown timer, decremented at 60 Hz and never below zero.
#[derive(Debug)]
pub struct Timer(u8);

impl Timer {
    pub fn new() -> Self {
        Self(0)
    }

    #[inline]
    pub fn store(&mut self, value: u8) {
        self.0 = value;
    }

    #[inline]
    pub fn load(&self) -> u8 {
        self.0
    }

    #[inline]
    pub fn decrement(&mut self) -> TimerState {
        if self.0 > 0 {
            self.0 -= 1;
            if self.0 == 0 {
                TimerState::Finished
            } else {
                TimerState::On
            }
        } else {
            TimerState::Off
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_floors_at_zero() {
        let mut timer = Timer::new();
        assert_eq!(timer.decrement(), TimerState::Off);
        assert_eq!(timer.load(), 0);

        timer.store(2);
        assert_eq!(timer.decrement(), TimerState::On);
        assert_eq!(timer.decrement(), TimerState::Finished);
        assert_eq!(timer.decrement(), TimerState::Off);
        assert_eq!(timer.load(), 0);
    }
}
