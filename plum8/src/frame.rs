use bitvec::prelude::*;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub(crate) const MEM_LENGTH: usize = WIDTH * HEIGHT / 8;

/// The 64x32 monochrome framebuffer
///
/// Every pixel is the XOR-accumulation of all sprite draws since the last
/// clear. Sprite coordinates wrap toroidally, so a draw never clips.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Frame([u8; MEM_LENGTH]);

/// A shared view over a `Frame`
///
/// Each pixel is represented either by a corresponding bit being set, or by `true` value.
/// Internally, the data is stored in a form of concatenating rows from top to bottom of the frame.
/// Rows are represented as an individual bits of continuous memory, matching the state of pixels
/// from left to the right.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FrameView<'a>(&'a [u8; MEM_LENGTH]);

impl<'a> FrameView<'a> {
    /// View the raw memory of a frame
    pub fn as_raw(&self) -> &[u8] {
        self.0
    }

    /// Create an immutable copy of a frame
    pub fn copy_frame(self) -> Frame {
        Frame(*self.0)
    }

    /// Access frame's bits by indexes
    pub fn get_bit(&self, x: usize, y: usize) -> Option<&bool> {
        self.iter_rows_as_bitslices()
            .nth(y)
            .map(|row| row.get(x))
            .flatten()
    }

    /// Get iterator over rows in a form of a `BitSlice`s
    pub fn iter_rows_as_bitslices(&self) -> impl Iterator<Item = &'a BitSlice<Msb0, u8>> {
        self.0.chunks(WIDTH / 8).map(|row| row.view_bits::<_>())
    }
}

impl Frame {
    pub(crate) fn new() -> Self {
        Self([0; MEM_LENGTH])
    }

    /// Get view over frame
    pub fn view(&self) -> FrameView<'_> {
        FrameView(&self.0)
    }

    /// Unset every pixel
    pub(crate) fn clear(&mut self) {
        self.0 = [0; MEM_LENGTH];
    }

    /// XOR a sprite onto the frame at `(x, y)` and report collision
    ///
    /// Bit `(row, col)` of the sprite lands on `((x + col) % 64, (y + row) % 32)`.
    /// The returned flag is true iff any pixel transitioned from set to unset.
    pub(crate) fn draw_sprite(&mut self, sprite: &[u8], x: u8, y: u8) -> bool {
        let mut collision = false;
        for (row, byte) in sprite.iter().enumerate() {
            let y = (y as usize + row) % HEIGHT;
            for col in 0..8 {
                if byte & (0x80u8 >> col) != 0 {
                    let x = (x as usize + col) % WIDTH;
                    collision |= self.xor_pixel(x, y);
                }
            }
        }
        collision
    }

    /// Flip a single pixel, returning true if it was cleared by the flip
    fn xor_pixel(&mut self, x: usize, y: usize) -> bool {
        let bits = self.0[..].view_bits_mut::<Msb0>();
        let idx = y * WIDTH + x;
        let was_set = bits[idx];
        bits.set(idx, !was_set);
        was_set
    }
}

#[cfg(test)]
impl<'a> FrameView<'a> {
    pub(crate) fn new(frame: &'a [u8; MEM_LENGTH]) -> Self {
        Self(frame)
    }
}

#[cfg(test)]
impl Frame {
    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
