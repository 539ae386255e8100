#[cfg(test)]
pub mod testing {
    use core::fmt;
    use core::ops::RangeBounds;

    use crate::frame::{FrameView, HEIGHT, WIDTH};

    #[macro_export]
    macro_rules! assert_eq_2d {
        (x_range: $xrange:expr, y_range: $yrange:expr; $lhs:expr, $rhs:expr $(,)?) => {{
            let mut lhs_mask = crate::utils::testing::ImageMask::new();
            let mut rhs_mask = crate::utils::testing::ImageMask::new();
            lhs_mask.set_slice($xrange, $yrange, &$lhs);
            rhs_mask.set_slice($xrange, $yrange, &$rhs);
            assert_eq!(lhs_mask, rhs_mask);
        }};
    }

    #[derive(Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ImageMask([[bool; WIDTH]; HEIGHT]);

    impl ImageMask {
        pub fn new() -> Self {
            Self([[false; WIDTH]; HEIGHT])
        }

        pub fn offset(&self, xoffset: usize, yoffset: usize) -> Self {
            let mut shifted = Self::new();
            for y in 0..HEIGHT {
                for x in 0..WIDTH {
                    if y + yoffset < HEIGHT && x + xoffset < WIDTH {
                        shifted.0[y + yoffset][x + xoffset] = self.0[y][x];
                    }
                }
            }
            shifted
        }

        pub fn set_slice<T>(&mut self, range_x: T, range_y: T, other: &Self)
        where
            T: RangeBounds<usize>,
        {
            for x in 0..WIDTH {
                for y in 0..HEIGHT {
                    if range_x.contains(&x) && range_y.contains(&y) {
                        self.0[y][x] = other.0[y][x];
                    }
                }
            }
        }
    }

    impl fmt::Debug for ImageMask {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let width = self.0[0].len() + 2;
            write!(f, "\n")?;
            for _ in 0..width {
                write!(f, "-")?;
            }
            write!(f, "\n")?;
            for row in &self.0 {
                write!(f, "|")?;
                row.iter()
                    .map(|&p| if p { write!(f, "#") } else { write!(f, " ") })
                    .fold(Ok(()), |acc, r| acc.and(r))?;
                write!(f, "|\n")?;
            }
            for _ in 0..width {
                write!(f, "-")?;
            }
            Ok(())
        }
    }

    pub trait ToMask {
        fn to_mask(&self) -> ImageMask;
    }

    impl ToMask for str {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            mask.0
                .iter_mut()
                .zip(self.split_whitespace())
                .for_each(|(m_row, c_row)| {
                    m_row
                        .iter_mut()
                        .zip(c_row.chars())
                        .for_each(|(m, c)| *m = if c == '#' { true } else { false })
                });
            mask
        }
    }

    impl<'a> ToMask for FrameView<'a> {
        fn to_mask(&self) -> ImageMask {
            let mut mask = ImageMask::new();
            self.iter_rows_as_bitslices()
                .zip(mask.0.iter_mut())
                .for_each(|(f_row, m_row)| {
                    m_row
                        .iter_mut()
                        .zip(f_row)
                        .for_each(|(m, &f)| *m = f)
                });
            mask
        }
    }

    mod tests {
        use super::*;
        use crate::frame::MEM_LENGTH;

        #[test]
        fn to_image_mask() {
            let empty = [0u8; MEM_LENGTH];
            let full = [255u8; MEM_LENGTH];

            assert_eq!(ImageMask::new(), FrameView::new(&empty).to_mask());
            assert_ne!(ImageMask::new(), FrameView::new(&full).to_mask());
            assert_eq!(
                "##......
                 #.#.....
                 #..#...."
                    .to_mask()
                    .offset(1, 1),
                ".........
                 .##......
                 .#.#.....
                 .#..#...."
                    .to_mask(),
            );
        }
    }
}
