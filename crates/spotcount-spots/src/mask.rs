//! Parametric ring ("donut") templates.

use std::fmt;

use crate::ScaleCalibration;

pub const MASK_ON: u8 = 255;
pub const MASK_OFF: u8 = 0;

/// Side `2 * radius + 1` of the template for `radius`, if it fits in `usize`.
pub fn mask_side(radius: usize) -> Option<usize> {
    radius.checked_mul(2)?.checked_add(1)
}

/// Square binary template of side `2 * radius + 1`.
///
/// Cell `(i, j)` is on when its squared distance from the center lies
/// strictly inside `(ring_radius - delta)^2 ± width`. Membership depends only
/// on that distance, so every mask is symmetric under 180° rotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    radius: usize,
    side: usize,
    data: Vec<u8>, // row-major over (i, j), len = side*side
}

impl Mask {
    /// Panics if `2 * radius + 1` overflows; callers size-check with
    /// [`mask_side`] first.
    pub fn ring(radius: usize, ring_radius: usize, width: i64, delta: i64) -> Self {
        let side = 2 * radius + 1;
        let r = radius as i64;
        let band = ring_radius as i64 - delta;
        let target = band * band;

        let mut data = Vec::with_capacity(side * side);
        for j in 0..side as i64 {
            for i in 0..side as i64 {
                let dist2 = (i - r) * (i - r) + (j - r) * (j - r);
                let on = target - width < dist2 && dist2 < target + width;
                data.push(if on { MASK_ON } else { MASK_OFF });
            }
        }
        Self { radius, side, data }
    }

    /// Edge-signature template for spots of the given radius.
    pub fn spot_ring(radius: usize, cal: &ScaleCalibration) -> Self {
        Self::ring(radius, radius, cal.ring_width, cal.delta)
    }

    /// Interior footprint (half the ring radius) used to mark a spot as counted.
    pub fn spot_center(radius: usize, cal: &ScaleCalibration) -> Self {
        Self::ring(radius, radius / 2, cal.ring_width, cal.delta)
    }

    #[inline]
    pub fn radius(&self) -> usize {
        self.radius
    }

    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.data[j * self.side + i]
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Offsets `(i, j)` of every on cell.
    pub fn on_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let side = self.side;
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v == MASK_ON)
            .map(move |(idx, _)| (idx % side, idx / side))
    }

    pub fn on_count(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_ON).count()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.data.chunks_exact(self.side) {
            for v in row {
                write!(f, "{v:3} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CALIBRATION;

    fn ascii(mask: &Mask) -> Vec<String> {
        mask.data()
            .chunks_exact(mask.side())
            .map(|row| {
                row.iter()
                    .map(|&v| if v == MASK_ON { '#' } else { '.' })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn smallest_ring_shape() {
        let mask = Mask::spot_ring(4, &CALIBRATION[0]);
        assert_eq!(mask.side(), 9);
        assert_eq!(mask.on_count(), 32);
        assert_eq!(
            ascii(&mask),
            vec![
                "..#####..",
                ".##...##.",
                "##.....##",
                "#.......#",
                "#.......#",
                "#.......#",
                "##.....##",
                ".##...##.",
                "..#####..",
            ]
        );
    }

    #[test]
    fn center_footprint_is_a_small_disk() {
        let mask = Mask::spot_center(4, &CALIBRATION[0]);
        assert_eq!(mask.side(), 9);
        assert_eq!(mask.on_count(), 29);
        assert_eq!(mask.get(4, 4), MASK_ON);
        assert_eq!(mask.get(4, 1), MASK_ON);
        assert_eq!(mask.get(4, 0), MASK_OFF);
        assert_eq!(mask.get(1, 1), MASK_OFF);
    }

    #[test]
    fn masks_are_point_symmetric() {
        for (s, cal) in CALIBRATION.iter().enumerate() {
            for r1 in 0..6 {
                let radius = r1 + s;
                for mask in [Mask::spot_ring(radius, cal), Mask::spot_center(radius, cal)] {
                    let n = mask.side() - 1;
                    for j in 0..=n {
                        for i in 0..=n {
                            assert_eq!(mask.get(i, j), mask.get(n - i, n - j));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn on_cells_agree_with_get() {
        let mask = Mask::ring(5, 4, 9, 1);
        let cells: Vec<_> = mask.on_cells().collect();
        assert_eq!(cells.len(), mask.on_count());
        assert!(cells.iter().all(|&(i, j)| mask.get(i, j) == MASK_ON));
    }

    #[test]
    fn display_prints_padded_matrix() {
        let mask = Mask::ring(1, 1, 1, 0);
        assert_eq!(
            mask.to_string(),
            "  0 255   0 \n255   0 255 \n  0 255   0 \n"
        );
    }
}
