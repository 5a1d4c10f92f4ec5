//! Rectangular pixel grids.
//!
//! Pixels are stored row-major and addressed as `(x, y)` with `x` running
//! along a row. The same container carries RGB triples before greyscale
//! reduction and single intensities afterwards.

use serde::{Deserialize, Serialize};

/// Grid shape violations reported at construction or validation time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("invalid image dimensions (width={width}, height={height}, pixels={len})")]
    InvalidDimensions {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("non-rectangular pixel rows (row {row} has {got} pixels, expected {expected})")]
    RaggedRows {
        row: usize,
        expected: usize,
        got: usize,
    },
}

/// One RGB pixel, channels in `0..=255`.
pub type Rgb = [u8; 3];

/// Width and height of a grid, as reported to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

fn check_dims(width: usize, height: usize, len: usize) -> Result<(), ImageError> {
    if width == 0 || height == 0 || width.checked_mul(height) != Some(len) {
        return Err(ImageError::InvalidDimensions { width, height, len });
    }
    Ok(())
}

/// Borrowed view over a row-major pixel buffer.
#[derive(Debug)]
pub struct PixelGridView<'a, P> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [P], // row-major, len = w*h
}

impl<P> Clone for PixelGridView<'_, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PixelGridView<'_, P> {}

impl<'a, P: Copy> PixelGridView<'a, P> {
    /// Check that the view is non-empty and its buffer matches its shape.
    pub fn validate(&self) -> Result<(), ImageError> {
        check_dims(self.width, self.height, self.data.len())
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        ImageSize {
            width: self.width,
            height: self.height,
        }
    }

    /// Bounds-checked pixel access.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<P> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    /// Pixel access for coordinates already known to be in range.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> P {
        self.data[y * self.width + x]
    }

    /// True on the outermost row or column.
    #[inline]
    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x + 1 == self.width || y + 1 == self.height
    }

    pub fn to_grid(&self) -> PixelGrid<P> {
        PixelGrid {
            width: self.width,
            height: self.height,
            data: self.data.to_vec(),
        }
    }
}

/// Owned row-major pixel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid<P> {
    pub width: usize,
    pub height: usize,
    pub data: Vec<P>,
}

impl<P: Copy> PixelGrid<P> {
    pub fn new(width: usize, height: usize, data: Vec<P>) -> Result<Self, ImageError> {
        check_dims(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: P) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a grid from rows of pixels; every row must have the same length.
    pub fn from_rows<R: AsRef<[P]>>(rows: &[R]) -> Result<Self, ImageError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(width * height);
        for (row, r) in rows.iter().enumerate() {
            let r = r.as_ref();
            if r.len() != width {
                return Err(ImageError::RaggedRows {
                    row,
                    expected: width,
                    got: r.len(),
                });
            }
            data.extend_from_slice(r);
        }
        Self::new(width, height, data)
    }

    /// Re-check the shape of a grid assembled through its public fields.
    pub fn validate(&self) -> Result<(), ImageError> {
        check_dims(self.width, self.height, self.data.len())
    }

    #[inline]
    pub fn view(&self) -> PixelGridView<'_, P> {
        PixelGridView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        self.view().size()
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<P> {
        self.view().get(x, y)
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> P {
        self.data[y * self.width + x]
    }

    /// Write one pixel. Panics if `(x, y)` lies outside the grid.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: P) {
        let idx = y * self.width + x;
        self.data[idx] = value;
    }
}

impl<P: Copy + PartialEq> PixelGrid<P> {
    /// Number of pixels equal to `value`.
    pub fn count_value(&self, value: P) -> usize {
        self.data.iter().filter(|&&p| p == value).count()
    }
}

pub type GrayImage = PixelGrid<u8>;
pub type GrayImageView<'a> = PixelGridView<'a, u8>;
pub type RgbImage = PixelGrid<Rgb>;
pub type RgbImageView<'a> = PixelGridView<'a, Rgb>;

impl GrayImage {
    /// Expand to R=G=B, the form written back out by image encoders.
    pub fn to_rgb(&self) -> RgbImage {
        RgbImage {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| [v, v, v]).collect(),
        }
    }
}
