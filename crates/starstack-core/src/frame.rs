use std::ops::Index;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::consts::{COLOR_CHANNEL_COUNT, MAX_STARS};

/// A detected star. Positions are sub-pixel `(row, col)` coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Star {
    pub row: f64,
    pub col: f64,
    pub brightness: f64,
}

impl Star {
    pub fn new(row: f64, col: f64, brightness: f64) -> Self {
        Self {
            row,
            col,
            brightness,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.row, self.col)
    }
}

/// Stars of one frame, sorted by descending brightness and capped in length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StarList {
    stars: Vec<Star>,
}

impl StarList {
    /// Sort `stars` brightest first and keep at most `cap` of them.
    ///
    /// The sort is stable, so stars of equal brightness keep their input order.
    pub fn new(mut stars: Vec<Star>, cap: usize) -> Self {
        stars.sort_by(|a, b| b.brightness.total_cmp(&a.brightness));
        stars.truncate(cap);
        Self { stars }
    }

    /// Same as [`StarList::new`] with the default cap of [`MAX_STARS`].
    pub fn brightest(stars: Vec<Star>) -> Self {
        Self::new(stars, MAX_STARS)
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Star> {
        self.stars.iter()
    }

    pub fn as_slice(&self) -> &[Star] {
        &self.stars
    }

    pub fn positions(&self) -> Vec<(f64, f64)> {
        self.stars.iter().map(Star::position).collect()
    }
}

impl Index<usize> for StarList {
    type Output = Star;

    fn index(&self, index: usize) -> &Star {
        &self.stars[index]
    }
}

impl<'a> IntoIterator for &'a StarList {
    type Item = &'a Star;
    type IntoIter = std::slice::Iter<'a, Star>;

    fn into_iter(self) -> Self::IntoIter {
        self.stars.iter()
    }
}

/// Processing stages a frame has completed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStatus {
    pub loaded: bool,
    /// Flat-field corrected.
    pub normalized: bool,
    /// Aligned onto the reference grid.
    pub registered: bool,
    /// Holds a star list valid for the current geometry.
    pub solved: bool,
}

impl FrameStatus {
    const LOADED: u8 = 1;
    const NORMALIZED: u8 = 1 << 1;
    const REGISTERED: u8 = 1 << 2;
    const SOLVED: u8 = 1 << 3;

    /// Pack the flags into the bit layout used by frame snapshots.
    pub fn to_bits(self) -> u8 {
        let mut bits = 0;
        if self.loaded {
            bits |= Self::LOADED;
        }
        if self.normalized {
            bits |= Self::NORMALIZED;
        }
        if self.registered {
            bits |= Self::REGISTERED;
        }
        if self.solved {
            bits |= Self::SOLVED;
        }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            loaded: bits & Self::LOADED != 0,
            normalized: bits & Self::NORMALIZED != 0,
            registered: bits & Self::REGISTERED != 0,
            solved: bits & Self::SOLVED != 0,
        }
    }
}

/// A 16-bit RGB exposure plus its processing state.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, shape = (height, width, 3).
    pub data: Array3<u16>,
    pub status: FrameStatus,
    /// Stars of the current geometry; meaningful only while `status.solved`
    /// or right after registration refreshed them.
    pub stars: StarList,
}

impl Frame {
    /// Wrap freshly decoded pixels. The frame starts out loaded and nothing else.
    pub fn new(data: Array3<u16>) -> Self {
        Self {
            data,
            status: FrameStatus {
                loaded: true,
                ..Default::default()
            },
            stars: StarList::default(),
        }
    }

    pub fn filled(height: usize, width: usize, value: u16) -> Self {
        Self::new(Array3::from_elem((height, width, COLOR_CHANNEL_COUNT), value))
    }

    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Attach a solver star list and mark the frame solved.
    pub fn set_stars(&mut self, stars: StarList) {
        self.stars = stars;
        self.status.solved = true;
    }
}
