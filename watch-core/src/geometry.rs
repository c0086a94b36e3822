//! Screen rectangles and the pixel-pair alignment the panel needs.
//!
//! The SH8601 only accepts windows that start on an even column and row and
//! span an even number of each. Every region handed to the panel goes
//! through [`Area::round_to_pixel_pairs`] first.

/// Inclusive rectangle in panel pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Area {
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Area covering `width` x `height` pixels from `(x, y)`, `None` if empty
    pub fn from_origin_size(x: u16, y: u16, width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(
            x,
            y,
            x.saturating_add(width - 1),
            y.saturating_add(height - 1),
        ))
    }

    pub fn width(&self) -> u32 {
        if self.x2 < self.x1 {
            0
        } else {
            u32::from(self.x2 - self.x1) + 1
        }
    }

    pub fn height(&self) -> u32 {
        if self.y2 < self.y1 {
            0
        } else {
            u32::from(self.y2 - self.y1) + 1
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.x2 < self.x1 || self.y2 < self.y1
    }

    pub fn contains(&self, other: &Area) -> bool {
        self.x1 <= other.x1 && self.y1 <= other.y1 && self.x2 >= other.x2 && self.y2 >= other.y2
    }

    /// Grows the area so both corners fall on pixel-pair boundaries: starts
    /// round down to even, ends round up to odd.
    pub fn round_to_pixel_pairs(&mut self) {
        self.x1 &= !1;
        self.y1 &= !1;
        self.x2 |= 1;
        self.y2 |= 1;
    }

    pub fn rounded(mut self) -> Self {
        self.round_to_pixel_pairs();
        self
    }

    /// Intersection with a `width` x `height` frame. Clipping a rounded area
    /// to a frame with even dimensions keeps it rounded.
    pub fn clipped(&self, width: u16, height: u16) -> Option<Area> {
        if self.is_empty() || width == 0 || height == 0 {
            return None;
        }
        let area = Area::new(
            self.x1,
            self.y1,
            self.x2.min(width - 1),
            self.y2.min(height - 1),
        );
        (!area.is_empty()).then_some(area)
    }

    /// Splits the area into full-width bands of at most `max_rows` rows.
    ///
    /// The band height is forced even (at least two rows) so every band of a
    /// rounded area stays rounded.
    pub fn bands(&self, max_rows: u16) -> Bands {
        let rows = (max_rows & !1).max(2);
        Bands {
            area: *self,
            rows,
            next_y: if self.is_empty() {
                None
            } else {
                Some(self.y1)
            },
        }
    }
}

/// Iterator returned by [`Area::bands`]
#[derive(Debug, Clone)]
pub struct Bands {
    area: Area,
    rows: u16,
    next_y: Option<u16>,
}

impl Iterator for Bands {
    type Item = Area;

    fn next(&mut self) -> Option<Area> {
        let y1 = self.next_y?;
        let y2 = y1.saturating_add(self.rows - 1).min(self.area.y2);
        self.next_y = if y2 >= self.area.y2 {
            None
        } else {
            Some(y2 + 1)
        };
        Some(Area::new(self.area.x1, y1, self.area.x2, y2))
    }
}
