//! Display orientation: panel scan transform and touch coordinate mapping.

/// Rotation of the logical screen relative to the panel's native scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

/// Scan direction settings that realize an [`Orientation`] on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelTransform {
    pub swap_xy: bool,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl PanelTransform {
    const fn new(swap_xy: bool, mirror_x: bool, mirror_y: bool) -> Self {
        Self {
            swap_xy,
            mirror_x,
            mirror_y,
        }
    }
}

impl Orientation {
    /// Next orientation a quarter turn clockwise
    pub fn next(self) -> Self {
        match self {
            Orientation::Deg0 => Orientation::Deg90,
            Orientation::Deg90 => Orientation::Deg180,
            Orientation::Deg180 => Orientation::Deg270,
            Orientation::Deg270 => Orientation::Deg0,
        }
    }

    /// Clockwise rotation in degrees
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    pub fn is_swapped(self) -> bool {
        matches!(self, Orientation::Deg90 | Orientation::Deg270)
    }

    /// The panel mounts mirrored along x, hence the mirror at 0°.
    pub fn panel_transform(self) -> PanelTransform {
        match self {
            Orientation::Deg0 => PanelTransform::new(false, true, false),
            Orientation::Deg90 => PanelTransform::new(true, true, true),
            Orientation::Deg180 => PanelTransform::new(false, false, true),
            Orientation::Deg270 => PanelTransform::new(true, false, false),
        }
    }

    /// Logical screen size for a panel of `width` x `height` native pixels
    pub fn logical_size(self, width: u16, height: u16) -> (u16, u16) {
        if self.is_swapped() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Maps a raw touch point on a `width` x `height` panel into logical
    /// coordinates. Raw points outside the panel are clamped to its edge, a
    /// panel without pixels maps everything to the origin.
    pub fn map_touch_point(self, x: u16, y: u16, width: u16, height: u16) -> (u16, u16) {
        let max_x = width.saturating_sub(1);
        let max_y = height.saturating_sub(1);
        let mut x = x.min(max_x);
        let mut y = y.min(max_y);

        if matches!(self, Orientation::Deg180 | Orientation::Deg270) {
            x = max_x - x;
            y = max_y - y;
        }
        if self.is_swapped() {
            let tmp = y;
            y = x;
            x = max_y - tmp;
        }
        (x, y)
    }
}
