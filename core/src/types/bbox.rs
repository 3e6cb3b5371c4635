use std::fmt;

/// Axis-aligned box in source-image pixel coordinates
///
/// `x`/`y` address the top-left corner; the box covers the half-open ranges
/// `[x, x + width)` and `[y, y + height)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Creates a new BoundingBox
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a box from a start corner and an exclusive end corner
    pub fn from_bounds(x_min: u32, y_min: u32, x_end: u32, y_end: u32) -> Self {
        Self {
            x: x_min,
            y: y_min,
            width: x_end.saturating_sub(x_min),
            height: y_end.saturating_sub(y_min),
        }
    }

    /// Exclusive right edge
    pub fn x_end(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn y_end(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Checks whether the pixel at (x, y) lies inside the box
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x_end() && y >= self.y && y < self.y_end()
    }

    /// Restricts the box to an image of the given dimensions
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self::from_bounds(x, y, self.x_end().min(width), self.y_end().min(height))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[x={}, y={}, w={}, h={}]",
            self.x, self.y, self.width, self.height
        )
    }
}
