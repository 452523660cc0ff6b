use serde::{Deserialize, Serialize};

/// An absolute pixel rectangle. Positions are signed because outputs can be
/// placed left of or above the origin.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Signed offsets added to a [`Rect`], e.g. the space a border style takes away
/// from the window inside a container.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectDelta {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const ZERO: Rect = Rect { x: 0, y: 0, width: 0, height: 0 };

    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_zero(&self) -> bool { *self == Self::ZERO }

    pub fn right(&self) -> i32 { self.x.saturating_add(self.width as i32) }

    pub fn bottom(&self) -> i32 { self.y.saturating_add(self.height as i32) }

    pub fn center(&self) -> (i32, i32) {
        (self.x + (self.width / 2) as i32, self.y + (self.height / 2) as i32)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Applies a border delta. Sizes never underflow; a delta larger than the
    /// rectangle collapses it to zero.
    pub fn adjusted(&self, delta: RectDelta) -> Rect {
        Rect {
            x: self.x + delta.x,
            y: self.y + delta.y,
            width: add_signed(self.width, delta.width),
            height: add_signed(self.height, delta.height),
        }
    }

    /// Moves this rectangle so that its center matches the center of `other`.
    pub fn centered_over(&self, other: &Rect) -> Rect {
        Rect {
            x: other.x + (other.width / 2) as i32 - (self.width / 2) as i32,
            y: other.y + (other.height / 2) as i32 - (self.height / 2) as i32,
            ..*self
        }
    }

    /// Same rectangle expressed relative to the origin of `outer`.
    pub fn relative_to(&self, outer: &Rect) -> Rect {
        Rect {
            x: self.x - outer.x,
            y: self.y - outer.y,
            ..*self
        }
    }

    pub fn with_min_size(&self, width: u32, height: u32) -> Rect {
        Rect {
            width: self.width.max(width),
            height: self.height.max(height),
            ..*self
        }
    }
}

fn add_signed(value: u32, delta: i32) -> u32 {
    if delta >= 0 {
        value.saturating_add(delta as u32)
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjusted_saturates_instead_of_wrapping() {
        let r = Rect::new(10, 10, 3, 3);
        let shrunk = r.adjusted(RectDelta { x: 2, y: 0, width: -4, height: -2 });
        assert_eq!(shrunk, Rect::new(12, 10, 0, 1));
    }

    #[test]
    fn centered_over_keeps_size() {
        let small = Rect::new(0, 0, 100, 50);
        let ws = Rect::new(0, 0, 1000, 800);
        assert_eq!(small.centered_over(&ws), Rect::new(450, 375, 100, 50));
    }

    #[test]
    fn contains_is_half_open() {
        let r = Rect::new(0, 0, 10, 10);
        assert!(r.contains(0, 0));
        assert!(r.contains(9, 9));
        assert!(!r.contains(10, 5));
    }
}
