use serde::{Deserialize, Serialize};
use tracing::debug;

use super::drag::{Drag, DragInput, DragOutcome};
use super::{Direction, Orientation, Way};
use crate::model::{ConId, ConLayout, ConTree, ConType, Rect};

/// No tiling container is resized below this share of its parent.
const MIN_PERCENT: f64 = 0.05;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Relative to current size
    #[default]
    Relative,
    /// Absolute target size
    Exact,
}

/// A resize value that can be specified as pixels or percentage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResizeValue {
    Pixels(f64),
    /// Fraction of the parent: 0.1 is ten percentage points.
    Percent(f64),
}

impl ResizeValue {
    /// Accepts `10`, `10px`, `10%` and `10ppt`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if let Some(num) = trimmed.strip_suffix('%').or_else(|| trimmed.strip_suffix("ppt")) {
            let pct: f64 = num.trim().parse().ok()?;
            Some(Self::Percent(pct / 100.0))
        } else {
            let px: f64 = trimmed.strip_suffix("px").unwrap_or(trimmed).trim().parse().ok()?;
            Some(Self::Pixels(px))
        }
    }

    /// The value as a fraction of `length` pixels.
    fn fraction_of(self, length: u32) -> f64 {
        match self {
            ResizeValue::Pixels(px) => px / length.max(1) as f64,
            ResizeValue::Percent(pct) => pct,
        }
    }
}

/// 2-dimensional resize payload with a mode, used for floating containers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ResizeDelta {
    pub x: ResizeValue,
    pub y: ResizeValue,
    #[serde(default)]
    pub mode: ResizeMode,
}

impl Default for ResizeDelta {
    fn default() -> Self {
        Self {
            x: ResizeValue::Pixels(0.0),
            y: ResizeValue::Pixels(0.0),
            mode: ResizeMode::Relative,
        }
    }
}

impl ResizeDelta {
    pub fn relative(x: ResizeValue, y: ResizeValue) -> Self {
        Self { x, y, mode: ResizeMode::Relative }
    }

    pub fn exact(x: ResizeValue, y: ResizeValue) -> Self {
        Self { x, y, mode: ResizeMode::Exact }
    }

    /// Convert into pixel deltas given current size (for relative) and output size (for exact %).
    pub fn to_pixel_delta(
        &self,
        current_w: f64,
        current_h: f64,
        screen_w: f64,
        screen_h: f64,
    ) -> (f64, f64) {
        let dx = Self::one_dim_delta(self.x, self.mode, current_w, screen_w);
        let dy = Self::one_dim_delta(self.y, self.mode, current_h, screen_h);
        (dx, dy)
    }

    fn one_dim_delta(value: ResizeValue, mode: ResizeMode, current: f64, screen: f64) -> f64 {
        let target = match (mode, value) {
            (ResizeMode::Relative, ResizeValue::Pixels(px)) => current + px,
            (ResizeMode::Relative, ResizeValue::Percent(pct)) => current * (1.0 + pct),
            (ResizeMode::Exact, ResizeValue::Pixels(px)) => px,
            (ResizeMode::Exact, ResizeValue::Percent(pct)) => screen * pct,
        };
        target - current
    }
}

fn axis_length(rect: &Rect, orientation: Orientation) -> u32 {
    match orientation {
        Orientation::Horizontal => rect.width,
        Orientation::Vertical => rect.height,
    }
}

impl ConTree {
    /// Finds the container that actually changes size when `con` is resized
    /// towards `direction`, together with the neighbour giving up the space.
    pub fn resize_partner(&self, con: ConId, direction: Direction) -> Option<(ConId, ConId)> {
        let orientation = direction.orientation();
        let mut current = con;
        loop {
            let c = &self.cons[current];
            if matches!(c.kind, ConType::Workspace | ConType::FloatingCon) {
                return None;
            }
            let parent = c.parent?;
            let p = &self.cons[parent];
            if p.layout == ConLayout::Default && p.orientation == Some(orientation) {
                let pos = p.nodes.iter().position(|&n| n == current)?;
                let neighbour = match direction.way() {
                    Way::Next => p.nodes.get(pos + 1).copied(),
                    Way::Prev => pos.checked_sub(1).map(|i| p.nodes[i]),
                };
                if let Some(neighbour) = neighbour {
                    return Some((current, neighbour));
                }
            }
            current = parent;
        }
    }

    /// Moves `delta` of the parent's space from `neighbour` to `con`.
    fn take_share(&mut self, con: ConId, neighbour: ConId, delta: f64) -> bool {
        let new_con = self.cons[con].percent + delta;
        let new_neighbour = self.cons[neighbour].percent - delta;
        if new_con < MIN_PERCENT || new_neighbour < MIN_PERCENT {
            debug!(con = ?con, neighbour = ?neighbour, delta, "resize would shrink a container too much");
            return false;
        }
        self.cons[con].percent = new_con;
        self.cons[neighbour].percent = new_neighbour;
        debug!(con = ?con, percent = new_con, neighbour = ?neighbour, "resized");
        true
    }

    /// Grows (or shrinks) a tiling container towards `direction`.
    pub fn resize_tiling(
        &mut self,
        con: ConId,
        direction: Direction,
        grow: bool,
        amount: ResizeValue,
    ) -> bool {
        let Some((current, neighbour)) = self.resize_partner(con, direction) else {
            debug!(con = ?con, ?direction, "nothing to resize in that direction");
            return false;
        };
        let parent = self.cons[current].parent.unwrap_or_else(|| panic!("{current:?} has no parent"));
        let length = axis_length(&self.cons[parent].rect, direction.orientation());
        let delta = amount.fraction_of(length);
        self.take_share(current, neighbour, if grow { delta } else { -delta })
    }

    /// Resizes the floating wrapper around `con`.
    pub fn resize_floating_by(&mut self, con: ConId, delta: ResizeDelta) -> bool {
        let Some(wrapper) = self.inside_floating(con) else {
            debug!(con = ?con, "not floating");
            return false;
        };
        let output = self.cons[self.output_of(wrapper)].rect;
        let rect = self.cons[wrapper].rect;
        let (dx, dy) = delta.to_pixel_delta(
            rect.width as f64,
            rect.height as f64,
            output.width as f64,
            output.height as f64,
        );
        let floating = &self.settings.floating;
        let width = (rect.width as f64 + dx).round().max(floating.minimum_width as f64) as u32;
        let height = (rect.height as f64 + dy).round().max(floating.minimum_height as f64) as u32;
        self.cons[wrapper].rect = Rect { width, height, ..rect };
        debug!(wrapper = ?wrapper, width, height, "resized floating container");
        true
    }

    /// Drags the separator between `first` and the sibling after it. The
    /// pixel distance the pointer travelled along the parent's axis is turned
    /// into a share moving from one to the other.
    pub fn resize_graphical<I: DragInput + ?Sized>(
        &mut self,
        first: ConId,
        second: ConId,
        start: (i32, i32),
        input: &mut I,
    ) -> DragOutcome {
        let parent = self.cons[first].parent.unwrap_or_else(|| panic!("{first:?} has no parent"));
        assert_eq!(self.cons[second].parent, Some(parent), "resizing containers of different parents");
        let orientation = self.cons[parent].orientation.unwrap_or(Orientation::Horizontal);
        let prect = self.cons[parent].rect;
        let margin = self.settings.resize_edge_margin as i32;
        let (low, high, origin) = match orientation {
            Orientation::Horizontal => (prect.x + margin, prect.right() - margin, start.0),
            Orientation::Vertical => (prect.y + margin, prect.bottom() - margin, start.1),
        };

        let mut position = origin;
        let outcome = Drag::new().run(first, prect, start, input, |_, _, _, pos| {
            let p = match orientation {
                Orientation::Horizontal => pos.0,
                Orientation::Vertical => pos.1,
            };
            if p < low || p > high {
                return;
            }
            position = p;
        });
        if outcome != DragOutcome::Released {
            return outcome;
        }

        let pixels = position - origin;
        if pixels == 0 {
            debug!("nothing changed, not updating");
            return outcome;
        }
        let delta = pixels as f64 / axis_length(&prect, orientation).max(1) as f64;
        self.take_share(first, second, delta);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::layout_engine::drag::DragSample;
    use crate::testing::{Fixture, RecordingDisplay, ScriptedInput, leaf_with_window};

    fn close_to(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

    #[test]
    fn parse_accepts_units() {
        assert_eq!(ResizeValue::parse("10"), Some(ResizeValue::Pixels(10.0)));
        assert_eq!(ResizeValue::parse("10px"), Some(ResizeValue::Pixels(10.0)));
        assert_eq!(ResizeValue::parse("10ppt"), Some(ResizeValue::Percent(0.1)));
        assert_eq!(ResizeValue::parse(" 25% "), Some(ResizeValue::Percent(0.25)));
        assert_eq!(ResizeValue::parse("wide"), None);
    }

    #[test]
    fn grow_takes_share_from_neighbour() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.render(&mut RecordingDisplay::default());
        assert!(fx.tree.resize_tiling(a, Direction::Right, true, ResizeValue::Pixels(100.0)));
        assert!(close_to(fx.tree.con(a).percent, 0.6));
        assert!(close_to(fx.tree.con(b).percent, 0.4));
        assert!(fx.tree.resize_tiling(b, Direction::Left, false, ResizeValue::Percent(0.1)));
        assert!(close_to(fx.tree.con(b).percent, 0.3));
        fx.assert_consistent();
    }

    #[test]
    fn resize_walks_up_to_matching_split() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.split(b, Orientation::Vertical);
        let split = fx.tree.con(b).parent().unwrap();
        let c = fx.tree.open(None);
        assert_eq!(fx.tree.resize_partner(c, Direction::Left), Some((split, a)));
        assert_eq!(fx.tree.resize_partner(c, Direction::Up), Some((c, b)));
        assert_eq!(fx.tree.resize_partner(c, Direction::Right), None);
    }

    #[test]
    fn refuses_to_shrink_below_minimum() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        fx.tree.open(None);
        assert!(!fx.tree.resize_tiling(a, Direction::Right, false, ResizeValue::Percent(0.48)));
        assert!(close_to(fx.tree.con(a).percent, 0.5));
    }

    #[test]
    fn floating_resize_changes_wrapper() {
        let mut fx = Fixture::new();
        let con = leaf_with_window(&mut fx, 1);
        fx.tree.floating_enable(con, false);
        let wrapper = fx.tree.con(con).parent().unwrap();
        let before = fx.tree.con(wrapper).rect;
        let delta = ResizeDelta::relative(ResizeValue::Pixels(50.0), ResizeValue::Pixels(-500.0));
        assert!(fx.tree.resize_floating_by(con, delta));
        let after = fx.tree.con(wrapper).rect;
        assert_eq!(after.width, before.width + 50);
        assert_eq!(after.height, 50);
        assert_eq!((after.x, after.y), (before.x, before.y));
    }

    fn motion(x: i32, y: i32) -> Option<DragSample> { Some(DragSample::Motion { x, y }) }

    #[test]
    fn dragging_separator_moves_share() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.render(&mut RecordingDisplay::default());
        let mut input = ScriptedInput::new([
            motion(600, 10),
            None,
            // within the edge margin, ignored
            motion(990, 10),
            None,
            Some(DragSample::ButtonRelease),
        ]);
        assert_eq!(fx.tree.resize_graphical(a, b, (500, 10), &mut input), DragOutcome::Released);
        assert!(close_to(fx.tree.con(a).percent, 0.6));
        assert!(close_to(fx.tree.con(b).percent, 0.4));
    }

    #[test]
    fn separator_released_in_place_changes_nothing() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.render(&mut RecordingDisplay::default());
        let mut input =
            ScriptedInput::new([motion(700, 10), None, motion(500, 10), None, Some(DragSample::ButtonRelease)]);
        fx.tree.resize_graphical(a, b, (500, 10), &mut input);
        assert!(close_to(fx.tree.con(a).percent, 0.5));
    }
}
