use tracing::{debug, info};

use super::Direction;
use crate::model::{ConId, ConLayout, ConTree, ConType, FloatingState, Rect};

impl ConTree {
    /// Turns `con` into floating content: it is moved into a new floating
    /// wrapper on its workspace. A workspace floats all of its tiling
    /// children at once.
    pub fn floating_enable(&mut self, con: ConId, automatic: bool) {
        if self.cons[con].is_floating() {
            debug!(con = ?con, "container is already floating");
            return;
        }

        let mut con = con;
        let mut set_focus = true;
        let previously_focused = self.focused;
        if self.cons[con].kind == ConType::Workspace {
            if self.cons[con].nodes.is_empty() {
                debug!(workspace = ?con, "workspace is empty, aborting");
                return;
            }
            let orientation = self.cons[con].orientation;
            con = self.wrap_workspace_children(con, ConLayout::Default, orientation);
            set_focus = false;
        }

        let old_parent = self.cons[con].parent.unwrap_or_else(|| panic!("floating parentless {con:?}"));
        let ws = self.workspace_of(con);
        self.detach(con);
        self.fix_percent(old_parent);

        let wrapper = self.new_con(ConType::FloatingCon);
        self.cons[wrapper].name = format!("floating wrapper around {con:?}");
        self.attach(wrapper, ws, false);

        let settings = &self.settings;
        let (min_w, min_h) = (settings.floating.minimum_width, settings.floating.minimum_height);
        let deco_height = settings.deco_height();
        let mut rect = self.cons[con].geometry;
        if rect.is_zero() {
            for &child in &self.cons[con].nodes {
                let g = self.cons[child].geometry;
                rect.width += g.width;
                rect.height = rect.height.max(g.height);
            }
        }
        let mut rect = rect.with_min_size(min_w, min_h);
        rect.height += deco_height + 4;
        rect.width += 4;

        if rect.x == 0 && rect.y == 0 {
            let leader = self.cons[con]
                .window
                .as_ref()
                .and_then(|w| w.leader)
                .and_then(|l| self.con_by_window_id(l))
                .filter(|&l| l != con);
            let over = match leader {
                Some(leader) => {
                    debug!(con = ?con, leader = ?leader, "centering over leader");
                    self.cons[leader].rect
                }
                None => self.cons[ws].rect,
            };
            rect = rect.centered_over(&over);
        }

        self.cons[wrapper].rect = rect;
        self.cons[wrapper].orientation = None;
        self.cons[wrapper].nodes.push(con);
        self.cons[wrapper].focus.push(con);
        {
            let c = &mut self.cons[con];
            c.parent = Some(wrapper);
            c.percent = 1.0;
            c.floating = FloatingState::enabled(automatic);
            c.old_parent = Some(old_parent);
        }
        info!(con = ?con, wrapper = ?wrapper, ?rect, automatic, "floating enabled");

        let p = &self.cons[old_parent];
        if matches!(p.kind, ConType::Con | ConType::FloatingCon) && p.nodes.is_empty() {
            self.close(old_parent, false, false);
        }

        if set_focus {
            self.focus(con);
        } else if let Some(f) = previously_focused {
            if self.cons.contains_key(f) && self.is_inside(f, con) {
                self.focus(f);
            }
        }
    }

    /// Puts a floating container back into the tiling layout of its workspace.
    pub fn floating_disable(&mut self, con: ConId, automatic: bool) {
        if !self.cons[con].is_floating() {
            debug!(con = ?con, "container is not floating");
            return;
        }
        let wrapper = self.cons[con].parent.unwrap_or_else(|| panic!("floating {con:?} has no wrapper"));
        let ws = self.workspace_of(con);

        self.detach(con);
        self.close(wrapper, false, false);

        let target = self.insertion_parent(ws);
        {
            let c = &mut self.cons[con];
            c.percent = 0.0;
            c.floating = FloatingState::disabled(automatic);
            c.old_parent = None;
        }
        self.attach(con, target, false);
        self.fix_percent(target);
        info!(con = ?con, parent = ?target, automatic, "floating disabled");
        self.focus(con);
    }

    pub fn floating_toggle(&mut self, con: ConId, automatic: bool) {
        if self.cons[con].is_floating() {
            self.floating_disable(con, automatic);
        } else {
            self.floating_enable(con, automatic);
        }
    }

    /// Puts the wrapper on top of the floating stack of its workspace.
    pub fn floating_raise(&mut self, wrapper: ConId) {
        let Some(ws) = self.cons[wrapper].parent else { return };
        let floating = &mut self.cons[ws].floating_nodes;
        let Some(pos) = floating.iter().position(|&f| f == wrapper) else {
            debug!(con = ?wrapper, "not a floating wrapper, not raising");
            return;
        };
        floating.remove(pos);
        floating.push(wrapper);
        debug!(wrapper = ?wrapper, "raised floating container");
    }

    /// Moves the floating content around `con` a few pixels in `direction`,
    /// unless that would take it off its output.
    pub fn floating_move(&mut self, con: ConId, direction: Direction) -> bool {
        let Some(wrapper) = self.inside_floating(con) else {
            debug!(con = ?con, "not floating, cannot move");
            return false;
        };
        let step = self.settings.floating.move_step as i32;
        let mut dest = self.cons[wrapper].rect;
        match direction {
            Direction::Left => dest.x -= step,
            Direction::Right => dest.x += step,
            Direction::Up => dest.y -= step,
            Direction::Down => dest.y += step,
        }
        let output = self.cons[self.output_of(wrapper)].rect;
        if vanishes(&dest, &output) {
            debug!(wrapper = ?wrapper, ?direction, "floating container would leave the output");
            return false;
        }
        self.cons[wrapper].rect = dest;
        true
    }
}

/// Whether less than 5 pixels of `rect` would remain on `output`.
fn vanishes(rect: &Rect, output: &Rect) -> bool {
    const KEEP: i32 = 5;
    rect.right() < output.x + KEEP
        || rect.x > output.right() - KEEP
        || rect.bottom() < output.y + KEEP
        || rect.y > output.bottom() - KEEP
}
