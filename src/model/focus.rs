use tracing::{debug, trace};

use super::con::{ConId, ConType};
use super::tree::ConTree;
use crate::layout_engine::{Orientation, Way};

impl ConTree {
    /// Makes `con` the focused container: it moves to the head of its parent's
    /// focus stack, and so does every ancestor below the root.
    pub fn focus(&mut self, con: ConId) {
        let mut current = con;
        loop {
            let parent = self.cons[current]
                .parent
                .unwrap_or_else(|| panic!("cannot focus {current:?}, it has no parent"));
            let focus = &mut self.cons[parent].focus;
            let pos = focus
                .iter()
                .position(|&c| c == current)
                .unwrap_or_else(|| panic!("{current:?} missing from focus stack of {parent:?}"));
            focus.remove(pos);
            focus.insert(0, current);
            if self.cons[parent].parent.is_none() {
                break;
            }
            current = parent;
        }
        trace!(con = ?con, "focused");
        self.focused = Some(con);

        if self.cons[con].urgent {
            self.cons[con].urgent = false;
            if let Some(ws) = self.workspace_of_opt(con) {
                self.update_urgent_flag(ws);
            }
        }
    }

    /// The container that should get focus once `con` is gone.
    pub fn next_focused(&self, con: ConId) -> ConId {
        let c = &self.cons[con];
        let parent = c.parent.unwrap_or_else(|| panic!("{con:?} has no parent"));

        if c.kind == ConType::FloatingCon {
            let floating = &self.cons[parent].floating_nodes;
            let pos = floating.iter().position(|&f| f == con);
            if let Some(&next) = pos.and_then(|p| floating.get(p + 1)) {
                trace!(from = ?con, to = ?next, "focusing next floating container");
                return self.descend_focused(next);
            }
            let ws = self.workspace_of(con);
            let mut next = ws;
            while let Some(&first) = self.cons[next].focus.iter().find(|&&f| f != con) {
                next = first;
            }
            return next;
        }

        let focus = &self.cons[parent].focus;
        let pos = focus.iter().position(|&f| f == con);
        let mut next = pos.and_then(|p| focus.get(p + 1)).copied().unwrap_or(parent);
        while let Some(&first) = self.cons[next].focus.first() {
            if first == con {
                break;
            }
            next = first;
        }
        next
    }

    /// Follows the first entry of each focus stack down to the deepest node.
    pub fn descend_focused(&self, con: ConId) -> ConId {
        let mut next = con;
        while let Some(&first) = self.cons[next].focus.first() {
            next = first;
        }
        next
    }

    /// Where a tiling container arriving on `ws` gets attached: next to the
    /// deepest focused container, but never inside a floating wrapper.
    pub(crate) fn insertion_parent(&self, ws: ConId) -> ConId {
        let mut next = self.descend_focused(ws);
        if self.cons[next].kind != ConType::Workspace {
            next = self.cons[next].parent.unwrap_or(ws);
        }
        if let Some(wrapper) = self.inside_floating(next) {
            next = self.cons[wrapper].parent.unwrap_or(ws);
        }
        next
    }

    /// Focuses the parent of the focused container.
    pub fn level_up(&mut self) -> bool {
        let focused = self.focused();
        let Some(parent) = self.cons[focused].parent else { return false };
        if !matches!(self.cons[parent].kind, ConType::Con | ConType::Workspace) {
            debug!(con = ?focused, "cannot go up any further");
            return false;
        }
        self.focus(parent);
        true
    }

    /// Focuses the most recently focused child of the focused container.
    pub fn level_down(&mut self) -> bool {
        let focused = self.focused();
        let Some(&next) = self.cons[focused].focus.first() else {
            debug!(con = ?focused, "cannot go down any further");
            return false;
        };
        let next = if self.cons[next].kind == ConType::FloatingCon {
            self.cons[next].focus.first().copied().unwrap_or(next)
        } else {
            next
        };
        self.focus(next);
        true
    }

    /// Moves focus to the neighbouring tiling container along `orientation`,
    /// wrapping around at the ends.
    pub fn focus_in_direction(&mut self, way: Way, orientation: Orientation) -> bool {
        let focused = self.focused();
        if self.cons[focused].kind == ConType::Workspace {
            debug!("focus is on a workspace, nothing to move to");
            return false;
        }
        let mut parent = self.cons[focused].parent.unwrap_or_else(|| panic!("{focused:?} has no parent"));
        while self.cons[parent].effective_orientation() != Some(orientation) {
            if self.cons[parent].kind == ConType::Workspace {
                debug!(?orientation, "no container with matching orientation");
                return false;
            }
            let Some(up) = self.cons[parent].parent else { return false };
            parent = up;
        }

        let Some(current) = self.first_tiling_focus(parent) else { return false };
        let nodes = &self.cons[parent].nodes;
        let Some(pos) = nodes.iter().position(|&n| n == current) else { return false };
        let next = match way {
            Way::Next => nodes[(pos + 1) % nodes.len()],
            Way::Prev => nodes[(pos + nodes.len() - 1) % nodes.len()],
        };
        let target = self.descend_focused(next);
        debug!(from = ?focused, to = ?target, ?way, ?orientation, "focusing neighbour");
        self.focus(target);
        true
    }

    /// Sets or clears the urgency hint of `con`. The focused container never
    /// becomes urgent.
    pub fn set_urgent(&mut self, con: ConId, urgent: bool) {
        let urgent = urgent && self.focused != Some(con);
        if self.cons[con].urgent == urgent {
            return;
        }
        debug!(con = ?con, urgent, "urgency hint changed");
        self.cons[con].urgent = urgent;
        if let Some(ws) = self.workspace_of_opt(con) {
            if ws != con {
                self.update_urgent_flag(ws);
            }
        }
    }

    /// A workspace is urgent while any container on it is.
    pub(crate) fn update_urgent_flag(&mut self, ws: ConId) {
        let urgent = self.traverse(ws).into_iter().skip(1).any(|c| self.cons[c].urgent);
        if self.cons[ws].urgent != urgent {
            debug!(workspace = ?ws, urgent, "workspace urgency changed");
        }
        self.cons[ws].urgent = urgent;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use crate::layout_engine::{Orientation, Way};
    use crate::model::ConType;
    use crate::testing::{Fixture, leaf_with_window};

    #[test]
    fn focus_propagates_up_to_output() {
        let mut fx = Fixture::new();
        let ws = fx.ws;
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.focus(a);
        assert_eq!(fx.tree.focused(), a);
        assert_eq!(fx.tree.con(ws).focus_order(), &[a, b]);
        let output = fx.tree.con(ws).parent().unwrap();
        assert_eq!(fx.tree.con(output).focus_order()[0], ws);
    }

    #[test]
    fn next_focused_prefers_sibling_then_parent() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        // b was focused last, a is next in line
        assert_eq!(fx.tree.next_focused(b), a);
        fx.tree.close(b, false, false);
        assert_eq!(fx.tree.next_focused(a), fx.ws);
    }

    #[test]
    fn next_focused_descends_into_split() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.split(b, Orientation::Vertical);
        let split = fx.tree.con(b).parent().unwrap();
        let c = fx.tree.open(None);
        assert_eq!(fx.tree.con(c).parent(), Some(split));
        fx.tree.focus(a);
        fx.tree.focus(c);
        // leaving `a` lands on the most recent leaf of the split
        fx.tree.focus(a);
        assert_eq!(fx.tree.next_focused(a), c);
    }

    #[test]
    fn next_focused_for_floating_wrapper() {
        let mut fx = Fixture::new();
        let tiled = fx.tree.open(None);
        let f1 = leaf_with_window(&mut fx, 11);
        fx.tree.floating_enable(f1, false);
        let f2 = leaf_with_window(&mut fx, 12);
        fx.tree.floating_enable(f2, false);
        let w1 = fx.tree.con(f1).parent().unwrap();
        let w2 = fx.tree.con(f2).parent().unwrap();
        // the next wrapper is entered, never focused itself
        assert_eq!(fx.tree.next_focused(w1), f2);
        assert_eq!(fx.tree.next_focused(w2), f1);
        fx.tree.close(f1, false, false);
        assert_eq!(fx.tree.next_focused(w2), tiled);
    }

    #[test]
    fn level_up_and_down() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        assert!(fx.tree.level_up());
        assert_eq!(fx.tree.focused(), fx.ws);
        assert!(!fx.tree.level_up());
        assert!(fx.tree.level_down());
        assert_eq!(fx.tree.focused(), a);
        assert!(!fx.tree.level_down());
    }

    #[test]
    fn focus_in_direction_wraps() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        let c = fx.tree.open(None);
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[a, b, c]);
        assert!(fx.tree.focus_in_direction(Way::Next, Orientation::Horizontal));
        assert_eq!(fx.tree.focused(), a);
        assert!(fx.tree.focus_in_direction(Way::Prev, Orientation::Horizontal));
        assert_eq!(fx.tree.focused(), c);
        assert!(!fx.tree.focus_in_direction(Way::Next, Orientation::Vertical));
        assert_eq!(fx.tree.focused(), c);
    }

    #[test]
    fn focus_in_direction_on_workspace_is_noop() {
        let mut fx = Fixture::new();
        assert_eq!(fx.tree.con(fx.tree.focused()).kind(), ConType::Workspace);
        assert!(!fx.tree.focus_in_direction(Way::Next, Orientation::Horizontal));
    }

    #[test]
    fn urgency_aggregates_on_workspace() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.set_urgent(a, true);
        assert!(fx.tree.con(fx.ws).urgent);
        // focused containers never become urgent
        fx.tree.set_urgent(b, true);
        assert!(!fx.tree.con(b).urgent);
        fx.tree.focus(a);
        assert!(!fx.tree.con(a).urgent);
        assert!(!fx.tree.con(fx.ws).urgent);
    }
}
