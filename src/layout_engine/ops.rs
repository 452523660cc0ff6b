//! Structural mutations of the container tree.

use tracing::{debug, info, warn};

use super::{Orientation, Way};
use crate::model::tree::MAX_DEPTH;
use crate::model::{BorderStyle, ConId, ConLayout, ConTree, ConType, FullscreenMode, Rect, Window};
use crate::sys::display::{Display, DisplayError, DisplayOp};

#[derive(Debug, thiserror::Error)]
pub enum ManageError {
    #[error("attributes of window {0:?} could not be fetched")]
    AttributesUnavailable(crate::model::WindowId),
    #[error("window {0:?} is override-redirect")]
    OverrideRedirect(crate::model::WindowId),
    #[error("window {0:?} is already managed")]
    AlreadyManaged(crate::model::WindowId),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// What the display layer reports about a window that wants to be managed.
#[derive(Clone, Debug)]
pub struct WindowInfo {
    pub window: Window,
    /// Size and position the client asked for.
    pub geometry: Rect,
    /// `None` when the attributes could not be fetched.
    pub attributes: Option<WindowAttributes>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct WindowAttributes {
    pub override_redirect: bool,
}

impl ConTree {
    /// Where a new container goes when no target is given: next to the focused
    /// container, on the workspace when a workspace or floating content is
    /// focused.
    fn open_target(&self) -> ConId {
        let focused = self.focused();
        let mut con = self.cons[focused]
            .parent
            .unwrap_or_else(|| panic!("focused container {focused:?} has no parent"));
        if self.cons[con].kind == ConType::Output {
            con = focused;
        }
        if self.cons[con].kind == ConType::FloatingCon {
            debug!("floating container focused, opening on the workspace");
            con = self.cons[con].parent.unwrap_or_else(|| panic!("orphaned floating wrapper {con:?}"));
        }
        con
    }

    /// Creates a new empty container and focuses it.
    pub fn open(&mut self, target: Option<ConId>) -> ConId {
        let parent = target.unwrap_or_else(|| self.open_target());
        debug_assert!(self.cons[parent].window.is_none(), "opening inside a window container");
        let con = self.new_con(ConType::Con);
        self.attach(con, parent, false);
        self.fix_percent(parent);
        debug!(con = ?con, parent = ?parent, "opened container");
        self.focus(con);
        con
    }

    /// Closes `con` and its whole subtree.
    ///
    /// When `dont_kill_parent` is unset, a parent split container left empty is
    /// closed too. Focus moves to [`ConTree::next_focused`] only when it was
    /// inside the closed subtree.
    pub fn close(&mut self, con: ConId, kill_window: bool, dont_kill_parent: bool) {
        self.close_inner(con, kill_window, dont_kill_parent, 0);
    }

    fn close_inner(&mut self, con: ConId, kill_window: bool, dont_kill_parent: bool, depth: usize) {
        debug_assert!(depth < MAX_DEPTH, "close recursion too deep at {con:?}");
        let parent = self.cons[con]
            .parent
            .unwrap_or_else(|| panic!("closing container {con:?} without parent"));

        let had_focus = match self.focused {
            Some(f) => !self.cons.contains_key(f) || self.is_inside(f, con),
            None => true,
        };
        let next = self.next_focused(con);
        debug!(con = ?con, next = ?next, kill_window, "closing container");

        while let Some(&child) = self.cons[con].nodes.first() {
            self.close_inner(child, kill_window, true, depth + 1);
        }
        while let Some(&child) = self.cons[con].floating_nodes.first() {
            self.close_inner(child, kill_window, true, depth + 1);
        }

        if let Some(window) = self.cons[con].window.take() {
            self.windows.remove(&window.id);
            self.pending.push(if kill_window {
                DisplayOp::KillWindow(window.id)
            } else {
                DisplayOp::UnmanageWindow(window.id)
            });
        }

        // after the children, so handles retargeted onto `con` move up again
        self.fix_floating_parent(con);

        let was_floating = self.cons[con].is_floating();
        self.detach(con);
        if self.cons[parent].kind != ConType::Output {
            self.fix_percent(parent);
        }
        self.free(con);

        if was_floating && !dont_kill_parent {
            debug!(wrapper = ?parent, "container was floating, killing floating container");
            self.close_inner(parent, false, false, depth + 1);
            return;
        }

        if had_focus {
            debug_assert!(self.cons.contains_key(next));
            self.focus(next);
        }

        let p = &self.cons[parent];
        if !dont_kill_parent
            && matches!(p.kind, ConType::Con | ConType::FloatingCon)
            && p.nodes.is_empty()
        {
            debug!(parent = ?parent, "closing empty parent");
            self.close_inner(parent, false, false, depth + 1);
        }
    }

    /// Retargets `old_parent` handles that point at a container about to
    /// vanish to that container's own parent.
    pub(crate) fn fix_floating_parent(&mut self, vanishing: ConId) {
        let replacement = self.cons[vanishing].parent;
        for (id, con) in self.cons.iter_mut() {
            if id != vanishing && con.old_parent == Some(vanishing) {
                debug!(con = ?id, from = ?vanishing, to = ?replacement, "retargeting old parent");
                con.old_parent = replacement;
            }
        }
    }

    /// Closes the focused container and asks its window to go away.
    pub fn close_focused(&mut self) -> bool {
        let focused = self.focused();
        if self.cons[focused].kind == ConType::Workspace {
            debug!(workspace = ?focused, "cannot close a workspace");
            return false;
        }
        self.close(focused, true, false);
        true
    }

    /// Splits `con` so that future siblings are arranged along `orientation`.
    pub fn split(&mut self, con: ConId, orientation: Orientation) {
        if self.cons[con].kind == ConType::Workspace {
            debug!(workspace = ?con, ?orientation, "changing workspace orientation");
            self.cons[con].orientation = Some(orientation);
            return;
        }
        let parent = self.cons[con].parent.unwrap_or_else(|| panic!("splitting parentless {con:?}"));
        if self.cons[parent].nodes.len() == 1 {
            debug!(parent = ?parent, ?orientation, "only child, changing parent orientation");
            self.cons[parent].orientation = Some(orientation);
            return;
        }

        let split = self.new_con(ConType::Con);
        self.replace(con, split);
        let percent = std::mem::replace(&mut self.cons[con].percent, 0.0);
        let s = &mut self.cons[split];
        s.orientation = Some(orientation);
        s.percent = percent;
        self.attach(con, split, false);
        self.fix_percent(split);
        debug!(con = ?con, split = ?split, ?orientation, "split container");
    }

    /// Wraps all tiling children of `ws` in a new split container that takes
    /// over the workspace's layout. Focus order is carried over unchanged.
    pub(crate) fn wrap_workspace_children(
        &mut self,
        ws: ConId,
        layout: ConLayout,
        orientation: Option<Orientation>,
    ) -> ConId {
        let focus_before = self.cons[ws].focus.clone();
        let children = self.cons[ws].nodes.clone();
        let wrapper = self.new_con(ConType::Con);
        {
            let w = &mut self.cons[wrapper];
            w.layout = layout;
            w.orientation = orientation;
        }
        self.cons[wrapper].rect = self.cons[ws].rect;
        for &child in &children {
            self.detach(child);
            self.attach(child, wrapper, true);
        }
        self.cons[wrapper].focus =
            focus_before.iter().copied().filter(|c| children.contains(c)).collect();

        self.cons[wrapper].percent = 0.0;
        self.attach(wrapper, ws, true);
        let mut placed = false;
        let ws_focus: Vec<ConId> = focus_before
            .into_iter()
            .filter_map(|c| {
                if !children.contains(&c) {
                    Some(c)
                } else if !placed {
                    placed = true;
                    Some(wrapper)
                } else {
                    None
                }
            })
            .collect();
        self.cons[ws].focus = if placed { ws_focus } else { [ws_focus, vec![wrapper]].concat() };
        self.fix_percent(ws);
        debug!(workspace = ?ws, wrapper = ?wrapper, children = children.len(), "wrapped workspace children");
        wrapper
    }

    /// Moves the focused container one step along `orientation`. Returns
    /// whether the tree changed.
    pub fn move_focused(&mut self, way: Way, orientation: Orientation) -> bool {
        let focused = self.focused();
        if self.cons[focused].kind == ConType::Workspace {
            debug!("cannot move a workspace");
            return false;
        }
        if self.cons[focused].is_floating() {
            debug!(con = ?focused, "not moving floating container within tiling");
            return false;
        }

        let mut parent = self.cons[focused].parent.unwrap_or_else(|| panic!("{focused:?} has no parent"));
        let mut level_changed = false;
        while self.cons[parent].effective_orientation() != Some(orientation) {
            if self.cons[parent].kind == ConType::Workspace {
                let (layout, current) = (self.cons[parent].layout, self.cons[parent].orientation);
                debug!(workspace = ?parent, ?orientation, "splitting workspace to move along new axis");
                self.wrap_workspace_children(parent, layout, current);
                let ws = &mut self.cons[parent];
                ws.layout = ConLayout::Default;
                ws.orientation = Some(orientation);
                level_changed = true;
                break;
            }
            parent = self.cons[parent].parent.unwrap_or_else(|| panic!("{parent:?} has no parent"));
            level_changed = true;
        }

        // the child of `parent` on the path down to the focused container
        let current = std::iter::once(focused)
            .chain(self.ancestors(focused))
            .find(|&c| self.cons[c].parent == Some(parent))
            .unwrap_or_else(|| panic!("{focused:?} is not below {parent:?}"));

        let nodes = &self.cons[parent].nodes;
        let pos = nodes.iter().position(|&n| n == current).unwrap_or_else(|| {
            panic!("{current:?} missing from nodes of {parent:?}")
        });
        let neighbour = match way {
            Way::Next => nodes.get(pos + 1).copied(),
            Way::Prev => pos.checked_sub(1).map(|p| nodes[p]),
        };

        let (target, after) = match neighbour {
            None => {
                if focused == current {
                    debug!(con = ?focused, ?way, "already at the edge, nothing to do");
                    return false;
                }
                (current, way == Way::Next)
            }
            Some(n) if level_changed && self.cons[n].is_leaf() => (current, way == Way::Next),
            Some(n) => {
                let d = self.descend_focused(n);
                let gone_down = d != n;
                (d, way == Way::Next || gone_down)
            }
        };

        let old_parent = self.cons[focused].parent.unwrap_or_else(|| panic!("{focused:?} has no parent"));
        self.detach(focused);
        let new_parent = self.cons[target].parent.unwrap_or_else(|| panic!("{target:?} has no parent"));
        let nodes = &mut self.cons[new_parent].nodes;
        let pos = nodes.iter().position(|&n| n == target).unwrap_or_else(|| {
            panic!("{target:?} missing from nodes of {new_parent:?}")
        });
        nodes.insert(if after { pos + 1 } else { pos }, focused);
        self.cons[new_parent].focus.insert(0, focused);
        self.cons[focused].parent = Some(new_parent);

        if old_parent != new_parent {
            self.cons[focused].percent = 0.0;
            self.fix_percent(old_parent);
        }
        self.fix_percent(new_parent);
        debug!(con = ?focused, target = ?target, after, "moved container");
        self.focus(focused);

        let old = &self.cons[old_parent];
        if old.kind == ConType::Con && old.nodes.is_empty() {
            debug!(parent = ?old_parent, "closing emptied parent");
            self.close(old_parent, false, false);
        }
        true
    }

    /// Moves `con` (or the floating wrapper around it) to workspace `ws`.
    pub fn move_to_workspace(&mut self, con: ConId, ws: ConId) -> bool {
        if self.cons[con].kind == ConType::Workspace {
            debug!("moving workspaces is not supported");
            return false;
        }
        let con = if self.cons[con].is_floating() {
            self.cons[con].parent.unwrap_or_else(|| panic!("floating {con:?} has no wrapper"))
        } else {
            con
        };
        let source = self.workspace_of(con);
        if source == ws {
            debug!(con = ?con, workspace = ?ws, "already on target workspace");
            return false;
        }

        let focus_next = self.next_focused(con);
        let target = if self.cons[con].kind == ConType::FloatingCon {
            ws
        } else {
            self.insertion_parent(ws)
        };

        let old_parent = self.cons[con].parent.unwrap_or_else(|| panic!("{con:?} has no parent"));
        self.detach(con);
        self.attach(con, target, false);
        if self.cons[con].kind != ConType::FloatingCon {
            self.fix_percent(old_parent);
            self.cons[con].percent = 0.0;
            self.fix_percent(target);
        }
        info!(con = ?con, from = ?source, to = ?ws, "moved container to workspace");

        self.focus(con);
        self.focus(focus_next);

        self.update_urgent_flag(source);
        self.update_urgent_flag(ws);

        let old = &self.cons[old_parent];
        if old.kind == ConType::Con && old.nodes.is_empty() {
            self.close(old_parent, false, false);
        }
        true
    }

    /// Toggles `con` between fullscreen and normal.
    pub fn toggle_fullscreen(&mut self, con: ConId) -> bool {
        if self.cons[con].kind == ConType::Workspace {
            debug!("workspaces cannot be made fullscreen");
            return false;
        }
        let enabled = self.cons[con].fullscreen_mode == FullscreenMode::None;
        if enabled {
            let ws = self.workspace_of(con);
            if let Some(other) = self.fullscreen_con_below(ws) {
                warn!(con = ?con, other = ?other, "not entering fullscreen, another container already is");
                return false;
            }
        }
        let c = &mut self.cons[con];
        c.fullscreen_mode = if enabled { FullscreenMode::Output } else { FullscreenMode::None };
        info!(con = ?con, enabled, "toggled fullscreen");
        if let Some(window) = &c.window {
            let window = window.id;
            self.pending.push(DisplayOp::SetFullscreen { window, enabled });
        }
        true
    }

    pub fn set_layout(&mut self, con: ConId, layout: ConLayout) {
        if self.cons[con].kind == ConType::Workspace && layout != ConLayout::Default {
            if self.cons[con].nodes.is_empty() {
                debug!(workspace = ?con, %layout, "empty workspace, setting layout directly");
                self.cons[con].layout = layout;
                return;
            }
            let previously_focused = self.focused;
            let wrapper =
                self.wrap_workspace_children(con, layout, Some(Orientation::Horizontal));
            debug!(workspace = ?con, wrapper = ?wrapper, %layout, "wrapped workspace for layout");
            if let Some(f) = previously_focused {
                if self.is_inside(f, wrapper) {
                    self.focus(f);
                }
            }
            return;
        }
        debug!(con = ?con, %layout, "setting layout");
        self.cons[con].layout = layout;
    }

    pub fn set_border(&mut self, con: ConId, style: BorderStyle) {
        debug!(con = ?con, %style, "setting border style");
        self.cons[con].border_style = style;
    }

    /// Starts managing a window: creates its container next to the focused one
    /// and hands it to the display layer. Nothing is attached when the display
    /// layer refuses.
    pub fn manage_window<D: Display + ?Sized>(
        &mut self,
        info: WindowInfo,
        display: &mut D,
    ) -> Result<ConId, ManageError> {
        let id = info.window.id;
        let Some(attributes) = info.attributes else {
            return Err(ManageError::AttributesUnavailable(id));
        };
        if attributes.override_redirect {
            return Err(ManageError::OverrideRedirect(id));
        }
        if self.windows.contains_key(&id) {
            return Err(ManageError::AlreadyManaged(id));
        }

        let parent = self.open_target();
        let con = self.new_con(ConType::Con);
        {
            let c = &mut self.cons[con];
            c.geometry = info.geometry;
            c.name = info.window.name.clone().unwrap_or_default();
        }
        if let Err(err) = display.frame_window(con, &info.window) {
            warn!(window = ?id, %err, "could not frame window, not managing it");
            self.free(con);
            return Err(err.into());
        }
        let transient = info.window.transient_for.is_some();
        self.cons[con].window = Some(info.window);
        self.windows.insert(id, con);
        self.attach(con, parent, false);
        self.fix_percent(parent);
        self.focus(con);
        info!(window = ?id, con = ?con, parent = ?parent, "managing window");

        if transient && self.settings.auto_float_transients {
            debug!(window = ?id, "transient window, floating it");
            self.floating_enable(con, true);
        }
        Ok(con)
    }

    /// The window went away on its own; forget about its container.
    pub fn unmanage_window(&mut self, window: crate::model::WindowId) -> bool {
        let Some(con) = self.con_by_window_id(window) else {
            debug!(?window, "unmap for a window we do not manage");
            return false;
        };
        self.close(con, false, false);
        true
    }

    /// Applies a property change to the window of a managed container.
    pub fn update_window_property(
        &mut self,
        window: crate::model::WindowId,
        property: crate::model::WindowProperty,
    ) -> bool {
        let Some(con) = self.con_by_window_id(window) else {
            debug!(?window, "property change for an unmanaged window");
            return false;
        };
        let c = &mut self.cons[con];
        let Some(w) = c.window.as_mut() else { return false };
        let changed = w.update(property);
        if changed {
            c.name = w.name.clone().unwrap_or_default();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::model::WindowId;
    use crate::testing::{Fixture, RecordingDisplay, leaf_with_window, window_info};

    #[test]
    fn open_then_close_leaves_empty_workspace() {
        let mut fx = Fixture::new();
        let con = fx.tree.open(None);
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[con]);
        assert_eq!(fx.tree.focused(), con);
        fx.tree.close(con, false, false);
        assert!(fx.tree.con(fx.ws).nodes().is_empty());
        assert_eq!(fx.tree.focused(), fx.ws);
        fx.assert_consistent();
    }

    #[test]
    fn open_from_floating_focus_goes_to_workspace() {
        let mut fx = Fixture::new();
        let tiled = fx.tree.open(None);
        let floating = leaf_with_window(&mut fx, 3);
        fx.tree.floating_enable(floating, false);
        assert_eq!(fx.tree.focused(), floating);
        let opened = fx.tree.open(None);
        assert_eq!(fx.tree.con(opened).parent(), Some(fx.ws));
        assert!(fx.tree.con(fx.ws).nodes().contains(&tiled));
        assert!(fx.tree.con(fx.ws).nodes().contains(&opened));
        fx.assert_consistent();
    }

    #[test]
    fn split_then_close_reaps_split_container() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.split(b, Orientation::Vertical);
        let split = fx.tree.con(b).parent().unwrap();
        assert_ne!(split, fx.ws);
        assert_eq!(fx.tree.con(split).orientation, Some(Orientation::Vertical));
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[a, split]);
        fx.assert_consistent();

        fx.tree.close(b, false, false);
        assert!(!fx.tree.contains(split));
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[a]);
        assert_eq!(fx.tree.focused(), a);
        fx.assert_consistent();
    }

    #[test]
    fn split_only_child_flips_parent() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        fx.tree.split(a, Orientation::Vertical);
        assert_eq!(fx.tree.con(a).parent(), Some(fx.ws));
        assert_eq!(fx.tree.con(fx.ws).orientation, Some(Orientation::Vertical));
    }

    #[test]
    fn split_keeps_slot_and_percent() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        let c = fx.tree.open(None);
        fx.tree.con_mut(b).percent = 0.5;
        fx.tree.con_mut(a).percent = 0.25;
        fx.tree.con_mut(c).percent = 0.25;
        fx.tree.split(b, Orientation::Vertical);
        let split = fx.tree.con(b).parent().unwrap();
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[a, split, c]);
        assert_eq!(fx.tree.con(split).percent, 0.5);
        assert_eq!(fx.tree.con(b).percent, 1.0);
        assert_eq!(fx.tree.con(fx.ws).focus_order(), &[c, split, a]);
    }

    #[test]
    fn move_only_child_is_noop() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let before = fx.tree.draw_tree();
        assert!(!fx.tree.move_focused(Way::Next, Orientation::Horizontal));
        assert_eq!(fx.tree.draw_tree(), before);
        assert_eq!(fx.tree.focused(), a);
    }

    #[test]
    fn move_swaps_with_leaf_neighbour() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.focus(a);
        assert!(fx.tree.move_focused(Way::Next, Orientation::Horizontal));
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[b, a]);
        assert_eq!(fx.tree.focused(), a);
        fx.assert_consistent();
    }

    #[test]
    fn move_along_other_axis_splits_workspace() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        assert!(fx.tree.move_focused(Way::Next, Orientation::Vertical));
        let ws = fx.tree.con(fx.ws);
        assert_eq!(ws.orientation, Some(Orientation::Vertical));
        assert_eq!(ws.nodes().len(), 2);
        let wrapper = ws.nodes()[0];
        assert_eq!(ws.nodes()[1], b);
        assert_eq!(fx.tree.con(wrapper).nodes(), &[a]);
        assert_eq!(fx.tree.con(wrapper).orientation, Some(Orientation::Horizontal));
        fx.assert_consistent();
    }

    #[test]
    fn move_out_of_split_reaps_it() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.split(b, Orientation::Vertical);
        let split = fx.tree.con(b).parent().unwrap();
        assert!(fx.tree.move_focused(Way::Next, Orientation::Horizontal));
        assert!(!fx.tree.contains(split));
        assert_eq!(fx.tree.con(fx.ws).nodes(), &[a, b]);
        fx.assert_consistent();
    }

    #[test]
    fn move_to_workspace_keeps_source_focus() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        let other = fx.tree.workspace_get("2");
        assert!(fx.tree.move_to_workspace(b, other));
        assert_eq!(fx.tree.con(b).parent(), Some(other));
        assert_eq!(fx.tree.focused(), a);
        assert_eq!(fx.tree.con(a).percent, 1.0);
        assert_eq!(fx.tree.con(b).percent, 1.0);
        assert!(!fx.tree.move_to_workspace(b, other));
        fx.assert_consistent();
    }

    #[test]
    fn move_floating_to_workspace_moves_wrapper() {
        let mut fx = Fixture::new();
        let f = leaf_with_window(&mut fx, 9);
        fx.tree.floating_enable(f, false);
        let wrapper = fx.tree.con(f).parent().unwrap();
        let other = fx.tree.workspace_get("2");
        let leaf = fx.tree.open(Some(other));
        fx.tree.focus(f);
        assert!(fx.tree.move_to_workspace(f, other));
        assert_eq!(fx.tree.con(other).floating_nodes(), &[wrapper]);
        assert!(fx.tree.con(other).nodes().contains(&leaf));
        assert_eq!(fx.tree.focused(), fx.ws);
        fx.assert_consistent();
    }

    #[test]
    fn closing_a_floating_window_removes_its_wrapper() {
        let mut fx = Fixture::new();
        let tiled = fx.tree.open(None);
        let f = leaf_with_window(&mut fx, 4);
        fx.tree.floating_enable(f, false);
        let wrapper = fx.tree.con(f).parent().unwrap();
        fx.tree.close(f, true, false);
        assert!(!fx.tree.contains(wrapper));
        assert_eq!(fx.tree.focused(), tiled);
        assert_eq!(fx.tree.pending_requests().first(), Some(&DisplayOp::KillWindow(WindowId(4))));
        fx.assert_consistent();
    }

    #[test]
    fn closing_unfocused_container_keeps_focus() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.close(a, false, false);
        assert_eq!(fx.tree.focused(), b);
        fx.assert_consistent();
    }

    #[test]
    fn workspaces_refuse_close_and_fullscreen() {
        let mut fx = Fixture::new();
        assert!(!fx.tree.close_focused());
        assert!(!fx.tree.toggle_fullscreen(fx.ws));
    }

    #[test]
    fn one_fullscreen_container_per_workspace() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let b = fx.tree.open(None);
        assert!(fx.tree.toggle_fullscreen(a));
        assert!(!fx.tree.toggle_fullscreen(b));
        assert_eq!(
            fx.tree.pending_requests().last(),
            Some(&DisplayOp::SetFullscreen { window: WindowId(1), enabled: true })
        );
        assert!(fx.tree.toggle_fullscreen(a));
        assert!(fx.tree.toggle_fullscreen(b));
    }

    #[test]
    fn tabbed_workspace_wraps_children() {
        let mut fx = Fixture::new();
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        fx.tree.set_layout(fx.ws, ConLayout::Tabbed);
        let wrapper = fx.tree.con(fx.ws).nodes()[0];
        assert_eq!(fx.tree.con(wrapper).layout, ConLayout::Tabbed);
        assert_eq!(fx.tree.con(wrapper).nodes(), &[a, b]);
        assert_eq!(fx.tree.focused(), b);
        assert_eq!(fx.tree.con(wrapper).focus_order()[0], b);
        fx.assert_consistent();
    }

    #[test]
    fn manage_attaches_and_focuses() {
        let mut fx = Fixture::new();
        let mut display = RecordingDisplay::default();
        let con = fx.tree.manage_window(window_info(5), &mut display).unwrap();
        assert_eq!(fx.tree.con_by_window_id(WindowId(5)), Some(con));
        assert_eq!(fx.tree.focused(), con);
        assert_eq!(display.framed, vec![(con, WindowId(5))]);
        assert!(matches!(
            fx.tree.manage_window(window_info(5), &mut display),
            Err(ManageError::AlreadyManaged(_))
        ));
        fx.assert_consistent();
    }

    #[test]
    fn failed_frame_leaves_no_trace() {
        let mut fx = Fixture::new();
        let mut display = RecordingDisplay { fail_frames: true, ..Default::default() };
        let before = fx.tree.len();
        let err = fx.tree.manage_window(window_info(5), &mut display).unwrap_err();
        assert!(matches!(err, ManageError::Display(DisplayError::FrameFailed { .. })));
        assert_eq!(fx.tree.len(), before);
        assert_eq!(fx.tree.con_by_window_id(WindowId(5)), None);
        assert_eq!(fx.tree.focused(), fx.ws);
        fx.assert_consistent();
    }

    #[test]
    fn override_redirect_and_missing_attributes_are_refused() {
        let mut fx = Fixture::new();
        let mut display = RecordingDisplay::default();
        let mut info = window_info(6);
        info.attributes = Some(WindowAttributes { override_redirect: true });
        assert!(matches!(
            fx.tree.manage_window(info.clone(), &mut display),
            Err(ManageError::OverrideRedirect(_))
        ));
        info.attributes = None;
        assert!(matches!(
            fx.tree.manage_window(info, &mut display),
            Err(ManageError::AttributesUnavailable(_))
        ));
        assert!(display.framed.is_empty());
    }

    #[test]
    fn transient_windows_float_automatically() {
        let mut fx = Fixture::new();
        let mut display = RecordingDisplay::default();
        let mut info = window_info(7);
        info.window.transient_for = Some(WindowId(1));
        let con = fx.tree.manage_window(info, &mut display).unwrap();
        assert_eq!(fx.tree.con(con).floating, crate::model::FloatingState::AutoOn);
        fx.assert_consistent();
    }

    #[test]
    fn vanished_window_closes_container() {
        let mut fx = Fixture::new();
        let con = leaf_with_window(&mut fx, 8);
        assert!(fx.tree.unmanage_window(WindowId(8)));
        assert!(!fx.tree.contains(con));
        assert!(!fx.tree.unmanage_window(WindowId(8)));
        assert!(fx.tree.pending_requests().contains(&DisplayOp::UnmanageWindow(WindowId(8))));
    }

    #[test]
    fn property_change_renames_container() {
        let mut fx = Fixture::new();
        let con = leaf_with_window(&mut fx, 8);
        assert!(fx.tree.update_window_property(
            WindowId(8),
            crate::model::WindowProperty::Name(Some("editor".into()))
        ));
        assert_eq!(fx.tree.con(con).name, "editor");
    }

    #[test]
    fn closing_an_ancestor_of_old_parent_retargets_above_it() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        leaf_with_window(&mut fx, 2);
        fx.tree.split(a, Orientation::Vertical);
        let outer = fx.tree.con(a).parent().unwrap();
        assert_ne!(outer, fx.ws);
        fx.tree.focus(a);
        let c = leaf_with_window(&mut fx, 3);
        assert_eq!(fx.tree.con(c).parent(), Some(outer));
        fx.tree.split(c, Orientation::Horizontal);
        let inner = fx.tree.con(c).parent().unwrap();
        assert_eq!(fx.tree.con(inner).parent(), Some(outer));
        let d = leaf_with_window(&mut fx, 4);
        assert_eq!(fx.tree.con(d).parent(), Some(inner));
        fx.tree.floating_enable(d, false);
        assert_eq!(fx.tree.con(d).old_parent(), Some(inner));

        fx.tree.close(outer, false, false);
        assert!(!fx.tree.contains(inner));
        assert_eq!(fx.tree.con(d).old_parent(), Some(fx.ws));
        fx.assert_consistent();
    }
}
