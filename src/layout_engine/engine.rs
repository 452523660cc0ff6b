use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::ops::WindowInfo;
use super::resize::{ResizeDelta, ResizeValue};
use super::workspaces::OutputInfo;
use super::{Direction, Orientation};
use crate::common::config::{LayoutSettings, Settings};
use crate::model::{BorderStyle, ConId, ConLayout, ConTree, ConType, WindowId, WindowProperty};
use crate::sys::display::Display;

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    Open,
    Close,
    Split(Orientation),
    Focus(#[serde(rename = "direction")] Direction),
    Move(Direction),
    MoveToWorkspace(String),
    Workspace(String),
    ToggleFloating,
    ToggleFullscreen,
    LevelUp,
    LevelDown,
    Layout(ConLayout),
    Border(BorderStyle),
    Resize {
        direction: Direction,
        grow: bool,
        amount: ResizeValue,
    },
    ResizeFloating(ResizeDelta),
}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum LayoutEvent {
    WindowAppeared(WindowInfo),
    WindowVanished(WindowId),
    PropertyChanged(WindowId, WindowProperty),
    UrgencyHint(WindowId, bool),
}

#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub changed: bool,
    pub focus_window: Option<WindowId>,
}

pub struct LayoutEngine {
    tree: ConTree,
}

impl LayoutEngine {
    pub fn new(settings: LayoutSettings, outputs: &[OutputInfo]) -> Self {
        let mut tree = ConTree::new(settings);
        tree.init(outputs);
        Self { tree }
    }

    /// Restores the tree saved at `path` when configured to, falling back to a
    /// fresh tree on `outputs` if there is nothing usable to restore.
    pub fn restore_or_init(
        settings: &Settings,
        path: &Path,
        outputs: &[OutputInfo],
        is_live: impl Fn(WindowId) -> bool,
    ) -> Self {
        if settings.restore_layout && path.exists() {
            match ConTree::load(path, settings.layout.clone(), is_live) {
                Ok(tree) => {
                    info!(path = %path.display(), "restored layout");
                    return Self { tree };
                }
                Err(e) => warn!(path = %path.display(), "could not restore layout: {e:#}"),
            }
        }
        Self::new(settings.layout.clone(), outputs)
    }

    pub fn tree(&self) -> &ConTree { &self.tree }

    pub fn tree_mut(&mut self) -> &mut ConTree { &mut self.tree }

    pub fn focused_window(&self) -> Option<WindowId> {
        let focused = self.tree.focused?;
        self.tree.con(focused).window.as_ref().map(|w| w.id)
    }

    fn response(&self, changed: bool) -> EventResponse {
        EventResponse {
            changed,
            focus_window: if changed { self.focused_window() } else { None },
        }
    }

    pub fn handle_event<D: Display + ?Sized>(
        &mut self,
        event: LayoutEvent,
        display: &mut D,
    ) -> EventResponse {
        debug!(?event);
        let changed = match event {
            LayoutEvent::WindowAppeared(info) => match self.tree.manage_window(info, display) {
                Ok(_) => true,
                Err(e) => {
                    warn!("not managing window: {e}");
                    false
                }
            },
            LayoutEvent::WindowVanished(window) => self.tree.unmanage_window(window),
            LayoutEvent::PropertyChanged(window, property) => {
                self.tree.update_window_property(window, property)
            }
            LayoutEvent::UrgencyHint(window, urgent) => match self.tree.con_by_window_id(window) {
                Some(con) => {
                    let before = self.tree.con(con).urgent;
                    self.tree.set_urgent(con, urgent);
                    self.tree.con(con).urgent != before
                }
                None => {
                    debug!(?window, "urgency hint for an unmanaged window");
                    false
                }
            },
        };
        self.response(changed)
    }

    pub fn handle_command(&mut self, command: LayoutCommand) -> EventResponse {
        debug!("Tree:\n{}", self.tree.draw_tree().trim());
        debug!(?command);
        let focused = self.tree.focused();
        let is_floating = self.tree.inside_floating(focused).is_some();
        debug!(?focused, is_floating);

        let changed = match command {
            LayoutCommand::Open => {
                self.tree.open(None);
                true
            }
            LayoutCommand::Close => self.tree.close_focused(),
            LayoutCommand::Split(orientation) => {
                self.tree.split(focused, orientation);
                true
            }
            LayoutCommand::Focus(direction) => {
                self.tree.focus_in_direction(direction.way(), direction.orientation())
            }
            LayoutCommand::Move(direction) if is_floating => {
                self.tree.floating_move(focused, direction)
            }
            LayoutCommand::Move(direction) => {
                self.tree.move_focused(direction.way(), direction.orientation())
            }
            LayoutCommand::MoveToWorkspace(name) => {
                let ws = self.tree.workspace_get(&name);
                let moved = self.tree.move_to_workspace(focused, ws);
                if !moved {
                    self.close_if_unused(ws);
                }
                moved
            }
            LayoutCommand::Workspace(name) => {
                self.tree.workspace_switch(&name);
                true
            }
            LayoutCommand::ToggleFloating => {
                if self.tree.con(focused).kind() == ConType::Workspace && self.tree.con(focused).is_leaf() {
                    debug!("empty workspace focused, nothing to float");
                    false
                } else {
                    self.tree.floating_toggle(focused, false);
                    true
                }
            }
            LayoutCommand::ToggleFullscreen => self.tree.toggle_fullscreen(focused),
            LayoutCommand::LevelUp => self.tree.level_up(),
            LayoutCommand::LevelDown => self.tree.level_down(),
            LayoutCommand::Layout(layout) => {
                let target = self.layout_target(focused);
                self.tree.set_layout(target, layout);
                true
            }
            LayoutCommand::Border(style) => {
                self.tree.set_border(focused, style);
                true
            }
            LayoutCommand::Resize { direction, grow, amount } if is_floating => {
                let amount = if grow { amount } else { negate(amount) };
                let none = ResizeValue::Pixels(0.0);
                let delta = match direction.orientation() {
                    Orientation::Horizontal => ResizeDelta::relative(amount, none),
                    Orientation::Vertical => ResizeDelta::relative(none, amount),
                };
                self.tree.resize_floating_by(focused, delta)
            }
            LayoutCommand::Resize { direction, grow, amount } => {
                self.tree.resize_tiling(focused, direction, grow, amount)
            }
            LayoutCommand::ResizeFloating(delta) => self.tree.resize_floating_by(focused, delta),
        };
        self.response(changed)
    }

    /// Layout changes apply to the container holding the focused one, or to
    /// the workspace itself when nothing below it is focused.
    fn layout_target(&self, focused: ConId) -> ConId {
        let c = self.tree.con(focused);
        if c.kind() == ConType::Workspace || c.is_floating() {
            return focused;
        }
        c.parent().unwrap_or(focused)
    }

    /// A workspace created only to be a move target is dropped again when the
    /// move did not happen.
    fn close_if_unused(&mut self, ws: ConId) {
        let output = self.tree.output_of(ws);
        let c = self.tree.con(ws);
        if c.is_leaf() && c.floating_nodes().is_empty() && self.tree.visible_workspace(output) != Some(ws) {
            debug!(workspace = ?ws, "dropping unused workspace");
            self.tree.close(ws, false, true);
        }
    }

    pub fn render<D: Display + ?Sized>(&mut self, display: &mut D) { self.tree.render(display); }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> { self.tree.save(path) }
}

fn negate(value: ResizeValue) -> ResizeValue {
    match value {
        ResizeValue::Pixels(px) => ResizeValue::Pixels(-px),
        ResizeValue::Percent(pct) => ResizeValue::Percent(-pct),
    }
}
