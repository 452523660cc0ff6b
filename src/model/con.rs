use serde::{Deserialize, Serialize};

use super::rect::{Rect, RectDelta};
use super::window::Window;
use crate::layout_engine::Orientation;

slotmap::new_key_type! { pub struct ConId; }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConType {
    Root,
    Output,
    Workspace,
    Con,
    FloatingCon,
}

#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConLayout {
    #[default]
    Default,
    Stacked,
    Tabbed,
}

#[derive(
    Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BorderStyle {
    #[default]
    Normal,
    #[strum(serialize = "1pixel")]
    #[serde(rename = "1pixel")]
    OnePixel,
    None,
}

impl BorderStyle {
    /// Pixels to add to a container rectangle to get the window rectangle.
    /// The title bar of [`BorderStyle::Normal`] is accounted for by the
    /// renderer since its height depends on the font.
    pub fn delta(self) -> RectDelta {
        match self {
            BorderStyle::Normal => RectDelta { x: 2, y: 0, width: -(2 * 2), height: -2 },
            BorderStyle::OnePixel => RectDelta { x: 1, y: 1, width: -2, height: -2 },
            BorderStyle::None => RectDelta::default(),
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenMode {
    #[default]
    None,
    Output,
}

/// Whether a container is floating and who decided so. Automatic decisions
/// (from window hints) can be overridden by the user, not the other way round.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingState {
    #[default]
    AutoOff,
    UserOff,
    AutoOn,
    UserOn,
}

impl FloatingState {
    pub fn is_floating(self) -> bool { self >= FloatingState::AutoOn }

    pub fn enabled(automatic: bool) -> Self {
        if automatic { FloatingState::AutoOn } else { FloatingState::UserOn }
    }

    pub fn disabled(automatic: bool) -> Self {
        if automatic { FloatingState::AutoOff } else { FloatingState::UserOff }
    }
}

/// A node of the container tree. All relationships are arena handles owned by
/// the [`ConTree`](super::tree::ConTree); the lists are only mutated through it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Con {
    pub(crate) kind: ConType,
    pub name: String,
    pub layout: ConLayout,
    pub orientation: Option<Orientation>,
    pub percent: f64,
    /// Absolute rectangle, overwritten on every render.
    pub rect: Rect,
    /// Window rectangle relative to `rect`.
    pub window_rect: Rect,
    /// Decoration rectangle relative to the parent's `rect`.
    pub deco_rect: Rect,
    /// Natural size hint, used when the container starts floating.
    pub geometry: Rect,
    pub border_style: BorderStyle,
    pub fullscreen_mode: FullscreenMode,
    pub floating: FloatingState,
    pub window: Option<Window>,
    pub num: i32,
    pub urgent: bool,
    pub mapped: bool,
    pub(crate) parent: Option<ConId>,
    pub(crate) old_parent: Option<ConId>,
    pub(crate) nodes: Vec<ConId>,
    pub(crate) floating_nodes: Vec<ConId>,
    pub(crate) focus: Vec<ConId>,
}

impl Con {
    pub(crate) fn new(kind: ConType, border_style: BorderStyle) -> Self {
        Self {
            kind,
            name: String::new(),
            layout: ConLayout::Default,
            orientation: None,
            percent: 0.0,
            rect: Rect::ZERO,
            window_rect: Rect::ZERO,
            deco_rect: Rect::ZERO,
            geometry: Rect::ZERO,
            border_style,
            fullscreen_mode: FullscreenMode::None,
            floating: FloatingState::AutoOff,
            window: None,
            num: -1,
            urgent: false,
            mapped: false,
            parent: None,
            old_parent: None,
            nodes: Vec::new(),
            floating_nodes: Vec::new(),
            focus: Vec::new(),
        }
    }

    pub fn kind(&self) -> ConType { self.kind }

    pub fn parent(&self) -> Option<ConId> { self.parent }

    pub fn old_parent(&self) -> Option<ConId> { self.old_parent }

    /// Tiling children in structural order.
    pub fn nodes(&self) -> &[ConId] { &self.nodes }

    /// Floating wrappers in stacking order (last is on top).
    pub fn floating_nodes(&self) -> &[ConId] { &self.floating_nodes }

    /// All children, most recently focused first.
    pub fn focus_order(&self) -> &[ConId] { &self.focus }

    pub fn is_leaf(&self) -> bool { self.nodes.is_empty() }

    pub fn is_floating(&self) -> bool { self.floating.is_floating() }

    pub fn num_children(&self) -> usize { self.nodes.len() }

    /// Stacked containers behave like vertical splits, tabbed ones like
    /// horizontal splits, regardless of the orientation field.
    pub fn effective_orientation(&self) -> Option<Orientation> {
        match self.layout {
            ConLayout::Stacked => Some(Orientation::Vertical),
            ConLayout::Tabbed => Some(Orientation::Horizontal),
            ConLayout::Default => self.orientation,
        }
    }

    /// Workspaces never hold windows directly, neither do split containers.
    pub fn accepts_window(&self) -> bool {
        self.kind == ConType::Con && self.orientation.is_none() && self.window.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floating_state_ordering() {
        assert!(!FloatingState::AutoOff.is_floating());
        assert!(!FloatingState::UserOff.is_floating());
        assert!(FloatingState::AutoOn.is_floating());
        assert!(FloatingState::enabled(false).is_floating());
        assert_eq!(FloatingState::disabled(true), FloatingState::AutoOff);
    }

    #[test]
    fn effective_orientation_follows_layout() {
        let mut con = Con::new(ConType::Con, BorderStyle::Normal);
        con.orientation = Some(Orientation::Horizontal);
        con.layout = ConLayout::Stacked;
        assert_eq!(con.effective_orientation(), Some(Orientation::Vertical));
        con.layout = ConLayout::Tabbed;
        con.orientation = Some(Orientation::Vertical);
        assert_eq!(con.effective_orientation(), Some(Orientation::Horizontal));
        con.layout = ConLayout::Default;
        assert_eq!(con.effective_orientation(), Some(Orientation::Vertical));
    }

    #[test]
    fn border_parses_i3_names() {
        assert_eq!("1pixel".parse::<BorderStyle>().unwrap(), BorderStyle::OnePixel);
        assert_eq!("none".parse::<BorderStyle>().unwrap(), BorderStyle::None);
    }
}
