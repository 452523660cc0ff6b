//! Turns the container tree into pixel rectangles and hands them to the
//! display layer in one batch.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::Orientation;
use crate::model::tree::MAX_DEPTH;
use crate::model::{BorderStyle, ConId, ConLayout, ConTree, ConType, FullscreenMode, Rect, WindowId};
use crate::sys::display::{Display, DisplayOp};

/// A container that is visible after a render pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderedCon {
    pub con: ConId,
    pub kind: ConType,
    pub rect: Rect,
    pub border: BorderStyle,
    pub window: Option<WindowId>,
    /// Absolute position of the client window.
    pub window_rect: Option<Rect>,
    pub floating: bool,
}

/// A title bar to draw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub con: ConId,
    pub rect: Rect,
    pub title: String,
    pub focused: bool,
    pub urgent: bool,
}

/// Everything the display layer needs after a render pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Mapped containers, bottom of the stacking order first.
    pub cons: Vec<RenderedCon>,
    pub decorations: Vec<Decoration>,
    /// Managed windows that must not be visible.
    pub unmapped: Vec<WindowId>,
    pub requests: Vec<DisplayOp>,
    pub focused_window: Option<WindowId>,
}

impl RenderFrame {
    pub fn get(&self, con: ConId) -> Option<&RenderedCon> { self.cons.iter().find(|c| c.con == con) }

    pub fn is_mapped(&self, con: ConId) -> bool { self.get(con).is_some() }
}

impl ConTree {
    /// Computes the geometry of every visible container and pushes the
    /// resulting frame to `display`.
    pub fn render<D: Display + ?Sized>(&mut self, display: &mut D) {
        let Some(root) = self.root else {
            debug!("no root, nothing to render");
            return;
        };
        for con in self.cons.values_mut() {
            con.mapped = false;
            con.deco_rect = Rect::ZERO;
        }
        self.cons[root].mapped = true;
        for output in self.cons[root].nodes.clone() {
            self.render_con(output, 1);
        }
        let frame = self.build_frame(root);
        trace!(mapped = frame.cons.len(), requests = frame.requests.len(), "pushing frame");
        display.push_changes(frame);
    }

    fn render_con(&mut self, con: ConId, depth: usize) {
        debug_assert!(depth < MAX_DEPTH, "render recursion too deep at {con:?}");
        self.cons[con].mapped = true;
        if self.cons[con].window.is_some() {
            self.place_window(con);
        }

        match self.cons[con].kind {
            ConType::Output => {
                let rect = self.cons[con].rect;
                if let Some(ws) = self.visible_workspace(con) {
                    self.cons[ws].rect = rect;
                    self.render_con(ws, depth + 1);
                }
                return;
            }
            ConType::Workspace => {
                if let Some(fs) = self.fullscreen_con_below(con) {
                    let output = self.output_of(con);
                    self.cons[fs].rect = self.cons[output].rect;
                    trace!(workspace = ?con, fullscreen = ?fs, "rendering fullscreen container only");
                    self.render_con(fs, depth + 1);
                    return;
                }
            }
            _ => {}
        }

        self.render_children(con, depth);

        if self.cons[con].kind == ConType::Workspace {
            for wrapper in self.cons[con].floating_nodes.clone() {
                self.render_con(wrapper, depth + 1);
            }
        }
    }

    fn render_children(&mut self, con: ConId, depth: usize) {
        let children = self.cons[con].nodes.clone();
        if children.is_empty() {
            return;
        }
        let rect = self.cons[con].rect;
        let deco_height = self.settings.deco_height();
        let n = children.len() as u32;

        match self.cons[con].layout {
            ConLayout::Default => {
                let orientation = self.cons[con].orientation.unwrap_or(Orientation::Horizontal);
                let total = match orientation {
                    Orientation::Horizontal => rect.width,
                    Orientation::Vertical => rect.height,
                };
                let mut offset = 0u32;
                for (i, &child) in children.iter().enumerate() {
                    let remaining = total.saturating_sub(offset);
                    let size = if i + 1 == children.len() {
                        remaining
                    } else {
                        ((total as f64 * self.cons[child].percent).round() as u32).min(remaining)
                    };
                    self.cons[child].rect = match orientation {
                        Orientation::Horizontal => {
                            Rect::new(rect.x + offset as i32, rect.y, size, rect.height)
                        }
                        Orientation::Vertical => {
                            Rect::new(rect.x, rect.y + offset as i32, rect.width, size)
                        }
                    };
                    offset += size;
                    self.render_con(child, depth + 1);
                }
            }
            ConLayout::Stacked => {
                let strip = (deco_height * n).min(rect.height);
                for (i, &child) in children.iter().enumerate() {
                    let c = &mut self.cons[child];
                    c.deco_rect = Rect::new(0, (i as u32 * deco_height) as i32, rect.width, deco_height);
                    c.rect = Rect::new(rect.x, rect.y + strip as i32, rect.width, rect.height - strip);
                }
                if let Some(visible) = self.first_tiling_focus(con) {
                    self.render_con(visible, depth + 1);
                }
            }
            ConLayout::Tabbed => {
                let tab = rect.width / n;
                let strip = deco_height.min(rect.height);
                for (i, &child) in children.iter().enumerate() {
                    let i = i as u32;
                    let width = if i + 1 == n { rect.width - tab * i } else { tab };
                    let c = &mut self.cons[child];
                    c.deco_rect = Rect::new((tab * i) as i32, 0, width, deco_height);
                    c.rect = Rect::new(rect.x, rect.y + strip as i32, rect.width, rect.height - strip);
                }
                if let Some(visible) = self.first_tiling_focus(con) {
                    self.render_con(visible, depth + 1);
                }
            }
        }
    }

    /// The border a container is drawn with. Stacked and tabbed siblings
    /// always get a title, fullscreen containers never do.
    pub fn effective_border(&self, con: ConId) -> BorderStyle {
        let c = &self.cons[con];
        if c.fullscreen_mode == FullscreenMode::Output {
            return BorderStyle::None;
        }
        let Some(parent) = c.parent else { return c.border_style };
        let p = &self.cons[parent];
        let siblings = p.nodes.len();
        match p.layout {
            ConLayout::Stacked if siblings > 1 => BorderStyle::Normal,
            ConLayout::Tabbed if siblings > 1 && c.border_style != BorderStyle::Normal => {
                BorderStyle::Normal
            }
            _ => c.border_style,
        }
    }

    fn place_window(&mut self, con: ConId) {
        let border = self.effective_border(con);
        let deco_height = self.settings.deco_height();
        let rect = self.cons[con].rect;
        let mut window_rect = Rect::new(0, 0, rect.width, rect.height).adjusted(border.delta());

        let fullscreen = self.cons[con].fullscreen_mode == FullscreenMode::Output;
        let parent = self.cons[con].parent.filter(|_| !fullscreen);
        let title_in_strip = parent.is_some_and(|p| {
            matches!(self.cons[p].layout, ConLayout::Stacked | ConLayout::Tabbed)
        });
        if border == BorderStyle::Normal && !title_in_strip {
            if let Some(p) = parent {
                let prect = self.cons[p].rect;
                self.cons[con].deco_rect = Rect::new(
                    rect.x - prect.x,
                    rect.y - prect.y,
                    rect.width,
                    deco_height,
                );
            }
            window_rect.y += deco_height as i32;
            window_rect.height = window_rect.height.saturating_sub(deco_height);
        }
        self.cons[con].window_rect = window_rect;
    }

    fn build_frame(&mut self, root: ConId) -> RenderFrame {
        let mut frame = RenderFrame {
            requests: std::mem::take(&mut self.pending),
            focused_window: self
                .focused
                .and_then(|f| self.cons.get(f))
                .and_then(|c| c.window.as_ref())
                .map(|w| w.id),
            ..Default::default()
        };

        for con in self.traverse(root) {
            let c = &self.cons[con];
            if c.mapped && c.kind != ConType::Root {
                let window_rect = c.window.as_ref().map(|_| Rect {
                    x: c.rect.x + c.window_rect.x,
                    y: c.rect.y + c.window_rect.y,
                    ..c.window_rect
                });
                frame.cons.push(RenderedCon {
                    con,
                    kind: c.kind,
                    rect: c.rect,
                    border: self.effective_border(con),
                    window: c.window.as_ref().map(|w| w.id),
                    window_rect,
                    floating: c.is_floating() || c.kind == ConType::FloatingCon,
                });
            } else if let Some(window) = &c.window {
                frame.unmapped.push(window.id);
            }

            if c.deco_rect.is_zero() {
                continue;
            }
            let Some(parent) = c.parent.filter(|&p| self.cons[p].mapped) else { continue };
            let prect = self.cons[parent].rect;
            frame.decorations.push(Decoration {
                con,
                rect: Rect {
                    x: prect.x + c.deco_rect.x,
                    y: prect.y + c.deco_rect.y,
                    ..c.deco_rect
                },
                title: c.window.as_ref().and_then(|w| w.name.clone()).unwrap_or_else(|| c.name.clone()),
                focused: self.focused.is_some_and(|f| self.is_inside(f, con)),
                urgent: c.urgent,
            });
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::common::config::LayoutSettings;
    use crate::testing::{Fixture, OUTPUT_RECT, RecordingDisplay, leaf_with_window};

    fn render(fx: &mut Fixture) -> RenderFrame {
        let mut display = RecordingDisplay::default();
        fx.tree.render(&mut display);
        assert_eq!(display.frames.len(), 1);
        display.frames.pop().unwrap()
    }

    #[test]
    fn horizontal_split_with_normal_borders() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let b = leaf_with_window(&mut fx, 2);
        let frame = render(&mut fx);
        assert_eq!(frame.get(a).unwrap().rect, Rect::new(0, 0, 500, 800));
        assert_eq!(frame.get(b).unwrap().rect, Rect::new(500, 0, 500, 800));
        // 2px sides and bottom, 18px title on top
        assert_eq!(frame.get(b).unwrap().window_rect, Some(Rect::new(502, 18, 496, 780)));
        assert_eq!(frame.decorations.len(), 2);
        assert_eq!(frame.decorations[1].rect, Rect::new(500, 0, 500, 18));
        assert!(frame.decorations[1].focused);
        assert_eq!(frame.focused_window, Some(WindowId(2)));
    }

    #[test]
    fn last_child_absorbs_rounding() {
        let mut fx = Fixture::new();
        let cons: Vec<_> = (0..3).map(|_| fx.tree.open(None)).collect();
        let frame = render(&mut fx);
        let widths: Vec<_> = cons.iter().map(|&c| frame.get(c).unwrap().rect.width).collect();
        assert_eq!(widths, vec![333, 333, 334]);
    }

    #[test]
    fn vertical_split_stacks_rows() {
        let mut fx = Fixture::new();
        fx.tree.con_mut(fx.ws).orientation = Some(Orientation::Vertical);
        let a = fx.tree.open(None);
        let b = fx.tree.open(None);
        let frame = render(&mut fx);
        assert_eq!(frame.get(a).unwrap().rect, Rect::new(0, 0, 1000, 400));
        assert_eq!(frame.get(b).unwrap().rect, Rect::new(0, 400, 1000, 400));
    }

    #[test]
    fn stacked_maps_only_focused_child() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let b = leaf_with_window(&mut fx, 2);
        fx.tree.con_mut(fx.ws).layout = ConLayout::Stacked;
        let frame = render(&mut fx);
        assert!(!frame.is_mapped(a));
        assert_eq!(frame.unmapped, vec![WindowId(1)]);
        assert_eq!(frame.get(b).unwrap().rect, Rect::new(0, 36, 1000, 764));
        // the title lives in the strip, so the window only loses its border
        assert_eq!(frame.get(b).unwrap().window_rect, Some(Rect::new(2, 36, 996, 762)));
        let titles: Vec<_> = frame.decorations.iter().map(|d| d.rect).collect();
        assert_eq!(titles, vec![Rect::new(0, 0, 1000, 18), Rect::new(0, 18, 1000, 18)]);
    }

    #[test]
    fn tabbed_splits_title_row() {
        let mut fx = Fixture::new();
        for _ in 0..3 {
            fx.tree.open(None);
        }
        fx.tree.con_mut(fx.ws).layout = ConLayout::Tabbed;
        let frame = render(&mut fx);
        let tabs: Vec<_> = frame.decorations.iter().map(|d| (d.rect.x, d.rect.width)).collect();
        assert_eq!(tabs, vec![(0, 333), (333, 333), (666, 334)]);
        assert_eq!(frame.decorations.iter().filter(|d| d.focused).count(), 1);
    }

    #[test]
    fn fullscreen_covers_output() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let b = leaf_with_window(&mut fx, 2);
        let f = leaf_with_window(&mut fx, 3);
        fx.tree.floating_enable(f, false);
        fx.tree.toggle_fullscreen(a);
        let frame = render(&mut fx);
        let rendered = frame.get(a).unwrap();
        assert_eq!(rendered.rect, OUTPUT_RECT);
        assert_eq!(rendered.border, BorderStyle::None);
        assert_eq!(rendered.window_rect, Some(OUTPUT_RECT));
        assert!(!frame.is_mapped(b));
        assert!(!frame.is_mapped(f));
        assert!(frame.decorations.is_empty());
        assert_eq!(
            frame.requests,
            vec![DisplayOp::SetFullscreen { window: WindowId(1), enabled: true }]
        );
    }

    #[test]
    fn floating_renders_above_tiling() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let f = leaf_with_window(&mut fx, 2);
        fx.tree.floating_enable(f, false);
        let wrapper = fx.tree.con(f).parent().unwrap();
        let frame = render(&mut fx);
        let order: Vec<_> = frame.cons.iter().map(|c| c.con).collect();
        let pos = |c| order.iter().position(|&o| o == c).unwrap();
        assert!(pos(a) < pos(wrapper));
        assert!(pos(wrapper) < pos(f));
        let rect = fx.tree.con(wrapper).rect;
        assert_eq!(frame.get(f).unwrap().rect, rect);
        assert!(frame.get(f).unwrap().floating);
    }

    #[test]
    fn only_visible_workspace_is_rendered() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        let two = fx.tree.workspace_get("2");
        let b = fx.tree.open(Some(two));
        fx.tree.focus(a);
        let frame = render(&mut fx);
        assert!(frame.is_mapped(a));
        assert!(!frame.is_mapped(b));
        assert!(!frame.is_mapped(two));
    }

    #[test]
    fn pending_requests_are_delivered_once() {
        let mut fx = Fixture::new();
        let a = leaf_with_window(&mut fx, 1);
        fx.tree.close(a, true, false);
        let frame = render(&mut fx);
        assert_eq!(frame.requests[0], DisplayOp::KillWindow(WindowId(1)));
        assert!(render(&mut fx).requests.is_empty());
    }

    #[test]
    fn uninitialized_tree_pushes_nothing() {
        let mut tree = ConTree::new(LayoutSettings::default());
        let mut display = RecordingDisplay::default();
        tree.render(&mut display);
        assert!(display.frames.is_empty());
    }
}
