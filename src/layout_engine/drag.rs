//! Pointer drags: moving and resizing floating containers, dragging
//! separators between tiling containers.

use bitflags::bitflags;
use tracing::{debug, trace};

use crate::model::{ConId, ConTree, Rect, WindowId};
use crate::sys::display::Display;

/// One input event observed while a drag is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragSample {
    /// Pointer position in root coordinates.
    Motion { x: i32, y: i32 },
    ButtonRelease,
    /// A window was unmapped while dragging.
    Unmap(WindowId),
    /// Anything else; ignored by the drag loop.
    Other,
}

/// Source of input samples for a drag. The display layer implements this on
/// top of its event queue.
pub trait DragInput {
    /// Blocks until the next sample arrives. `None` means the input is gone.
    fn wait(&mut self) -> Option<DragSample>;

    /// Returns an already queued sample without blocking.
    fn poll(&mut self) -> Option<DragSample>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragOutcome {
    /// The button was released; the last applied position stays.
    Released,
    /// A window was unmapped mid-drag. Pending motion was dropped; the caller
    /// still has to process the unmap.
    Unmapped(WindowId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        con: ConId,
        /// Rectangle of the dragged container when the drag started.
        old_rect: Rect,
        /// Pointer position when the drag started.
        start: (i32, i32),
    },
}

bitflags! {
    /// Edges of a rectangle that follow the pointer during a resize.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Border: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
    }
}

impl Border {
    /// The corner of `rect` nearest to the point `(x, y)`, given relative to
    /// the rectangle.
    pub fn nearest_corner(rect: &Rect, x: i32, y: i32) -> Border {
        let horizontal = if x < (rect.width / 2) as i32 { Border::LEFT } else { Border::RIGHT };
        let vertical = if y < (rect.height / 2) as i32 { Border::TOP } else { Border::BOTTOM };
        horizontal | vertical
    }
}

/// Drives a single drag from press to release.
#[derive(Debug, Default)]
pub struct Drag {
    state: DragState,
}

impl Drag {
    pub fn new() -> Self { Self::default() }

    pub fn state(&self) -> DragState { self.state }

    /// Runs the drag loop. Motion that queued up while the callback was busy is
    /// coalesced: only the latest position is handed to `on_motion`.
    pub fn run<I, F>(
        &mut self,
        con: ConId,
        old_rect: Rect,
        start: (i32, i32),
        input: &mut I,
        mut on_motion: F,
    ) -> DragOutcome
    where
        I: DragInput + ?Sized,
        F: FnMut(ConId, &Rect, (i32, i32), (i32, i32)),
    {
        self.state = DragState::Dragging { con, old_rect, start };
        debug!(con = ?con, ?start, "drag started");
        let outcome = 'drag: loop {
            let Some(first) = input.wait() else { break DragOutcome::Released };
            let mut latest = None;
            let mut sample = Some(first);
            while let Some(s) = sample {
                match s {
                    DragSample::ButtonRelease => break 'drag DragOutcome::Released,
                    DragSample::Unmap(window) => break 'drag DragOutcome::Unmapped(window),
                    DragSample::Motion { x, y } => latest = Some((x, y)),
                    DragSample::Other => {}
                }
                sample = input.poll();
            }
            if let Some(pos) = latest {
                trace!(con = ?con, ?pos, "drag motion");
                on_motion(con, &old_rect, start, pos);
            }
        };
        debug!(con = ?con, ?outcome, "drag finished");
        self.state = DragState::Idle;
        outcome
    }
}

impl ConTree {
    /// Moves a floating container with the pointer until the button is
    /// released.
    pub fn drag_floating<I, D>(
        &mut self,
        con: ConId,
        start: (i32, i32),
        input: &mut I,
        display: &mut D,
    ) -> Option<DragOutcome>
    where
        I: DragInput + ?Sized,
        D: Display + ?Sized,
    {
        let Some(wrapper) = self.inside_floating(con) else {
            debug!(con = ?con, "not floating, cannot drag");
            return None;
        };
        let old_rect = self.cons[wrapper].rect;
        let outcome = Drag::new().run(wrapper, old_rect, start, input, |wrapper, old, start, pos| {
            let rect = &mut self.cons[wrapper].rect;
            rect.x = old.x + (pos.0 - start.0);
            rect.y = old.y + (pos.1 - start.1);
            self.render(display);
        });
        Some(outcome)
    }

    /// Resizes a floating container by dragging the corner nearest to
    /// `grab`, which is relative to the container. With `proportional` the
    /// aspect ratio is kept.
    pub fn resize_floating<I, D>(
        &mut self,
        con: ConId,
        start: (i32, i32),
        grab: (i32, i32),
        proportional: bool,
        input: &mut I,
        display: &mut D,
    ) -> Option<DragOutcome>
    where
        I: DragInput + ?Sized,
        D: Display + ?Sized,
    {
        let Some(wrapper) = self.inside_floating(con) else {
            debug!(con = ?con, "not floating, cannot resize");
            return None;
        };
        let old_rect = self.cons[wrapper].rect;
        let corner = Border::nearest_corner(&old_rect, grab.0, grab.1);
        let min = (self.settings.floating.minimum_width, self.settings.floating.minimum_height);
        debug!(wrapper = ?wrapper, ?corner, proportional, "resizing floating container");
        let outcome = Drag::new().run(wrapper, old_rect, start, input, |wrapper, old, start, pos| {
            self.cons[wrapper].rect = resized(old, corner, start, pos, proportional, min);
            self.render(display);
        });
        Some(outcome)
    }
}

/// Applies a pointer movement to the edges in `corner`.
pub(crate) fn resized(
    old: &Rect,
    corner: Border,
    start: (i32, i32),
    pos: (i32, i32),
    proportional: bool,
    min: (u32, u32),
) -> Rect {
    let dx = pos.0 - start.0;
    let dy = pos.1 - start.1;
    let dx = if corner.contains(Border::LEFT) { -dx } else { dx };
    let dy = if corner.contains(Border::TOP) { -dy } else { dy };

    let mut width = (old.width as i32 + dx).max(min.0 as i32) as u32;
    let mut height = (old.height as i32 + dy).max(min.1 as i32) as u32;

    if proportional && old.width > 0 && old.height > 0 {
        let ratio = old.width as f64 / old.height as f64;
        let by_width = (width as f64 / ratio) as u32;
        let by_height = (height as f64 * ratio) as u32;
        // the larger of the two candidates wins
        width = width.max(by_height);
        height = height.max(by_width);
    }

    let x = if corner.contains(Border::LEFT) { old.right() - width as i32 } else { old.x };
    let y = if corner.contains(Border::TOP) { old.bottom() - height as i32 } else { old.y };
    Rect::new(x, y, width, height)
}
