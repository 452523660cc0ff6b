//! Fixtures shared by the unit tests.

use std::collections::VecDeque;

use crate::common::config::LayoutSettings;
use crate::layout_engine::drag::{DragInput, DragSample};
use crate::layout_engine::ops::{WindowAttributes, WindowInfo};
use crate::layout_engine::render::RenderFrame;
use crate::layout_engine::workspaces::OutputInfo;
use crate::model::{ConId, ConTree, Rect, Window, WindowId};
use crate::sys::display::{Display, DisplayError};

pub const OUTPUT_RECT: Rect = Rect::new(0, 0, 1000, 800);

/// A tree with a single 1000x800 output showing workspace "1".
pub struct Fixture {
    pub tree: ConTree,
    pub ws: ConId,
}

impl Fixture {
    pub fn new() -> Self { Self::with_settings(LayoutSettings::default()) }

    pub fn with_settings(settings: LayoutSettings) -> Self {
        let mut tree = ConTree::new(settings);
        tree.init(&[OutputInfo::new("out", OUTPUT_RECT)]);
        let ws = tree.find_workspace("1").unwrap();
        Self { tree, ws }
    }

    #[track_caller]
    pub fn assert_consistent(&self) {
        let issues = self.tree.check_invariants();
        assert!(issues.is_empty(), "{issues:#?}\n{}", self.tree.draw_tree());
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub fail_frames: bool,
    pub framed: Vec<(ConId, WindowId)>,
    pub frames: Vec<RenderFrame>,
}

impl Display for RecordingDisplay {
    fn frame_window(&mut self, con: ConId, window: &Window) -> Result<(), DisplayError> {
        if self.fail_frames {
            return Err(DisplayError::FrameFailed {
                window: window.id,
                reason: "test display refuses".to_string(),
            });
        }
        self.framed.push((con, window.id));
        Ok(())
    }

    fn push_changes(&mut self, frame: RenderFrame) { self.frames.push(frame); }
}

pub fn window_info(id: u32) -> WindowInfo {
    WindowInfo {
        window: Window::new(WindowId(id)),
        geometry: Rect::ZERO,
        attributes: Some(WindowAttributes::default()),
    }
}

/// Manages a fresh window next to the focused container.
pub fn leaf_with_window(fx: &mut Fixture, id: u32) -> ConId {
    fx.tree.manage_window(window_info(id), &mut RecordingDisplay::default()).unwrap()
}

/// Replays a script of samples. `None` entries separate batches: `poll`
/// reports nothing past a separator, so the next batch is only seen by the
/// following `wait`.
#[derive(Default)]
pub struct ScriptedInput {
    pub script: VecDeque<Option<DragSample>>,
    pub waits: usize,
}

impl ScriptedInput {
    pub fn new(script: impl IntoIterator<Item = Option<DragSample>>) -> Self {
        Self { script: script.into_iter().collect(), waits: 0 }
    }
}

impl DragInput for ScriptedInput {
    fn wait(&mut self) -> Option<DragSample> {
        self.waits += 1;
        while let Some(next) = self.script.pop_front() {
            if next.is_some() {
                return next;
            }
        }
        None
    }

    fn poll(&mut self) -> Option<DragSample> {
        match self.script.front() {
            Some(Some(_)) => self.script.pop_front().flatten(),
            _ => None,
        }
    }
}

