use serde::{Deserialize, Serialize};

use crate::layout_engine::render::RenderFrame;
use crate::model::{ConId, Window, WindowId};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DisplayError {
    #[error("window {0:?} no longer exists")]
    WindowGone(WindowId),
    #[error("could not create a frame for window {window:?}: {reason}")]
    FrameFailed { window: WindowId, reason: String },
}

/// Requests the tree queues for the display layer between two renders. They are
/// delivered as part of the next [`RenderFrame`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayOp {
    /// Ask the client to close its window.
    KillWindow(WindowId),
    /// Stop managing the window: reparent it back to the root window.
    UnmanageWindow(WindowId),
    /// The frame belonging to this container is no longer needed.
    DestroyFrame(ConId),
    SetFullscreen { window: WindowId, enabled: bool },
}

/// The display collaborator. Implementations talk to the display server; the
/// tree only ever sees their results.
pub trait Display {
    /// Creates the frame for a freshly managed window. On error the container
    /// is dropped again and the window stays unmanaged; whatever the
    /// implementation allocated before failing is its own to release.
    fn frame_window(&mut self, con: ConId, window: &Window) -> Result<(), DisplayError>;

    /// Receives the complete result of a render pass.
    fn push_changes(&mut self, frame: RenderFrame);
}
