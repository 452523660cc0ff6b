pub mod drag;
pub mod engine;
mod floating;
pub(crate) mod graph;
pub mod ops;
pub mod render;
pub mod resize;
pub mod workspaces;

pub use drag::{Border, Drag, DragInput, DragOutcome, DragSample, DragState};
pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
pub use graph::{Direction, Orientation, Way};
pub use ops::{ManageError, WindowAttributes, WindowInfo};
pub use render::{Decoration, RenderFrame, RenderedCon};
pub use resize::{ResizeDelta, ResizeMode, ResizeValue};
pub use workspaces::OutputInfo;
