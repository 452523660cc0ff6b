pub mod con;
mod focus;
mod percent;
pub mod rect;
pub mod snapshot;
pub mod tree;
pub mod window;

pub use con::{BorderStyle, Con, ConId, ConLayout, ConType, FloatingState, FullscreenMode};
pub use rect::{Rect, RectDelta};
pub use snapshot::{ConSnapshot, RestoreError, TreeSnapshot};
pub use tree::ConTree;
pub use window::{Window, WindowId, WindowProperty};
