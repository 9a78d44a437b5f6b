pub mod drag;
pub mod engine;
pub mod error;
pub mod filter;
pub mod groups;
pub mod projection;
mod reconcile;

pub use drag::{DragPayload, DragSession, DropTarget, Panel, RowHalf};
pub use engine::{ChooserCommand, ChooserEngine, EventResponse};
pub use error::ChooserError;
pub use groups::{GroupRegistry, SelectedGroup};
