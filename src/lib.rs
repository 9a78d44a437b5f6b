//! Dual-panel column chooser engine for data grids.
//!
//! The crate implements the model core behind a "column chooser" widget:
//! an available tree of columns organized in fixed canonical groups, a
//! selected list with user-defined grouping, and the reconciliation
//! machinery that keeps both consistent under drag-and-drop while deriving
//! the external grid's column schema after every change.

pub mod chooser;
pub mod common;
pub mod grid;
pub mod model;

pub use chooser::engine::{ChooserCommand, ChooserEngine, EventResponse};
pub use chooser::error::ChooserError;
pub use chooser::{DragPayload, DragSession, DropTarget, Panel, RowHalf};
pub use grid::{ColumnDescriptor, ColumnSchema, GridAdapter};
