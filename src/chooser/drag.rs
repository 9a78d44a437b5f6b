use serde::{Deserialize, Serialize};

use crate::chooser::error::ChooserError;

/// The two panels of the chooser.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Panel {
    Available,
    Selected,
}

/// Wire format of a drag, carried across the platform drag boundary.
///
/// The platform API only transports strings, so this round-trips through
/// JSON. Decode failure at the drop site is a logged no-op, never a crash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DragPayload {
    pub ids: Vec<String>,
    pub source: Panel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl DragPayload {
    pub fn encode(&self) -> Result<String, ChooserError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(raw: &str) -> Result<Self, ChooserError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One drag gesture, constructed at drag-start and consumed exactly once
/// by the drop. Cancellation is simply dropping the value, so no stale
/// drag state can leak into the next gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Row the gesture started on.
    pub dragged: String,
    /// Whether that row is a group row (canonical or user group).
    pub is_group: bool,
    pub source: Panel,
    /// User group owning the dragged row, when dragging a grouped leaf.
    pub parent_group: Option<String>,
    /// Full multi-selection being dragged; just the dragged row when it
    /// was not part of one.
    pub ids: Vec<String>,
}

impl DragSession {
    pub fn payload(&self) -> DragPayload {
        DragPayload {
            ids: self.ids.clone(),
            source: self.source,
            parent_id: self.parent_group.clone(),
        }
    }
}

/// Vertical half of the row the drop landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowHalf {
    #[default]
    Upper,
    Lower,
}

impl RowHalf {
    /// Classifies a cursor position given as a fraction of the row height.
    pub fn from_fraction(fraction: f64, insert_after_threshold: f64) -> Self {
        if fraction >= insert_after_threshold { RowHalf::Lower } else { RowHalf::Upper }
    }
}

/// Where a drop landed.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTarget {
    pub panel: Panel,
    /// Row under the cursor; `None` is the empty-panel sentinel (append).
    pub row: Option<String>,
    /// User group under the cursor, when dropping into a group's area.
    pub group: Option<String>,
    /// Explicit insertion index, when the view already computed one.
    pub index: Option<usize>,
    pub hit: RowHalf,
}

impl DropTarget {
    pub fn empty_panel(panel: Panel) -> Self {
        Self { panel, row: None, group: None, index: None, hit: RowHalf::Upper }
    }

    pub fn on_row(panel: Panel, row: &str, hit: RowHalf) -> Self {
        Self { panel, row: Some(row.to_string()), group: None, index: None, hit }
    }

    pub fn in_group(panel: Panel, group: &str, row: Option<&str>, hit: RowHalf) -> Self {
        Self {
            panel,
            row: row.map(str::to_string),
            group: Some(group.to_string()),
            index: None,
            hit,
        }
    }

    pub fn at_index(panel: Panel, index: usize) -> Self {
        Self { panel, row: None, group: None, index: Some(index), hit: RowHalf::Upper }
    }
}
