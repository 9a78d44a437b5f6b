//! External interfaces: the canonical column metadata the chooser is
//! seeded from, the column-definition schema pushed to the grid, and the
//! thin trait the real grid component is consumed through.

use serde::{Deserialize, Serialize};

use crate::chooser::error::ChooserError;
use crate::common::collections::HashMap;

pub type Row = serde_json::Map<String, serde_json::Value>;

/// Static, per-session description of one data-source column.
///
/// `group_path` is the canonical grouping: fixed schema metadata, never
/// changed by the chooser. An empty path means the column sits at the root
/// of the available tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ColumnDescriptor {
    pub id: String,
    pub field: String,
    pub name: String,
    #[serde(default)]
    pub group_path: Vec<String>,
    #[serde(default)]
    pub visible_by_default: bool,
}

/// The canonical metadata, indexed by column id.
#[derive(Debug, Clone)]
pub struct CanonicalSchema {
    descriptors: Vec<ColumnDescriptor>,
    by_id: HashMap<String, usize>,
}

impl CanonicalSchema {
    pub fn new(descriptors: Vec<ColumnDescriptor>) -> Result<Self, ChooserError> {
        let mut by_id = HashMap::default();
        for (idx, descriptor) in descriptors.iter().enumerate() {
            if by_id.insert(descriptor.id.clone(), idx).is_some() {
                return Err(ChooserError::DuplicateColumn(descriptor.id.clone()));
            }
        }
        Ok(Self { descriptors, by_id })
    }

    pub fn descriptor(&self, id: &str) -> Option<&ColumnDescriptor> {
        self.by_id.get(id).map(|&idx| &self.descriptors[idx])
    }

    /// Canonical group path owning `id`; empty for root-level and unknown
    /// columns.
    pub fn group_path(&self, id: &str) -> &[String] {
        self.descriptor(id).map(|d| d.group_path.as_slice()).unwrap_or(&[])
    }

    /// Node id of the canonical group at `path`. Namespaced so generated
    /// group ids can never collide with column ids.
    pub fn group_id(path: &[String]) -> String {
        format!("group:{}", path.join("/"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> + '_ {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// One entry of the column-definition list sent to the grid. Serializes
/// with camelCase keys, matching what JS grid components expect.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ColumnSchema {
    Group {
        header_name: String,
        children: Vec<ColumnSchema>,
    },
    Column {
        field: String,
        header_name: String,
        sortable: bool,
        filter: bool,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        hide: bool,
    },
}

impl ColumnSchema {
    pub fn header_name(&self) -> &str {
        match self {
            ColumnSchema::Group { header_name, .. } => header_name,
            ColumnSchema::Column { header_name, .. } => header_name,
        }
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, ColumnSchema::Column { hide: true, .. })
    }

    /// Leaf fields in this entry, in order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ColumnSchema::Column { field, .. } => vec![field.as_str()],
            ColumnSchema::Group { children, .. } => {
                children.iter().flat_map(|c| c.fields()).collect()
            }
        }
    }
}

/// The grid component, as far as the chooser is concerned.
pub trait GridAdapter {
    fn set_column_definitions(&mut self, columns: Vec<ColumnSchema>);
    fn set_row_data(&mut self, rows: Vec<Row>);
}

/// Test double recording every push from the engine.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingGrid {
    pub column_updates: Vec<Vec<ColumnSchema>>,
    pub row_updates: Vec<Vec<Row>>,
}

#[cfg(test)]
impl GridAdapter for RecordingGrid {
    fn set_column_definitions(&mut self, columns: Vec<ColumnSchema>) {
        self.column_updates.push(columns);
    }

    fn set_row_data(&mut self, rows: Vec<Row>) {
        self.row_updates.push(rows);
    }
}
