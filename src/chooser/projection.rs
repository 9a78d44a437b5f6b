//! Derivation of the external grid's column definitions, and the rendered
//! row order of the selected panel. Both share the group-block rule: a
//! user group occupies the list position of the first list entry belonging
//! to it and moves as a block, while ungrouped leaves keep their own list
//! positions.

use tracing::warn;

use crate::chooser::groups::GroupRegistry;
use crate::common::collections::HashSet;
use crate::common::config::ChooserSettings;
use crate::grid::ColumnSchema;
use crate::model::tree::{ColumnTree, Node};

/// Builds the full schema for the grid: visible columns first (grouped
/// ones nested under their group header, in group-defined order), then
/// every remaining available leaf as a hidden column, so the grid always
/// knows every column.
pub fn project(
    selected: &ColumnTree,
    groups: &GroupRegistry,
    available: &ColumnTree,
    settings: &ChooserSettings,
) -> Vec<ColumnSchema> {
    let mut out = Vec::new();
    let mut emitted: HashSet<String> = HashSet::default();
    for id in selected.root_ids() {
        match groups.group_of(&id) {
            Some(group) => {
                if emitted.insert(group.id.clone()) {
                    let children: Vec<ColumnSchema> = group
                        .members
                        .iter()
                        .filter_map(|member| {
                            let node = selected.get(member);
                            if node.is_none() {
                                warn!("group {} references missing column {member}", group.id);
                            }
                            node
                        })
                        .map(|node| leaf_schema(node, settings, false))
                        .collect();
                    out.push(ColumnSchema::Group { header_name: group.name.clone(), children });
                }
            }
            None => {
                if let Some(node) = selected.get(&id) {
                    out.push(leaf_schema(node, settings, false));
                }
            }
        }
    }
    for key in available.flatten_leaves() {
        out.push(leaf_schema(available.node(key), settings, true));
    }
    out
}

fn leaf_schema(node: &Node, settings: &ChooserSettings, hide: bool) -> ColumnSchema {
    ColumnSchema::Column {
        field: node.field().unwrap_or(node.id.as_str()).to_string(),
        header_name: node.name.clone(),
        sortable: settings.sortable_columns,
        filter: settings.filterable_columns,
        hide,
    }
}

/// Row ids of the selected panel in rendered order: group header rows at
/// their block positions, members under them (in group order) when the
/// group is expanded or `include_collapsed_members` is set, ungrouped
/// leaves in place.
pub fn selected_panel_rows(
    selected: &ColumnTree,
    groups: &GroupRegistry,
    include_collapsed_members: bool,
) -> Vec<String> {
    let mut rows = Vec::new();
    let mut emitted: HashSet<String> = HashSet::default();
    for id in selected.root_ids() {
        match groups.group_of(&id) {
            Some(group) => {
                if emitted.insert(group.id.clone()) {
                    rows.push(group.id.clone());
                    if group.expanded || include_collapsed_members {
                        for member in &group.members {
                            if selected.contains(member) {
                                rows.push(member.clone());
                            }
                        }
                    }
                }
            }
            None => rows.push(id),
        }
    }
    rows
}
