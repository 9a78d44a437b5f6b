//! Query filtering for both panels. Matching is a case-insensitive
//! substring test on the display name and the data-source field.

use crate::chooser::groups::GroupRegistry;
use crate::model::tree::{ColumnTree, Node, NodeView};

/// A user group as it survives a query, members already filtered.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupView {
    pub id: String,
    pub name: String,
    pub expanded: bool,
    pub members: Vec<NodeView>,
}

pub fn node_matches(node: &Node, query: &str) -> bool {
    text_matches(&node.name, query) || node.field().is_some_and(|field| text_matches(field, query))
}

fn text_matches(text: &str, query: &str) -> bool {
    query.is_empty() || text.to_lowercase().contains(&query.to_lowercase())
}

/// Filters the available tree, preserving group structure and expanding
/// branches kept for their matching descendants.
pub fn filter_available(tree: &ColumnTree, query: &str) -> Vec<NodeView> {
    tree.filter(&|node: &Node| node_matches(node, query))
}

/// Matching leaves of the selected list, in list order.
pub fn filter_selected_flat(selected: &ColumnTree, query: &str) -> Vec<NodeView> {
    selected
        .flatten_leaves()
        .into_iter()
        .map(|key| selected.node(key))
        .filter(|node| node_matches(node, query))
        .map(|node| NodeView {
            id: node.id.clone(),
            name: node.name.clone(),
            field: node.field().map(str::to_string),
            expanded: node.expanded,
            selected: node.selected,
            children: Vec::new(),
        })
        .collect()
}

/// Filters user groups: a group matching by name keeps all its members,
/// otherwise it survives with just its matching members and comes back
/// expanded to reveal them.
pub fn filter_groups(groups: &GroupRegistry, selected: &ColumnTree, query: &str) -> Vec<GroupView> {
    groups
        .iter()
        .filter_map(|group| {
            let member_view = |member: &String| {
                selected.find(member).map(|key| {
                    let node = selected.node(key);
                    NodeView {
                        id: node.id.clone(),
                        name: node.name.clone(),
                        field: node.field().map(str::to_string),
                        expanded: node.expanded,
                        selected: node.selected,
                        children: Vec::new(),
                    }
                })
            };
            if text_matches(&group.name, query) {
                return Some(GroupView {
                    id: group.id.clone(),
                    name: group.name.clone(),
                    expanded: group.expanded,
                    members: group.members.iter().filter_map(member_view).collect(),
                });
            }
            let members: Vec<NodeView> = group
                .members
                .iter()
                .filter_map(member_view)
                .filter(|view| {
                    text_matches(&view.name, query)
                        || view.field.as_deref().is_some_and(|field| text_matches(field, query))
                })
                .collect();
            if members.is_empty() {
                return None;
            }
            Some(GroupView {
                id: group.id.clone(),
                name: group.name.clone(),
                expanded: true,
                members,
            })
        })
        .collect()
}
