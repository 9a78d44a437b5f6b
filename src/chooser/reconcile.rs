//! Drop reconciliation: one completed gesture resolves to a single
//! transition, which is then applied atomically to both collections and
//! the group registry.

use tracing::{debug, warn};

use crate::chooser::drag::{DragSession, DropTarget, Panel, RowHalf};
use crate::chooser::error::ChooserError;
use crate::chooser::groups::GroupRegistry;
use crate::common::collections::HashSet;
use crate::grid::CanonicalSchema;
use crate::model::tree::{ColumnTree, Placement};

/// Positional part of a drop, resolved against a row list from which the
/// dragged rows have already been taken out.
#[derive(Debug, Clone, PartialEq)]
pub struct DropSpot {
    pub row: Option<String>,
    pub index: Option<usize>,
    pub hit: RowHalf,
}

impl DropSpot {
    fn of(target: &DropTarget) -> Self {
        Self { row: target.row.clone(), index: target.index, hit: target.hit }
    }
}

/// Exhaustive set of outcomes a drop gesture can have.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ignore,
    MoveToSelected { ids: Vec<String>, group: Option<String>, spot: DropSpot },
    MoveToAvailable { ids: Vec<String> },
    ReorderWithinGroup { group: String, ids: Vec<String>, spot: DropSpot },
    ExtractFromGroup { group: String, ids: Vec<String>, spot: DropSpot },
    InsertIntoGroup { group: String, ids: Vec<String>, spot: DropSpot },
    TransferBetweenGroups { source: String, target: String, ids: Vec<String>, spot: DropSpot },
    ReorderUngrouped { ids: Vec<String>, spot: DropSpot },
    MergeGroups { source: String, target: String, spot: DropSpot },
    DissolveGroup { group: String, spot: DropSpot },
}

pub fn resolve(
    available: &ColumnTree,
    selected: &ColumnTree,
    groups: &GroupRegistry,
    session: &DragSession,
    target: &DropTarget,
) -> Transition {
    if session.ids.len() == 1
        && target.panel == session.source
        && target.row.as_deref() == Some(session.dragged.as_str())
        && target.group == session.parent_group
    {
        return Transition::Ignore;
    }

    let spot = DropSpot::of(target);
    match (session.source, target.panel) {
        (Panel::Available, Panel::Selected) => {
            let ids = resolve_available_leaves(available, selected, session);
            if ids.is_empty() {
                return Transition::Ignore;
            }
            let group = target.group.clone().filter(|group| {
                let known = groups.contains(group);
                if !known {
                    warn!("drop targets unknown group {group}, inserting ungrouped");
                }
                known
            });
            Transition::MoveToSelected { ids, group, spot }
        }
        (Panel::Selected, Panel::Available) => {
            let ids = resolve_selected_leaves(selected, groups, session);
            if ids.is_empty() {
                return Transition::Ignore;
            }
            Transition::MoveToAvailable { ids }
        }
        (Panel::Selected, Panel::Selected) => {
            resolve_same_panel(selected, groups, session, target, spot)
        }
        (Panel::Available, Panel::Available) => {
            debug!("same-panel drop on the available side ignored, canonical grouping is fixed");
            Transition::Ignore
        }
    }
}

/// Leaves to move out of the available tree: a dragged canonical group
/// resolves to all its leaves, a multi-selection resolves item by item.
/// Stale ids and ids already on the selected side are skipped.
fn resolve_available_leaves(
    available: &ColumnTree,
    selected: &ColumnTree,
    session: &DragSession,
) -> Vec<String> {
    let source: Vec<String> =
        if session.is_group { vec![session.dragged.clone()] } else { session.ids.clone() };
    let mut seen = HashSet::default();
    let mut out = Vec::new();
    for id in &source {
        let Some(key) = available.find(id) else {
            warn!("dragged id {id} no longer in the available tree, skipping");
            continue;
        };
        for leaf in available.snapshot(key).leaf_ids() {
            if selected.contains(&leaf) {
                warn!("dragged id {leaf} already selected, skipping");
                continue;
            }
            if seen.insert(leaf.clone()) {
                out.push(leaf);
            }
        }
    }
    out
}

/// Leaves to move or reorder on the selected side. User-group rows in the
/// dragged set expand to their members; stale ids are skipped.
fn resolve_selected_leaves(
    selected: &ColumnTree,
    groups: &GroupRegistry,
    session: &DragSession,
) -> Vec<String> {
    let source: Vec<String> =
        if session.is_group { vec![session.dragged.clone()] } else { session.ids.clone() };
    let mut seen = HashSet::default();
    let mut out = Vec::new();
    let push = |id: &String, seen: &mut HashSet<String>, out: &mut Vec<String>| {
        if !selected.contains(id) {
            warn!("dragged id {id} no longer in the selected list, skipping");
            return;
        }
        if seen.insert(id.clone()) {
            out.push(id.clone());
        }
    };
    for id in &source {
        if let Some(group) = groups.get(id) {
            for member in group.members.clone() {
                push(&member, &mut seen, &mut out);
            }
        } else {
            push(id, &mut seen, &mut out);
        }
    }
    out
}

fn resolve_same_panel(
    selected: &ColumnTree,
    groups: &GroupRegistry,
    session: &DragSession,
    target: &DropTarget,
    spot: DropSpot,
) -> Transition {
    if session.is_group {
        let Some(source) = groups.get(&session.dragged).map(|g| g.id.clone()) else {
            warn!("dragged group {} no longer exists, skipping", session.dragged);
            return Transition::Ignore;
        };
        return match &target.group {
            Some(group) if *group == source => Transition::Ignore,
            Some(group) if groups.contains(group) => {
                Transition::MergeGroups { source, target: group.clone(), spot }
            }
            Some(group) => {
                warn!("drop targets unknown group {group}, skipping");
                Transition::Ignore
            }
            None => Transition::DissolveGroup { group: source, spot },
        };
    }

    let ids = resolve_selected_leaves(selected, groups, session);
    if ids.is_empty() {
        return Transition::Ignore;
    }
    let source_group = session.parent_group.clone().filter(|group| groups.contains(group));
    let target_group = target.group.clone().filter(|group| groups.contains(group));
    match (source_group, target_group) {
        (None, None) => Transition::ReorderUngrouped { ids, spot },
        (Some(source), Some(target)) if source == target => {
            Transition::ReorderWithinGroup { group: source, ids, spot }
        }
        (Some(source), None) => Transition::ExtractFromGroup { group: source, ids, spot },
        (None, Some(target)) => Transition::InsertIntoGroup { group: target, ids, spot },
        (Some(source), Some(target)) => {
            Transition::TransferBetweenGroups { source, target, ids, spot }
        }
    }
}

pub fn apply(
    available: &mut ColumnTree,
    selected: &mut ColumnTree,
    groups: &mut GroupRegistry,
    canonical: &CanonicalSchema,
    transition: Transition,
) -> Result<bool, ChooserError> {
    match transition {
        Transition::Ignore => Ok(false),

        Transition::MoveToSelected { ids, group, spot } => {
            let mut at = effective_index(&selected.root_ids(), &spot);
            let mut inserted = Vec::new();
            for id in &ids {
                let Some(mut view) = available.remove(id) else { continue };
                view.selected = false;
                if selected.insert_at_position(view, canonical, &Placement::Index(at), false) {
                    at += 1;
                    inserted.push(id.clone());
                }
            }
            debug_assert_eq!(inserted.len(), ids.len(), "resolution should have filtered stale ids");
            if inserted.is_empty() {
                return Ok(false);
            }
            if let Some(group) = group {
                let member_at = member_insert_index(groups, &group, &inserted, &spot);
                groups.add_members(&group, &inserted, member_at)?;
            }
            Ok(true)
        }

        Transition::MoveToAvailable { ids } => {
            let mut changed = false;
            for id in &ids {
                if !selected.contains(id) {
                    continue;
                }
                // Group membership goes first so the registry never
                // references a leaf the list no longer holds.
                groups.detach_member(id);
                let Some(mut view) = selected.remove(id) else { continue };
                view.selected = false;
                available.insert_at_position(view, canonical, &Placement::End, true);
                changed = true;
            }
            Ok(changed)
        }

        Transition::ReorderWithinGroup { group, ids, spot } => {
            let entry =
                groups.get(&group).ok_or_else(|| ChooserError::UnknownGroup(group.clone()))?;
            let moving: Vec<String> =
                ids.iter().filter(|id| entry.members.contains(*id)).cloned().collect();
            if moving.is_empty() {
                return Ok(false);
            }
            let mut order: Vec<String> = entry
                .members
                .iter()
                .filter(|member| !moving.contains(*member))
                .cloned()
                .collect();
            let at = effective_index(&order, &spot);
            for (offset, id) in moving.into_iter().enumerate() {
                order.insert(at + offset, id);
            }
            groups.reorder_members(&group, order)?;
            Ok(true)
        }

        Transition::ExtractFromGroup { group, ids, spot } => {
            groups.remove_members(&group, &ids)?;
            splice_list(selected, &ids, &spot);
            Ok(true)
        }

        Transition::InsertIntoGroup { group, ids, spot } => {
            let at = member_insert_index(groups, &group, &ids, &spot);
            groups.add_members(&group, &ids, at)?;
            Ok(true)
        }

        Transition::TransferBetweenGroups { source, target, ids, spot } => {
            let at = member_insert_index(groups, &target, &ids, &spot);
            groups.remove_members(&source, &ids)?;
            groups.add_members(&target, &ids, at)?;
            Ok(true)
        }

        Transition::ReorderUngrouped { ids, spot } => {
            splice_list(selected, &ids, &spot);
            Ok(true)
        }

        Transition::MergeGroups { source, target, spot } => {
            let at = member_insert_index(groups, &target, &[], &spot);
            groups.merge_into(&source, &target, at)?;
            Ok(true)
        }

        Transition::DissolveGroup { group, spot } => {
            let members = groups
                .get(&group)
                .map(|g| g.members.clone())
                .ok_or_else(|| ChooserError::UnknownGroup(group.clone()))?;
            groups.remove(&group);
            splice_list(selected, &members, &spot);
            Ok(true)
        }
    }
}

/// Splices `ids` out of the selected list and reinserts them as a block at
/// the spot's effective position.
fn splice_list(selected: &mut ColumnTree, ids: &[String], spot: &DropSpot) {
    let remaining: Vec<String> =
        selected.root_ids().into_iter().filter(|id| !ids.contains(id)).collect();
    let at = effective_index(&remaining, spot);
    selected.reorder_roots(ids, at);
}

/// Effective insertion index against `rows`, which must already exclude
/// the dragged entries: an explicit index wins, the empty-panel sentinel
/// appends, a drop on the lower half of a row inserts after it, and a
/// vanished target row appends.
fn effective_index(rows: &[String], spot: &DropSpot) -> usize {
    if let Some(at) = spot.index {
        return at.min(rows.len());
    }
    let Some(row) = &spot.row else {
        return rows.len();
    };
    match rows.iter().position(|id| id == row) {
        Some(at) => at + usize::from(spot.hit == RowHalf::Lower),
        None => rows.len(),
    }
}

/// Insertion index within a group's member order, `None` for append.
fn member_insert_index(
    groups: &GroupRegistry,
    group: &str,
    moving: &[String],
    spot: &DropSpot,
) -> Option<usize> {
    let entry = groups.get(group)?;
    let members: Vec<&String> =
        entry.members.iter().filter(|member| !moving.contains(*member)).collect();
    if let Some(at) = spot.index {
        return Some(at.min(members.len()));
    }
    let row = spot.row.as_ref()?;
    members
        .iter()
        .position(|member| *member == row)
        .map(|at| at + usize::from(spot.hit == RowHalf::Lower))
}
