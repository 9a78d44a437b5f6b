use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chooser::drag::{DragPayload, DragSession, DropTarget, Panel};
use crate::chooser::error::ChooserError;
use crate::chooser::filter::{self, GroupView};
use crate::chooser::groups::GroupRegistry;
use crate::chooser::projection;
use crate::chooser::reconcile;
use crate::common::collections::HashSet;
use crate::common::config::ChooserSettings;
use crate::grid::{CanonicalSchema, ColumnDescriptor, ColumnSchema, GridAdapter};
use crate::model::selection::{self, ClickModifiers};
use crate::model::tree::{ColumnTree, NodeView, Placement};

/// What one engine operation did.
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// Any model state changed (including selection-only changes).
    pub changed: bool,
    /// The grid's column definitions need recomputing.
    pub schema_changed: bool,
}

impl EventResponse {
    fn selection_only() -> Self {
        Self { changed: true, schema_changed: false }
    }

    fn reconciled() -> Self {
        Self { changed: true, schema_changed: true }
    }
}

/// Gesture-independent operations a host can drive the chooser with
/// (toolbar buttons, context menus, IPC).
#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ChooserCommand {
    MoveToSelected { ids: Vec<String> },
    MoveToAvailable { ids: Vec<String> },
    SelectAllColumns,
    ClearColumns,
    CreateGroup { name: String },
    CreateGroupWith { name: String, ids: Vec<String> },
    RenameGroup { group: String, name: String },
    DeleteGroup { group: String },
    EjectFromGroup { ids: Vec<String> },
    SelectAll { panel: Panel },
    ClearSelection { panel: Panel },
    ExpandAll { panel: Panel },
    CollapseAll { panel: Panel },
    Reset,
}

/// The chooser model core: both panels, the user-group registry, and the
/// reconciliation entry points the view layer drives.
pub struct ChooserEngine {
    canonical: CanonicalSchema,
    available: ColumnTree,
    selected: ColumnTree,
    groups: GroupRegistry,
    settings: ChooserSettings,
    available_anchor: Option<String>,
    selected_anchor: Option<String>,
}

impl ChooserEngine {
    pub fn new(
        descriptors: Vec<ColumnDescriptor>,
        settings: ChooserSettings,
    ) -> Result<Self, ChooserError> {
        let canonical = CanonicalSchema::new(descriptors)?;
        let mut engine = Self {
            canonical,
            available: ColumnTree::new(),
            selected: ColumnTree::new(),
            groups: GroupRegistry::new(),
            settings,
            available_anchor: None,
            selected_anchor: None,
        };
        engine.seed();
        Ok(engine)
    }

    fn seed(&mut self) {
        let descriptors: Vec<ColumnDescriptor> = self.canonical.iter().cloned().collect();
        for descriptor in &descriptors {
            let view = NodeView::leaf(
                descriptor.id.clone(),
                descriptor.name.clone(),
                descriptor.field.clone(),
            );
            self.available.insert_at_position(view, &self.canonical, &Placement::End, true);
        }
        if self.settings.seed_visible_columns {
            for descriptor in descriptors.iter().filter(|d| d.visible_by_default) {
                if let Some(view) = self.available.remove(&descriptor.id) {
                    self.selected.insert_at_position(
                        view,
                        &self.canonical,
                        &Placement::End,
                        false,
                    );
                }
            }
        }
        if !self.settings.expand_groups_on_init {
            self.available.collapse_all();
        }
    }

    /// Rebuilds both panels from the canonical metadata.
    pub fn reset(&mut self) -> EventResponse {
        self.available = ColumnTree::new();
        self.selected = ColumnTree::new();
        self.groups = GroupRegistry::new();
        self.available_anchor = None;
        self.selected_anchor = None;
        self.seed();
        EventResponse::reconciled()
    }

    pub fn available_tree(&self) -> &ColumnTree {
        &self.available
    }

    pub fn selected_list(&self) -> &ColumnTree {
        &self.selected
    }

    pub fn groups(&self) -> &GroupRegistry {
        &self.groups
    }

    pub fn settings(&self) -> &ChooserSettings {
        &self.settings
    }

    pub fn available_count(&self) -> usize {
        self.available.count_leaves()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.count_leaves()
    }

    pub fn selection_count(&self, panel: Panel) -> usize {
        match panel {
            Panel::Available => self.available.count_selected(),
            Panel::Selected => {
                self.selected.count_selected() + self.groups.selected_ids().len()
            }
        }
    }

    /// Row ids of a panel in rendered order.
    pub fn panel_rows(&self, panel: Panel) -> Vec<String> {
        match panel {
            Panel::Available => self.available.visible_order(false),
            Panel::Selected => projection::selected_panel_rows(&self.selected, &self.groups, false),
        }
    }

    // ---- selection gestures ----

    pub fn click(&mut self, panel: Panel, row: &str, modifiers: ClickModifiers) -> EventResponse {
        let modifiers = ClickModifiers {
            multi: modifiers.multi && self.settings.multi_select,
            range: modifiers.range && self.settings.range_select,
        };
        let visible = self.panel_rows(panel);
        if !visible.iter().any(|id| id == row) {
            warn!("click on unknown row {row}, ignoring");
            return EventResponse::default();
        }
        let current = self.panel_selected_set(panel);
        let anchor = match panel {
            Panel::Available => self.available_anchor.clone(),
            Panel::Selected => self.selected_anchor.clone(),
        };
        let update = selection::toggle(&visible, &current, row, modifiers, anchor.as_deref());
        for id in &update.deselect {
            self.set_row_selected(panel, id, false);
        }
        for id in &update.select {
            self.set_row_selected(panel, id, true);
        }
        match panel {
            Panel::Available => self.available_anchor = update.anchor,
            Panel::Selected => self.selected_anchor = update.anchor,
        }
        EventResponse::selection_only()
    }

    pub fn select_all(&mut self, panel: Panel) -> EventResponse {
        match panel {
            Panel::Available => self.available.select_all(),
            Panel::Selected => {
                self.selected.select_all();
                self.groups.select_all(true);
            }
        }
        EventResponse::selection_only()
    }

    pub fn clear_selection(&mut self, panel: Panel) -> EventResponse {
        match panel {
            Panel::Available => {
                self.available.clear_selection();
                self.available_anchor = None;
            }
            Panel::Selected => {
                self.selected.clear_selection();
                self.groups.select_all(false);
                self.selected_anchor = None;
            }
        }
        EventResponse::selection_only()
    }

    fn panel_selected_set(&self, panel: Panel) -> HashSet<String> {
        match panel {
            Panel::Available => self.available.selected_ids().into_iter().collect(),
            Panel::Selected => self
                .selected
                .selected_ids()
                .into_iter()
                .chain(self.groups.selected_ids())
                .collect(),
        }
    }

    fn set_row_selected(&mut self, panel: Panel, id: &str, value: bool) {
        match panel {
            Panel::Available => {
                self.available.set_selected(id, value);
            }
            Panel::Selected => {
                if !self.selected.set_selected(id, value) {
                    self.groups.set_selected(id, value);
                }
            }
        }
    }

    // ---- expansion ----

    pub fn set_expanded(&mut self, panel: Panel, id: &str, expanded: bool) -> EventResponse {
        let found = match panel {
            Panel::Available => self.available.set_expanded(id, expanded),
            Panel::Selected => self.groups.set_expanded(id, expanded),
        };
        if found { EventResponse::selection_only() } else { EventResponse::default() }
    }

    pub fn expand_all(&mut self, panel: Panel) -> EventResponse {
        match panel {
            Panel::Available => self.available.expand_all(),
            Panel::Selected => self.groups.set_expanded_all(true),
        }
        EventResponse::selection_only()
    }

    pub fn collapse_all(&mut self, panel: Panel) -> EventResponse {
        match panel {
            Panel::Available => self.available.collapse_all(),
            Panel::Selected => self.groups.set_expanded_all(false),
        }
        EventResponse::selection_only()
    }

    // ---- drag and drop ----

    /// Starts a drag on `row`. The session must be threaded through the
    /// gesture and handed back to [`complete_drop`]; dropping it cancels
    /// the gesture with no model change.
    ///
    /// [`complete_drop`]: ChooserEngine::complete_drop
    pub fn begin_drag(&self, panel: Panel, row: &str) -> Result<DragSession, ChooserError> {
        match panel {
            Panel::Available => {
                let node = self
                    .available
                    .get(row)
                    .ok_or_else(|| ChooserError::UnknownColumn(row.to_string()))?;
                let ids = if node.selected && !node.is_group() {
                    self.available
                        .visible_order(false)
                        .into_iter()
                        .filter(|id| self.available.get(id).is_some_and(|n| n.selected))
                        .collect()
                } else {
                    vec![row.to_string()]
                };
                Ok(DragSession {
                    dragged: row.to_string(),
                    is_group: node.is_group(),
                    source: panel,
                    parent_group: None,
                    ids,
                })
            }
            Panel::Selected => {
                if self.groups.contains(row) {
                    return Ok(DragSession {
                        dragged: row.to_string(),
                        is_group: true,
                        source: panel,
                        parent_group: None,
                        ids: vec![row.to_string()],
                    });
                }
                let node = self
                    .selected
                    .get(row)
                    .ok_or_else(|| ChooserError::UnknownColumn(row.to_string()))?;
                let parent_group = self.groups.group_of(row).map(|g| g.id.clone());
                let ids = if node.selected {
                    let current = self.panel_selected_set(Panel::Selected);
                    projection::selected_panel_rows(&self.selected, &self.groups, true)
                        .into_iter()
                        .filter(|id| current.contains(id))
                        .collect()
                } else {
                    vec![row.to_string()]
                };
                Ok(DragSession {
                    dragged: row.to_string(),
                    is_group: false,
                    source: panel,
                    parent_group,
                    ids,
                })
            }
        }
    }

    /// Commits a drop. Consumes the session so a duplicate platform event
    /// has nothing left to replay; the resolve step additionally makes a
    /// replayed payload a no-op.
    pub fn complete_drop(
        &mut self,
        session: DragSession,
        target: DropTarget,
    ) -> Result<EventResponse, ChooserError> {
        let transition =
            reconcile::resolve(&self.available, &self.selected, &self.groups, &session, &target);
        debug!("drop from {} resolved to {transition:?}", session.source);
        let changed = reconcile::apply(
            &mut self.available,
            &mut self.selected,
            &mut self.groups,
            &self.canonical,
            transition,
        )?;
        if changed {
            self.check_invariants();
            Ok(EventResponse::reconciled())
        } else {
            Ok(EventResponse::default())
        }
    }

    /// Drop entry point for payloads that crossed the platform's
    /// string-only drag boundary. Malformed payloads and stale state are
    /// logged no-ops, never errors.
    pub fn drop_payload(&mut self, raw: &str, target: DropTarget) -> EventResponse {
        let payload = match DragPayload::decode(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("ignoring drop with malformed payload: {err}");
                return EventResponse::default();
            }
        };
        let session = self.session_from_payload(payload);
        match self.complete_drop(session, target) {
            Ok(response) => response,
            Err(err) => {
                warn!("drop failed, leaving model unchanged: {err}");
                EventResponse::default()
            }
        }
    }

    fn session_from_payload(&self, payload: DragPayload) -> DragSession {
        let dragged = payload.ids.first().cloned().unwrap_or_default();
        let is_group = payload.ids.len() == 1
            && match payload.source {
                Panel::Available => {
                    self.available.get(&dragged).is_some_and(|node| node.is_group())
                }
                Panel::Selected => self.groups.contains(&dragged),
            };
        DragSession {
            dragged,
            is_group,
            source: payload.source,
            parent_group: payload.parent_id,
            ids: payload.ids,
        }
    }

    // ---- gesture-independent operations ----

    pub fn handle_command(&mut self, command: ChooserCommand) -> Result<EventResponse, ChooserError> {
        match command {
            ChooserCommand::MoveToSelected { ids } => self.move_to_selected(&ids),
            ChooserCommand::MoveToAvailable { ids } => self.move_to_available(&ids),
            ChooserCommand::SelectAllColumns => {
                let ids = self.available.leaf_ids();
                self.move_to_selected(&ids)
            }
            ChooserCommand::ClearColumns => {
                let ids = self.selected.leaf_ids();
                self.move_to_available(&ids)
            }
            ChooserCommand::CreateGroup { name } => self.create_group_from_selection(&name),
            ChooserCommand::CreateGroupWith { name, ids } => self.create_group_with(&name, ids),
            ChooserCommand::RenameGroup { group, name } => self.rename_group(&group, &name),
            ChooserCommand::DeleteGroup { group } => self.delete_group(&group),
            ChooserCommand::EjectFromGroup { ids } => Ok(self.eject_from_group(&ids)),
            ChooserCommand::SelectAll { panel } => Ok(self.select_all(panel)),
            ChooserCommand::ClearSelection { panel } => Ok(self.clear_selection(panel)),
            ChooserCommand::ExpandAll { panel } => Ok(self.expand_all(panel)),
            ChooserCommand::CollapseAll { panel } => Ok(self.collapse_all(panel)),
            ChooserCommand::Reset => Ok(self.reset()),
        }
    }

    /// Moves `ids` (leaves, or canonical groups resolved to their leaves)
    /// to the end of the selected list, ungrouped.
    pub fn move_to_selected(&mut self, ids: &[String]) -> Result<EventResponse, ChooserError> {
        let Some(first) = ids.first() else { return Ok(EventResponse::default()) };
        let session = DragSession {
            dragged: first.clone(),
            is_group: false,
            source: Panel::Available,
            parent_group: None,
            ids: ids.to_vec(),
        };
        self.complete_drop(session, DropTarget::empty_panel(Panel::Selected))
    }

    /// Moves `ids` back to the available tree, regrouping canonically.
    pub fn move_to_available(&mut self, ids: &[String]) -> Result<EventResponse, ChooserError> {
        let Some(first) = ids.first() else { return Ok(EventResponse::default()) };
        let session = DragSession {
            dragged: first.clone(),
            is_group: false,
            source: Panel::Selected,
            parent_group: None,
            ids: ids.to_vec(),
        };
        self.complete_drop(session, DropTarget::empty_panel(Panel::Available))
    }

    /// Creates a user group over the currently selected leaves of the
    /// selected panel, in rendered order. The list order itself is
    /// untouched; grouping is metadata over it.
    pub fn create_group_from_selection(&mut self, name: &str) -> Result<EventResponse, ChooserError> {
        let current = self.panel_selected_set(Panel::Selected);
        let ids: Vec<String> = projection::selected_panel_rows(&self.selected, &self.groups, true)
            .into_iter()
            .filter(|id| current.contains(id) && self.selected.contains(id))
            .collect();
        self.create_group_with(name, ids)
    }

    pub fn create_group_with(
        &mut self,
        name: &str,
        ids: Vec<String>,
    ) -> Result<EventResponse, ChooserError> {
        let ids: Vec<String> =
            ids.into_iter().filter(|id| self.selected.contains(id)).collect();
        if ids.is_empty() {
            debug!("no selected leaves to group under {name:?}");
            return Ok(EventResponse::default());
        }
        let group = self.groups.create(name, ids);
        debug!("created group {group} ({name:?})");
        self.check_invariants();
        Ok(EventResponse::reconciled())
    }

    pub fn rename_group(&mut self, group: &str, name: &str) -> Result<EventResponse, ChooserError> {
        self.groups.rename(group, name)?;
        Ok(EventResponse::reconciled())
    }

    /// Deletes the group entry; members stay in the list, ungrouped.
    pub fn delete_group(&mut self, group: &str) -> Result<EventResponse, ChooserError> {
        if self.groups.remove(group).is_none() {
            return Err(ChooserError::UnknownGroup(group.to_string()));
        }
        Ok(EventResponse::reconciled())
    }

    /// Ungroups `ids` in place (the double-click gesture): membership is
    /// dropped, list positions are kept.
    pub fn eject_from_group(&mut self, ids: &[String]) -> EventResponse {
        let mut changed = false;
        for id in ids {
            if self.groups.detach_member(id).is_some() {
                changed = true;
            }
        }
        if changed { EventResponse::reconciled() } else { EventResponse::default() }
    }

    // ---- search ----

    pub fn search_available(&self, query: &str) -> Vec<NodeView> {
        filter::filter_available(&self.available, query)
    }

    pub fn search_selected(&self, query: &str) -> Vec<NodeView> {
        filter::filter_selected_flat(&self.selected, query)
    }

    pub fn search_groups(&self, query: &str) -> Vec<GroupView> {
        filter::filter_groups(&self.groups, &self.selected, query)
    }

    // ---- schema ----

    pub fn column_definitions(&self) -> Vec<ColumnSchema> {
        projection::project(&self.selected, &self.groups, &self.available, &self.settings)
    }

    /// Pushes the current schema to the grid. Call after any response
    /// with `schema_changed`.
    pub fn sync_grid(&self, grid: &mut dyn GridAdapter) {
        grid.set_column_definitions(self.column_definitions());
    }

    /// Debug-build verification that no operation broke id uniqueness
    /// across the panels or left a group referencing a missing leaf.
    fn check_invariants(&self) {
        if cfg!(debug_assertions) {
            let mut seen: HashSet<String> = HashSet::default();
            for id in self.available.leaf_ids().into_iter().chain(self.selected.leaf_ids()) {
                debug_assert!(seen.insert(id.clone()), "column {id} present twice");
            }
            for group in self.groups.iter() {
                for member in &group.members {
                    debug_assert!(
                        self.selected.contains(member),
                        "group {} references missing column {member}",
                        group.id
                    );
                }
            }
        }
    }
}
