use crate::chooser::error::ChooserError;

/// A user-created grouping of selected columns. Membership is metadata
/// over the selected list and fully independent of canonical grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedGroup {
    pub id: String,
    pub name: String,
    /// Member leaf ids, in group-defined display order.
    pub members: Vec<String>,
    pub expanded: bool,
    pub selected: bool,
}

/// Registry of user groups, in creation order.
///
/// The registry never outlives its members: a group whose last member
/// leaves is deleted on the spot, so no operation can observe an empty
/// group. Ids come from a deterministic per-registry counter.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<SelectedGroup>,
    next_id: u64,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectedGroup> + '_ {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.id == group)
    }

    pub fn get(&self, group: &str) -> Option<&SelectedGroup> {
        self.groups.iter().find(|g| g.id == group)
    }

    fn get_mut(&mut self, group: &str) -> Option<&mut SelectedGroup> {
        self.groups.iter_mut().find(|g| g.id == group)
    }

    /// The group referencing `leaf`, if any. Membership is exclusive: a
    /// leaf sits in at most one group.
    pub fn group_of(&self, leaf: &str) -> Option<&SelectedGroup> {
        self.groups.iter().find(|g| g.members.iter().any(|m| m == leaf))
    }

    /// Creates a group with `members`, or merges them into an existing
    /// group of the same name instead of creating a duplicate. Returns the
    /// group id. Members already grouped elsewhere are claimed for the new
    /// group.
    pub fn create(&mut self, name: &str, members: Vec<String>) -> String {
        for member in &members {
            if let Some(owner) = self.group_of(member)
                && owner.name != name
            {
                let owner = owner.id.clone();
                self.remove_member_inner(&owner, member);
            }
        }
        if let Some(existing) = self.groups.iter_mut().find(|g| g.name == name) {
            let id = existing.id.clone();
            for member in members {
                if !existing.members.contains(&member) {
                    existing.members.push(member);
                }
            }
            return id;
        }
        self.next_id += 1;
        let id = format!("group-{}", self.next_id);
        self.groups.push(SelectedGroup {
            id: id.clone(),
            name: name.to_string(),
            members,
            expanded: true,
            selected: false,
        });
        id
    }

    pub fn rename(&mut self, group: &str, name: &str) -> Result<(), ChooserError> {
        let entry = self.get_mut(group).ok_or_else(|| ChooserError::UnknownGroup(group.into()))?;
        entry.name = name.to_string();
        Ok(())
    }

    /// Deletes the group entry; its members become ungrouped.
    pub fn remove(&mut self, group: &str) -> Option<SelectedGroup> {
        let at = self.groups.iter().position(|g| g.id == group)?;
        Some(self.groups.remove(at))
    }

    /// Adds `ids` to the group at `at` (default end), skipping ids already
    /// present.
    pub fn add_members(
        &mut self,
        group: &str,
        ids: &[String],
        at: Option<usize>,
    ) -> Result<(), ChooserError> {
        let entry = self.get_mut(group).ok_or_else(|| ChooserError::UnknownGroup(group.into()))?;
        let fresh: Vec<String> =
            ids.iter().filter(|id| !entry.members.contains(*id)).cloned().collect();
        let at = at.unwrap_or(entry.members.len()).min(entry.members.len());
        for (offset, id) in fresh.into_iter().enumerate() {
            entry.members.insert(at + offset, id);
        }
        Ok(())
    }

    /// Removes `ids` from the group. Returns `true` when the removal
    /// emptied the group and it was deleted as a side effect — callers
    /// must treat deletion as a possible outcome.
    pub fn remove_members(&mut self, group: &str, ids: &[String]) -> Result<bool, ChooserError> {
        let entry = self.get_mut(group).ok_or_else(|| ChooserError::UnknownGroup(group.into()))?;
        entry.members.retain(|member| !ids.contains(member));
        if entry.members.is_empty() {
            self.remove(group);
            return Ok(true);
        }
        Ok(false)
    }

    /// Drops `leaf` from whatever group references it. Returns the
    /// owning group's id, if there was one; the group may be gone
    /// afterwards.
    pub fn detach_member(&mut self, leaf: &str) -> Option<String> {
        let owner = self.group_of(leaf)?.id.clone();
        self.remove_member_inner(&owner, leaf);
        Some(owner)
    }

    fn remove_member_inner(&mut self, group: &str, leaf: &str) {
        if let Some(entry) = self.get_mut(group) {
            entry.members.retain(|member| member != leaf);
            if entry.members.is_empty() {
                self.remove(group);
            }
        }
    }

    /// Replaces the group's member order wholesale.
    pub fn reorder_members(&mut self, group: &str, order: Vec<String>) -> Result<(), ChooserError> {
        let entry = self.get_mut(group).ok_or_else(|| ChooserError::UnknownGroup(group.into()))?;
        debug_assert_eq!(
            {
                let mut sorted = order.clone();
                sorted.sort();
                sorted
            },
            {
                let mut sorted = entry.members.clone();
                sorted.sort();
                sorted
            },
            "reorder must permute the existing membership"
        );
        entry.members = order;
        Ok(())
    }

    /// Splices `source`'s members into `target` at `at` (default end),
    /// then deletes `source`.
    pub fn merge_into(
        &mut self,
        source: &str,
        target: &str,
        at: Option<usize>,
    ) -> Result<(), ChooserError> {
        if !self.contains(target) {
            return Err(ChooserError::UnknownGroup(target.into()));
        }
        let source_group =
            self.remove(source).ok_or_else(|| ChooserError::UnknownGroup(source.into()))?;
        self.add_members(target, &source_group.members, at)
    }

    pub fn set_selected(&mut self, group: &str, selected: bool) -> bool {
        if let Some(entry) = self.get_mut(group) {
            entry.selected = selected;
            true
        } else {
            false
        }
    }

    pub fn set_expanded(&mut self, group: &str, expanded: bool) -> bool {
        if let Some(entry) = self.get_mut(group) {
            entry.expanded = expanded;
            true
        } else {
            false
        }
    }

    pub fn select_all(&mut self, selected: bool) {
        for group in &mut self.groups {
            group.selected = selected;
        }
    }

    pub fn set_expanded_all(&mut self, expanded: bool) {
        for group in &mut self.groups {
            group.expanded = expanded;
        }
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.groups.iter().filter(|g| g.selected).map(|g| g.id.clone()).collect()
    }
}
