use slotmap::SlotMap;

use crate::common::collections::HashMap;
use crate::grid::CanonicalSchema;

slotmap::new_key_type! {
    /// Key of a node in a tree arena.
    pub struct NodeKey;
}

/// Leaf/group split of a node. A leaf is an actual column bound to a
/// data-source key; a group only ever contains other nodes, so the
/// "children XOR field" invariant holds by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Leaf { field: String },
    Group,
}

#[derive(Debug)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub kind: NodeKind,
    /// Tree-view expansion state. Irrelevant to correctness, persisted
    /// across operations.
    pub expanded: bool,
    /// Transient UI selection state.
    pub selected: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    pub fn field(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Leaf { field } => Some(field),
            NodeKind::Group => None,
        }
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }
}

/// Detached value-tree snapshot of a node.
///
/// Subtrees cross from one collection to the other as owned views, so the
/// source and destination arenas never alias a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeView {
    pub id: String,
    pub name: String,
    pub field: Option<String>,
    pub expanded: bool,
    pub selected: bool,
    pub children: Vec<NodeView>,
}

impl NodeView {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field: Some(field.into()),
            expanded: false,
            selected: false,
            children: Vec::new(),
        }
    }

    pub fn group(id: impl Into<String>, name: impl Into<String>, children: Vec<NodeView>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field: None,
            expanded: true,
            selected: false,
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.field.is_some()
    }

    /// Leaf ids under this view, document order.
    pub fn leaf_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaf_ids(&mut out);
        out
    }

    fn collect_leaf_ids(&self, out: &mut Vec<String>) {
        if self.is_leaf() {
            out.push(self.id.clone());
        }
        for child in &self.children {
            child.collect_leaf_ids(out);
        }
    }
}

/// Where to insert relative to existing siblings.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    End,
    Index(usize),
    Before(String),
    After(String),
}

/// Arena-backed ordered tree of columns.
///
/// Both panels use this structure: the available side with canonical group
/// nodes, the selected side with root-level leaves only. Nodes live in a
/// slotmap with an id index and explicit parent/children links, so find,
/// remove and insert are map operations rather than recursive rewrites.
#[derive(Default)]
pub struct ColumnTree {
    nodes: SlotMap<NodeKey, Node>,
    index: HashMap<String, NodeKey>,
    roots: Vec<NodeKey>,
}

impl ColumnTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, id: &str) -> Option<NodeKey> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.find(id).map(|key| &self.nodes[key])
    }

    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    pub fn root_ids(&self) -> Vec<String> {
        self.roots.iter().map(|&key| self.nodes[key].id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// All node keys in document (pre-)order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeKey> + '_ {
        let mut stack: Vec<NodeKey> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let key = stack.pop()?;
            stack.extend(self.nodes[key].children.iter().rev());
            Some(key)
        })
    }

    pub fn count_leaves(&self) -> usize {
        self.preorder().filter(|&key| self.nodes[key].is_leaf()).count()
    }

    /// Leaves only, document order.
    pub fn flatten_leaves(&self) -> Vec<NodeKey> {
        self.preorder().filter(|&key| self.nodes[key].is_leaf()).collect()
    }

    pub fn leaf_ids(&self) -> Vec<String> {
        self.flatten_leaves().into_iter().map(|key| self.nodes[key].id.clone()).collect()
    }

    /// Deep copy of the subtree at `key` as an owned value tree.
    pub fn snapshot(&self, key: NodeKey) -> NodeView {
        let node = &self.nodes[key];
        NodeView {
            id: node.id.clone(),
            name: node.name.clone(),
            field: node.field().map(str::to_string),
            expanded: node.expanded,
            selected: node.selected,
            children: node.children.iter().map(|&child| self.snapshot(child)).collect(),
        }
    }

    /// Detaches the node with `id` wherever it sits and returns its
    /// snapshot. Any group emptied by the detach is reaped, cascading up
    /// through its ancestors.
    pub fn remove(&mut self, id: &str) -> Option<NodeView> {
        let key = self.find(id)?;
        let view = self.snapshot(key);
        let mut parent = self.nodes[key].parent;
        self.unlink(key);
        self.dealloc_subtree(key);
        while let Some(group) = parent {
            let node = &self.nodes[group];
            if node.is_leaf() || !node.children.is_empty() {
                break;
            }
            parent = node.parent;
            self.unlink(group);
            self.dealloc_subtree(group);
        }
        Some(view)
    }

    /// Inserts `view` at the placement position.
    ///
    /// With `respect_groups` the canonical group path owning `view.id` is
    /// looked up and missing group nodes along it are created; without it
    /// the view lands at root level. Inserting an id already present is a
    /// no-op returning `false`, which makes duplicate drop events harmless.
    pub fn insert_at_position(
        &mut self,
        view: NodeView,
        canonical: &CanonicalSchema,
        placement: &Placement,
        respect_groups: bool,
    ) -> bool {
        if self.contains(&view.id) {
            return false;
        }
        let parent = if respect_groups {
            let path = canonical.group_path(&view.id).to_vec();
            self.ensure_group_chain(&path)
        } else {
            None
        };
        let key = self.alloc_view(view);
        let at = self.placement_index(parent, placement);
        self.attach(key, parent, at);
        true
    }

    /// Reorders root-level nodes: the named ids are spliced out and
    /// reinserted as a block at `at` (relative to the remaining roots).
    pub fn reorder_roots(&mut self, ids: &[String], at: usize) {
        let moving: Vec<NodeKey> = ids
            .iter()
            .filter_map(|id| self.find(id))
            .filter(|&key| self.nodes[key].parent.is_none())
            .collect();
        if moving.is_empty() {
            return;
        }
        self.roots.retain(|key| !moving.contains(key));
        let at = at.min(self.roots.len());
        for (offset, &key) in moving.iter().enumerate() {
            self.roots.insert(at + offset, key);
        }
    }

    /// Row ids in visible order: leaves only when `flat`, otherwise every
    /// node in document order descending only into expanded groups.
    pub fn visible_order(&self, flat: bool) -> Vec<String> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.push_visible(root, flat, &mut out);
        }
        out
    }

    fn push_visible(&self, key: NodeKey, flat: bool, out: &mut Vec<String>) {
        let node = &self.nodes[key];
        match node.kind {
            NodeKind::Leaf { .. } => out.push(node.id.clone()),
            NodeKind::Group => {
                if flat {
                    for &child in &node.children {
                        self.push_visible(child, flat, out);
                    }
                } else {
                    out.push(node.id.clone());
                    if node.expanded {
                        for &child in &node.children {
                            self.push_visible(child, flat, out);
                        }
                    }
                }
            }
        }
    }

    /// Keeps a leaf when the predicate holds. A group matching by itself
    /// keeps its whole subtree; a group kept only for surviving
    /// descendants keeps just those and comes back expanded to reveal
    /// them.
    pub fn filter<F>(&self, pred: &F) -> Vec<NodeView>
    where
        F: Fn(&Node) -> bool,
    {
        self.roots.iter().filter_map(|&root| self.filter_node(root, pred)).collect()
    }

    fn filter_node<F>(&self, key: NodeKey, pred: &F) -> Option<NodeView>
    where
        F: Fn(&Node) -> bool,
    {
        let node = &self.nodes[key];
        match node.kind {
            NodeKind::Leaf { .. } => pred(node).then(|| self.snapshot(key)),
            NodeKind::Group => {
                if pred(node) {
                    return Some(self.snapshot(key));
                }
                let kept: Vec<NodeView> =
                    node.children.iter().filter_map(|&child| self.filter_node(child, pred)).collect();
                if kept.is_empty() {
                    return None;
                }
                let mut view = self.snapshot(key);
                view.children = kept;
                view.expanded = true;
                Some(view)
            }
        }
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> bool {
        if let Some(key) = self.find(id) {
            self.nodes[key].expanded = expanded;
            true
        } else {
            false
        }
    }

    pub fn expand_all(&mut self) {
        self.set_expanded_all(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_expanded_all(false);
    }

    fn set_expanded_all(&mut self, expanded: bool) {
        for (_, node) in self.nodes.iter_mut() {
            if node.is_group() {
                node.expanded = expanded;
            }
        }
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) -> bool {
        if let Some(key) = self.find(id) {
            self.nodes[key].selected = selected;
            true
        } else {
            false
        }
    }

    /// Marks every node, groups and leaves uniformly.
    pub fn select_all(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.selected = true;
        }
    }

    pub fn clear_selection(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.selected = false;
        }
    }

    pub fn count_selected(&self) -> usize {
        self.nodes.iter().filter(|(_, node)| node.selected).count()
    }

    /// Selected row ids in document order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.preorder()
            .filter(|&key| self.nodes[key].selected)
            .map(|key| self.nodes[key].id.clone())
            .collect()
    }

    /// Renders the tree for diagnostics.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            ascii_tree::write_tree(&mut out, &self.ascii_node(root)).unwrap();
        }
        out
    }

    fn ascii_node(&self, key: NodeKey) -> ascii_tree::Tree {
        let node = &self.nodes[key];
        match &node.kind {
            NodeKind::Leaf { field } => {
                ascii_tree::Tree::Leaf(vec![format!("{} [{field}]", node.name)])
            }
            NodeKind::Group => ascii_tree::Tree::Node(
                node.name.clone(),
                node.children.iter().map(|&child| self.ascii_node(child)).collect(),
            ),
        }
    }

    fn alloc_view(&mut self, view: NodeView) -> NodeKey {
        let NodeView { id, name, field, expanded, selected, children } = view;
        let kind = match field {
            Some(field) => NodeKind::Leaf { field },
            None => NodeKind::Group,
        };
        let key = self.nodes.insert(Node {
            id: id.clone(),
            name,
            kind,
            expanded,
            selected,
            parent: None,
            children: Vec::new(),
        });
        self.index.insert(id, key);
        for child in children {
            debug_assert!(!self.contains(&child.id), "duplicate id grafted: {}", child.id);
            let child_key = self.alloc_view(child);
            self.nodes[child_key].parent = Some(key);
            self.nodes[key].children.push(child_key);
        }
        key
    }

    fn attach(&mut self, key: NodeKey, parent: Option<NodeKey>, at: usize) {
        self.nodes[key].parent = parent;
        let siblings = match parent {
            Some(group) => &mut self.nodes[group].children,
            None => &mut self.roots,
        };
        let at = at.min(siblings.len());
        siblings.insert(at, key);
    }

    fn unlink(&mut self, key: NodeKey) {
        let parent = self.nodes[key].parent.take();
        let siblings = match parent {
            Some(group) => &mut self.nodes[group].children,
            None => &mut self.roots,
        };
        siblings.retain(|&sibling| sibling != key);
    }

    fn dealloc_subtree(&mut self, key: NodeKey) {
        if let Some(node) = self.nodes.remove(key) {
            self.index.remove(&node.id);
            for child in node.children {
                self.dealloc_subtree(child);
            }
        }
    }

    /// Walks the canonical path, creating missing group nodes along it,
    /// and returns the deepest group. `None` for an empty path.
    fn ensure_group_chain(&mut self, path: &[String]) -> Option<NodeKey> {
        let mut parent = None;
        for depth in 1..=path.len() {
            let prefix = &path[..depth];
            let group_id = CanonicalSchema::group_id(prefix);
            let key = match self.find(&group_id) {
                Some(key) => key,
                None => {
                    let key =
                        self.alloc_view(NodeView::group(group_id, prefix[depth - 1].clone(), vec![]));
                    let at = self.placement_index(parent, &Placement::End);
                    self.attach(key, parent, at);
                    key
                }
            };
            parent = Some(key);
        }
        parent
    }

    fn placement_index(&self, parent: Option<NodeKey>, placement: &Placement) -> usize {
        let siblings = match parent {
            Some(group) => self.nodes[group].children.as_slice(),
            None => self.roots.as_slice(),
        };
        let position = |target: &str| {
            self.find(target).and_then(|key| siblings.iter().position(|&sibling| sibling == key))
        };
        match placement {
            Placement::End => siblings.len(),
            Placement::Index(at) => (*at).min(siblings.len()),
            Placement::Before(target) => position(target).unwrap_or(siblings.len()),
            Placement::After(target) => {
                position(target).map(|at| at + 1).unwrap_or(siblings.len())
            }
        }
    }
}
