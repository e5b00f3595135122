//! The entity registry: an arena tree of display nodes keyed by entity
//! id. Nodes hold child links only, so parent lookups walk the tree.

use crate::config::EntityConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub entity_id: String,
    pub nickname: String,
}

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub label: String,
    pub entity: Option<EntityRef>,
    pub expanded: bool,
    pub selectable: bool,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRow {
    pub id: NodeId,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct EntityTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl EntityTree {
    /// One leaf per configured entity under a single hub group node;
    /// labels start as the bare nickname with no state suffix.
    pub fn build(entities: &[EntityConfig]) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        let root = tree.push(TreeNode {
            label: ".".to_string(),
            entity: None,
            expanded: true,
            selectable: false,
            children: Vec::new(),
        });
        tree.root = root;

        let group = tree.add_child(root, "home-assistant");
        for entity in entities {
            let leaf = tree.add_child(group, &entity.id);
            tree.nodes[leaf.0].entity = Some(EntityRef {
                entity_id: entity.entity_id.clone(),
                nickname: entity.id.clone(),
            });
        }
        tree
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_child(&mut self, parent: NodeId, label: &str) -> NodeId {
        let id = self.push(TreeNode {
            label: label.to_string(),
            entity: None,
            expanded: true,
            selectable: true,
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    pub fn entity_id(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0]
            .entity
            .as_ref()
            .map(|entity| entity.entity_id.as_str())
    }

    /// The initial selection: the first node below the hidden root.
    pub fn first_selectable(&self) -> NodeId {
        self.nodes[self.root.0]
            .children
            .first()
            .copied()
            .unwrap_or(self.root)
    }

    /// Relabels the first node matching `entity_id` as
    /// `<nickname> == <new_state>`. No match is a silent no-op.
    pub fn apply_state_changed(&mut self, entity_id: &str, new_state: &str) -> bool {
        for node in &mut self.nodes {
            if let Some(entity) = &node.entity {
                if entity.entity_id == entity_id {
                    node.label = format!("{} == {}", entity.nickname, new_state);
                    return true;
                }
            }
        }
        false
    }

    /// Same label update over a full-refresh batch; returns how many
    /// nodes changed.
    pub fn apply_states_result<'a>(
        &mut self,
        states: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> usize {
        states
            .into_iter()
            .filter(|(entity_id, state)| self.apply_state_changed(entity_id, state))
            .count()
    }

    /// Depth-first walk from `root` for the node whose immediate
    /// children contain `node`. `None` for the root itself and for
    /// nodes not reachable from `root`.
    pub fn find_parent(&self, node: NodeId, root: NodeId) -> Option<NodeId> {
        if node == root {
            return None;
        }
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if self.nodes[current.0].children.contains(&node) {
                return Some(current);
            }
            for child in self.nodes[current.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        None
    }

    /// Preorder flattening of the expanded tree. The root itself is
    /// hidden; its children are the top level.
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for child in &self.nodes[self.root.0].children {
            self.flatten(*child, 0, &mut rows);
        }
        rows
    }

    fn flatten(&self, id: NodeId, depth: usize, rows: &mut Vec<TreeRow>) {
        rows.push(TreeRow { id, depth });
        if self.nodes[id.0].expanded {
            for child in &self.nodes[id.0].children {
                self.flatten(*child, depth + 1, rows);
            }
        }
    }

    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visible_rows().iter().any(|row| row.id == id)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) {
        self.nodes[id.0].expanded = expanded;
    }

    pub fn expand_all(&mut self) {
        for node in &mut self.nodes {
            node.expanded = true;
        }
    }

    pub fn collapse_all_except_root(&mut self) {
        let root = self.root;
        for (index, node) in self.nodes.iter_mut().enumerate() {
            node.expanded = index == root.0;
        }
    }

    fn nearest_visible(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while !self.is_visible(current) {
            match self.find_parent(current, self.root) {
                Some(parent) if parent != self.root => current = parent,
                _ => return self.first_selectable(),
            }
        }
        current
    }

    /// Moves the selection through the visible rows, clamped at both
    /// ends.
    pub fn move_selection(&self, selection: NodeId, delta: isize) -> NodeId {
        let rows = self.visible_rows();
        if rows.is_empty() {
            return selection;
        }
        let current = rows
            .iter()
            .position(|row| row.id == selection)
            .unwrap_or(0);
        let next = current.saturating_add_signed(delta).min(rows.len() - 1);
        rows[next].id
    }

    /// Direction keys over the tree: `H` collapses everything except
    /// the root, `L` expands everything, `l` expands the selection,
    /// and `h` collapses an expanded branch or else climbs to the
    /// parent (top-level nodes stay put).
    pub fn vi_navigate(&mut self, selection: NodeId, key: char) -> NodeId {
        match key {
            'H' => {
                self.collapse_all_except_root();
                self.nearest_visible(selection)
            }
            'L' => {
                self.expand_all();
                selection
            }
            'h' => {
                if self.nodes[selection.0].expanded && self.has_children(selection) {
                    self.nodes[selection.0].expanded = false;
                    selection
                } else {
                    match self.find_parent(selection, self.root) {
                        Some(parent) if parent != self.root => parent,
                        _ => selection,
                    }
                }
            }
            'l' => {
                if self.has_children(selection) {
                    self.nodes[selection.0].expanded = true;
                }
                selection
            }
            _ => selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, entity_id: &str) -> EntityConfig {
        EntityConfig {
            id: id.to_string(),
            entity_id: entity_id.to_string(),
        }
    }

    fn sample_tree() -> EntityTree {
        EntityTree::build(&[
            entity("kitchen light", "light.kitchen"),
            entity("desk switch", "switch.desk"),
        ])
    }

    fn labels(tree: &EntityTree) -> Vec<String> {
        tree.visible_rows()
            .iter()
            .map(|row| tree.node(row.id).label.clone())
            .collect()
    }

    #[test]
    fn build_places_entities_under_the_hub_group() {
        let tree = sample_tree();
        assert_eq!(
            labels(&tree),
            vec!["home-assistant", "kitchen light", "desk switch"]
        );
        let rows = tree.visible_rows();
        assert_eq!(rows[0].depth, 0);
        assert_eq!(rows[1].depth, 1);
        assert!(!tree.node(tree.root()).selectable);
    }

    #[test]
    fn state_changed_updates_exactly_the_matching_node() {
        let mut tree = sample_tree();
        assert!(tree.apply_state_changed("switch.desk", "on"));
        assert_eq!(
            labels(&tree),
            vec!["home-assistant", "kitchen light", "desk switch == on"]
        );
    }

    #[test]
    fn unknown_entity_is_a_silent_no_op() {
        let mut tree = sample_tree();
        assert!(!tree.apply_state_changed("light.cellar", "on"));
        assert_eq!(
            labels(&tree),
            vec!["home-assistant", "kitchen light", "desk switch"]
        );
    }

    #[test]
    fn duplicate_entity_ids_update_the_first_match() {
        let mut tree = EntityTree::build(&[
            entity("first", "switch.twin"),
            entity("second", "switch.twin"),
        ]);
        tree.apply_state_changed("switch.twin", "on");
        assert_eq!(labels(&tree), vec!["home-assistant", "first == on", "second"]);
    }

    #[test]
    fn states_result_refreshes_the_whole_batch() {
        let mut tree = sample_tree();
        let updated = tree.apply_states_result(vec![
            ("light.kitchen", "off"),
            ("switch.desk", "on"),
            ("sensor.unknown", "7"),
        ]);
        assert_eq!(updated, 2);
        assert_eq!(
            labels(&tree),
            vec!["home-assistant", "kitchen light == off", "desk switch == on"]
        );
    }

    #[test]
    fn find_parent_is_none_for_the_root() {
        let tree = sample_tree();
        assert_eq!(tree.find_parent(tree.root(), tree.root()), None);
    }

    #[test]
    fn find_parent_walks_arbitrary_shapes() {
        let mut tree = sample_tree();
        let group = tree.first_selectable();
        let nested = tree.add_child(group, "cellar");
        let deep = tree.add_child(nested, "freezer");

        assert_eq!(tree.find_parent(group, tree.root()), Some(tree.root()));
        assert_eq!(tree.find_parent(nested, tree.root()), Some(group));
        assert_eq!(tree.find_parent(deep, tree.root()), Some(nested));
        // a subtree walk cannot see nodes above it.
        assert_eq!(tree.find_parent(group, nested), None);
    }

    #[test]
    fn h_collapses_an_expanded_branch_then_climbs() {
        let mut tree = sample_tree();
        let group = tree.first_selectable();
        let leaf = tree.children(group)[0];

        // leaf has no children: h climbs to the group node.
        assert_eq!(tree.vi_navigate(leaf, 'h'), group);
        // the group is expanded with children: h collapses it in place.
        assert_eq!(tree.vi_navigate(group, 'h'), group);
        assert!(!tree.node(group).expanded);
        // top-level node with nothing left to collapse: no-op.
        assert_eq!(tree.vi_navigate(group, 'h'), group);
    }

    #[test]
    fn collapse_all_moves_a_hidden_selection_up() {
        let mut tree = sample_tree();
        let group = tree.first_selectable();
        let leaf = tree.children(group)[1];

        let selection = tree.vi_navigate(leaf, 'H');
        assert_eq!(selection, group);
        assert_eq!(labels(&tree), vec!["home-assistant"]);

        let selection = tree.vi_navigate(selection, 'L');
        assert_eq!(selection, group);
        assert_eq!(labels(&tree).len(), 3);
    }

    #[test]
    fn l_expands_the_current_branch_only() {
        let mut tree = sample_tree();
        let group = tree.first_selectable();
        tree.set_expanded(group, false);
        assert_eq!(labels(&tree), vec!["home-assistant"]);

        tree.vi_navigate(group, 'l');
        assert_eq!(labels(&tree).len(), 3);
    }

    #[test]
    fn selection_moves_through_visible_rows_and_clamps() {
        let tree = sample_tree();
        let rows = tree.visible_rows();

        let mut selection = tree.first_selectable();
        selection = tree.move_selection(selection, 1);
        assert_eq!(selection, rows[1].id);
        selection = tree.move_selection(selection, 10);
        assert_eq!(selection, rows[2].id);
        selection = tree.move_selection(selection, -10);
        assert_eq!(selection, rows[0].id);
    }
}
