//! The document tree - an arena of nodes linked by parent and child handles

use crate::{CoreError, NodeId, NodeKind, NodeType, Paragraph, Result, Tag};

/// A node in the document tree
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// A change notification: the node whose children or attributes changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
    pub tag: Tag,
}

/// Arena-backed document tree
///
/// Every structural edit and every attribute write through [`Document::kind_mut`]
/// is appended to a mutation log, drained with [`Document::take_mutations`].
#[derive(Debug, Clone)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    mutations: Vec<Mutation>,
}

impl Document {
    /// Create a document holding only the root
    pub fn new() -> Self {
        let root_node = Node {
            kind: NodeKind::Root,
            parent: None,
            children: Vec::new(),
        };
        Self {
            slots: vec![Slot {
                generation: 0,
                node: Some(root_node),
            }],
            free: Vec::new(),
            root: NodeId::new(0, 0),
            mutations: Vec::new(),
        }
    }

    /// Create a document holding a single empty paragraph
    pub fn with_empty_paragraph() -> Self {
        let mut doc = Self::new();
        let paragraph = doc.create(NodeKind::Paragraph(Paragraph::default()));
        let root = doc.root;
        doc.attach(root, paragraph, None);
        doc.mutations.clear();
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.get(self.root)
            .map(|root| root.children.is_empty())
            .unwrap_or(true)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(CoreError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(CoreError::NodeNotFound(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.get(id)?.kind)
    }

    /// Mutable access to a node's kind; recorded as an attribute mutation
    pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind> {
        let tag = self.get(id)?.kind.tag();
        self.mutations.push(Mutation { target: id, tag });
        Ok(&mut self.node_mut(id)?.kind)
    }

    pub fn node_type(&self, id: NodeId) -> Result<NodeType> {
        Ok(self.get(id)?.node_type())
    }

    /// Fail unless `id` is a node of type `expected`
    pub fn expect_type(&self, id: NodeId, expected: NodeType) -> Result<()> {
        let actual = self.node_type(id)?;
        if actual == expected {
            Ok(())
        } else {
            Err(CoreError::UnexpectedType {
                node: id,
                expected,
                actual,
            })
        }
    }

    /// Create a detached node
    pub fn create(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId::new(index, 0)
            }
        }
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(id)?.children)
    }

    /// Append `child` as the last child of `parent`, detaching it first
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference`, or last when `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(CoreError::RootRemoval);
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(CoreError::WouldCycle { child, parent });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.get(reference)?.parent != Some(parent) {
                return Err(CoreError::NotAChild {
                    node: reference,
                    parent,
                });
            }
        }
        self.detach(child)?;
        self.attach(parent, child, reference);
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let tag = match self.get(parent) {
            Ok(node) => node.kind.tag(),
            Err(_) => return,
        };
        if let Ok(parent_node) = self.node_mut(parent) {
            let position = reference
                .and_then(|r| parent_node.children.iter().position(|c| *c == r))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(position, child);
        }
        if let Ok(child_node) = self.node_mut(child) {
            child_node.parent = Some(parent);
        }
        self.mutations.push(Mutation { target: parent, tag });
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, id: NodeId) -> Result<bool> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == candidate {
                return Ok(true);
            }
            current = self.get(node)?.parent;
        }
        Ok(false)
    }

    /// Unlink a node from its parent, keeping its subtree alive
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(CoreError::RootRemoval);
        }
        let Some(parent) = self.get(id)?.parent else {
            return Ok(());
        };
        let tag = self.get(parent)?.kind.tag();
        let parent_node = self.node_mut(parent)?;
        parent_node.children.retain(|c| *c != id);
        self.node_mut(id)?.parent = None;
        self.mutations.push(Mutation { target: parent, tag });
        Ok(())
    }

    /// Detach a node and free it together with its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index()];
            if let Some(node) = slot.node.take() {
                stack.extend(node.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index() as u32);
            }
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`, preserving order
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let children = self.children(from)?.to_vec();
        for child in children {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    pub fn index_in_parent(&self, id: NodeId) -> Result<Option<usize>> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(None);
        };
        Ok(self.children(parent)?.iter().position(|c| *c == id))
    }

    pub fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.sibling(id, 1)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.sibling(id, -1)
    }

    fn sibling(&self, id: NodeId, offset: isize) -> Result<Option<NodeId>> {
        let Some(parent) = self.get(id)?.parent else {
            return Ok(None);
        };
        let siblings = self.children(parent)?;
        let Some(index) = siblings.iter().position(|c| *c == id) else {
            return Ok(None);
        };
        let target = index as isize + offset;
        if target < 0 {
            return Ok(None);
        }
        Ok(siblings.get(target as usize).copied())
    }

    /// All descendants of `id` in pre-order, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id)?.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current)?.iter().rev().copied());
        }
        Ok(out)
    }

    pub fn descendants_of_type(&self, id: NodeId, node_type: NodeType) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for node in self.descendants(id)? {
            if self.node_type(node)? == node_type {
                out.push(node);
            }
        }
        Ok(out)
    }

    pub fn children_of_type(&self, id: NodeId, node_type: NodeType) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for child in self.children(id)? {
            if self.node_type(*child)? == node_type {
                out.push(*child);
            }
        }
        Ok(out)
    }

    pub fn first_child_of_type(&self, id: NodeId, node_type: NodeType) -> Result<Option<NodeId>> {
        for child in self.children(id)? {
            if self.node_type(*child)? == node_type {
                return Ok(Some(*child));
            }
        }
        Ok(None)
    }

    /// Nearest ancestor of the given type, `id` itself included
    pub fn ancestor_of_type(&self, id: NodeId, node_type: NodeType) -> Result<Option<NodeId>> {
        let mut current = Some(id);
        while let Some(node) = current {
            let entry = self.get(node)?;
            if entry.node_type() == node_type {
                return Ok(Some(node));
            }
            current = entry.parent;
        }
        Ok(None)
    }

    /// Like [`Document::ancestor_of_type`], but a missing ancestor is an error
    pub fn find_ancestor(&self, id: NodeId, node_type: NodeType) -> Result<NodeId> {
        self.ancestor_of_type(id, node_type)?
            .ok_or(CoreError::MissingAncestor {
                node: id,
                node_type: self.node_type(id)?,
                expected: node_type,
            })
    }

    /// Whether some ancestor of `id` (itself included) satisfies `predicate`
    pub fn has_ancestor(&self, id: NodeId, predicate: impl Fn(NodeType) -> bool) -> Result<bool> {
        let mut current = Some(id);
        while let Some(node) = current {
            let entry = self.get(node)?;
            if predicate(entry.node_type()) {
                return Ok(true);
            }
            current = entry.parent;
        }
        Ok(false)
    }

    /// Drain the mutation log
    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    pub fn has_pending_mutations(&self) -> bool {
        !self.mutations.is_empty()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::with_empty_paragraph()
    }
}
