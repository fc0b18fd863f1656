use crate::types::{Element, NodeData, NodeId, NodeSlot};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} is not an element")]
    NotAnElement(NodeId),
    #[error("node {0:?} has no parent")]
    Detached(NodeId),
    #[error("node {0:?} cannot have children")]
    CannotHaveChildren(NodeId),
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("{reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("document has no body")]
    NoBody,
    #[error("a document node cannot be imported")]
    ImportDocument,
    #[error("node {0:?} was released or belongs to another document")]
    Stale(NodeId),
}

pub type DomResult<T> = Result<T, DomError>;

/// What a stale or foreign `NodeId` reads as: a detached, empty node.
static RELEASED: NodeData = NodeData::Comment(String::new());

/// Arena-backed mutable document tree.
///
/// Nodes detached by `remove`, `clear_children` or `replace_with` stay readable until
/// `sweep_detached` (or `release`) frees them. Freed slots are reused; handles to them go stale
/// and read as detached empty nodes, so queries never panic on an old or foreign `NodeId`.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeSlot>,
    free: Vec<u32>,
    orphans: Vec<NodeId>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeSlot {
                generation: 0,
                parent: None,
                children: Vec::new(),
                data: NodeData::Document { doctype: None },
            }],
            free: Vec::new(),
            orphans: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0, 0)
    }

    /// Live nodes, the document node included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.nodes
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.nodes
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
    }

    /// Whether `id` names a live node of this arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        self.slot(id).map_or(&RELEASED, |slot| &slot.data)
    }

    pub fn set_doctype(&mut self, value: Option<String>) {
        let root = self.root();
        if let Some(NodeSlot {
            data: NodeData::Document { doctype },
            ..
        }) = self.slot_mut(root)
        {
            *doctype = value;
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        match self.data(self.root()) {
            NodeData::Document { doctype } => doctype.as_deref(),
            _ => None,
        }
    }

    // -- Construction ---
    fn push(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.nodes[index as usize];
            slot.data = data;
            return NodeId::new(index, slot.generation);
        }
        let index = self.nodes.len() as u32;
        self.nodes.push(NodeSlot {
            generation: 0,
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId::new(index, 0)
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Comment(text.into()))
    }

    /// Deep-copy `node` out of `source` into this arena as a detached subtree.
    pub fn import(&mut self, source: &Dom, node: NodeId) -> DomResult<NodeId> {
        if !source.contains(node) {
            return Err(DomError::Stale(node));
        }
        let data = match source.data(node) {
            NodeData::Document { .. } => return Err(DomError::ImportDocument),
            other => other.clone(),
        };
        let copy = self.push(data);
        let mut stack: Vec<(NodeId, NodeId)> = source
            .children(node)
            .iter()
            .rev()
            .map(|&child| (child, copy))
            .collect();
        while let Some((src, parent)) = stack.pop() {
            let id = self.push(source.data(src).clone());
            self.link(parent, id, None);
            for &child in source.children(src).iter().rev() {
                stack.push((child, id));
            }
        }
        Ok(copy)
    }

    /// Detached copies of every child of `parent` in `source`, in order.
    pub fn import_children(&mut self, source: &Dom, parent: NodeId) -> Vec<NodeId> {
        source
            .children(parent)
            .iter()
            .filter_map(|&child| self.import(source, child).ok())
            .collect()
    }

    // -- Queries ---
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.data(id) {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.slot_mut(id)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    pub fn is_element_named(&self, id: NodeId, tag: &str) -> bool {
        self.element(id).is_some_and(|e| e.is(tag))
    }

    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(key))
    }

    pub fn has_attr(&self, id: NodeId, key: &str) -> bool {
        self.element(id).is_some_and(|e| e.has_attr(key))
    }

    pub fn set_attr(&mut self, id: NodeId, key: &str, value: &str) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        element.set_attr(key, value);
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.slot(id) {
            Some(slot) => &slot.children,
            None => &[],
        }
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == self.root() {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Pre-order walk of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            stack: vec![id],
        }
    }

    /// First connected element whose `id` attribute equals `value`, in tree order.
    pub fn get_element_by_id(&self, value: &str) -> Option<NodeId> {
        if value.is_empty() {
            return None;
        }
        self.descendants(self.root())
            .find(|&n| self.attr(n, "id") == Some(value))
    }

    /// `id` itself or its nearest ancestor element with the given tag.
    pub fn closest(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_element_named(current, tag) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    pub fn find_first(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(from)
            .find(|&n| self.is_element_named(n, tag))
    }

    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&n| self.element(n).is_some())
    }

    pub fn head(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|&n| self.is_element_named(n, "head"))
    }

    pub fn body(&self) -> Option<NodeId> {
        let html = self.document_element()?;
        self.children(html)
            .iter()
            .copied()
            .find(|&n| self.is_element_named(n, "body"))
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for n in self.descendants(id) {
            if let NodeData::Text(text) = self.data(n) {
                out.push_str(text);
            }
        }
        out
    }

    /// Replace all children of `id` with a single text node (or nothing for "").
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> DomResult<()> {
        self.clear_children(id)?;
        if !text.is_empty() {
            let child = self.create_text(text);
            self.append_child(id, child)?;
        }
        Ok(())
    }

    // -- Class list ---
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|e| e.attr_has_token("class", class))
    }

    pub fn add_classes(&mut self, id: NodeId, classes: &[&str]) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let mut tokens: Vec<String> = element
            .attr("class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .map(str::to_string)
            .collect();
        for class in classes {
            if !tokens.iter().any(|t| t == class) {
                tokens.push((*class).to_string());
            }
        }
        element.set_attr("class", &tokens.join(" "));
        Ok(())
    }

    pub fn remove_classes(&mut self, id: NodeId, classes: &[&str]) -> DomResult<()> {
        let element = self.element_mut(id).ok_or(DomError::NotAnElement(id))?;
        let tokens: Vec<&str> = element
            .attr("class")
            .unwrap_or("")
            .split_ascii_whitespace()
            .filter(|t| !classes.contains(t))
            .collect();
        let joined = tokens.join(" ");
        element.set_attr("class", &joined);
        Ok(())
    }

    // -- Mutation ---
    fn can_have_children(&self, id: NodeId) -> bool {
        matches!(
            self.data(id),
            NodeData::Document { .. } | NodeData::Element(_)
        )
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.contains(child) {
            return Err(DomError::Stale(child));
        }
        if !self.can_have_children(parent) {
            return Err(DomError::CannotHaveChildren(parent));
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(DomError::Cycle { parent, child });
            }
            cursor = self.parent(node);
        }
        Ok(())
    }

    /// Point `child` at `parent` and put it in `parent`'s children at `index` (or last).
    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
        if let Some(slot) = self.slot_mut(parent) {
            match index {
                Some(index) => slot.children.insert(index, child),
                None => slot.children.push(child),
            }
        }
    }

    /// Returns whether `child` had a parent.
    fn unlink(&mut self, child: NodeId) -> bool {
        let Some(old) = self.parent(child) else {
            return false;
        };
        if let Some(slot) = self.slot_mut(old) {
            slot.children.retain(|&c| c != child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = None;
        }
        true
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        self.link(parent, child, None);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> DomResult<()> {
        if child == reference {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        if self.parent(reference) != Some(parent) {
            return Err(DomError::NotAChild { parent, reference });
        }
        self.unlink(child);
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == reference)
            .ok_or(DomError::NotAChild { parent, reference })?;
        self.link(parent, child, Some(index));
        Ok(())
    }

    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        match self.children(parent).first().copied() {
            Some(first) => self.insert_before(parent, child, first),
            None => self.append_child(parent, child),
        }
    }

    /// Detach `id` from its parent. Detaching an already detached node is a no-op.
    pub fn remove(&mut self, id: NodeId) {
        if self.unlink(id) {
            self.orphans.push(id);
        }
    }

    pub fn clear_children(&mut self, id: NodeId) -> DomResult<()> {
        if !self.can_have_children(id) {
            return Err(DomError::CannotHaveChildren(id));
        }
        let old = match self.slot_mut(id) {
            Some(slot) => std::mem::take(&mut slot.children),
            None => Vec::new(),
        };
        for child in old {
            if let Some(slot) = self.slot_mut(child) {
                slot.parent = None;
            }
            self.orphans.push(child);
        }
        Ok(())
    }

    /// Put `replacements` where `target` is, in order, and detach `target`.
    pub fn replace_with(&mut self, target: NodeId, replacements: &[NodeId]) -> DomResult<()> {
        let parent = self.parent(target).ok_or(DomError::Detached(target))?;
        for &node in replacements {
            self.insert_before(parent, node, target)?;
        }
        self.remove(target);
        Ok(())
    }

    // -- Reclamation ---
    /// Free `id` and everything below it, making every handle into the subtree stale. Only
    /// detached subtree roots are released. Returns how many nodes were freed.
    pub fn release(&mut self, id: NodeId) -> usize {
        if id == self.root() || !self.contains(id) || self.parent(id).is_some() {
            return 0;
        }
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(slot) = self.slot_mut(node) else {
                continue;
            };
            stack.extend(std::mem::take(&mut slot.children));
            slot.parent = None;
            slot.data = NodeData::Comment(String::new());
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(node.index() as u32);
            freed += 1;
        }
        freed
    }

    /// Release every subtree that `remove`, `clear_children` or `replace_with` detached and
    /// that has not been attached again since.
    pub fn sweep_detached(&mut self) -> usize {
        let orphans = std::mem::take(&mut self.orphans);
        orphans.into_iter().map(|id| self.release(id)).sum()
    }
}

pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(id).iter().rev().copied());
        Some(id)
    }
}
