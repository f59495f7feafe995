//! In-memory DOM.
//!
//! Backs headless use of the page controllers and every test in this crate.
//! Nodes live in a slot map; detaching a subtree through
//! [`Dom::clear_children`] or [`Dom::remove_last_child`] frees it, and
//! lookups by id only see nodes reachable from the document root, as in a
//! browser.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fmt::{Debug, Formatter, Result as FmtResult},
};

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::dom::{Dom, DomError, Listener, PropValue};

new_key_type! {
    /// Handle to a node in a [`MemoryDom`].
    pub struct NodeKey;
}

struct NodeData {
    tag: String,
    id: Option<String>,
    classes: SmallVec<[String; 4]>,
    attributes: BTreeMap<String, String>,
    properties: BTreeMap<String, PropValue>,
    styles: BTreeMap<String, String>,
    text: String,
    value: String,
    visible: bool,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    listeners: Vec<(String, Listener)>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_uppercase(),
            id: None,
            classes: SmallVec::new(),
            attributes: BTreeMap::new(),
            properties: BTreeMap::new(),
            styles: BTreeMap::new(),
            text: String::new(),
            value: String::new(),
            visible: true,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

/// Slot-map backed DOM.
pub struct MemoryDom {
    nodes: RefCell<SlotMap<NodeKey, NodeData>>,
    root: NodeKey,
    focused: RefCell<Option<NodeKey>>,
    refuse: Cell<bool>,
}

impl Debug for MemoryDom {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// An empty document with a `BODY` root.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new("body"));

        Self {
            nodes: RefCell::new(nodes),
            root,
            focused: RefCell::new(None),
            refuse: Cell::new(false),
        }
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> NodeKey {
        self.root
    }

    /// Attach `node` to the document root.
    pub fn mount(&self, node: &NodeKey) {
        self.append_child(&self.root, node);
    }

    /// While set, every [`Dom::create_element`] call fails.
    pub fn refuse_elements(&self, refuse: bool) {
        self.refuse.set(refuse);
    }

    /// Whether `node` still exists.
    #[must_use]
    pub fn contains(&self, node: &NodeKey) -> bool {
        self.nodes.borrow().contains_key(*node)
    }

    /// Text of the node and all its descendants, in document order.
    #[must_use]
    pub fn text_content(&self, node: &NodeKey) -> String {
        let nodes = self.nodes.borrow();
        let mut text = String::new();

        collect_text(&nodes, *node, &mut text);

        text
    }

    /// Child element keys, in order.
    #[must_use]
    pub fn children(&self, node: &NodeKey) -> Vec<NodeKey> {
        self.nodes
            .borrow()
            .get(*node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn classes(&self, node: &NodeKey) -> Vec<String> {
        self.nodes
            .borrow()
            .get(*node)
            .map(|data| data.classes.to_vec())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn attribute(&self, node: &NodeKey, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(*node)
            .and_then(|data| data.attributes.get(name).cloned())
    }

    #[must_use]
    pub fn property(&self, node: &NodeKey, name: &str) -> Option<PropValue> {
        self.nodes
            .borrow()
            .get(*node)
            .and_then(|data| data.properties.get(name).cloned())
    }

    #[must_use]
    pub fn style(&self, node: &NodeKey, name: &str) -> Option<String> {
        self.nodes
            .borrow()
            .get(*node)
            .and_then(|data| data.styles.get(name).cloned())
    }

    /// Whether the node is shown and so is every ancestor.
    #[must_use]
    pub fn is_rendered(&self, node: &NodeKey) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(*node);

        while let Some(key) = current {
            let Some(data) = nodes.get(key) else {
                return false;
            };

            if !data.visible {
                return false;
            }

            current = data.parent;
        }

        true
    }

    /// Whether the node is inert, either through `disabled` or
    /// `pointer-events: none`.
    #[must_use]
    pub fn is_disabled(&self, node: &NodeKey) -> bool {
        let nodes = self.nodes.borrow();

        nodes.get(*node).is_some_and(|data| {
            data.properties.get("disabled") == Some(&PropValue::Bool(true))
                || data.styles.get("pointer-events").map(String::as_str) == Some("none")
        })
    }

    /// The node that last received focus.
    #[must_use]
    pub fn focused(&self) -> Option<NodeKey> {
        *self.focused.borrow()
    }

    /// Descendants of `node` whose tag matches and whose own text equals
    /// `text`.
    #[must_use]
    pub fn find_by_text(&self, node: &NodeKey, tag: &str, text: &str) -> Vec<NodeKey> {
        let nodes = self.nodes.borrow();
        let tag = tag.to_ascii_uppercase();
        let mut found = Vec::new();
        let mut stack = vec![*node];

        while let Some(key) = stack.pop() {
            let Some(data) = nodes.get(key) else {
                continue;
            };

            if data.tag == tag && data.text == text {
                found.push(key);
            }

            stack.extend(data.children.iter().rev());
        }

        found
    }

    /// Fire every listener registered for `event` on `node`.
    ///
    /// Listeners run after the node borrow is released so they may mutate
    /// the document, including the node itself.
    pub fn dispatch(&self, node: &NodeKey, event: &str) {
        let listeners: Vec<Listener> = self
            .nodes
            .borrow()
            .get(*node)
            .map(|data| {
                data.listeners
                    .iter()
                    .filter(|(name, _)| name == event)
                    .map(|(_, listener)| Listener::clone(listener))
                    .collect()
            })
            .unwrap_or_default();

        for listener in listeners {
            listener();
        }
    }

    fn with_node(&self, node: &NodeKey, update: impl FnOnce(&mut NodeData)) {
        if let Some(data) = self.nodes.borrow_mut().get_mut(*node) {
            update(data);
        }
    }

    fn detach(nodes: &mut SlotMap<NodeKey, NodeData>, child: NodeKey) {
        let parent = nodes.get(child).and_then(|data| data.parent);

        if let Some(parent) = parent
            && let Some(data) = nodes.get_mut(parent)
        {
            data.children.retain(|key| *key != child);
        }

        if let Some(data) = nodes.get_mut(child) {
            data.parent = None;
        }
    }

    fn free(nodes: &mut SlotMap<NodeKey, NodeData>, node: NodeKey) {
        let mut stack = vec![node];

        while let Some(key) = stack.pop() {
            if let Some(data) = nodes.remove(key) {
                stack.extend(data.children);
            }
        }
    }
}

fn collect_text(nodes: &SlotMap<NodeKey, NodeData>, node: NodeKey, out: &mut String) {
    let Some(data) = nodes.get(node) else {
        return;
    };

    out.push_str(&data.text);

    for child in &data.children {
        collect_text(nodes, *child, out);
    }
}

impl Dom for MemoryDom {
    type Node = NodeKey;

    fn create_element(&self, tag: &str) -> Result<NodeKey, DomError> {
        if self.refuse.get() {
            return Err(DomError::Create {
                tag: tag.to_string(),
                reason: "element creation refused".to_string(),
            });
        }

        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomError::Create {
                tag: tag.to_string(),
                reason: "invalid tag name".to_string(),
            });
        }

        Ok(self.nodes.borrow_mut().insert(NodeData::new(tag)))
    }

    fn element_by_id(&self, id: &str) -> Option<NodeKey> {
        let nodes = self.nodes.borrow();
        let mut stack = vec![self.root];

        while let Some(key) = stack.pop() {
            let Some(data) = nodes.get(key) else {
                continue;
            };

            if data.id.as_deref() == Some(id) {
                return Some(key);
            }

            stack.extend(data.children.iter().rev());
        }

        None
    }

    fn tag_name(&self, node: &NodeKey) -> String {
        self.nodes
            .borrow()
            .get(*node)
            .map(|data| data.tag.clone())
            .unwrap_or_default()
    }

    fn set_id(&self, node: &NodeKey, id: &str) {
        self.with_node(node, |data| data.id = Some(id.to_string()));
    }

    fn set_text(&self, node: &NodeKey, text: &str) {
        self.clear_children(node);
        self.with_node(node, |data| data.text = text.to_string());
    }

    fn add_class(&self, node: &NodeKey, class: &str) {
        self.with_node(node, |data| {
            if !data.classes.iter().any(|existing| existing == class) {
                data.classes.push(class.to_string());
            }
        });
    }

    fn set_attribute(&self, node: &NodeKey, name: &str, value: &str) {
        self.with_node(node, |data| {
            data.attributes.insert(name.to_string(), value.to_string());
        });
    }

    fn set_property(&self, node: &NodeKey, name: &str, value: &PropValue) {
        self.with_node(node, |data| {
            if name == "value"
                && let PropValue::Text(text) = value
            {
                data.value.clone_from(text);
            }

            data.properties.insert(name.to_string(), value.clone());
        });
    }

    fn set_style(&self, node: &NodeKey, name: &str, value: &str) {
        self.with_node(node, |data| {
            data.styles.insert(name.to_string(), value.to_string());
        });
    }

    fn set_visible(&self, node: &NodeKey, visible: bool) {
        self.with_node(node, |data| data.visible = visible);
    }

    fn is_visible(&self, node: &NodeKey) -> bool {
        self.nodes
            .borrow()
            .get(*node)
            .is_some_and(|data| data.visible)
    }

    fn append_child(&self, parent: &NodeKey, child: &NodeKey) {
        let mut nodes = self.nodes.borrow_mut();

        if !nodes.contains_key(*parent) || !nodes.contains_key(*child) {
            return;
        }

        Self::detach(&mut nodes, *child);

        if let Some(data) = nodes.get_mut(*parent) {
            data.children.push(*child);
        }

        if let Some(data) = nodes.get_mut(*child) {
            data.parent = Some(*parent);
        }
    }

    fn prepend_child(&self, parent: &NodeKey, child: &NodeKey) {
        let mut nodes = self.nodes.borrow_mut();

        if !nodes.contains_key(*parent) || !nodes.contains_key(*child) {
            return;
        }

        Self::detach(&mut nodes, *child);

        if let Some(data) = nodes.get_mut(*parent) {
            data.children.insert(0, *child);
        }

        if let Some(data) = nodes.get_mut(*child) {
            data.parent = Some(*parent);
        }
    }

    fn remove_last_child(&self, parent: &NodeKey) {
        let mut nodes = self.nodes.borrow_mut();

        let last = nodes
            .get_mut(*parent)
            .and_then(|data| data.children.pop());

        if let Some(last) = last {
            Self::free(&mut nodes, last);
        }
    }

    fn clear_children(&self, parent: &NodeKey) {
        let mut nodes = self.nodes.borrow_mut();

        let children = nodes
            .get_mut(*parent)
            .map(|data| {
                data.text.clear();
                std::mem::take(&mut data.children)
            })
            .unwrap_or_default();

        for child in children {
            Self::free(&mut nodes, child);
        }
    }

    fn value(&self, node: &NodeKey) -> String {
        self.nodes
            .borrow()
            .get(*node)
            .map(|data| data.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, node: &NodeKey, value: &str) {
        self.with_node(node, |data| data.value = value.to_string());
    }

    fn focus(&self, node: &NodeKey) {
        if self.contains(node) {
            *self.focused.borrow_mut() = Some(*node);
        }
    }

    fn listen(&self, node: &NodeKey, event: &str, listener: Listener) {
        self.with_node(node, |data| {
            data.listeners.push((event.to_string(), listener));
        });
    }
}
