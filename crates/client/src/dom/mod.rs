//! DOM seam and the component builder on top of it.

use std::{fmt::Debug, rc::Rc};

use thiserror::Error;

mod builder;
pub mod memory;

pub use builder::*;
pub use memory::MemoryDom;

/// Event callback registered through [`Dom::listen`].
pub type Listener = Rc<dyn Fn()>;

/// Errors raised by a [`Dom`] backend.
#[derive(Debug, Error)]
pub enum DomError {
    /// The backend refused to create an element.
    #[error("cannot create <{tag}>: {reason}")]
    Create { tag: String, reason: String },

    /// There is no document to work with.
    #[error("no document available")]
    NoDocument,
}

/// A DOM property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropValue {
    Bool(bool),
    Text(String),
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Primitive node operations a page needs.
///
/// Mutations are infallible: a backend that cannot apply one logs it and
/// moves on, no page ever aborts over a styling failure.
pub trait Dom: Debug + 'static {
    /// Backend node handle.
    type Node: Clone + Debug + 'static;

    /// Create a detached element.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the tag.
    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

    /// Look up a live element by id.
    fn element_by_id(&self, id: &str) -> Option<Self::Node>;

    /// Upper-case tag name, e.g. `BUTTON`.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn set_id(&self, node: &Self::Node, id: &str);

    /// Replace all children with a single text node.
    fn set_text(&self, node: &Self::Node, text: &str);

    fn add_class(&self, node: &Self::Node, class: &str);

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn set_property(&self, node: &Self::Node, name: &str, value: &PropValue);

    fn set_style(&self, node: &Self::Node, name: &str, value: &str);

    /// Show or hide the element without touching its other styles.
    fn set_visible(&self, node: &Self::Node, visible: bool);

    fn is_visible(&self, node: &Self::Node) -> bool;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);

    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node);

    /// Remove the last element child, if any.
    fn remove_last_child(&self, parent: &Self::Node);

    fn clear_children(&self, parent: &Self::Node);

    /// Current form value of an input-like element.
    fn value(&self, node: &Self::Node) -> String;

    fn set_value(&self, node: &Self::Node, value: &str);

    fn focus(&self, node: &Self::Node);

    /// Register `listener` for `event`.
    ///
    /// Backends must suppress the default action (form submission, link
    /// navigation) before calling the listener.
    fn listen(&self, node: &Self::Node, event: &str, listener: Listener);
}
