//! Component builder.
//!
//! Every component is created through a [`Builder`], which owns the set of
//! ids in use on the page and hands back a [`Component`] handle. Controllers
//! keep those handles instead of looking nodes up by selector.

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
};

use smallvec::SmallVec;
use thiserror::Error;

use crate::dom::{Dom, DomError, PropValue};

/// Errors raised while creating a component.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The requested id is empty, contains whitespace, or starts with a digit.
    #[error("invalid component id {0:?}")]
    InvalidId(String),

    /// Another live component already uses the id.
    #[error("component id {0:?} is already in use")]
    DuplicateId(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Construction options for [`Builder::create`].
pub struct ComponentOptions<D: Dom> {
    id: Option<String>,
    classes: SmallVec<[String; 4]>,
    text: Option<String>,
    attributes: Vec<(String, String)>,
    properties: Vec<(String, PropValue)>,
    children: Vec<Component<D>>,
}

impl<D: Dom> Default for ComponentOptions<D> {
    fn default() -> Self {
        Self {
            id: None,
            classes: SmallVec::new(),
            text: None,
            attributes: Vec::new(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl<D: Dom> Debug for ComponentOptions<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ComponentOptions")
            .field("id", &self.id)
            .field("classes", &self.classes)
            .field("text", &self.text)
            .field("attributes", &self.attributes)
            .field("properties", &self.properties)
            .field("children", &self.children.len())
            .finish()
    }
}

impl<D: Dom> ComponentOptions<D> {
    /// Empty options: generated id, no classes, no text, no children.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a caller supplied id instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add whitespace separated classes.
    #[must_use]
    pub fn classes(mut self, classes: &str) -> Self {
        self.classes
            .extend(classes.split_whitespace().map(str::to_string));
        self
    }

    /// Initial text content.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    /// Append a child, in order.
    #[must_use]
    pub fn child(mut self, child: &Component<D>) -> Self {
        self.children.push(child.clone());
        self
    }

    #[must_use]
    pub fn children<'a>(mut self, children: impl IntoIterator<Item = &'a Component<D>>) -> Self {
        self.children.extend(children.into_iter().cloned());
        self
    }
}

/// Allocates components and keeps their ids unique within the page.
pub struct Builder<D: Dom> {
    dom: Rc<D>,
    next_id: Cell<u64>,
    ids: RefCell<HashSet<String>>,
}

impl<D: Dom> Debug for Builder<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Builder")
            .field("next_id", &self.next_id.get())
            .field("ids", &self.ids.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Builder<D> {
    #[must_use]
    pub fn new(dom: Rc<D>) -> Self {
        Self {
            dom,
            next_id: Cell::new(1),
            ids: RefCell::new(HashSet::new()),
        }
    }

    /// The DOM backend.
    #[must_use]
    pub fn dom(&self) -> &Rc<D> {
        &self.dom
    }

    /// Create a component with a unique id.
    ///
    /// # Errors
    ///
    /// Returns an error when the supplied id is invalid or taken, or when
    /// the backend cannot create the element.
    pub fn create(&self, tag: &str, options: ComponentOptions<D>) -> Result<Component<D>, BuildError> {
        let id = match options.id {
            Some(id) => {
                validate_id(&id)?;

                if self.is_taken(&id) {
                    return Err(BuildError::DuplicateId(id));
                }

                id
            }
            None => self.generate_id(tag),
        };

        let node = self.dom.create_element(tag)?;

        self.dom.set_id(&node, &id);
        self.ids.borrow_mut().insert(id.clone());

        let component = Component {
            dom: Rc::clone(&self.dom),
            node,
            id: Some(Rc::from(id.as_str())),
        };

        for class in &options.classes {
            component.add_class(class);
        }

        if let Some(text) = &options.text {
            component.text(text);
        }

        for (name, value) in &options.attributes {
            component.attr(name, value);
        }

        for (name, value) in &options.properties {
            self.dom.set_property(&component.node, name, value);
        }

        for child in &options.children {
            component.append(child);
        }

        Ok(component)
    }

    /// Create an anonymous element, the counterpart of a bare `m("div")`.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend cannot create the element.
    pub fn element(&self, tag: &str) -> Result<Component<D>, BuildError> {
        let node = self.dom.create_element(tag)?;

        Ok(Component {
            dom: Rc::clone(&self.dom),
            node,
            id: None,
        })
    }

    /// Wrap an existing node in a mutation handle.
    #[must_use]
    pub fn wrap(&self, node: D::Node) -> Component<D> {
        Component {
            dom: Rc::clone(&self.dom),
            node,
            id: None,
        }
    }

    /// Find a live component by id.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Component<D>> {
        self.dom.element_by_id(id).map(|node| Component {
            dom: Rc::clone(&self.dom),
            node,
            id: Some(Rc::from(id)),
        })
    }

    /// Forget a component's id so it can be reused after the node is gone.
    pub fn release(&self, component: &Component<D>) {
        if let Some(id) = component.id() {
            self.ids.borrow_mut().remove(id);
        }
    }

    fn is_taken(&self, id: &str) -> bool {
        self.ids.borrow().contains(id) || self.dom.element_by_id(id).is_some()
    }

    fn generate_id(&self, tag: &str) -> String {
        loop {
            let n = self.next_id.get();
            self.next_id.set(n.saturating_add(1));

            let id = format!("{tag}-{n}");

            if !self.is_taken(&id) {
                return id;
            }
        }
    }
}

fn validate_id(id: &str) -> Result<(), BuildError> {
    let starts_with_digit = id.chars().next().is_some_and(|c| c.is_ascii_digit());

    if id.is_empty() || starts_with_digit || id.chars().any(char::is_whitespace) {
        return Err(BuildError::InvalidId(id.to_string()));
    }

    Ok(())
}

/// Mutation handle for one node.
///
/// Methods return `&Self` so calls chain the way a fluent DOM helper does.
pub struct Component<D: Dom> {
    dom: Rc<D>,
    node: D::Node,
    id: Option<Rc<str>>,
}

impl<D: Dom> Clone for Component<D> {
    fn clone(&self) -> Self {
        Self {
            dom: Rc::clone(&self.dom),
            node: self.node.clone(),
            id: self.id.clone(),
        }
    }
}

impl<D: Dom> Debug for Component<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("node", &self.node)
            .finish()
    }
}

impl<D: Dom> Component<D> {
    /// Id assigned at creation; `None` for anonymous or wrapped nodes.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The backend node.
    #[must_use]
    pub fn node(&self) -> &D::Node {
        &self.node
    }

    pub fn text(&self, text: &str) -> &Self {
        self.dom.set_text(&self.node, text);
        self
    }

    /// Add whitespace separated classes.
    pub fn add_class(&self, classes: &str) -> &Self {
        for class in classes.split_whitespace() {
            self.dom.add_class(&self.node, class);
        }
        self
    }

    pub fn attr(&self, name: &str, value: &str) -> &Self {
        self.dom.set_attribute(&self.node, name, value);
        self
    }

    pub fn prop(&self, name: &str, value: impl Into<PropValue>) -> &Self {
        self.dom.set_property(&self.node, name, &value.into());
        self
    }

    pub fn style(&self, name: &str, value: &str) -> &Self {
        self.dom.set_style(&self.node, name, value);
        self
    }

    /// Bind `handler` to `event`.
    ///
    /// Binding twice registers two listeners; callers bind once per load.
    pub fn on(&self, event: &str, handler: impl Fn() + 'static) -> &Self {
        self.dom.listen(&self.node, event, Rc::new(handler));
        self
    }

    pub fn show(&self) -> &Self {
        self.dom.set_visible(&self.node, true);
        self
    }

    pub fn hide(&self) -> &Self {
        self.dom.set_visible(&self.node, false);
        self
    }

    pub fn toggle(&self) -> &Self {
        let visible = self.dom.is_visible(&self.node);
        self.dom.set_visible(&self.node, !visible);
        self
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.dom.is_visible(&self.node)
    }

    pub fn append(&self, child: &Self) -> &Self {
        self.dom.append_child(&self.node, &child.node);
        self
    }

    pub fn append_all<'a>(&self, children: impl IntoIterator<Item = &'a Self>) -> &Self {
        for child in children {
            self.append(child);
        }
        self
    }

    pub fn prepend(&self, child: &Self) -> &Self {
        self.dom.prepend_child(&self.node, &child.node);
        self
    }

    pub fn remove_last_child(&self) -> &Self {
        self.dom.remove_last_child(&self.node);
        self
    }

    /// Remove every child.
    pub fn clear(&self) -> &Self {
        self.dom.clear_children(&self.node);
        self
    }

    /// Current form value.
    #[must_use]
    pub fn value(&self) -> String {
        self.dom.value(&self.node)
    }

    /// Current form value with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed_value(&self) -> String {
        self.value().trim().to_string()
    }

    pub fn set_value(&self, value: &str) -> &Self {
        self.dom.set_value(&self.node, value);
        self
    }

    pub fn focus(&self) -> &Self {
        self.dom.focus(&self.node);
        self
    }

    /// Make the control inert: form controls get `disabled`, anything else
    /// stops receiving pointer events.
    pub fn disable(&self) -> &Self {
        self.set_enabled(false)
    }

    /// Undo [`Component::disable`].
    pub fn enable(&self) -> &Self {
        self.set_enabled(true)
    }

    fn set_enabled(&self, enabled: bool) -> &Self {
        if self.is_form_control() {
            self.dom
                .set_property(&self.node, "disabled", &PropValue::Bool(!enabled));
        } else {
            self.dom.set_style(
                &self.node,
                "pointer-events",
                if enabled { "auto" } else { "none" },
            );
        }
        self
    }

    fn is_form_control(&self) -> bool {
        matches!(self.dom.tag_name(&self.node).as_str(), "BUTTON" | "INPUT")
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use testresult::TestResult;

    use super::*;
    use crate::dom::MemoryDom;

    fn builder() -> Builder<MemoryDom> {
        Builder::new(Rc::new(MemoryDom::new()))
    }

    #[test]
    fn create_applies_every_option() -> TestResult {
        let builder = builder();
        let child = builder.element("span")?;
        child.text("inner");

        let component = builder.create(
            "div",
            ComponentOptions::new()
                .id("panel")
                .classes("alert my-1")
                .attr("title", "hint")
                .prop("hidden", false)
                .child(&child),
        )?;

        let dom = builder.dom();

        assert_eq!(component.id(), Some("panel"));
        assert_eq!(dom.classes(component.node()), vec!["alert", "my-1"]);
        assert_eq!(dom.attribute(component.node(), "title").as_deref(), Some("hint"));
        assert_eq!(dom.text_content(component.node()), "inner");

        Ok(())
    }

    #[test]
    fn generated_ids_are_unique() -> TestResult {
        let builder = builder();

        let first = builder.create("button", ComponentOptions::new())?;
        let second = builder.create("button", ComponentOptions::new())?;

        assert_ne!(first.id(), second.id());

        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected() -> TestResult {
        let builder = builder();

        builder.create("div", ComponentOptions::new().id("submit"))?;
        let result = builder.create("div", ComponentOptions::new().id("submit"));

        assert!(matches!(result, Err(BuildError::DuplicateId(id)) if id == "submit"));

        Ok(())
    }

    #[test]
    fn released_ids_can_be_reused() -> TestResult {
        let builder = builder();

        let first = builder.create("div", ComponentOptions::new().id("item"))?;
        builder.release(&first);

        assert!(builder.create("div", ComponentOptions::new().id("item")).is_ok());

        Ok(())
    }

    #[test]
    fn invalid_ids_are_rejected() {
        let builder = builder();

        for id in ["", "2024", "has space"] {
            let result = builder.create("div", ComponentOptions::new().id(id));

            assert!(matches!(result, Err(BuildError::InvalidId(_))), "{id:?} accepted");
        }
    }

    #[test]
    fn lookup_finds_attached_component() -> TestResult {
        let builder = builder();
        let component = builder.create("div", ComponentOptions::new().id("list"))?;

        builder.dom().mount(component.node());

        let found = builder.lookup("list");

        assert!(found.is_some_and(|found| found.node() == component.node()));

        Ok(())
    }

    #[test]
    fn disable_uses_property_for_buttons_and_style_otherwise() -> TestResult {
        let builder = builder();
        let button = builder.create("button", ComponentOptions::new())?;
        let link = builder.create("a", ComponentOptions::new())?;
        let dom = builder.dom();

        button.disable();
        link.disable();

        assert!(dom.is_disabled(button.node()));
        assert!(dom.is_disabled(link.node()));
        assert_eq!(dom.style(link.node(), "pointer-events").as_deref(), Some("none"));

        button.enable();
        link.enable();

        assert!(!dom.is_disabled(button.node()));
        assert!(!dom.is_disabled(link.node()));

        Ok(())
    }

    #[test]
    fn toggle_flips_visibility() -> TestResult {
        let builder = builder();
        let component = builder.element("ul")?;

        component.hide();
        assert!(!component.is_visible());

        component.toggle();
        assert!(component.is_visible());

        Ok(())
    }

    #[test]
    fn on_registers_listener() -> TestResult {
        let builder = builder();
        let button = builder.create("button", ComponentOptions::new())?;
        let clicks = Rc::new(Cell::new(0));

        let counter = Rc::clone(&clicks);
        button.on("click", move || counter.set(counter.get() + 1));

        builder.dom().dispatch(button.node(), "click");
        builder.dom().dispatch(button.node(), "click");

        assert_eq!(clicks.get(), 2);

        Ok(())
    }
}
