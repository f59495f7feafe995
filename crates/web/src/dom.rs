//! [`Dom`] backend over the browser document.

use tracing::warn;
use txt_client::dom::{Dom, DomError, Listener, PropValue};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{Document, Element, Event, HtmlElement};

/// The live browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
}

impl WebDom {
    /// Bind to the current window's document.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NoDocument`] outside a browser window.
    pub fn new() -> Result<Self, DomError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or(DomError::NoDocument)?;

        Ok(Self { document })
    }
}

/// Best-effort text for a thrown JS value.
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|error| String::from(error.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn report(operation: &str, result: Result<(), JsValue>) {
    if let Err(error) = result {
        warn!(target: "txt::dom", "{operation} failed: {}", js_message(&error));
    }
}

fn html(node: &Element) -> Option<&HtmlElement> {
    node.dyn_ref::<HtmlElement>()
}

impl Dom for WebDom {
    type Node = Element;

    fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        self.document
            .create_element(tag)
            .map_err(|error| DomError::Create {
                tag: tag.to_string(),
                reason: js_message(&error),
            })
    }

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_uppercase()
    }

    fn set_id(&self, node: &Element, id: &str) {
        node.set_id(id);
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn add_class(&self, node: &Element, class: &str) {
        report("add class", node.class_list().add_1(class));
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        report("set attribute", node.set_attribute(name, value));
    }

    fn set_property(&self, node: &Element, name: &str, value: &PropValue) {
        let value = match value {
            PropValue::Bool(flag) => JsValue::from_bool(*flag),
            PropValue::Text(text) => JsValue::from_str(text),
        };

        report(
            "set property",
            js_sys::Reflect::set(node, &JsValue::from_str(name), &value).map(drop),
        );
    }

    fn set_style(&self, node: &Element, name: &str, value: &str) {
        if let Some(element) = html(node) {
            report("set style", element.style().set_property(name, value));
        }
    }

    fn set_visible(&self, node: &Element, visible: bool) {
        let Some(element) = html(node) else {
            return;
        };

        let style = element.style();

        if visible {
            report("show", style.remove_property("display").map(drop));
        } else {
            report("hide", style.set_property("display", "none"));
        }
    }

    fn is_visible(&self, node: &Element) -> bool {
        html(node).is_none_or(|element| {
            !matches!(element.style().get_property_value("display").as_deref(), Ok("none"))
        })
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        report("append", parent.append_child(child).map(drop));
    }

    fn prepend_child(&self, parent: &Element, child: &Element) {
        report("prepend", parent.prepend_with_node_1(child));
    }

    fn remove_last_child(&self, parent: &Element) {
        if let Some(last) = parent.last_element_child() {
            last.remove();
        }
    }

    fn clear_children(&self, parent: &Element) {
        parent.set_text_content(None);
    }

    fn value(&self, node: &Element) -> String {
        js_sys::Reflect::get(node, &JsValue::from_str("value"))
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    }

    fn set_value(&self, node: &Element, value: &str) {
        self.set_property(node, "value", &PropValue::Text(value.to_string()));
    }

    fn focus(&self, node: &Element) {
        if let Some(element) = html(node) {
            report("focus", element.focus());
        }
    }

    fn listen(&self, node: &Element, event: &str, listener: Listener) {
        let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            event.prevent_default();
            listener();
        });

        report(
            "listen",
            node.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()),
        );

        // Listeners live as long as the page.
        callback.forget();
    }
}
