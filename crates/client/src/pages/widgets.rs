//! Small building blocks shared by several pages.

use crate::dom::{BuildError, Builder, Component, ComponentOptions, Dom};

/// Project home linked from the footer.
pub const PROJECT_URL: &str = "https://github.com/ahui2016/txt";

/// Release shown in the footer.
pub const VERSION: &str = "2022-02-24";

/// One piece of a navigation bar.
#[derive(Debug, Clone, Copy)]
pub enum Nav<'a> {
    Link {
        href: &'a str,
        text: &'a str,
        title: Option<&'a str>,
    },
    Text(&'a str),
}

impl<'a> Nav<'a> {
    #[must_use]
    pub const fn link(href: &'a str, text: &'a str) -> Self {
        Self::Link {
            href,
            text,
            title: None,
        }
    }

    #[must_use]
    pub const fn titled(href: &'a str, text: &'a str, title: &'a str) -> Self {
        Self::Link {
            href,
            text,
            title: Some(title),
        }
    }
}

/// `<span>` with text.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn span<D: Dom>(builder: &Builder<D>, text: &str) -> Result<Component<D>, BuildError> {
    let span = builder.element("span")?;
    span.text(text);
    Ok(span)
}

/// `<a href>` with text.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn link<D: Dom>(builder: &Builder<D>, href: &str, text: &str) -> Result<Component<D>, BuildError> {
    let link = builder.element("a")?;
    link.text(text).attr("href", href);
    Ok(link)
}

/// `div.Loading` placeholder.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn loading<D: Dom>(builder: &Builder<D>) -> Result<Component<D>, BuildError> {
    builder.create(
        "div",
        ComponentOptions::new()
            .classes("Loading text-center")
            .text("Loading..."),
    )
}

/// Navigation bar built from links and text separators.
///
/// # Errors
///
/// Returns an error when an element cannot be created.
pub fn navbar<D: Dom>(builder: &Builder<D>, classes: &str, items: &[Nav<'_>]) -> Result<Component<D>, BuildError> {
    let bar = builder.create("div", ComponentOptions::new().classes(classes))?;

    for item in items {
        let node = match *item {
            Nav::Link { href, text, title } => {
                let node = link(builder, href, text)?;
                if let Some(title) = title {
                    node.attr("title", title);
                }
                node
            }
            Nav::Text(text) => span(builder, text)?,
        };

        bar.append(&node);
    }

    Ok(bar)
}

/// Panel asking the user to sign in first.
///
/// # Errors
///
/// Returns an error when an element cannot be created.
pub fn goto_sign_in<D: Dom>(builder: &Builder<D>) -> Result<Component<D>, BuildError> {
    let notice = builder.element("p")?;
    notice.add_class("alert-danger").text("请先登入。");

    let line = builder.element("div")?;
    line.append(&span(builder, "前往登入页面 ➡ ")?)
        .append(&link(builder, "/public/sign-in.html", "/public/sign-in.html")?);

    builder.create("div", ComponentOptions::new().child(&notice).child(&line))
}

/// Footer with version and project link.
///
/// # Errors
///
/// Returns an error when an element cannot be created.
pub fn footer<D: Dom>(builder: &Builder<D>) -> Result<Component<D>, BuildError> {
    let project = link(builder, PROJECT_URL, PROJECT_URL)?;
    project.add_class("FooterLink").attr("target", "_blank");

    let footer = builder.element("div")?;
    footer
        .add_class("Footer")
        .append(&span(builder, &format!("version: {VERSION}"))?)
        .append(&builder.element("br")?)
        .append(&project);

    Ok(footer)
}

/// The bare `.` footer of the inner pages.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn plain_footer<D: Dom>(builder: &Builder<D>) -> Result<Component<D>, BuildError> {
    let footer = builder.element("div")?;
    footer.add_class("Footer").text(".");
    Ok(footer)
}

/// `<input type=kind>`.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn input<D: Dom>(builder: &Builder<D>, kind: &str) -> Result<Component<D>, BuildError> {
    builder.create("input", ComponentOptions::new().attr("type", kind))
}

/// `<textarea rows=rows>`.
///
/// # Errors
///
/// Returns an error when the element cannot be created.
pub fn textarea<D: Dom>(builder: &Builder<D>, rows: u32) -> Result<Component<D>, BuildError> {
    builder.create(
        "textarea",
        ComponentOptions::new()
            .classes("form-textarea")
            .attr("rows", rows.to_string()),
    )
}

/// Label, control and help text stacked in one `div`.
///
/// # Errors
///
/// Returns an error when an element cannot be created.
pub fn form_item<D: Dom>(
    builder: &Builder<D>,
    control: &Component<D>,
    label: &str,
    description: &str,
    classes: &str,
) -> Result<Component<D>, BuildError> {
    let caption = builder.element("label")?;
    caption
        .add_class("form-label")
        .attr("for", control.id().unwrap_or_default())
        .text(label);

    control.add_class("form-textinput form-textinput-fat");

    let help = builder.element("div")?;
    help.add_class("form-text").text(description);

    let item = builder.element("div")?;
    item.add_class(classes)
        .append(&caption)
        .append(control)
        .append(&help);

    Ok(item)
}

/// Hidden `#submit` button that swallows implicit form submission on Enter.
///
/// # Errors
///
/// Returns an error when the id is already taken.
pub fn hidden_submit<D: Dom>(builder: &Builder<D>) -> Result<Component<D>, BuildError> {
    let button = builder.create("button", ComponentOptions::new().id("submit").text("submit"))?;
    button.hide().on("click", || {});
    Ok(button)
}
