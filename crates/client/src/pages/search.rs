use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Builder, Component, ComponentOptions, Dom},
    models::{AliasRecord, Message},
    pages::{
        Context, Lifecycle, MessageItem, Page,
        message_item::append_items,
        on_click,
        widgets::{self, Nav},
    },
};

/// Keyword search plus the list of every alias.
#[derive(Debug)]
pub struct SearchPage<D: Dom> {
    ctx: Rc<Context<D>>,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    input: Component<D>,
    search: Component<D>,
    form_alerts: Alerts<D>,
    alias_list: Component<D>,
    show_aliases: Component<D>,
    hide_aliases: Component<D>,
    results: Component<D>,
    searched: Cell<bool>,
    items: RefCell<Vec<Rc<MessageItem<D>>>>,
}

impl<D: Dom> SearchPage<D> {
    /// Build the page.
    ///
    /// # Errors
    ///
    /// Returns an error when an element cannot be created.
    pub fn build(ctx: &Rc<Context<D>>) -> Result<Rc<Self>, BuildError> {
        let builder = &ctx.builder;

        let navbar = widgets::navbar(
            builder,
            "my-5",
            &[Nav::link("/public/index.html", "Home"), Nav::Text(" .. Search")],
        )?;
        let loading = widgets::loading(builder)?;
        loading.add_class("my-5");
        let alerts = ctx.alerts()?;

        let input = widgets::input(builder, "text")?;
        let search = builder.create("button", ComponentOptions::new().text("Search"))?;
        let form_alerts = ctx.alerts()?;

        let search_row = builder.element("div")?;
        search_row.add_class("text-right").append(&search);

        let form = builder.create(
            "form",
            ComponentOptions::new().children([
                &widgets::form_item(builder, &input, "Search text", "", "mb-1")?,
                form_alerts.component(),
                &search_row,
            ]),
        )?;

        let show_aliases = widgets::link(builder, "#", "(show)")?;
        show_aliases.hide();
        let hide_aliases = widgets::link(builder, "#", "(hide)")?;
        let alias_list = builder.element("ul")?;
        let aliases_area = aliases_area(builder, &show_aliases, &hide_aliases, &alias_list)?;

        let results = builder.create("div", ComponentOptions::new().classes("mb-5"))?;

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &loading,
            &form,
            alerts.component(),
            &aliases_area,
            &results,
            &widgets::plain_footer(builder)?,
        ]);

        let lifecycle = Lifecycle::new(&loading, &[&form, &aliases_area], None);

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            root,
            lifecycle,
            alerts,
            input,
            search,
            form_alerts,
            alias_list,
            show_aliases,
            hide_aliases,
            results,
            searched: Cell::new(false),
            items: RefCell::new(Vec::new()),
        });

        on_click(ctx, &page.search, &page, |page| async move { page.run_search().await });
        on_click(ctx, &page.show_aliases, &page, |page| async move { page.toggle_aliases() });
        on_click(ctx, &page.hide_aliases, &page, |page| async move { page.toggle_aliases() });

        Ok(page)
    }

    /// Fetch every alias and list them newest message first.
    pub async fn load_aliases(&self) {
        self.ctx
            .api
            .exchange::<D>(api::all_aliases())
            .on_failure(|error| {
                self.lifecycle.fail();
                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .on_always(|| self.ctx.focus_later(&self.input))
            .send(|aliases: Option<Vec<AliasRecord>>| {
                let mut aliases = aliases.unwrap_or_default();
                aliases.sort_by(|a, b| b.msg_id.cmp(&a.msg_id));

                self.lifecycle.ready();

                if let Err(error) = self.render_aliases(&aliases) {
                    self.alerts.insert(AlertKind::Danger, &error.to_string());
                }
            })
            .await;
    }

    fn render_aliases(&self, aliases: &[AliasRecord]) -> Result<(), BuildError> {
        let builder = &self.ctx.builder;

        if aliases.is_empty() {
            let item = builder.element("li")?;
            item.text("No aliases found.");
            self.alias_list.append(&item);
            return Ok(());
        }

        for alias in aliases {
            let msg_id = widgets::span(builder, &format!("[{}]", alias.msg_id))?;
            msg_id.add_class("text-grey mr-2");

            let edit = widgets::link(builder, &format!("/public/edit.html?id={}", alias.msg_id), &alias.id)?;
            edit.attr("target", "_blank");

            let item = builder.create("li", ComponentOptions::new().children([&msg_id, &edit]))?;
            self.alias_list.append(&item);
        }

        Ok(())
    }

    /// Show or hide the alias list.
    pub fn toggle_aliases(&self) {
        self.alias_list.toggle();
        self.show_aliases.toggle();
        self.hide_aliases.toggle();
    }

    /// Search every bucket for the input's keyword.
    pub async fn run_search(&self) {
        if !self.lifecycle.is_ready() {
            return;
        }

        let keyword = self.input.trimmed_value();

        if keyword.is_empty() {
            self.form_alerts.insert(AlertKind::Danger, "搜索内容不能为空");
            self.ctx.focus_later(&self.input);
            return;
        }

        if !self.searched.replace(true) && self.alias_list.is_visible() {
            self.toggle_aliases();
        }

        self.form_alerts
            .insert(AlertKind::Primary, &format!("Searching [{keyword}]..."));

        self.ctx
            .api
            .exchange::<D>(api::search(&keyword, &[]))
            .button(&self.search)
            .alerts(&self.form_alerts)
            .send(|messages: Option<Vec<Message>>| {
                let messages = messages.unwrap_or_default();

                // Earlier results stay up when nothing matches.
                if messages.is_empty() {
                    self.form_alerts.insert(AlertKind::Danger, "No items found.");
                    return;
                }

                self.clear_results();

                self.form_alerts
                    .insert(AlertKind::Success, &format!("Found {} items.", messages.len()));

                match append_items(&self.ctx, &self.results, messages) {
                    Ok(items) => self.items.borrow_mut().extend(items),
                    Err(error) => self.form_alerts.insert(AlertKind::Danger, &error.to_string()),
                }
            })
            .await;
    }

    fn clear_results(&self) {
        for item in self.items.borrow_mut().drain(..) {
            self.ctx.builder.release(item.root());
        }

        self.results.clear();
    }
}

fn aliases_area<D: Dom>(
    builder: &Builder<D>,
    show: &Component<D>,
    hide: &Component<D>,
    list: &Component<D>,
) -> Result<Component<D>, BuildError> {
    let heading = builder.element("h4")?;
    heading.add_class("mb-0").text("Aliases");

    let rule = builder.element("hr")?;
    rule.add_class("my-0");

    let toggles = builder.element("div")?;
    toggles.add_class("text-right").append_all([show, hide]);

    builder.create(
        "div",
        ComponentOptions::new().children([&heading, &rule, &toggles, list]),
    )
}

impl<D: Dom> Page<D> for SearchPage<D> {
    fn title(&self) -> &'static str {
        "Search .. txt-online"
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.load_aliases().await });
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};
    use testresult::TestResult;

    use super::*;
    use crate::{
        dom::MemoryDom,
        request::{EncodedBody, HttpResponse, MockTransport},
        test::{Harness, message_json, respond, respond_each, sent_count, sent_request},
    };

    fn aliases(transport: &mut MockTransport, records: Value) {
        respond(transport, "/api/get-all-aliases", HttpResponse::json(200, &records));
    }

    fn open(transport: MockTransport) -> Result<(Harness, Rc<SearchPage<MemoryDom>>), BuildError> {
        let harness = Harness::new(transport);
        let page = SearchPage::build(&harness.ctx)?;
        harness.open(&page);
        Ok((harness, page))
    }

    #[test]
    fn aliases_are_listed_newest_first() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(
            &mut transport,
            json!([
                {"ID": "old", "MsgID": "20230101000000"},
                {"ID": "new", "MsgID": "20240101000000"},
            ]),
        );

        let (harness, page) = open(transport)?;

        let text = harness.dom.text_content(page.alias_list.node());

        assert_eq!(text, "[20240101000000]new[20230101000000]old");
        assert!(harness.rendered(&page.input));
        assert_eq!(harness.dom.focused().as_ref(), Some(page.input.node()));

        let links = harness.dom.find_by_text(page.alias_list.node(), "a", "new");
        let link = links.first().ok_or("missing alias link")?;

        assert_eq!(
            harness.dom.attribute(link, "href").as_deref(),
            Some("/public/edit.html?id=20240101000000")
        );
        assert_eq!(harness.dom.attribute(link, "target").as_deref(), Some("_blank"));

        Ok(())
    }

    #[test]
    fn no_aliases_says_so() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!(null));

        let (harness, page) = open(transport)?;

        assert_eq!(harness.dom.text_content(page.alias_list.node()), "No aliases found.");

        Ok(())
    }

    #[test]
    fn alias_list_toggles() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!([]));

        let (harness, page) = open(transport)?;

        assert!(!harness.rendered(&page.show_aliases));

        harness.click(&page.hide_aliases);

        assert!(!harness.rendered(&page.alias_list));
        assert!(harness.rendered(&page.show_aliases));
        assert!(!harness.rendered(&page.hide_aliases));

        harness.click(&page.show_aliases);

        assert!(harness.rendered(&page.alias_list));

        Ok(())
    }

    #[test]
    fn search_lists_results_and_collapses_aliases_once() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!([]));
        let sent = respond_each(
            &mut transport,
            "/api/search",
            vec![
                HttpResponse::json(
                    200,
                    &json!([
                        message_json("20240102000000", "Category-Temporary", 1),
                        message_json("20240101000000", "Category-Permanent", 1),
                    ]),
                ),
                HttpResponse::json(200, &json!([message_json("20240102000000", "Category-Temporary", 1)])),
            ],
        );

        let (harness, page) = open(transport)?;

        page.input.set_value(" milk ");
        harness.click(&page.search);

        let request = sent_request(&sent, 0).ok_or("search not sent")?;
        let EncodedBody::Json(body) = &request.body else {
            return Err("search body is not JSON".into());
        };
        let body: Value = serde_json::from_str(body)?;

        assert_eq!(body, json!({"keyword": "milk", "buckets": []}));
        assert!(!harness.rendered(&page.alias_list));
        assert!(harness.text().contains("Searching [milk]..."));
        assert!(harness.text().contains("Found 2 items."));
        assert_eq!(page.items.borrow().len(), 2);

        harness.click(&page.show_aliases);
        harness.click(&page.search);

        assert!(harness.rendered(&page.alias_list));
        assert_eq!(page.items.borrow().len(), 1);
        assert_eq!(harness.dom.children(page.results.node()).len(), 1);
        assert!(!harness.disabled(&page.search));

        Ok(())
    }

    #[test]
    fn empty_result_is_reported() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!([]));
        respond(&mut transport, "/api/search", HttpResponse::json(200, &json!(null)));

        let (harness, page) = open(transport)?;

        page.input.set_value("nothing");
        harness.click(&page.search);

        assert!(harness.text().contains("No items found."));

        Ok(())
    }

    #[test]
    fn no_match_keeps_previous_results() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!([]));
        respond_each(
            &mut transport,
            "/api/search",
            vec![
                HttpResponse::json(200, &json!([message_json("20240102000000", "Category-Temporary", 1)])),
                HttpResponse::json(200, &json!([])),
            ],
        );

        let (harness, page) = open(transport)?;

        page.input.set_value("milk");
        harness.click(&page.search);
        page.input.set_value("nothing");
        harness.click(&page.search);

        assert!(harness.text().contains("No items found."));
        assert_eq!(page.items.borrow().len(), 1);
        assert_eq!(harness.dom.children(page.results.node()).len(), 1);

        Ok(())
    }

    #[test]
    fn blank_keyword_is_not_sent() -> TestResult {
        let mut transport = MockTransport::new();
        aliases(&mut transport, json!([]));
        let sent = respond(&mut transport, "/api/search", HttpResponse::ok());

        let (harness, page) = open(transport)?;

        harness.click(&page.search);

        assert_eq!(sent_count(&sent), 0);
        assert!(harness.text().contains("搜索内容不能为空"));
        assert!(harness.rendered(&page.alias_list));

        Ok(())
    }
}
