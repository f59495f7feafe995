use std::rc::Rc;

use serde::de::IgnoredAny;

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    models::Message,
    pages::{
        Context, on_click, reload_notice,
        widgets::{link, span},
    },
};

/// One rendered message with its toggle/edit/del/copy actions.
#[derive(Debug)]
pub struct MessageItem<D: Dom> {
    ctx: Rc<Context<D>>,
    message: Message,
    root: Component<D>,
    toggle: Component<D>,
    delete: Component<D>,
    copy: Component<D>,
    alerts: Alerts<D>,
}

impl<D: Dom> MessageItem<D> {
    /// Render `message` and bind its actions.
    ///
    /// # Errors
    ///
    /// Returns an error when an element cannot be created or the message's
    /// element id is already on the page.
    pub fn build(ctx: &Rc<Context<D>>, message: Message) -> Result<Rc<Self>, BuildError> {
        let builder = &ctx.builder;
        let alerts = ctx.alerts()?;

        let toggle = link(builder, "#", "toggle")?;
        toggle.add_class("toggle-btn").attr("title", "暂存/永久");

        let edit = link(builder, &format!("/public/edit.html?id={}", message.id), "edit")?;
        edit.attr("title", "修改/别名");

        let delete = link(builder, "#", "del")?;
        delete.add_class("del-btn").attr("title", "彻底删除");

        let copy = link(builder, "#", "copy")?;
        copy.attr("title", "复制内容");

        let actions = builder.element("div")?;
        actions
            .add_class("ItemButtons")
            .append(span(builder, "|")?.add_class("ml-2"))
            .append_all([&toggle, &edit, &delete, &copy]);

        let header = builder.element("div")?;
        header
            .add_class("text-grey")
            .append(&span(builder, &format!("[{}] {}", message.label(), message.id))?)
            .append(&actions);

        let body = builder.element("div")?;
        body.text(&message.msg);

        let root = builder.create(
            "div",
            ComponentOptions::new()
                .id(message.element_id())
                .classes("TxtMsgItem")
                .children([&header, &body, alerts.component()]),
        )?;

        let item = Rc::new(Self {
            ctx: Rc::clone(ctx),
            message,
            root,
            toggle,
            delete,
            copy,
            alerts,
        });

        on_click(ctx, &item.toggle, &item, |item| async move { item.toggle_category().await });
        on_click(ctx, &item.delete, &item, |item| async move { item.delete().await });
        on_click(ctx, &item.copy, &item, |item| async move { item.copy().await });

        Ok(item)
    }

    #[must_use]
    pub fn root(&self) -> &Component<D> {
        &self.root
    }

    #[must_use]
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Move the message to the other category, then reload.
    pub async fn toggle_category(&self) {
        let after = self.message.cat.toggled();

        self.ctx
            .api
            .exchange::<D>(api::toggle_category(&self.message.id))
            .button(&self.toggle)
            .alerts(&self.alerts)
            .send(|_: IgnoredAny| {
                self.alerts.insert(
                    AlertKind::Success,
                    &format!("已转换至[{}], {}", after.display_name(), reload_notice(&self.ctx)),
                );
                self.ctx.reload_later();
            })
            .await;
    }

    /// Delete the message for good, then reload.
    pub async fn delete(&self) {
        self.ctx
            .api
            .exchange::<D>(api::delete(&self.message.id))
            .button(&self.delete)
            .alerts(&self.alerts)
            .send(|_: IgnoredAny| {
                self.alerts
                    .insert(AlertKind::Info, &format!("已删除, {}", reload_notice(&self.ctx)));
                self.ctx.reload_later();
            })
            .await;
    }

    /// Put the message body on the clipboard.
    pub async fn copy(&self) {
        match self.ctx.runtime.copy_text(&self.message.msg).await {
            Ok(()) => self.alerts.insert(AlertKind::Success, "复制成功"),
            Err(error) => self.alerts.insert(AlertKind::Danger, &error.to_string()),
        }
    }
}

/// Render `messages` under `list`, appending to what is already there.
///
/// # Errors
///
/// Returns the first build failure; items before it stay rendered.
pub(crate) fn append_items<D: Dom>(
    ctx: &Rc<Context<D>>,
    list: &Component<D>,
    messages: Vec<Message>,
) -> Result<Vec<Rc<MessageItem<D>>>, BuildError> {
    let mut items = Vec::with_capacity(messages.len());

    for message in messages {
        let item = MessageItem::build(ctx, message)?;
        list.append(item.root());
        items.push(item);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        models::Category,
        request::{HttpResponse, MockTransport},
        test::{Harness, respond, sent_count},
    };

    fn message(cat: Category) -> Message {
        Message {
            id: "20240101120000".to_string(),
            user_id: String::new(),
            alias: String::new(),
            msg: "hello world".to_string(),
            cat,
            index: 3,
        }
    }

    fn mounted(harness: &Harness, cat: Category) -> Result<Rc<MessageItem<crate::dom::MemoryDom>>, BuildError> {
        let item = MessageItem::build(&harness.ctx, message(cat))?;
        harness.dom.mount(item.root().node());
        Ok(item)
    }

    #[test]
    fn renders_label_id_and_body() -> TestResult {
        let harness = Harness::new(MockTransport::new());
        let item = mounted(&harness, Category::Temporary)?;

        assert_eq!(item.root().id(), Some("i20240101120000"));
        assert!(harness.text().starts_with("[T3] 20240101120000|toggleeditdelcopyhello world"));

        Ok(())
    }

    #[test]
    fn toggle_names_new_category_and_reloads() -> TestResult {
        let mut transport = MockTransport::new();
        let sent = respond(&mut transport, "/api/toggle-category", HttpResponse::ok());

        let harness = Harness::new(transport);
        let item = mounted(&harness, Category::Temporary)?;

        harness.click(&item.toggle);

        assert_eq!(sent_count(&sent), 1);
        assert!(harness.text().contains("已转换至[永久消息], 3 秒后会自动刷新页面。"));
        assert!(!harness.disabled(&item.toggle));
        assert_eq!(harness.runtime.reloads(), 1);
        assert!(harness.runtime.sleeps().contains(&Duration::from_millis(3000)));

        Ok(())
    }

    #[test]
    fn toggle_back_to_temporary() -> TestResult {
        let mut transport = MockTransport::new();
        respond(&mut transport, "/api/toggle-category", HttpResponse::ok());

        let harness = Harness::new(transport);
        let item = mounted(&harness, Category::Permanent)?;

        harness.click(&item.toggle);

        assert!(harness.text().contains("已转换至[暂存消息]"));

        Ok(())
    }

    #[test]
    fn failed_delete_shows_error_without_reload() -> TestResult {
        let mut transport = MockTransport::new();
        respond(
            &mut transport,
            "/api/delete",
            HttpResponse::json(500, &json!({"message": "db closed"})),
        );

        let harness = Harness::new(transport);
        let item = mounted(&harness, Category::Temporary)?;

        harness.click(&item.delete);

        assert!(harness.text().contains("500 db closed"));
        assert_eq!(harness.runtime.reloads(), 0);

        Ok(())
    }

    #[test]
    fn delete_announces_reload() -> TestResult {
        let mut transport = MockTransport::new();
        respond(&mut transport, "/api/delete", HttpResponse::ok());

        let harness = Harness::new(transport);
        let item = mounted(&harness, Category::Temporary)?;

        harness.click(&item.delete);

        assert!(harness.text().contains("已删除, 3 秒后会自动刷新页面。"));
        assert_eq!(harness.runtime.reloads(), 1);

        Ok(())
    }

    #[test]
    fn copy_puts_body_on_clipboard() -> TestResult {
        let harness = Harness::new(MockTransport::new());
        let item = mounted(&harness, Category::Temporary)?;

        harness.click(&item.copy);

        assert_eq!(harness.runtime.clipboard(), vec!["hello world".to_string()]);
        assert!(harness.text().contains("复制成功"));

        Ok(())
    }

    #[test]
    fn copy_reports_clipboard_failure() -> TestResult {
        let harness = Harness::new(MockTransport::new());
        let item = mounted(&harness, Category::Temporary)?;

        harness.runtime.deny_clipboard();
        harness.click(&item.copy);

        assert!(harness.text().contains("clipboard unavailable"));

        Ok(())
    }
}
