use std::{cell::RefCell, rc::Rc};

use serde::de::IgnoredAny;

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    models::Message,
    pages::{
        Context, Lifecycle, Page, on_click,
        widgets::{self, Nav},
    },
};

/// Alias and body editor for the message named by the `id` query
/// parameter.
#[derive(Debug)]
pub struct EditPage<D: Dom> {
    ctx: Rc<Context<D>>,
    id: Option<String>,
    original: RefCell<Option<Message>>,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    form: Component<D>,
    id_input: Component<D>,
    category: Component<D>,
    alias: Component<D>,
    msg: Component<D>,
    form_alerts: Alerts<D>,
    submit: Component<D>,
}

impl<D: Dom> EditPage<D> {
    /// Build the page.
    ///
    /// # Errors
    ///
    /// Returns an error when an element cannot be created.
    pub fn build(ctx: &Rc<Context<D>>) -> Result<Rc<Self>, BuildError> {
        let builder = &ctx.builder;

        let navbar = widgets::navbar(
            builder,
            "my-3",
            &[Nav::link("/public/index.html", "home"), Nav::Text(" .. Edit")],
        )?;
        let loading = widgets::loading(builder)?;
        loading.add_class("my-3");
        let alerts = ctx.alerts()?;
        alerts.component().add_class("my-3");

        let id_input = widgets::input(builder, "text")?;
        let category = widgets::input(builder, "text")?;
        let alias = widgets::input(builder, "text")?;
        let msg = widgets::textarea(builder, 5)?;
        let form_alerts = ctx.alerts()?;
        let submit = builder.create("button", ComponentOptions::new().text("Submit"))?;

        let form = builder.create(
            "form",
            ComponentOptions::new().children([
                &widgets::form_item(builder, &id_input, "ID", "", "mb-3")?,
                &widgets::form_item(
                    builder,
                    &category,
                    "Category",
                    "类型（暂存/永久），可在消息列表中点击 toggle 按钮转换类型。",
                    "mb-3",
                )?,
                &widgets::form_item(
                    builder,
                    &alias,
                    "Alias",
                    "别名(可留空)。用于方便命令行精准指定消息。",
                    "mb-3",
                )?,
                &widgets::form_item(builder, &msg, "Message", "文本消息内容(必填)", "mb-3")?,
                &widgets::hidden_submit(builder)?,
                &submit,
                form_alerts.component(),
            ]),
        )?;

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &loading,
            alerts.component(),
            &form,
            &widgets::plain_footer(builder)?,
        ]);

        let lifecycle = Lifecycle::new(&loading, &[&form], None);

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            id: ctx.runtime.query_param("id").filter(|id| !id.is_empty()),
            original: RefCell::new(None),
            root,
            lifecycle,
            alerts,
            form,
            id_input,
            category,
            alias,
            msg,
            form_alerts,
            submit,
        });

        on_click(ctx, &page.submit, &page, |page| async move { page.submit().await });

        Ok(page)
    }

    /// Load the message into the form.
    pub async fn load(&self) {
        let Some(id) = self.id.as_deref() else {
            self.lifecycle.fail();
            self.alerts.insert(AlertKind::Danger, "未指定 id");
            return;
        };

        self.ctx
            .api
            .exchange::<D>(api::get_by_id(id))
            .on_failure(|error| {
                self.lifecycle.fail();
                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .on_always(|| self.ctx.focus_later(&self.msg))
            .send(|message: Message| {
                self.id_input.set_value(&message.id).disable();
                self.category.set_value(message.cat.wire_name()).disable();
                self.alias.set_value(&message.alias);
                self.msg.set_value(&message.msg);
                *self.original.borrow_mut() = Some(message);
                self.lifecycle.ready();
            })
            .await;
    }

    /// Save alias and body; an unchanged form is not sent.
    pub async fn submit(&self) {
        let Some(id) = self.id.as_deref() else {
            return;
        };

        if !self.lifecycle.is_ready() {
            return;
        }

        let msg = self.msg.trimmed_value();

        if msg.is_empty() {
            self.form_alerts
                .insert(AlertKind::Danger, "Message(文本消息内容)必填");
            self.ctx.focus_later(&self.msg);
            return;
        }

        let alias = self.alias.trimmed_value();

        let unchanged = self
            .original
            .borrow()
            .as_ref()
            .is_some_and(|original| original.alias == alias && original.msg == msg);

        if unchanged {
            self.alerts
                .clear()
                .insert(AlertKind::Success, "修改成功(内容无变化)");
            self.form.hide();
            return;
        }

        self.ctx
            .api
            .exchange::<D>(api::edit(id, &alias, &msg))
            .button(&self.submit)
            .alerts(&self.form_alerts)
            .send(|_: IgnoredAny| {
                self.alerts.clear().insert(AlertKind::Success, "修改成功");
                self.form.hide();
            })
            .await;
    }
}

impl<D: Dom> Page<D> for EditPage<D> {
    fn title(&self) -> &'static str {
        "Edit .. txt"
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.load().await });
    }
}
