use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    models::{Message, Text},
    pages::{
        Context, Lifecycle, MessageItem, Page,
        message_item::append_items,
        on_click, reload_notice,
        widgets::{self, Nav},
    },
    request::ErrorCode,
};

/// Which home page is being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeVariant {
    /// Navigation, add form and the recent messages; reloads after adding.
    Full,

    /// Add form only; shows the new id and stays put.
    Compact,
}

/// Sign-in check, add form and, for [`HomeVariant::Full`], recent messages.
#[derive(Debug)]
pub struct HomePage<D: Dom> {
    ctx: Rc<Context<D>>,
    variant: HomeVariant,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    input: Component<D>,
    send: Component<D>,
    form_alerts: Alerts<D>,
    list: Component<D>,
    footer: Component<D>,
    items: RefCell<Vec<Rc<MessageItem<D>>>>,
}

impl<D: Dom> HomePage<D> {
    /// Build the page.
    ///
    /// # Errors
    ///
    /// Returns an error when an element cannot be created.
    pub fn build(ctx: &Rc<Context<D>>, variant: HomeVariant) -> Result<Rc<Self>, BuildError> {
        let builder = &ctx.builder;

        let heading = builder.element("h1")?;
        heading.text(match variant {
            HomeVariant::Full => "txt online",
            HomeVariant::Compact => "txt",
        });

        let title_area = builder.element("div")?;
        title_area.add_class("text-center").append(&heading);

        let loading = widgets::loading(builder)?;
        let alerts = ctx.alerts()?;
        let goto_sign_in = widgets::goto_sign_in(builder)?;
        goto_sign_in.add_class("my-3");

        let input = widgets::textarea(builder, 3)?;
        input
            .add_class("form-textinput form-textinput-fat")
            .attr("placeholder", "New message");

        let send = builder.create("button", ComponentOptions::new().text("Send"))?;
        let form_alerts = ctx.alerts()?;

        let send_row = builder.element("div")?;
        send_row.add_class("text-right").append(&send);

        let form = builder.create(
            "form",
            ComponentOptions::new().children([&input, form_alerts.component(), &send_row]),
        )?;

        let list = builder.create("div", ComponentOptions::new().classes("mb-5"))?;
        let footer = widgets::footer(builder)?;
        footer.hide();

        let root = builder.element("div")?;
        root.append(&title_area);

        if variant == HomeVariant::Full {
            let navbar = widgets::navbar(
                builder,
                "text-center my-5",
                &[
                    Nav::titled("/public/search.html", "Search", "查找"),
                    Nav::Text(" | "),
                    Nav::titled("/public/temp.html", "Temp", "暂存消息"),
                    Nav::Text(" | "),
                    Nav::titled("/public/perm.html", "Perm", "永久消息"),
                    Nav::Text(" | "),
                    Nav::titled("/public/alias.html", "Alias", "别名"),
                    Nav::Text(" | "),
                    Nav::titled("/public/config.html", "Config", "设定"),
                ],
            )?;
            root.append(&navbar);
        }

        loading.add_class("my-5");
        root.append_all([&loading, alerts.component(), &goto_sign_in, &form, &list, &footer]);

        let lifecycle = Lifecycle::new(&loading, &[&form], Some(&goto_sign_in));

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            variant,
            root,
            lifecycle,
            alerts,
            input,
            send,
            form_alerts,
            list,
            footer,
            items: RefCell::new(Vec::new()),
        });

        on_click(ctx, &page.send, &page, |page| async move { page.send_message().await });

        Ok(page)
    }

    /// Check the session, then show the form or the sign-in panel.
    pub async fn check_sign_in(&self) {
        let signed_in = Cell::new(false);

        self.ctx
            .api
            .exchange::<D>(api::is_signed_in())
            .on_failure(|error| {
                self.lifecycle.fail();
                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .send(|yes: bool| {
                signed_in.set(yes);

                if yes {
                    self.lifecycle.ready();
                    self.ctx.focus_later(&self.input);
                } else {
                    self.lifecycle.require_sign_in();
                }
            })
            .await;

        if signed_in.get() && self.variant == HomeVariant::Full {
            self.load_recent().await;
        }
    }

    /// List the most recent messages.
    pub async fn load_recent(&self) {
        self.ctx
            .api
            .exchange::<D>(api::recent_items())
            .alerts(&self.alerts)
            .send(|messages: Option<Vec<Message>>| {
                let messages = messages.unwrap_or_default();
                let count = messages.len();

                match append_items(&self.ctx, &self.list, messages) {
                    Ok(items) => self.items.borrow_mut().extend(items),
                    Err(error) => self.alerts.insert(AlertKind::Danger, &error.to_string()),
                }

                if count >= self.ctx.settings.recent_footer_threshold {
                    self.footer.show();
                }
            })
            .await;
    }

    /// Send the textarea content as a new temporary message.
    pub async fn send_message(&self) {
        if !self.lifecycle.is_ready() {
            return;
        }

        let msg = self.input.trimmed_value();

        if msg.is_empty() {
            self.form_alerts.insert(AlertKind::Danger, "消息内容不能为空");
            self.ctx.focus_later(&self.input);
            return;
        }

        self.ctx
            .api
            .exchange::<D>(api::add(&msg))
            .button(&self.send)
            .alerts(&self.form_alerts)
            .on_failure(|error| match error.code() {
                ErrorCode::SameAsLast => self
                    .form_alerts
                    .insert(AlertKind::Info, "与最近一条暂存消息重复，不重复插入。"),
                ErrorCode::Unauthorized | ErrorCode::Other => {
                    self.form_alerts.insert(AlertKind::Danger, &error.to_string());
                }
            })
            .send(|reply: Option<Text>| match self.variant {
                HomeVariant::Full => {
                    self.form_alerts
                        .insert(AlertKind::Success, &format!("发送成功, {}", reload_notice(&self.ctx)));
                    self.ctx.reload_later();
                }
                HomeVariant::Compact => {
                    let id = reply.map(|text| text.message).unwrap_or_default();
                    self.form_alerts.insert(AlertKind::Success, &id);
                    self.input.set_value("");
                    self.ctx.focus_later(&self.input);
                }
            })
            .await;
    }
}

impl<D: Dom> Page<D> for HomePage<D> {
    fn title(&self) -> &'static str {
        match self.variant {
            HomeVariant::Full => "txt online",
            HomeVariant::Compact => "txt",
        }
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.check_sign_in().await });
    }
}
