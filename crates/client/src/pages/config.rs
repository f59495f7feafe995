use std::rc::Rc;

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    models::{ConfigForm, Text},
    pages::{
        Context, Lifecycle, Page, on_click,
        widgets::{self, Nav},
    },
    request::ErrorCode,
};

/// Server settings form.
#[derive(Debug)]
pub struct ConfigPage<D: Dom> {
    ctx: Rc<Context<D>>,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    form: Component<D>,
    key_max_age: Component<D>,
    msg_size_limit: Component<D>,
    temp_limit: Component<D>,
    every_page_limit: Component<D>,
    time_offset: Component<D>,
    form_alerts: Alerts<D>,
    submit: Component<D>,
}

impl<D: Dom> ConfigPage<D> {
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
            &[
                Nav::link("/public/index.html", "Home"),
                Nav::Text(" .. "),
                Nav::titled("/public/sign-in.html", "Sign-in/out", "登入/登出"),
                Nav::Text(" .. "),
                Nav::link("/public/secret-key.html", "Password"),
                Nav::Text(" .. Config"),
            ],
        )?;
        let loading = widgets::loading(builder)?;
        loading.add_class("my-3");
        let alerts = ctx.alerts()?;
        alerts.component().add_class("my-3");
        let goto_sign_in = widgets::goto_sign_in(builder)?;
        goto_sign_in.add_class("my-3");

        let key_max_age = widgets::input(builder, "text")?;
        let msg_size_limit = widgets::input(builder, "text")?;
        let temp_limit = widgets::input(builder, "text")?;
        let every_page_limit = widgets::input(builder, "text")?;
        let time_offset = widgets::input(builder, "text")?;
        let form_alerts = ctx.alerts()?;
        let submit = builder.create("button", ComponentOptions::new().text("Submit"))?;

        let form = builder.create(
            "form",
            ComponentOptions::new().children([
                &widgets::form_item(
                    builder,
                    &key_max_age,
                    "Key Max Age",
                    "密钥有效期（单位：天），不可小于 1 天",
                    "mb-3",
                )?,
                &widgets::form_item(
                    builder,
                    &msg_size_limit,
                    "Message Size Limit",
                    "每条消息的长度上限 (单位: byte), 不可小于 256。",
                    "mb-3",
                )?,
                &widgets::form_item(
                    builder,
                    &temp_limit,
                    "Temporary Messages Limit",
                    "暂存消息条数上限，超过上限会自动删除旧消息。不可小于 1。",
                    "mb-3",
                )?,
                &widgets::form_item(
                    builder,
                    &every_page_limit,
                    "Every Page Limit",
                    "每页最多列出多少条消息，不可小于 1。",
                    "mb-3",
                )?,
                &widgets::form_item(
                    builder,
                    &time_offset,
                    "Timezone Offset",
                    "时区（例如 \"+8\" 表示北京时间, \"-5\" 表示纽约时间）, 建议不要频繁更改时区。",
                    "mb-3",
                )?,
                form_alerts.component(),
                &widgets::hidden_submit(builder)?,
                &submit,
            ]),
        )?;

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &loading,
            alerts.component(),
            &goto_sign_in,
            &form,
            &widgets::plain_footer(builder)?,
        ]);

        let lifecycle = Lifecycle::new(&loading, &[&form], Some(&goto_sign_in));

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            root,
            lifecycle,
            alerts,
            form,
            key_max_age,
            msg_size_limit,
            temp_limit,
            every_page_limit,
            time_offset,
            form_alerts,
            submit,
        });

        on_click(ctx, &page.submit, &page, |page| async move { page.submit().await });

        Ok(page)
    }

    /// Fill the form from the server.
    pub async fn load(&self) {
        self.ctx
            .api
            .exchange::<D>(api::get_config())
            .on_failure(|error| {
                if error.code() == ErrorCode::Unauthorized {
                    self.lifecycle.require_sign_in();
                } else {
                    self.lifecycle.fail();
                }

                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .send(|config: ConfigForm| {
                self.key_max_age.set_value(&config.key_max_age.to_string());
                self.msg_size_limit.set_value(&config.msg_size_limit.to_string());
                self.temp_limit.set_value(&config.temp_limit.to_string());
                self.every_page_limit
                    .set_value(&config.every_page_limit.to_string());
                self.time_offset.set_value(&config.time_offset);
                self.lifecycle.ready();
            })
            .await;
    }

    /// The form as entered, or the label of the first field that is not an
    /// integer.
    fn read_form(&self) -> Result<ConfigForm, &'static str> {
        let number = |input: &Component<D>, label: &'static str| input.trimmed_value().parse::<i64>().ok().ok_or(label);

        Ok(ConfigForm {
            key_max_age: number(&self.key_max_age, "Key Max Age")?,
            msg_size_limit: number(&self.msg_size_limit, "Message Size Limit")?,
            temp_limit: number(&self.temp_limit, "Temporary Messages Limit")?,
            every_page_limit: number(&self.every_page_limit, "Every Page Limit")?,
            time_offset: self.time_offset.trimmed_value(),
        })
    }

    /// Send the whole form back.
    pub async fn submit(&self) {
        if !self.lifecycle.is_ready() {
            return;
        }

        let form = match self.read_form() {
            Ok(form) => form,
            Err(label) => {
                self.form_alerts
                    .insert(AlertKind::Danger, &format!("{label} 必须是整数"));
                return;
            }
        };

        let request = match api::update_config(&form) {
            Ok(request) => request,
            Err(error) => {
                self.form_alerts.insert(AlertKind::Danger, &error.to_string());
                return;
            }
        };

        self.ctx
            .api
            .exchange::<D>(request)
            .button(&self.submit)
            .alerts(&self.form_alerts)
            .send(|reply: Option<Text>| {
                self.form.hide();
                self.alerts.clear().insert(AlertKind::Success, "更新成功");

                if let Some(warning) = reply.filter(|text| !text.message.is_empty()) {
                    self.alerts.insert(AlertKind::Info, &warning.message);
                }
            })
            .await;
    }
}

impl<D: Dom> Page<D> for ConfigPage<D> {
    fn title(&self) -> &'static str {
        "Config .. txt-online"
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.load().await });
    }
}
