use std::rc::Rc;

use jiff::tz::TimeZone;
use serde::de::IgnoredAny;

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Builder, Component, ComponentOptions, Dom},
    models::CurrentKey,
    pages::{
        Context, Page, on_click, reload_notice,
        widgets::{self, Nav, span},
    },
};

const ABOUT: &str = "本软件的安全措施分为 \"主密码\" 与 \"日常操作密钥\"。主密码的唯一用途是获取当前密钥或生成新密钥，\
                     其他操作如果要求输入密码，一律是指日常操作密钥（以下简称密钥）。";

const ABOUT_KEY: &str = "输入主密码，点击 Get Key 按钮可获取当前密钥。\
                         获取密钥后会出现 Generate 按钮，点击该按钮可生成新的密钥。\
                         一旦生成新密钥，旧密钥就会作废。";

/// Current key lookup, key rotation and master password change.
#[derive(Debug)]
pub struct SecretKeyPage<D: Dom> {
    ctx: Rc<Context<D>>,
    tz: TimeZone,
    root: Component<D>,
    password: Component<D>,
    get_key: Component<D>,
    generate: Component<D>,
    form_alerts: Alerts<D>,
    key_area: Component<D>,
    current_password: Component<D>,
    new_password: Component<D>,
    change: Component<D>,
    password_alerts: Alerts<D>,
}

impl<D: Dom> SecretKeyPage<D> {
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
            &[
                Nav::link("/public/index.html", "Home"),
                Nav::Text(" .. "),
                Nav::link("/public/sign-in.html", "Sign-in"),
                Nav::Text(" .. Key and Password"),
            ],
        )?;

        let about = builder.element("div")?;
        about.add_class("my-3").text(ABOUT);

        let username = widgets::input(builder, "text")?;
        username.attr("autocomplete", "username").hide();

        let password = widgets::input(builder, "password")?;
        password
            .add_class("form-textinput form-textinput-fat")
            .attr("autocomplete", "current-password");

        let form_alerts = ctx.alerts()?;
        let get_key = builder.create("button", ComponentOptions::new().text("Get key"))?;
        let generate = builder.create("button", ComponentOptions::new().classes("ml-2").text("Generate"))?;
        generate.hide();

        let buttons = builder.element("div")?;
        buttons.add_class("text-right").append_all([&get_key, &generate]);

        let label = builder.element("label")?;
        label
            .text("Master Password")
            .attr("for", password.id().unwrap_or_default());

        let fields = builder.element("div")?;
        fields.append_all([&username, &password, form_alerts.component(), &buttons]);

        let form = builder.create("form", ComponentOptions::new().children([&label, &fields]))?;

        let key_area = builder.create("div", ComponentOptions::new().classes("mb-5"))?;
        key_area.hide();

        let current_password = widgets::input(builder, "password")?;
        let new_password = widgets::input(builder, "text")?;
        let change = builder.create("button", ComponentOptions::new().text("Change Password"))?;
        let password_alerts = ctx.alerts()?;

        let current_item = widgets::form_item(builder, &current_password, "Current Password", "", "mb-3")?;
        current_item.attr("autocomplete", "current-password");
        let new_item = widgets::form_item(builder, &new_password, "New Password", "", "mb-3")?;
        new_item.attr("autocomplete", "new-password");

        let password_form = builder.create(
            "form",
            ComponentOptions::new().children([&current_item, &new_item, password_alerts.component(), &change]),
        )?;

        let about_password = section(builder, "Change Master Password", "可在此修改主密码。")?;
        about_password.add_class("mt-5");

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &about,
            &section(builder, "Secret Key", ABOUT_KEY)?,
            &form,
            &key_area,
            &about_password,
            &password_form,
            &widgets::footer(builder)?,
        ]);

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            tz: TimeZone::system(),
            root,
            password,
            get_key,
            generate,
            form_alerts,
            key_area,
            current_password,
            new_password,
            change,
            password_alerts,
        });

        on_click(ctx, &page.get_key, &page, |page| async move { page.get_current_key().await });
        on_click(ctx, &page.generate, &page, |page| async move { page.generate_key().await });
        on_click(ctx, &page.change, &page, |page| async move { page.change_password().await });

        Ok(page)
    }

    /// Show the current key; the button stays disabled once a key is shown.
    pub async fn get_current_key(&self) {
        let password = self.password.value();

        if password.is_empty() {
            self.ctx.focus_later(&self.password);
            return;
        }

        self.get_key.disable();

        self.ctx
            .api
            .exchange::<D>(api::get_current_key(&password))
            .on_failure(|error| {
                self.get_key.enable();
                self.form_alerts.insert(AlertKind::Danger, &error.to_string());
                self.ctx.focus_later(&self.password);
            })
            .send(|key: CurrentKey| {
                self.key_area.show();
                self.show_key(&key);
                self.generate.show();
                self.form_alerts.clear();
            })
            .await;
    }

    /// Replace the current key with a new one.
    pub async fn generate_key(&self) {
        let password = self.password.value();

        if password.is_empty() {
            self.ctx.focus_later(&self.password);
            return;
        }

        self.ctx
            .api
            .exchange::<D>(api::gen_new_key(&password))
            .button(&self.generate)
            .alerts(&self.form_alerts)
            .send(|key: CurrentKey| {
                self.show_key(&key);
                self.password.set_value("");
            })
            .await;
    }

    /// Change the master password, then reload.
    pub async fn change_password(&self) {
        let old = self.current_password.value();
        let new = self.new_password.value();

        if old.is_empty() || new.is_empty() {
            self.password_alerts
                .insert(AlertKind::Danger, "当前密码与新密码都必填");
            return;
        }

        self.ctx
            .api
            .exchange::<D>(api::change_password(&old, &new))
            .button(&self.change)
            .alerts(&self.password_alerts)
            .send(|_: IgnoredAny| {
                self.password_alerts.clear().insert(
                    AlertKind::Success,
                    &format!("已成功更改主密码。{}", reload_notice(&self.ctx)),
                );
                self.current_password.set_value("");
                self.new_password.set_value("");
                self.ctx.reload_later();
            })
            .await;
    }

    fn show_key(&self, key: &CurrentKey) {
        self.key_area.clear();

        if let Err(error) = self.render_key(key) {
            self.form_alerts.insert(AlertKind::Danger, &error.to_string());
        }
    }

    fn render_key(&self, key: &CurrentKey) -> Result<(), BuildError> {
        let builder = &self.ctx.builder;
        let expires = key.expires_date(&self.tz);

        let value = builder.element("input")?;
        value.add_class("ml-2").set_value(&key.key).prop("readOnly", true);

        let key_row = builder.element("div")?;
        key_row.append(&span(builder, "Current Key")?).append(&value);

        let starts = builder.element("div")?;
        starts.text(&format!("生效日期: {}", key.starts_date(&self.tz)));

        let max_age = builder.element("div")?;
        max_age.text(&format!("有效期: {} (天)", key.max_age));

        let (status, class, note) = if key.is_good {
            ("有效", "alert-success", format!("(该密钥将于 {expires} 自动作废)"))
        } else {
            ("已过期", "alert-danger", format!("该密钥已于 {expires} 作废"))
        };

        let badge = span(builder, status)?;
        badge.add_class(class);

        let status_row = builder.element("div")?;
        status_row.append(&span(builder, "状态: ")?).append(&badge);

        let expiry = builder.element("div")?;
        expiry.add_class("form-text").text(&note);

        self.key_area
            .append_all([&key_row, &starts, &max_age, &status_row, &expiry]);

        Ok(())
    }
}

fn section<D: Dom>(builder: &Builder<D>, heading: &str, text: &str) -> Result<Component<D>, BuildError> {
    let title = builder.element("h3")?;
    title.add_class("mb-0").text(heading);

    let paragraph = builder.element("p")?;
    paragraph.text(text);

    builder.create(
        "div",
        ComponentOptions::new().children([&title, &builder.element("hr")?, &paragraph]),
    )
}

impl<D: Dom> Page<D> for SecretKeyPage<D> {
    fn title(&self) -> &'static str {
        "Password .. txt-online"
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        self.ctx.focus_later(&self.password);
    }
}
