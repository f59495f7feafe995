use std::rc::Rc;

use serde::de::IgnoredAny;

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    pages::{
        Context, Lifecycle, Page, on_click,
        widgets::{self, Nav},
    },
    request::ErrorCode,
};

/// Session check, sign-in form and sign-out button.
#[derive(Debug)]
pub struct SignInPage<D: Dom> {
    ctx: Rc<Context<D>>,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    form: Component<D>,
    password: Component<D>,
    submit: Component<D>,
    goto_get_key: Component<D>,
    sign_out_area: Component<D>,
    sign_out: Component<D>,
}

impl<D: Dom> SignInPage<D> {
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
                Nav::link("/public/index.html", "home"),
                Nav::Text(" .. "),
                Nav::link("/public/secret-key.html", "get secret key"),
                Nav::Text(" .. Sign-in"),
            ],
        )?;
        let loading = widgets::loading(builder)?;
        loading.add_class("my-3");
        let alerts = ctx.alerts()?;

        // Password managers look for a username field next to the password.
        let username = widgets::input(builder, "text")?;
        username.attr("autocomplete", "username").hide();

        let password = widgets::input(builder, "password")?;
        password.attr("autocomplete", "current-password");

        let submit = builder.create("button", ComponentOptions::new().classes("ml-1").text("Sign in"))?;

        let label = builder.element("label")?;
        label
            .text("Secret Key")
            .attr("for", password.id().unwrap_or_default());

        let row = builder.element("div")?;
        row.append_all([&username, &password, &submit]);

        let form = builder.create("form", ComponentOptions::new().children([&label, &row]))?;
        form.hide();

        let goto_get_key = builder.element("div")?;
        goto_get_key
            .append(&widgets::span(builder, "获取密钥或重新生成密钥 ➡ ")?)
            .append(&widgets::link(builder, "/public/secret-key.html", "/public/secret-key.html")?)
            .hide();

        let sign_out = builder.create("button", ComponentOptions::new().text("Sign out"))?;
        let sign_out_area = builder.create("div", ComponentOptions::new().classes("my-5").child(&sign_out))?;
        sign_out_area.hide();

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &loading,
            &form,
            alerts.component(),
            &goto_get_key,
            &sign_out_area,
            &widgets::footer(builder)?,
        ]);

        let lifecycle = Lifecycle::new(&loading, &[], None);

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            root,
            lifecycle,
            alerts,
            form,
            password,
            submit,
            goto_get_key,
            sign_out_area,
            sign_out,
        });

        on_click(ctx, &page.submit, &page, |page| async move { page.sign_in().await });
        on_click(ctx, &page.sign_out, &page, |page| async move { page.sign_out().await });

        Ok(page)
    }

    /// Show the sign-out button when a session exists, the form otherwise.
    pub async fn check_sign_in(&self) {
        self.ctx
            .api
            .exchange::<D>(api::is_signed_in())
            .on_failure(|error| {
                self.lifecycle.fail();
                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .send(|yes: bool| {
                self.lifecycle.ready();

                if yes {
                    self.alerts.insert(AlertKind::Info, "已登入");
                    self.sign_out_area.show();
                } else {
                    self.form.show();
                    self.ctx.focus_later(&self.password);
                }
            })
            .await;
    }

    /// Exchange the entered key or master password for a session.
    pub async fn sign_in(&self) {
        let password = self.password.value();

        if password.is_empty() {
            self.ctx.focus_later(&self.password);
            return;
        }

        self.ctx
            .api
            .exchange::<D>(api::sign_in(&password))
            .button(&self.submit)
            .on_failure(|error| {
                if error.code() == ErrorCode::Unauthorized {
                    self.alerts.insert(AlertKind::Danger, "密码错误");
                    self.goto_get_key.show();
                } else {
                    self.alerts.insert(AlertKind::Danger, &error.to_string());
                }
            })
            .on_always(|| self.ctx.focus_later(&self.password))
            .send(|_: IgnoredAny| {
                self.password.set_value("");
                self.form.hide();
                self.alerts.clear().insert(AlertKind::Success, "成功登入");
                self.sign_out_area.show();
                self.goto_get_key.hide();
            })
            .await;
    }

    /// End the session and bring the form back.
    pub async fn sign_out(&self) {
        self.ctx
            .api
            .exchange::<D>(api::sign_out())
            .button(&self.sign_out)
            .alerts(&self.alerts)
            .send(|_: IgnoredAny| {
                self.alerts.clear().insert(AlertKind::Info, "已登出");
                self.sign_out_area.hide();
                self.form.show();
                self.ctx.focus_later(&self.password);
            })
            .await;
    }
}

impl<D: Dom> Page<D> for SignInPage<D> {
    fn title(&self) -> &'static str {
        "Sign-in .. txt"
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.check_sign_in().await });
    }
}
