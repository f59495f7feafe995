//! Page controllers.
//!
//! Each page owns its components and per-page state as fields of one
//! controller struct, built once by [`mount`] and then driven by DOM events.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    future::Future,
    rc::Rc,
};

use futures::FutureExt;

use crate::{
    alerts::Alerts,
    dom::{BuildError, Builder, Component, Dom},
    request::{ApiClient, Transport},
    runtime::{self, Runtime},
    settings::Settings,
};

mod config;
mod cursor;
mod edit;
mod home;
mod lifecycle;
mod listing;
mod message_item;
mod search;
mod secret_key;
mod sign_in;
pub mod widgets;

pub use config::ConfigPage;
pub use cursor::{Cursor, PageOutcome};
pub use edit::EditPage;
pub use home::{HomePage, HomeVariant};
pub use lifecycle::{Lifecycle, PageState};
pub use listing::{Listing, ListingPage};
pub use message_item::MessageItem;
pub use search::SearchPage;
pub use secret_key::SecretKeyPage;
pub use sign_in::SignInPage;

/// Which controller a URL path maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Sign-in check, add form and recent messages.
    Home,

    /// Add form only; stays on the page after sending.
    QuickAdd,

    Temporary,
    Permanent,
    Aliases,
    Search,
    SignIn,
    Config,
    Edit,
    SecretKey,
}

impl PageKind {
    /// Map a URL path such as `/public/perm.html` to a page.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let file = path.rsplit('/').next().unwrap_or_default();

        let kind = match file {
            "" | "index.html" => Self::Home,
            "quick.html" => Self::QuickAdd,
            "temp.html" => Self::Temporary,
            "perm.html" => Self::Permanent,
            "alias.html" => Self::Aliases,
            "search.html" => Self::Search,
            "sign-in.html" => Self::SignIn,
            "config.html" => Self::Config,
            "edit.html" => Self::Edit,
            "secret-key.html" => Self::SecretKey,
            _ => return None,
        };

        Some(kind)
    }
}

/// A mounted page controller.
pub trait Page<D: Dom> {
    /// Document title.
    fn title(&self) -> &'static str;

    /// Top-level node holding everything the page renders.
    fn root(&self) -> &Component<D>;

    /// Kick off the initial load.
    fn start(self: Rc<Self>);
}

/// Everything a controller needs from its surroundings.
pub struct Context<D: Dom> {
    pub builder: Rc<Builder<D>>,
    pub api: ApiClient,
    pub runtime: Rc<dyn Runtime>,
    pub settings: Rc<Settings>,
}

impl<D: Dom> Debug for Context<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Context")
            .field("builder", &self.builder)
            .field("api", &self.api)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<D: Dom> Context<D> {
    #[must_use]
    pub fn new(dom: Rc<D>, transport: Rc<dyn Transport>, runtime: Rc<dyn Runtime>, settings: Settings) -> Rc<Self> {
        let settings = Rc::new(settings);

        Rc::new(Self {
            builder: Rc::new(Builder::new(dom)),
            api: ApiClient::new(transport, Rc::clone(&runtime), Rc::clone(&settings)),
            runtime,
            settings,
        })
    }

    /// A fresh alert list with the configured cap.
    ///
    /// # Errors
    ///
    /// Returns an error when the container cannot be created.
    pub fn alerts(&self) -> Result<Alerts<D>, BuildError> {
        Alerts::new(&self.builder, self.settings.alert_max)
    }

    /// Run `task` in the background.
    pub fn spawn(&self, task: impl Future<Output = ()> + 'static) {
        self.runtime.spawn(task.boxed_local());
    }

    /// Reload the page after the configured delay.
    pub fn reload_later(&self) {
        runtime::schedule_reload(&self.runtime, self.settings.reload_delay());
    }

    /// Focus `component` after the configured delay.
    pub fn focus_later(&self, component: &Component<D>) {
        runtime::focus_later(&self.runtime, self.settings.focus_delay(), component);
    }
}

/// `N 秒后会自动刷新页面。` for the configured reload delay.
pub(crate) fn reload_notice<D: Dom>(ctx: &Context<D>) -> String {
    format!("{} 秒后会自动刷新页面。", ctx.settings.reload_delay().as_secs())
}

/// Run `action` on `target` in the background whenever `component` is
/// clicked.
pub(crate) fn on_click<D, T, F, Fut>(ctx: &Context<D>, component: &Component<D>, target: &Rc<T>, action: F)
where
    D: Dom,
    T: 'static,
    F: Fn(Rc<T>) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let runtime = Rc::clone(&ctx.runtime);
    let target = Rc::clone(target);

    component.on("click", move || runtime.spawn(action(Rc::clone(&target)).boxed_local()));
}

/// Build the controller for `kind`, attach it under `root` and start it.
///
/// # Errors
///
/// Returns an error when the page cannot be built.
pub fn mount<D: Dom>(ctx: &Rc<Context<D>>, kind: PageKind, root: &Component<D>) -> Result<Rc<dyn Page<D>>, BuildError> {
    // The full home page lists recent items, so it reloads after an add to
    // refresh their indexes. The quick-add page has no list; it clears the
    // input and reports the new id instead.
    let page: Rc<dyn Page<D>> = match kind {
        PageKind::Home => HomePage::build(ctx, HomeVariant::Full)?,
        PageKind::QuickAdd => HomePage::build(ctx, HomeVariant::Compact)?,
        PageKind::Temporary => ListingPage::build(ctx, Listing::Temporary)?,
        PageKind::Permanent => ListingPage::build(ctx, Listing::Permanent)?,
        PageKind::Aliases => ListingPage::build(ctx, Listing::Aliases)?,
        PageKind::Search => SearchPage::build(ctx)?,
        PageKind::SignIn => SignInPage::build(ctx)?,
        PageKind::Config => ConfigPage::build(ctx)?,
        PageKind::Edit => EditPage::build(ctx)?,
        PageKind::SecretKey => SecretKeyPage::build(ctx)?,
    };

    tracing::debug!(?kind, title = page.title(), "mounting page");

    root.append(page.root());
    ctx.runtime.set_title(page.title());
    Rc::clone(&page).start();

    Ok(page)
}
