use std::{cell::RefCell, rc::Rc};

use crate::{
    alerts::{AlertKind, Alerts},
    api,
    dom::{BuildError, Component, ComponentOptions, Dom},
    models::{Bucket, Message},
    pages::{
        Context, Cursor, Lifecycle, MessageItem, Page, PageOutcome,
        message_item::append_items,
        on_click,
        widgets::{self, Nav},
    },
};

/// Which bucket a listing page walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Temporary,
    Permanent,
    Aliases,
}

impl Listing {
    #[must_use]
    pub const fn bucket(self) -> Bucket {
        match self {
            Self::Temporary => Bucket::Temporary,
            Self::Permanent => Bucket::Permanent,
            Self::Aliases => Bucket::Alias,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Temporary => "Temp Msg .. txt-online",
            Self::Permanent => "Perm Msg .. txt-online",
            Self::Aliases => "Aliases .. txt-online",
        }
    }

    fn nav(self) -> Vec<Nav<'static>> {
        let home = Nav::link("/public/index.html", "Home");
        let sep = Nav::Text(" .. ");
        let temp = Nav::link("/public/temp.html", "Temp");
        let perm = Nav::link("/public/perm.html", "Perm");

        match self {
            Self::Temporary => vec![home, sep, perm, Nav::Text(" .. Temporary Messages (暂存消息)")],
            Self::Permanent => vec![home, sep, temp, Nav::Text(" .. Permanent Messages (永久消息)")],
            Self::Aliases => vec![home, sep, perm, sep, temp, Nav::Text(" .. Aliases (有别名的消息)")],
        }
    }
}

/// A bucket listed page by page behind a "More" button.
#[derive(Debug)]
pub struct ListingPage<D: Dom> {
    ctx: Rc<Context<D>>,
    listing: Listing,
    root: Component<D>,
    lifecycle: Lifecycle<D>,
    alerts: Alerts<D>,
    list: Component<D>,
    more: Component<D>,
    more_area: Component<D>,
    cursor: RefCell<Cursor>,
    items: RefCell<Vec<Rc<MessageItem<D>>>>,
}

impl<D: Dom> ListingPage<D> {
    /// Build the page.
    ///
    /// # Errors
    ///
    /// Returns an error when an element cannot be created.
    pub fn build(ctx: &Rc<Context<D>>, listing: Listing) -> Result<Rc<Self>, BuildError> {
        let builder = &ctx.builder;

        let navbar = widgets::navbar(builder, "my-5", &listing.nav())?;
        let loading = widgets::loading(builder)?;
        loading.add_class("my-3");

        let list = builder.create("div", ComponentOptions::new().classes("mt-3"))?;
        let alerts = ctx.alerts()?;

        let more = builder.create("button", ComponentOptions::new().text("More"))?;
        let more_area = builder.create(
            "div",
            ComponentOptions::new().classes("mt-5 text-center").child(&more),
        )?;
        more_area.hide();

        let root = builder.element("div")?;
        root.append_all([
            &navbar,
            &loading,
            &list,
            alerts.component(),
            &more_area,
            &widgets::plain_footer(builder)?,
        ]);

        let lifecycle = Lifecycle::new(&loading, &[&list], None);

        let page = Rc::new(Self {
            ctx: Rc::clone(ctx),
            listing,
            root,
            lifecycle,
            alerts,
            list,
            more,
            more_area,
            cursor: RefCell::new(Cursor::new()),
            items: RefCell::new(Vec::new()),
        });

        on_click(ctx, &page.more, &page, |page| async move { page.load_more().await });

        Ok(page)
    }

    /// Fetch the page after the cursor and append it.
    pub async fn load_more(&self) {
        let bucket = self.listing.bucket();
        let start = self.cursor.borrow().position().to_string();

        self.ctx
            .api
            .exchange::<D>(api::more_items(bucket, &start, -1))
            .button(&self.more)
            .on_failure(|error| {
                self.lifecycle.fail();
                self.alerts.insert(AlertKind::Danger, &error.to_string());
            })
            .send(|messages: Option<Vec<Message>>| {
                let messages = messages.unwrap_or_default();
                let last = messages.last().map(|message| bucket.cursor_of(message));

                self.lifecycle.ready();

                let outcome = self.cursor.borrow_mut().apply(last);

                match outcome {
                    PageOutcome::FirstPage | PageOutcome::NextPage => {
                        match append_items(&self.ctx, &self.list, messages) {
                            Ok(items) => self.items.borrow_mut().extend(items),
                            Err(error) => self.alerts.insert(AlertKind::Danger, &error.to_string()),
                        }

                        if outcome == PageOutcome::FirstPage {
                            self.more_area.show();
                        }
                    }
                    PageOutcome::Exhausted => {
                        self.alerts.insert(AlertKind::Info, "没有更多了");
                        self.more_area.hide();
                    }
                    PageOutcome::Empty => self.alerts.insert(AlertKind::Info, "空空如也"),
                }
            })
            .await;
    }
}

impl<D: Dom> Page<D> for ListingPage<D> {
    fn title(&self) -> &'static str {
        self.listing.title()
    }

    fn root(&self) -> &Component<D> {
        &self.root
    }

    fn start(self: Rc<Self>) {
        let ctx = Rc::clone(&self.ctx);
        ctx.spawn(async move { self.load_more().await });
    }
}
