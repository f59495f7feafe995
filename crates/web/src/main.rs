//! Browser entry point for the txt web pages.
//!
//! Every page loads the same bundle; the page to build is picked from the
//! location path and mounted under the `#root` element.

use std::rc::Rc;

use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::util::TryInitError;
use txt_client::{
    dom::{BuildError, Dom, DomError},
    pages::{self, Context, PageKind},
    settings::Settings,
};
use wasm_bindgen::JsValue;

use crate::{dom::WebDom, runtime::BrowserRuntime, transport::ReqwestTransport};

mod dom;
mod observability;
mod runtime;
mod transport;

const SETTINGS_YAML: &str = include_str!("../config/txt.yml");

/// Errors that stop a page from starting.
#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to initialise logging: {0}")]
    Logging(#[from] TryInitError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error("cannot read the page location: {0}")]
    Location(String),

    #[error("no page is served at {0:?}")]
    UnknownPage(String),

    #[error("the document has no #root element")]
    NoRoot,

    #[error("failed to build the page: {0}")]
    Build(#[from] BuildError),
}

fn main() {
    console_error_panic_hook::set_once();

    if let Err(error) = run() {
        web_sys::console::error_1(&JsValue::from_str(&error.to_string()));
    }
}

fn run() -> Result<(), StartupError> {
    let (settings, invalid) = match Settings::from_yaml(SETTINGS_YAML) {
        Ok(settings) => (settings, None),
        Err(error) => (Settings::default(), Some(error)),
    };

    observability::init(&settings)?;

    if let Some(error) = invalid {
        warn!("invalid settings, using defaults: {error}");
    }

    let window = web_sys::window().ok_or(DomError::NoDocument)?;
    let location = window.location();
    let path = location
        .pathname()
        .map_err(|error| StartupError::Location(dom::js_message(&error)))?;
    let origin = location
        .origin()
        .map_err(|error| StartupError::Location(dom::js_message(&error)))?;

    let kind = PageKind::from_path(&path).ok_or_else(|| StartupError::UnknownPage(path.clone()))?;

    let dom = Rc::new(WebDom::new()?);
    let root = dom.element_by_id("root").ok_or(StartupError::NoRoot)?;

    let ctx = Context::new(
        dom,
        Rc::new(ReqwestTransport::new(origin)),
        Rc::new(BrowserRuntime::new(window)),
        settings,
    );

    let root = ctx.builder.wrap(root);
    pages::mount(&ctx, kind, &root)?;

    info!(?kind, %path, "page started");

    Ok(())
}
