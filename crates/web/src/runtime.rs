//! [`Runtime`] backed by the browser window.

use std::time::Duration;

use futures::{FutureExt, future::LocalBoxFuture};
use js_sys::{Function, Promise};
use tracing::warn;
use txt_client::runtime::{Runtime, RuntimeError};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use wasm_bindgen_futures::JsFuture;
use web_sys::{UrlSearchParams, Window};

use crate::dom::js_message;

/// Timers, tasks and navigation of one browser window.
#[derive(Debug, Clone)]
pub struct BrowserRuntime {
    window: Window,
}

impl BrowserRuntime {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

fn timeout_ms(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}

impl Runtime for BrowserRuntime {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let window = self.window.clone();
        let delay = timeout_ms(duration);

        let mut executor = move |resolve: Function, _reject: Function| {
            let callback = Closure::once_into_js(move || {
                if let Err(error) = resolve.call0(&JsValue::NULL) {
                    warn!("timer callback failed: {}", js_message(&error));
                }
            });

            if let Err(error) =
                window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
            {
                warn!("cannot schedule timer: {}", js_message(&error));
            }
        };

        let promise = Promise::new(&mut executor);

        async move {
            if let Err(error) = JsFuture::from(promise).await {
                warn!("timer failed: {}", js_message(&error));
            }
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn reload(&self) {
        if let Err(error) = self.window.location().reload() {
            warn!("cannot reload: {}", js_message(&error));
        }
    }

    fn query_param(&self, name: &str) -> Option<String> {
        let search = self.window.location().search().ok()?;

        UrlSearchParams::new_with_str(&search).ok()?.get(name)
    }

    fn copy_text(&self, text: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
        let promise = self.window.navigator().clipboard().write_text(text);

        async move {
            JsFuture::from(promise)
                .await
                .map(drop)
                .map_err(|error| RuntimeError::Clipboard(js_message(&error)))
        }
        .boxed_local()
    }

    fn set_title(&self, title: &str) {
        if let Some(document) = self.window.document() {
            document.set_title(title);
        }
    }
}
