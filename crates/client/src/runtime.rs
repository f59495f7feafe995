//! Host services a page needs besides the DOM: timers, task spawning,
//! navigation and the clipboard.

use std::{rc::Rc, time::Duration};

use futures::{FutureExt, future::LocalBoxFuture};
use thiserror::Error;

use crate::dom::{Component, Dom};

/// A host service call failed.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
}

/// Timers, task spawning and browser navigation.
pub trait Runtime {
    /// Resolve after `duration`.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;

    /// Run `task` to completion in the background.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// Reload the current page.
    fn reload(&self);

    /// Value of `name` in the current URL's query string.
    fn query_param(&self, name: &str) -> Option<String>;

    /// Put `text` on the system clipboard.
    fn copy_text(&self, text: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>>;

    fn set_title(&self, title: &str);
}

/// Reload the page once `delay` has passed.
pub fn schedule_reload(runtime: &Rc<dyn Runtime>, delay: Duration) {
    let handle = Rc::clone(runtime);

    runtime.spawn(
        async move {
            handle.sleep(delay).await;
            handle.reload();
        }
        .boxed_local(),
    );
}

/// Focus `component` once `delay` has passed, giving it time to become
/// visible.
pub fn focus_later<D: Dom>(runtime: &Rc<dyn Runtime>, delay: Duration, component: &Component<D>) {
    let handle = Rc::clone(runtime);
    let component = component.clone();

    runtime.spawn(
        async move {
            handle.sleep(delay).await;
            component.focus();
        }
        .boxed_local(),
    );
}
