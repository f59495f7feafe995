use std::cell::Cell;

use crate::dom::{Component, Dom};

/// Where a page is in its initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Loading,

    /// Data arrived and the content is interactive.
    Ready,

    /// The load failed or a session is required.
    Error,
}

/// Loading/Ready/Error state machine over a page's top-level components.
///
/// Only `Loading` can be left; later transitions are ignored.
#[derive(Debug)]
pub struct Lifecycle<D: Dom> {
    state: Cell<PageState>,
    loading: Component<D>,
    content: Vec<Component<D>>,
    sign_in: Option<Component<D>>,
}

impl<D: Dom> Lifecycle<D> {
    /// Enter `Loading`: the indicator is shown, everything else hidden.
    #[must_use]
    pub fn new(loading: &Component<D>, content: &[&Component<D>], sign_in: Option<&Component<D>>) -> Self {
        loading.show();

        for component in content {
            component.hide();
        }

        if let Some(panel) = sign_in {
            panel.hide();
        }

        Self {
            state: Cell::new(PageState::Loading),
            loading: loading.clone(),
            content: content.iter().map(|component| (*component).clone()).collect(),
            sign_in: sign_in.cloned(),
        }
    }

    #[must_use]
    pub fn state(&self) -> PageState {
        self.state.get()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.get() == PageState::Ready
    }

    /// The "please sign in" panel, for pages gated on a session.
    #[must_use]
    pub fn sign_in_panel(&self) -> Option<&Component<D>> {
        self.sign_in.as_ref()
    }

    /// Show the content. Returns `false` if the page had already settled.
    pub fn ready(&self) -> bool {
        if !self.leave_loading(PageState::Ready) {
            return false;
        }

        if let Some(panel) = &self.sign_in {
            panel.hide();
        }

        for component in &self.content {
            component.show();
        }

        true
    }

    /// Settle in `Error`; the caller reports the failure.
    pub fn fail(&self) -> bool {
        self.leave_loading(PageState::Error)
    }

    /// Settle in `Error` and show the sign-in panel instead of the content.
    pub fn require_sign_in(&self) -> bool {
        if !self.leave_loading(PageState::Error) {
            return false;
        }

        if let Some(panel) = &self.sign_in {
            panel.show();
        }

        true
    }

    fn leave_loading(&self, next: PageState) -> bool {
        if self.state.get() != PageState::Loading {
            return false;
        }

        self.loading.hide();
        self.state.set(next);

        true
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use testresult::TestResult;

    use super::*;
    use crate::dom::{Builder, MemoryDom};

    #[test]
    fn ready_swaps_loading_for_content() -> TestResult {
        let builder = Builder::new(Rc::new(MemoryDom::new()));
        let loading = builder.element("div")?;
        let form = builder.element("form")?;
        let panel = builder.element("div")?;

        let lifecycle = Lifecycle::new(&loading, &[&form], Some(&panel));

        assert_eq!(lifecycle.state(), PageState::Loading);
        assert!(!form.is_visible());

        assert!(lifecycle.ready());
        assert!(!loading.is_visible());
        assert!(form.is_visible());
        assert!(!panel.is_visible());
        assert!(lifecycle.is_ready());

        Ok(())
    }

    #[test]
    fn sign_in_gate_never_shows_content() -> TestResult {
        let builder = Builder::new(Rc::new(MemoryDom::new()));
        let loading = builder.element("div")?;
        let form = builder.element("form")?;
        let panel = builder.element("div")?;

        let lifecycle = Lifecycle::new(&loading, &[&form], Some(&panel));

        assert!(lifecycle.require_sign_in());
        assert!(panel.is_visible());
        assert!(!form.is_visible());

        assert!(!lifecycle.ready(), "error is terminal");
        assert!(!form.is_visible());
        assert_eq!(lifecycle.state(), PageState::Error);

        Ok(())
    }

    #[test]
    fn fail_only_hides_loading() -> TestResult {
        let builder = Builder::new(Rc::new(MemoryDom::new()));
        let loading = builder.element("div")?;
        let list = builder.element("div")?;

        let lifecycle = Lifecycle::new(&loading, &[&list], None);

        assert!(lifecycle.fail());
        assert!(!loading.is_visible());
        assert!(!list.is_visible());
        assert!(!lifecycle.fail());

        Ok(())
    }
}
