/// What a freshly received page means for a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// First non-empty page: show the "more" control.
    FirstPage,

    /// A later non-empty page.
    NextPage,

    /// Empty page after earlier data: hide the "more" control.
    Exhausted,

    /// Empty first page: nothing stored at all.
    Empty,
}

/// Pagination cursor: the key of the last item received, empty before the
/// first page.
///
/// Whether a page has arrived is tracked on its own, since a received key may
/// itself be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    last: String,
    advanced: bool,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value to send as the next `start`.
    #[must_use]
    pub fn position(&self) -> &str {
        &self.last
    }

    /// Whether no non-empty page has been received yet.
    #[must_use]
    pub fn is_start(&self) -> bool {
        !self.advanced
    }

    /// Record a received page by the key of its last item, `None` when the
    /// page was empty.
    pub fn apply(&mut self, last_key: Option<String>) -> PageOutcome {
        match last_key {
            Some(key) => {
                let outcome = if self.is_start() {
                    PageOutcome::FirstPage
                } else {
                    PageOutcome::NextPage
                };

                self.last = key;
                self.advanced = true;
                outcome
            }
            None if self.is_start() => PageOutcome::Empty,
            None => PageOutcome::Exhausted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_through_every_outcome() {
        let mut cursor = Cursor::new();

        assert_eq!(cursor.apply(Some("b".into())), PageOutcome::FirstPage);
        assert_eq!(cursor.position(), "b");
        assert_eq!(cursor.apply(Some("d".into())), PageOutcome::NextPage);
        assert_eq!(cursor.position(), "d");
        assert_eq!(cursor.apply(None), PageOutcome::Exhausted);
        assert_eq!(cursor.position(), "d");
    }

    #[test]
    fn empty_first_page_is_empty() {
        let mut cursor = Cursor::new();

        assert_eq!(cursor.apply(None), PageOutcome::Empty);
        assert!(cursor.is_start());
    }

    #[test]
    fn empty_key_still_advances() {
        let mut cursor = Cursor::new();

        assert_eq!(cursor.apply(Some(String::new())), PageOutcome::FirstPage);
        assert!(!cursor.is_start());
        assert_eq!(cursor.position(), "");
        assert_eq!(cursor.apply(None), PageOutcome::Exhausted);
    }
}
