//! Alert log.
//!
//! [`AlertLog`] is the bounded, newest-first list of timestamped status
//! messages. [`Alerts`] renders one onto a component.

use std::{
    cell::RefCell,
    collections::VecDeque,
    fmt::{Display, Formatter, Result as FmtResult},
    rc::Rc,
};

use jiff::{Zoned, civil::Time};
use tracing::warn;

use crate::dom::{BuildError, Builder, Component, ComponentOptions, Dom};

/// Entries kept when no maximum is given.
pub const DEFAULT_ALERT_MAX: i32 = 3;

/// Severity of an alert entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
    Info,
    Primary,
}

impl AlertKind {
    /// Name used in the `alert-<kind>` class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Danger => "danger",
            Self::Info => "info",
            Self::Primary => "primary",
        }
    }
}

impl Display for AlertKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One immutable alert entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEntry {
    pub kind: AlertKind,
    pub time: Time,
    pub text: String,
}

impl AlertEntry {
    /// `HH:mm:ss text`, as displayed.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{} {}", self.time.strftime("%H:%M:%S"), self.text)
    }
}

/// Bounded, newest-first alert list.
#[derive(Debug, Clone)]
pub struct AlertLog {
    max: i32,
    entries: VecDeque<AlertEntry>,
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_MAX)
    }
}

impl AlertLog {
    /// A log that keeps at most `max` entries; `max <= 0` keeps everything.
    #[must_use]
    pub fn new(max: i32) -> Self {
        Self {
            max,
            entries: VecDeque::new(),
        }
    }

    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }

    /// Insert an entry stamped with the current local time.
    ///
    /// Returns `true` when the oldest entry was dropped to make room.
    pub fn insert(&mut self, kind: AlertKind, text: impl Into<String>) -> bool {
        self.insert_at(kind, Zoned::now().time(), text)
    }

    /// Insert an entry with an explicit timestamp.
    pub fn insert_at(&mut self, kind: AlertKind, time: Time, text: impl Into<String>) -> bool {
        self.push(AlertEntry {
            kind,
            time,
            text: text.into(),
        })
    }

    /// Insert a prepared entry.
    ///
    /// Danger entries are mirrored to the log so they survive the list cap.
    pub fn push(&mut self, entry: AlertEntry) -> bool {
        if entry.kind == AlertKind::Danger {
            warn!(target: "txt::alerts", "{}", entry.line());
        }

        self.entries.push_front(entry);

        let over = usize::try_from(self.max).is_ok_and(|max| max > 0 && self.entries.len() > max);

        if over {
            self.entries.pop_back();
        }

        over
    }

    /// Drop every entry.
    pub fn clear(&mut self) -> &mut Self {
        self.entries.clear();
        self
    }
}

/// An [`AlertLog`] rendered into a `div`.
#[derive(Debug)]
pub struct Alerts<D: Dom> {
    log: RefCell<AlertLog>,
    container: Component<D>,
    builder: Rc<Builder<D>>,
}

impl<D: Dom> Alerts<D> {
    /// Create an empty alert list keeping at most `max` entries.
    ///
    /// # Errors
    ///
    /// Returns an error when the container cannot be created.
    pub fn new(builder: &Rc<Builder<D>>, max: i32) -> Result<Self, BuildError> {
        let container = builder.create("div", ComponentOptions::new())?;

        Ok(Self {
            log: RefCell::new(AlertLog::new(max)),
            container,
            builder: Rc::clone(builder),
        })
    }

    /// The list container, for placing on the page.
    #[must_use]
    pub fn component(&self) -> &Component<D> {
        &self.container
    }

    /// Snapshot of the underlying log.
    #[must_use]
    pub fn log(&self) -> AlertLog {
        self.log.borrow().clone()
    }

    /// Prepend a timestamped entry, dropping the oldest one past the cap.
    ///
    /// The log only changes once the entry's node exists, so the list on the
    /// page always matches [`Alerts::log`].
    pub fn insert(&self, kind: AlertKind, text: &str) {
        let entry = AlertEntry {
            kind,
            time: Zoned::now().time(),
            text: text.to_string(),
        };

        let item = match self.item(&entry) {
            Ok(item) => item,
            Err(source) => {
                warn!(target: "txt::alerts", "cannot render alert {:?}: {source}", entry.line());
                return;
            }
        };

        let evicted = self.log.borrow_mut().push(entry);

        self.container.prepend(&item);

        if evicted {
            self.container.remove_last_child();
        }
    }

    /// Empty the list.
    pub fn clear(&self) -> &Self {
        self.log.borrow_mut().clear();
        self.container.clear();
        self
    }

    fn item(&self, entry: &AlertEntry) -> Result<Component<D>, BuildError> {
        let line = self.builder.element("span")?;
        line.text(&entry.line());

        let item = self.builder.element("div")?;
        item.add_class(&format!("alert alert-{} my-1", entry.kind))
            .append(&line);

        Ok(item)
    }
}
