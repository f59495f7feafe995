//! Wire models shared with the txt server.
//!
//! Field names follow the server's JSON exactly, so most structs rename to
//! `PascalCase` on the wire.

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::{Timestamp, tz::TimeZone};
use serde::{Deserialize, Serialize};

/// Message bucket a [`Message`] lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Count-capped bucket, pruned oldest-first by the server.
    #[serde(rename = "Category-Temporary")]
    Temporary,

    /// Uncapped bucket.
    #[serde(rename = "Category-Permanent")]
    Permanent,
}

impl Category {
    /// Prefix used in front of the display index.
    #[must_use]
    pub const fn index_prefix(self) -> char {
        match self {
            Self::Temporary => 'T',
            Self::Permanent => 'P',
        }
    }

    /// The category a toggle moves a message into.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Temporary => Self::Permanent,
            Self::Permanent => Self::Temporary,
        }
    }

    /// Human readable name shown in alerts.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Temporary => "暂存消息",
            Self::Permanent => "永久消息",
        }
    }

    /// Name as the server spells it.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Temporary => "Category-Temporary",
            Self::Permanent => "Category-Permanent",
        }
    }
}

/// A stored text message.
///
/// `index` is recomputed by the server after every add, delete or toggle and
/// must never be used as an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    /// Date-derived id, e.g. `20240101120000`.
    #[serde(rename = "ID")]
    pub id: String,

    /// Owner reference, unused.
    #[serde(rename = "UserID", default)]
    pub user_id: String,

    /// Optional alias, empty when unset.
    #[serde(default)]
    pub alias: String,

    /// Message body.
    pub msg: String,

    /// Bucket the message belongs to.
    pub cat: Category,

    /// Ephemeral position inside its category.
    #[serde(default)]
    pub index: i64,
}

impl Message {
    /// Display label such as `T3` or `P12`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.cat.index_prefix(), self.index)
    }

    /// DOM id for the rendered item. Message ids start with a digit, which
    /// is not a valid component id, so they get an `i` prefix.
    #[must_use]
    pub fn element_id(&self) -> String {
        format!("i{}", self.id)
    }
}

/// Alias to message mapping returned by `get-all-aliases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// The alias string.
    #[serde(rename = "ID")]
    pub id: String,

    /// Id of the message that owns the alias.
    #[serde(rename = "MsgID")]
    pub msg_id: String,
}

/// Server settings, edited and submitted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConfigForm {
    /// Key max age in days.
    pub key_max_age: i64,

    /// Per-message size limit in bytes.
    pub msg_size_limit: i64,

    /// Maximum number of temporary messages.
    pub temp_limit: i64,

    /// Items listed per page.
    pub every_page_limit: i64,

    /// Timezone offset such as `"+8"`.
    pub time_offset: String,
}

/// The current daily-use secret key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CurrentKey {
    /// The key itself.
    pub key: String,

    /// Activation time, unix seconds.
    pub starts: i64,

    /// Max age in days.
    pub max_age: i64,

    /// Expiry time, unix seconds.
    pub expires: i64,

    /// Whether the key is still valid.
    pub is_good: bool,
}

impl CurrentKey {
    /// Activation date as `YYYY-MM-DD` in `tz`.
    #[must_use]
    pub fn starts_date(&self, tz: &TimeZone) -> String {
        format_date(self.starts, tz)
    }

    /// Expiry date as `YYYY-MM-DD` in `tz`.
    #[must_use]
    pub fn expires_date(&self, tz: &TimeZone) -> String {
        format_date(self.expires, tz)
    }
}

fn format_date(unix_seconds: i64, tz: &TimeZone) -> String {
    Timestamp::from_second(unix_seconds).map_or_else(
        |_| unix_seconds.to_string(),
        |timestamp| timestamp.to_zoned(tz.clone()).strftime("%Y-%m-%d").to_string(),
    )
}

/// Plain message wrapper the server uses for ids, warnings and errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// The message; may be empty.
    #[serde(default)]
    pub message: String,
}

/// Storage bucket addressed by `get-more-items`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bucket {
    /// Temporary messages.
    #[serde(rename = "temporary-bucket")]
    Temporary,

    /// Permanent messages.
    #[serde(rename = "permanent-bucket")]
    Permanent,

    /// Messages that carry an alias.
    #[serde(rename = "alias-bucket")]
    Alias,
}

impl Bucket {
    /// Cursor value for the next page, taken from the last item received.
    ///
    /// The alias bucket is keyed by alias, the others by message id.
    #[must_use]
    pub fn cursor_of(self, message: &Message) -> String {
        match self {
            Self::Alias => message.alias.clone(),
            Self::Temporary | Self::Permanent => message.id.clone(),
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Temporary => "temporary-bucket",
            Self::Permanent => "permanent-bucket",
            Self::Alias => "alias-bucket",
        })
    }
}
