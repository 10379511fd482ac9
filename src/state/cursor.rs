/// Cursor and id comparison definitions
///
/// A cursor is the id of the newest quote already saved for a feed. Whether a
/// freshly extracted id is "newer" depends on the configured `IdOrdering`.
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Rule used to compare quote ids with each other and with cursors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdOrdering {
    /// Ids are compared as unsigned integers, ignoring a leading `#`.
    ///
    /// Anything that does not parse (including the empty string) sorts below
    /// every number and is never newer than a cursor.
    #[default]
    Numeric,

    /// Byte-wise string comparison. `"99"` sorts after `"100"`, which is only
    /// correct while ids share a length; kept for compatibility with state
    /// files written by earlier archivers.
    Lexicographic,
}

impl IdOrdering {
    /// Compares two ids under this rule
    pub fn compare(self, a: &str, b: &str) -> Ordering {
        match self {
            Self::Lexicographic => a.cmp(b),
            Self::Numeric => match (numeric_key(a), numeric_key(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        }
    }

    /// Returns the greatest id of the iterator under this rule
    pub fn max_id<'a, I>(self, ids: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().max_by(|a, b| self.compare(a, b))
    }
}

impl fmt::Display for IdOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric => write!(f, "numeric"),
            Self::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

fn numeric_key(id: &str) -> Option<u64> {
    let id = id.trim();
    id.strip_prefix('#').unwrap_or(id).parse().ok()
}

/// High-water mark of a feed: the id of the newest quote already saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Sentinel for the main feed before the first run
    pub const MAIN_SENTINEL: &'static str = "0";

    /// Sentinel for the abyss-best feed before the first run
    pub const ABYSS_BEST_SENTINEL: &'static str = "#0";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if `id` is strictly newer than this cursor
    pub fn admits(&self, id: &str, ordering: IdOrdering) -> bool {
        ordering.compare(id, &self.0) == Ordering::Greater
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
