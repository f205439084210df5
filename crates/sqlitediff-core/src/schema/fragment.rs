//! Raw SQL fragments captured by the parser.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

use crate::lexer::{mentions_identifier, normalize_sql};

/// A span of SQL text kept verbatim, compared by its normalized form.
///
/// `DEFAULT`, `CHECK`, `REFERENCES`, declared types and table options are
/// never interpreted; two fragments are equal when their token streams
/// normalize to the same key.
#[derive(Debug, Clone)]
pub struct Fragment {
    text: String,
    normalized: String,
}

impl Fragment {
    /// Captures `text`.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = normalize_sql(&text);
        Self { text, normalized }
    }

    /// The verbatim source text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The normalized comparison key.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True if the normalized form equals `keyword` (already upper-case).
    #[must_use]
    pub fn is(&self, keyword: &str) -> bool {
        self.normalized == keyword
    }

    /// True if the fragment names `identifier` anywhere.
    #[must_use]
    pub fn mentions(&self, identifier: &str) -> bool {
        mentions_identifier(&self.text, identifier)
    }
}

impl PartialEq for Fragment {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for Fragment {}

impl PartialOrd for Fragment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fragment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized.cmp(&other.normalized)
    }
}

impl Hash for Fragment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
