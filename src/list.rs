//! Key listing and cursor pagination.
//!
//! A page is complete only when it comes back shorter than the requested
//! limit. A full page always means "ask again with the cursor", whatever the
//! server says.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::error::Result;
use crate::validate::validate_list_limit;
use crate::value::Numeric;

/// Options for `list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub prefix: Option<String>,
    /// Page size, 1 to 1000. Defaults to 1000.
    pub limit: Option<Numeric>,
    /// Cursor from a previous page, passed back verbatim.
    pub cursor: Option<String>,
}

impl ListOptions {
    /// Create options with no prefix, the default limit, and no cursor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only list keys starting with `prefix`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Maximum keys per page (1 to 1000).
    pub fn limit(mut self, limit: impl Into<Numeric>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Resume after the page that returned `cursor`.
    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// One key in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListKey {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Json>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage {
    pub keys: Vec<ListKey>,
    /// Opaque continuation token.
    pub cursor: Option<String>,
    /// True iff fewer keys came back than were asked for.
    pub list_complete: bool,
}

impl ListPage {
    pub(crate) fn new(keys: Vec<ListKey>, cursor: Option<String>, limit: u32) -> Self {
        let list_complete = keys.len() < limit as usize;
        Self {
            keys,
            cursor,
            list_complete,
        }
    }
}

/// Validated list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListQuery {
    pub prefix: Option<String>,
    pub limit: u32,
    pub cursor: Option<String>,
}

impl ListQuery {
    /// Validate the limit and drop empty prefix/cursor values.
    pub fn from_options(options: &ListOptions) -> Result<Self> {
        let limit = validate_list_limit(options.limit.as_ref())?;
        let non_empty = |s: &Option<String>| s.clone().filter(|s| !s.is_empty());
        Ok(Self {
            prefix: non_empty(&options.prefix),
            limit,
            cursor: non_empty(&options.cursor),
        })
    }

    /// Query-string pairs. `limit` is always present.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(prefix) = &self.prefix {
            pairs.push(("prefix", prefix.clone()));
        }
        pairs.push(("limit", self.limit.to_string()));
        if let Some(cursor) = &self.cursor {
            pairs.push(("cursor", cursor.clone()));
        }
        pairs
    }
}

/// `{"result": [...], "result_info": {"cursor": ...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListEnvelope {
    #[serde(default)]
    result: Vec<ListKey>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    cursor: Option<String>,
}

impl ListEnvelope {
    /// Reshape into a page, deriving `list_complete` from `limit`.
    pub fn into_page(self, limit: u32) -> ListPage {
        let cursor = self.result_info.and_then(|info| info.cursor);
        ListPage::new(self.result, cursor, limit)
    }
}
