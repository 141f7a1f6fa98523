use chrono::NaiveDateTime;

use crate::domain::types::SourceId;

/// A syndicated feed the worker pulls entries from.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub feed_url: String,
    pub website_url: Option<String>,
    pub enabled: bool,
    pub last_fetched: Option<NaiveDateTime>,
}
