use chrono::{DateTime, NaiveDateTime, Utc};

use crate::domain::types::{ArticleId, SourceId};

/// Title used when the upstream entry has none.
pub const UNTITLED: &str = "Untitled";

/// Storage-ready representation of one normalized feed entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalArticle {
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl CanonicalArticle {
    pub fn embedding_text(&self) -> String {
        embedding_text(&self.title, self.content.as_deref())
    }
}

/// An article as persisted, including its pipeline attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub source_id: SourceId,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub fetched_at: NaiveDateTime,
    pub embedding: Option<Vec<u8>>,
    pub embedding_model: Option<String>,
    pub is_duplicate: bool,
    pub duplicate_of: Option<ArticleId>,
    pub processed_at: Option<NaiveDateTime>,
}

impl Article {
    pub fn embedding_text(&self) -> String {
        embedding_text(&self.title, self.content.as_deref())
    }

    /// Stored embedding bytes, if they were produced by `model_id`.
    pub fn embedding_for_model(&self, model_id: &str) -> Option<&[u8]> {
        match self.embedding_model.as_deref() {
            Some(model) if model == model_id => self.embedding.as_deref(),
            _ => None,
        }
    }
}

/// Text embedded for both deduplication and classification.
pub fn embedding_text(title: &str, content: Option<&str>) -> String {
    format!("{title} {}", content.unwrap_or(""))
}
