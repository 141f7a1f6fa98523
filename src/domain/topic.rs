use serde::Deserialize;

use crate::domain::types::TopicId;

/// Slug of the reserved fallback topic.
pub const GENERAL_TOPIC_SLUG: &str = "general";
pub const GENERAL_TOPIC_NAME: &str = "General";

/// A topic label with the keywords used as its matching anchor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicDefinition {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl TopicDefinition {
    pub fn new(name: &str, slug: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Space-joined non-blank keywords, the text embedded for this topic.
    pub fn keyword_text(&self) -> String {
        self.keywords
            .iter()
            .map(|keyword| keyword.trim())
            .filter(|keyword| !keyword.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A topic without keywords can never match.
    pub fn is_inert(&self) -> bool {
        self.keyword_text().is_empty()
    }
}

/// A stored topic, optionally carrying the cached keyword embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Topic {
    pub id: TopicId,
    pub definition: TopicDefinition,
    pub embedding: Option<Vec<u8>>,
    pub embedding_model: Option<String>,
}

impl Topic {
    /// Cached keyword embedding, if it was produced by `model_id`.
    pub fn embedding_for_model(&self, model_id: &str) -> Option<&[u8]> {
        match self.embedding_model.as_deref() {
            Some(model) if model == model_id => self.embedding.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TopicDefinition;

    #[test]
    fn keyword_text_skips_blank_keywords() {
        let topic = TopicDefinition::new("Tech", "tech", &["software", "  ", "ai "]);
        assert_eq!(topic.keyword_text(), "software ai");
        assert!(!topic.is_inert());
    }

    #[test]
    fn topic_with_only_blank_keywords_is_inert() {
        assert!(TopicDefinition::new("Tech", "tech", &[]).is_inert());
        assert!(TopicDefinition::new("Tech", "tech", &["", " "]).is_inert());
    }
}
