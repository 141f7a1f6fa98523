//! Helpers for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use pushkind_feeds::db::{DbPool, establish_connection_pool, initialize_schema};
use pushkind_feeds::domain::article::CanonicalArticle;
use pushkind_feeds::models::config::SourceConfig;
use pushkind_feeds::processing::embedding::{EmbeddingError, EmbeddingResult, TextEmbedder};
use tempfile::TempDir;

/// Temporary database used in integration tests.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir.");
        let path = dir.path().join("test.db");

        let pool = establish_connection_pool(path.to_str().expect("utf-8 temp path"))
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        initialize_schema(&mut conn).expect("Failed to create schema.");

        TestDb { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

/// Embeds text as a bag of the vocabulary words it contains.
///
/// Words outside the vocabulary are ignored, so text without any of them
/// embeds to the zero vector.
pub struct VocabularyEmbedder {
    vocabulary: Vec<&'static str>,
    calls: AtomicUsize,
    failing: Option<&'static str>,
}

impl VocabularyEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
            calls: AtomicUsize::new(0),
            failing: None,
        }
    }

    /// Fail every text containing `word`.
    pub fn failing_on(mut self, word: &'static str) -> Self {
        self.failing = Some(word);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextEmbedder for VocabularyEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
            .collect();

        if let Some(failing) = self.failing
            && words.iter().any(|word| word == failing)
        {
            return Err(EmbeddingError::Inference(format!("refusing {text:?}")));
        }

        Ok(self
            .vocabulary
            .iter()
            .map(|term| {
                if words.iter().any(|word| word == term) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect())
    }

    fn model_id(&self) -> &str {
        "vocabulary"
    }
}

pub fn source_config(name: &str, feed_url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        feed_url: feed_url.to_string(),
        website_url: None,
        enabled: true,
    }
}

pub fn canonical(url: &str, title: &str, content: Option<&str>) -> CanonicalArticle {
    CanonicalArticle {
        url: url.to_string(),
        title: title.to_string(),
        content: content.map(ToString::to_string),
        image_url: None,
        published_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).single(),
    }
}
