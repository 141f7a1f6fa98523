use crate::db::{DbConnection, DbPool};
use crate::domain::article::{Article, CanonicalArticle};
use crate::domain::source::Source;
use crate::domain::topic::{Topic, TopicDefinition};
use crate::domain::types::{ArticleId, SourceId, TopicId};
use crate::models::config::SourceConfig;
use crate::repository::errors::RepositoryResult;

pub mod article;
pub mod errors;
pub mod source;
pub mod topic;

/// Diesel-backed repository over the worker's SQLite database.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

pub trait SourceReader {
    fn list_enabled_sources(&self) -> RepositoryResult<Vec<Source>>;
    /// Find a source by feed URL or, failing that, by name.
    fn find_source(&self, selector: &str) -> RepositoryResult<Source>;
    fn count_sources(&self) -> RepositoryResult<i64>;
}

pub trait SourceWriter {
    /// Insert new sources and update existing ones, matched by feed URL.
    fn sync_sources(&self, sources: &[SourceConfig]) -> RepositoryResult<usize>;
    fn set_source_fetched(&self, source_id: SourceId) -> RepositoryResult<usize>;
}

pub trait ArticleReader {
    /// Articles to run through deduplication and classification, oldest
    /// first. Without `reprocess` only unprocessed articles are returned.
    fn list_articles_for_processing(
        &self,
        reprocess: bool,
        limit: Option<i64>,
    ) -> RepositoryResult<Vec<Article>>;

    /// Articles stored before `article_id` that carry an embedding from
    /// `embedding_model`, most recent first.
    fn list_duplicate_candidates(
        &self,
        article_id: ArticleId,
        embedding_model: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<Article>>;

    fn count_articles(&self) -> RepositoryResult<i64>;
    fn count_duplicates(&self) -> RepositoryResult<i64>;
}

pub trait ArticleWriter {
    /// Store articles whose URL is not yet known; returns how many were new.
    fn create_articles(
        &self,
        source_id: SourceId,
        articles: &[CanonicalArticle],
    ) -> RepositoryResult<usize>;
    fn set_article_embedding(
        &self,
        article_id: ArticleId,
        embedding: &[f32],
        embedding_model: &str,
    ) -> RepositoryResult<usize>;
    /// Set or clear the duplicate pointer of `article_id`.
    fn set_article_duplicate(
        &self,
        article_id: ArticleId,
        duplicate_of: Option<ArticleId>,
    ) -> RepositoryResult<usize>;
    fn set_article_processed(&self, article_id: ArticleId) -> RepositoryResult<usize>;
}

pub trait TopicReader {
    fn list_topics(&self) -> RepositoryResult<Vec<Topic>>;
    fn list_article_topic_slugs(&self, article_id: ArticleId) -> RepositoryResult<Vec<String>>;
}

pub trait TopicWriter {
    /// Insert new topics and update existing ones, matched by slug. A
    /// changed keyword list clears the cached keyword embedding.
    fn sync_topics(&self, topics: &[TopicDefinition]) -> RepositoryResult<usize>;
    fn set_topic_embedding(
        &self,
        topic_id: TopicId,
        embedding: &[f32],
        embedding_model: &str,
    ) -> RepositoryResult<usize>;
    /// Replace the topics of `article_id` with `slugs`. Unknown slugs are
    /// skipped; `general` is created on first use.
    fn set_article_topics(&self, article_id: ArticleId, slugs: &[String])
    -> RepositoryResult<usize>;
}
