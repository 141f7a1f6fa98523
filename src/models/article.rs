use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::article::{Article as DomainArticle, CanonicalArticle};
use crate::domain::types::{ArticleId, SourceId, TypeError};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Article {
    pub id: i32,
    pub source_id: i32,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub fetched_at: NaiveDateTime,
    pub embedding: Option<Vec<u8>>,
    pub embedding_model: Option<String>,
    pub is_duplicate: bool,
    pub duplicate_of_id: Option<i32>,
    pub processed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::articles)]
pub struct NewArticle {
    pub source_id: i32,
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<NaiveDateTime>,
    pub fetched_at: NaiveDateTime,
}

impl NewArticle {
    pub fn from_canonical(
        source_id: SourceId,
        article: &CanonicalArticle,
        fetched_at: NaiveDateTime,
    ) -> Self {
        Self {
            source_id: source_id.get(),
            url: article.url.clone(),
            title: article.title.clone(),
            content: article.content.clone(),
            image_url: article.image_url.clone(),
            published_at: article.published_at.map(|value| value.naive_utc()),
            fetched_at,
        }
    }
}

impl TryFrom<Article> for DomainArticle {
    type Error = TypeError;

    fn try_from(row: Article) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ArticleId::new(row.id)?,
            source_id: SourceId::new(row.source_id)?,
            url: row.url,
            title: row.title,
            content: row.content,
            image_url: row.image_url,
            published_at: row.published_at,
            fetched_at: row.fetched_at,
            embedding: row.embedding,
            embedding_model: row.embedding_model,
            is_duplicate: row.is_duplicate,
            duplicate_of: row.duplicate_of_id.map(ArticleId::new).transpose()?,
            processed_at: row.processed_at,
        })
    }
}
