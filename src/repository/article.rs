use chrono::Utc;
use diesel::prelude::*;

use crate::domain::article::{Article, CanonicalArticle};
use crate::domain::types::{ArticleId, SourceId};
use crate::models::article::{Article as DbArticle, NewArticle};
use crate::processing::embedding::serialize_embedding;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{ArticleReader, ArticleWriter, DieselRepository};

fn into_domain(rows: Vec<DbArticle>) -> RepositoryResult<Vec<Article>> {
    rows.into_iter()
        .map(Article::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| RepositoryError::ValidationError(err.to_string()))
}

impl ArticleReader for DieselRepository {
    fn list_articles_for_processing(
        &self,
        reprocess: bool,
        limit: Option<i64>,
    ) -> RepositoryResult<Vec<Article>> {
        use crate::schema::articles;

        let mut conn = self.conn()?;

        let mut query = articles::table
            .select(DbArticle::as_select())
            .order(articles::id.asc())
            .into_boxed();

        if !reprocess {
            query = query.filter(articles::processed_at.is_null());
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        into_domain(query.load::<DbArticle>(&mut conn)?)
    }

    fn list_duplicate_candidates(
        &self,
        article_id: ArticleId,
        embedding_model: &str,
        limit: i64,
    ) -> RepositoryResult<Vec<Article>> {
        use crate::schema::articles;

        let mut conn = self.conn()?;

        let result = articles::table
            .filter(articles::id.lt(article_id.get()))
            .filter(articles::embedding.is_not_null())
            .filter(articles::embedding_model.eq(embedding_model))
            .order(articles::id.desc())
            .limit(limit)
            .select(DbArticle::as_select())
            .load::<DbArticle>(&mut conn)?;

        into_domain(result)
    }

    fn count_articles(&self) -> RepositoryResult<i64> {
        use crate::schema::articles;

        let mut conn = self.conn()?;

        Ok(articles::table.count().get_result::<i64>(&mut conn)?)
    }

    fn count_duplicates(&self) -> RepositoryResult<i64> {
        use crate::schema::articles;

        let mut conn = self.conn()?;

        Ok(articles::table
            .filter(articles::is_duplicate.eq(true))
            .count()
            .get_result::<i64>(&mut conn)?)
    }
}

impl ArticleWriter for DieselRepository {
    fn create_articles(
        &self,
        source_id: SourceId,
        articles: &[CanonicalArticle],
    ) -> RepositoryResult<usize> {
        use crate::schema::articles as articles_table;

        if articles.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let fetched_at = Utc::now().naive_utc();

        let inserted = conn.transaction(|conn| {
            let mut inserted_rows = 0;
            for article in articles {
                let row = NewArticle::from_canonical(source_id, article, fetched_at);
                // A URL already stored, or repeated within the batch, is skipped.
                inserted_rows += diesel::insert_or_ignore_into(articles_table::table)
                    .values(&row)
                    .execute(conn)?;
            }
            Ok::<usize, RepositoryError>(inserted_rows)
        })?;

        Ok(inserted)
    }

    fn set_article_embedding(
        &self,
        article_id: ArticleId,
        embedding: &[f32],
        embedding_model: &str,
    ) -> RepositoryResult<usize> {
        use crate::schema::articles;

        let mut conn = self.conn()?;
        let blob = serialize_embedding(embedding);

        let affected = diesel::update(articles::table.filter(articles::id.eq(article_id.get())))
            .set((
                articles::embedding.eq(blob),
                articles::embedding_model.eq(embedding_model),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_article_duplicate(
        &self,
        article_id: ArticleId,
        duplicate_of: Option<ArticleId>,
    ) -> RepositoryResult<usize> {
        use crate::schema::articles;

        if duplicate_of == Some(article_id) {
            return Err(RepositoryError::ValidationError(format!(
                "article {article_id} cannot duplicate itself"
            )));
        }

        let mut conn = self.conn()?;

        let affected = diesel::update(articles::table.filter(articles::id.eq(article_id.get())))
            .set((
                articles::is_duplicate.eq(duplicate_of.is_some()),
                articles::duplicate_of_id.eq(duplicate_of.map(|id| id.get())),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_article_processed(&self, article_id: ArticleId) -> RepositoryResult<usize> {
        use crate::schema::articles;

        let mut conn = self.conn()?;

        let affected = diesel::update(articles::table.filter(articles::id.eq(article_id.get())))
            .set(articles::processed_at.eq(Utc::now().naive_utc()))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
