use diesel::prelude::*;

use crate::domain::topic::{GENERAL_TOPIC_NAME, GENERAL_TOPIC_SLUG, Topic, TopicDefinition};
use crate::domain::types::{ArticleId, TopicId};
use crate::models::topic::{NewTopic, Topic as DbTopic};
use crate::processing::embedding::serialize_embedding;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TopicReader, TopicWriter};

impl TopicReader for DieselRepository {
    fn list_topics(&self) -> RepositoryResult<Vec<Topic>> {
        use crate::schema::topics;

        let mut conn = self.conn()?;

        let result = topics::table
            .order(topics::id.asc())
            .select(DbTopic::as_select())
            .load::<DbTopic>(&mut conn)?;

        result.into_iter().map(Topic::try_from).collect()
    }

    fn list_article_topic_slugs(&self, article_id: ArticleId) -> RepositoryResult<Vec<String>> {
        use crate::schema::{article_topics, topics};

        let mut conn = self.conn()?;

        let slugs = article_topics::table
            .inner_join(topics::table)
            .filter(article_topics::article_id.eq(article_id.get()))
            .order(article_topics::id.asc())
            .select(topics::slug)
            .load::<String>(&mut conn)?;

        Ok(slugs)
    }
}

impl TopicWriter for DieselRepository {
    fn sync_topics(&self, definitions: &[TopicDefinition]) -> RepositoryResult<usize> {
        use crate::schema::topics;

        if definitions.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            let mut affected_rows = 0;
            for definition in definitions {
                let row = NewTopic::from_definition(definition)?;

                let existing = topics::table
                    .filter(topics::slug.eq(&row.slug))
                    .select(DbTopic::as_select())
                    .first::<DbTopic>(conn)
                    .optional()?;

                affected_rows += match existing {
                    Some(current) if current.keywords == row.keywords => {
                        diesel::update(topics::table.filter(topics::id.eq(current.id)))
                            .set(topics::name.eq(&row.name))
                            .execute(conn)?
                    }
                    Some(current) => {
                        diesel::update(topics::table.filter(topics::id.eq(current.id)))
                            .set((
                                topics::name.eq(&row.name),
                                topics::keywords.eq(&row.keywords),
                                topics::embedding.eq::<Option<Vec<u8>>>(None),
                                topics::embedding_model.eq::<Option<String>>(None),
                            ))
                            .execute(conn)?
                    }
                    None => diesel::insert_into(topics::table)
                        .values(&row)
                        .execute(conn)?,
                };
            }
            Ok::<usize, RepositoryError>(affected_rows)
        })?;

        Ok(affected)
    }

    fn set_topic_embedding(
        &self,
        topic_id: TopicId,
        embedding: &[f32],
        embedding_model: &str,
    ) -> RepositoryResult<usize> {
        use crate::schema::topics;

        let mut conn = self.conn()?;
        let blob = serialize_embedding(embedding);

        let affected = diesel::update(topics::table.filter(topics::id.eq(topic_id.get())))
            .set((
                topics::embedding.eq(blob),
                topics::embedding_model.eq(embedding_model),
            ))
            .execute(&mut conn)?;

        Ok(affected)
    }

    fn set_article_topics(
        &self,
        article_id: ArticleId,
        slugs: &[String],
    ) -> RepositoryResult<usize> {
        use crate::schema::{article_topics, topics};

        let mut conn = self.conn()?;

        let assigned = conn.transaction(|conn| {
            diesel::delete(
                article_topics::table.filter(article_topics::article_id.eq(article_id.get())),
            )
            .execute(conn)?;

            let mut assigned_rows = 0;
            for slug in slugs {
                let topic_id = topics::table
                    .filter(topics::slug.eq(slug))
                    .select(topics::id)
                    .first::<i32>(conn)
                    .optional()?;

                let topic_id = match topic_id {
                    Some(id) => id,
                    None if slug == GENERAL_TOPIC_SLUG => diesel::insert_into(topics::table)
                        .values(&NewTopic {
                            name: GENERAL_TOPIC_NAME.to_string(),
                            slug: GENERAL_TOPIC_SLUG.to_string(),
                            keywords: "[]".to_string(),
                        })
                        .returning(topics::id)
                        .get_result::<i32>(conn)?,
                    None => {
                        log::warn!("Skipping unknown topic {slug} for article {article_id}");
                        continue;
                    }
                };

                assigned_rows += diesel::insert_or_ignore_into(article_topics::table)
                    .values((
                        article_topics::article_id.eq(article_id.get()),
                        article_topics::topic_id.eq(topic_id),
                    ))
                    .execute(conn)?;
            }
            Ok::<usize, RepositoryError>(assigned_rows)
        })?;

        Ok(assigned)
    }
}
