use diesel::prelude::*;

use crate::domain::topic::{Topic as DomainTopic, TopicDefinition};
use crate::domain::types::TopicId;
use crate::repository::errors::RepositoryError;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::topics)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Topic {
    pub id: i32,
    pub name: String,
    pub slug: String,
    /// JSON array of keywords.
    pub keywords: String,
    pub embedding: Option<Vec<u8>>,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::topics)]
pub struct NewTopic {
    pub name: String,
    pub slug: String,
    pub keywords: String,
}

impl NewTopic {
    pub fn from_definition(definition: &TopicDefinition) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: definition.name.clone(),
            slug: definition.slug.clone(),
            keywords: serde_json::to_string(&definition.keywords)?,
        })
    }
}

impl TryFrom<Topic> for DomainTopic {
    type Error = RepositoryError;

    fn try_from(row: Topic) -> Result<Self, Self::Error> {
        let keywords: Vec<String> = serde_json::from_str(&row.keywords)?;
        Ok(Self {
            id: TopicId::new(row.id)
                .map_err(|err| RepositoryError::ValidationError(err.to_string()))?,
            definition: TopicDefinition {
                name: row.name,
                slug: row.slug,
                keywords,
            },
            embedding: row.embedding,
            embedding_model: row.embedding_model,
        })
    }
}
