use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::source::Source as DomainSource;
use crate::domain::types::{SourceId, TypeError};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = crate::schema::sources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Source {
    pub id: i32,
    pub name: String,
    pub feed_url: String,
    pub website_url: Option<String>,
    pub enabled: bool,
    pub last_fetched: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::sources)]
#[diesel(treat_none_as_null = true)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
    pub website_url: Option<String>,
    pub enabled: bool,
}

impl TryFrom<Source> for DomainSource {
    type Error = TypeError;

    fn try_from(row: Source) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SourceId::new(row.id)?,
            name: row.name,
            feed_url: row.feed_url,
            website_url: row.website_url,
            enabled: row.enabled,
            last_fetched: row.last_fetched,
        })
    }
}
