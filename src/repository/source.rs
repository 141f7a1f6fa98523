use chrono::Utc;
use diesel::prelude::*;

use crate::domain::source::Source;
use crate::domain::types::SourceId;
use crate::models::config::SourceConfig;
use crate::models::source::{NewSource, Source as DbSource};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, SourceReader, SourceWriter};

impl SourceReader for DieselRepository {
    fn list_enabled_sources(&self) -> RepositoryResult<Vec<Source>> {
        use crate::schema::sources;

        let mut conn = self.conn()?;

        let result = sources::table
            .filter(sources::enabled.eq(true))
            .order(sources::id.asc())
            .select(DbSource::as_select())
            .load::<DbSource>(&mut conn)?;

        result
            .into_iter()
            .map(Source::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| RepositoryError::ValidationError(err.to_string()))
    }

    fn find_source(&self, selector: &str) -> RepositoryResult<Source> {
        use crate::schema::sources;

        let mut conn = self.conn()?;

        let by_url = sources::table
            .filter(sources::feed_url.eq(selector))
            .select(DbSource::as_select())
            .first::<DbSource>(&mut conn)
            .optional()?;

        // Names are not unique; the oldest source with the name wins.
        let result = match by_url {
            Some(source) => source,
            None => sources::table
                .filter(sources::name.eq(selector))
                .order(sources::id.asc())
                .select(DbSource::as_select())
                .first::<DbSource>(&mut conn)?,
        };

        Source::try_from(result).map_err(|err| RepositoryError::ValidationError(err.to_string()))
    }

    fn count_sources(&self) -> RepositoryResult<i64> {
        use crate::schema::sources;

        let mut conn = self.conn()?;

        Ok(sources::table.count().get_result::<i64>(&mut conn)?)
    }
}

impl SourceWriter for DieselRepository {
    fn sync_sources(&self, sources: &[SourceConfig]) -> RepositoryResult<usize> {
        use crate::schema::sources as sources_table;

        if sources.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;

        let affected = conn.transaction(|conn| {
            let mut affected_rows = 0;
            for source in sources {
                let row = NewSource {
                    name: source.name.clone(),
                    feed_url: source.feed_url.clone(),
                    website_url: source.website_url.clone(),
                    enabled: source.enabled,
                };
                affected_rows += diesel::insert_into(sources_table::table)
                    .values(&row)
                    .on_conflict(sources_table::feed_url)
                    .do_update()
                    .set(&row)
                    .execute(conn)?;
            }
            Ok::<usize, RepositoryError>(affected_rows)
        })?;

        Ok(affected)
    }

    fn set_source_fetched(&self, source_id: SourceId) -> RepositoryResult<usize> {
        use crate::schema::sources;

        let mut conn = self.conn()?;

        let affected = diesel::update(sources::table.filter(sources::id.eq(source_id.get())))
            .set(sources::last_fetched.eq(Utc::now().naive_utc()))
            .execute(&mut conn)?;

        Ok(affected)
    }
}
