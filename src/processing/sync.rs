use std::path::Path;

use crate::models::config::FeedsConfig;
use crate::repository::errors::RepositoryError;
use crate::repository::{ArticleReader, SourceReader, SourceWriter, TopicReader, TopicWriter};

/// Counts reported by the `Stats` message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub sources: i64,
    pub topics: usize,
    pub articles: i64,
    pub duplicates: i64,
}

/// Write the sources and topics of `feeds` into storage.
pub fn sync_config<R>(feeds: &FeedsConfig, repo: &R) -> Result<(usize, usize), ()>
where
    R: SourceWriter + TopicWriter,
{
    let sources = repo.sync_sources(&feeds.sources).map_err(|error| {
        log::error!("Failed to sync sources: {error}");
    })?;
    let topics = repo.sync_topics(&feeds.topics).map_err(|error| {
        log::error!("Failed to sync topics: {error}");
    })?;
    Ok((sources, topics))
}

/// Reload the feeds file and synchronise it.
pub fn process_sync_config_message<R>(feeds_file: &Path, repo: &R)
where
    R: SourceWriter + TopicWriter,
{
    log::info!("Received SyncConfig: {}", feeds_file.display());

    let feeds = match FeedsConfig::load(feeds_file) {
        Ok(feeds) => feeds,
        Err(error) => {
            log::error!("Failed to load feeds file {}: {error}", feeds_file.display());
            return;
        }
    };

    if let Ok((sources, topics)) = sync_config(&feeds, repo) {
        log::info!("Finished SyncConfig: sources_synced={sources}, topics_synced={topics}");
    }
}

pub fn store_stats<R>(repo: &R) -> Result<StoreStats, ()>
where
    R: SourceReader + ArticleReader + TopicReader,
{
    let log_error = |error: RepositoryError| log::error!("Failed to collect stats: {error}");

    Ok(StoreStats {
        sources: repo.count_sources().map_err(log_error)?,
        topics: repo.list_topics().map_err(log_error)?.len(),
        articles: repo.count_articles().map_err(log_error)?,
        duplicates: repo.count_duplicates().map_err(log_error)?,
    })
}

pub fn process_stats_message<R>(repo: &R)
where
    R: SourceReader + ArticleReader + TopicReader,
{
    if let Ok(stats) = store_stats(repo) {
        log::info!(
            "Stats: sources={}, topics={}, articles={}, duplicates={}",
            stats.sources,
            stats.topics,
            stats.articles,
            stats.duplicates
        );
    }
}
