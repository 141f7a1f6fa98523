use futures::future;

use crate::domain::source::Source;
use crate::feeds::FeedFetcher;
use crate::processing::normalize::normalize_entries;
use crate::processing::{FetchSelector, ProcessingGuard};
use crate::repository::{ArticleWriter, SourceReader, SourceWriter};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchStats {
    pub sources_selected: usize,
    pub sources_failed: usize,
    pub entries_fetched: usize,
    pub entries_dropped: usize,
    pub articles_created: usize,
}

fn select_sources<R>(selector: &FetchSelector, repo: &R) -> Result<Vec<Source>, ()>
where
    R: SourceReader,
{
    match selector {
        FetchSelector::All => repo.list_enabled_sources().map_err(|error| {
            log::error!("Failed to list enabled sources: {error}");
        }),
        FetchSelector::Source(selector) => {
            let source = repo.find_source(selector).map_err(|error| {
                log::error!("Error retrieving source {selector}: {error}");
            })?;
            if source.enabled {
                Ok(vec![source])
            } else {
                log::warn!("Source {selector} is disabled");
                Ok(vec![])
            }
        }
    }
}

/// Fetch the selected sources concurrently and store every new article.
///
/// A source that fails to fetch is logged and counted; the other sources are
/// still stored.
pub async fn fetch_sources<R, F>(
    selector: &FetchSelector,
    repo: &R,
    fetcher: &F,
) -> Result<FetchStats, ()>
where
    R: SourceReader + SourceWriter + ArticleWriter,
    F: FeedFetcher + ?Sized,
{
    let sources = select_sources(selector, repo)?;
    let mut stats = FetchStats {
        sources_selected: sources.len(),
        ..Default::default()
    };

    let tasks = sources.iter().map(|source| async move {
        (source, fetcher.fetch_entries(&source.feed_url).await)
    });

    for (source, result) in future::join_all(tasks).await {
        let entries = match result {
            Ok(entries) => entries,
            Err(error) => {
                log::error!("Failed to fetch source {}: {error}", source.name);
                stats.sources_failed += 1;
                continue;
            }
        };

        let articles = normalize_entries(&entries);
        stats.entries_fetched += entries.len();
        stats.entries_dropped += entries.len() - articles.len();

        match repo.create_articles(source.id, &articles) {
            Ok(created) => {
                log::info!(
                    "Fetched source {}: entries={}, articles={}, created={created}",
                    source.name,
                    entries.len(),
                    articles.len()
                );
                stats.articles_created += created;
            }
            Err(error) => {
                log::error!("Error storing articles for source {}: {error}", source.name);
                stats.sources_failed += 1;
                continue;
            }
        }

        if let Err(error) = repo.set_source_fetched(source.id) {
            log::error!("Error updating fetch time of source {}: {error}", source.name);
        }
    }

    Ok(stats)
}

/// Handle a fetch message, skipping it while another run is active.
pub async fn process_fetch_message<R, F>(
    selector: FetchSelector,
    repo: &R,
    fetcher: &F,
    guard: &ProcessingGuard,
) where
    R: SourceReader + SourceWriter + ArticleWriter,
    F: FeedFetcher + ?Sized,
{
    log::info!("Received fetch: {selector:?}");

    let Some(_claim) = guard.try_claim() else {
        log::warn!("Skipping Fetch {selector:?}: processing already active (skipped_because_processing_active=1)");
        return;
    };

    match fetch_sources(&selector, repo, fetcher).await {
        Ok(stats) => log::info!(
            "Finished Fetch {selector:?}: sources_selected={}, sources_failed={}, entries_fetched={}, entries_dropped={}, articles_created={}",
            stats.sources_selected,
            stats.sources_failed,
            stats.entries_fetched,
            stats.entries_dropped,
            stats.articles_created
        ),
        Err(()) => log::error!("Fetch {selector:?} failed"),
    }
}
