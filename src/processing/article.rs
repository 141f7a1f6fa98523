use crate::DUPLICATE_THRESHOLD;
use crate::domain::article::Article;
use crate::domain::topic::GENERAL_TOPIC_SLUG;
use crate::models::config::ServerConfig;
use crate::processing::dedup::find_duplicate_by_embedding;
use crate::processing::embedding::{TextEmbedder, load_or_generate_embedding};
use crate::processing::topics::TopicClassifier;
use crate::processing::{ProcessOptions, ProcessingGuard, run_with_processing_guard};
use crate::repository::{ArticleReader, ArticleWriter, TopicReader, TopicWriter};

/// Tunables of the deduplication and classification stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSettings {
    pub duplicate_threshold: f32,
    pub candidate_pool_size: i64,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            duplicate_threshold: DUPLICATE_THRESHOLD,
            candidate_pool_size: 500,
        }
    }
}

impl From<&ServerConfig> for ProcessSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            duplicate_threshold: config.duplicate_threshold,
            candidate_pool_size: config.candidate_pool_size,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessStats {
    pub topics_loaded: usize,
    pub topic_embeddings_generated: usize,
    pub articles_loaded: usize,
    pub article_embeddings_generated: usize,
    pub processed: usize,
    pub duplicates: usize,
    pub unique: usize,
    pub general_only: usize,
    pub embedding_failures: usize,
    pub storage_failures: usize,
}

fn build_classifier<R, E>(
    repo: &R,
    embedder: &E,
    stats: &mut ProcessStats,
) -> Result<TopicClassifier, ()>
where
    R: TopicReader + TopicWriter,
    E: TextEmbedder + ?Sized,
{
    let topics = repo.list_topics().map_err(|error| {
        log::error!("Failed to list topics: {error}");
    })?;
    stats.topics_loaded = topics.len();

    let model = embedder.model_id();
    let mut embeddings = Vec::with_capacity(topics.len());
    for topic in topics {
        if topic.definition.is_inert() {
            continue;
        }

        match load_or_generate_embedding(
            topic.embedding_for_model(model),
            &topic.definition.keyword_text(),
            embedder,
            |value| {
                repo.set_topic_embedding(topic.id, value, model)
                    .map(|_| ())
                    .map_err(|error| {
                        format!("Failed to persist topic embedding for {}: {error}", topic.id)
                    })
            },
        ) {
            Ok((embedding, generated)) => {
                if generated {
                    stats.topic_embeddings_generated += 1;
                }
                embeddings.push((topic.definition.slug, embedding));
            }
            Err(error) if error.is_infrastructure() => {
                log::error!("Embedding model unavailable: {error}");
                return Err(());
            }
            Err(error) => {
                log::error!(
                    "Skipping topic {}: failed to resolve keyword embedding: {error}",
                    topic.definition.slug
                );
            }
        }
    }

    Ok(TopicClassifier::from_embeddings(embeddings))
}

/// Resolve the duplicate pointer and topics of one article and store them.
///
/// An article whose embedding cannot be produced keeps the defaults: no
/// duplicate and the `general` topic. Returns `Err` only when the embedding
/// model is unusable, which stops the batch.
fn process_article<R, E>(
    article: &Article,
    repo: &R,
    embedder: &E,
    classifier: &TopicClassifier,
    settings: &ProcessSettings,
    stats: &mut ProcessStats,
) -> Result<(), ()>
where
    R: ArticleReader + ArticleWriter + TopicWriter,
    E: TextEmbedder + ?Sized,
{
    let model = embedder.model_id();
    let text = article.embedding_text();

    let embedding = match load_or_generate_embedding(
        article.embedding_for_model(model),
        &text,
        embedder,
        |value| {
            repo.set_article_embedding(article.id, value, model)
                .map(|_| ())
                .map_err(|error| {
                    format!("Failed to persist article embedding for {}: {error}", article.id)
                })
        },
    ) {
        Ok((embedding, generated)) => {
            if generated {
                stats.article_embeddings_generated += 1;
            }
            Some(embedding)
        }
        Err(error) if error.is_infrastructure() => {
            log::error!("Embedding model unavailable: {error}");
            return Err(());
        }
        Err(error) => {
            log::error!("Failed to resolve embedding for article {}: {error}", article.id);
            stats.embedding_failures += 1;
            None
        }
    };

    let duplicate_of = embedding.as_deref().and_then(|embedding| {
        match repo.list_duplicate_candidates(article.id, model, settings.candidate_pool_size) {
            Ok(candidates) => {
                find_duplicate_by_embedding(embedding, &candidates, settings.duplicate_threshold)
                    .map(|original| original.id)
            }
            Err(error) => {
                log::error!(
                    "Failed to list duplicate candidates for article {}: {error}",
                    article.id
                );
                None
            }
        }
    });

    let slugs = match embedding.as_deref() {
        Some(embedding) => classifier.classify_embedding(&text, embedding),
        None => vec![GENERAL_TOPIC_SLUG.to_string()],
    };

    if let Err(error) = repo.set_article_duplicate(article.id, duplicate_of) {
        log::error!("Failed to store duplicate pointer of article {}: {error}", article.id);
        stats.storage_failures += 1;
        return Ok(());
    }
    if let Err(error) = repo.set_article_topics(article.id, &slugs) {
        log::error!("Failed to store topics of article {}: {error}", article.id);
        stats.storage_failures += 1;
        return Ok(());
    }
    if let Err(error) = repo.set_article_processed(article.id) {
        log::error!("Failed to mark article {} processed: {error}", article.id);
        stats.storage_failures += 1;
        return Ok(());
    }

    stats.processed += 1;
    match duplicate_of {
        Some(original) => {
            log::debug!("Article {} duplicates {original}", article.id);
            stats.duplicates += 1;
        }
        None => stats.unique += 1,
    }
    if slugs.len() == 1 && slugs[0] == GENERAL_TOPIC_SLUG {
        stats.general_only += 1;
    }
    Ok(())
}

/// Run deduplication and classification over stored articles in ascending
/// id order.
pub fn process_articles<R, E>(
    options: &ProcessOptions,
    repo: &R,
    embedder: &E,
    settings: &ProcessSettings,
) -> Result<ProcessStats, ()>
where
    R: ArticleReader + ArticleWriter + TopicReader + TopicWriter,
    E: TextEmbedder + ?Sized,
{
    let mut stats = ProcessStats::default();

    let classifier = build_classifier(repo, embedder, &mut stats)?;
    if classifier.is_empty() {
        log::warn!("No topic has keywords; every article will be classified as general");
    }

    let articles = repo
        .list_articles_for_processing(options.reprocess, options.limit)
        .map_err(|error| {
            log::error!("Failed to list articles for processing: {error}");
        })?;
    stats.articles_loaded = articles.len();

    for article in &articles {
        process_article(article, repo, embedder, &classifier, settings, &mut stats)?;
    }

    Ok(stats)
}

/// Handle a process message, skipping it while another run is active.
pub fn process_articles_message<R, E>(
    options: ProcessOptions,
    repo: &R,
    embedder: &E,
    settings: &ProcessSettings,
    guard: &ProcessingGuard,
) where
    R: ArticleReader + ArticleWriter + TopicReader + TopicWriter,
    E: TextEmbedder + ?Sized,
{
    log::info!("Received Process: {options:?}");

    let outcome = match run_with_processing_guard(guard, "Process", || {
        process_articles(&options, repo, embedder, settings)
    }) {
        Ok(Some(stats)) => Ok(stats),
        Ok(None) => return,
        Err(()) => Err(()),
    };

    match outcome {
        Ok(stats) => {
            log::info!(
                "Finished Process: topics_loaded={}, topic_embeddings_generated={}, articles_loaded={}, article_embeddings_generated={}, processed={}, duplicates={}, unique={}, general_only={}",
                stats.topics_loaded,
                stats.topic_embeddings_generated,
                stats.articles_loaded,
                stats.article_embeddings_generated,
                stats.processed,
                stats.duplicates,
                stats.unique,
                stats.general_only
            );
            if stats.embedding_failures > 0 || stats.storage_failures > 0 {
                log::warn!(
                    "Process had failures: embedding_failures={}, storage_failures={}",
                    stats.embedding_failures,
                    stats.storage_failures
                );
            }
        }
        Err(()) => log::error!("Process failed"),
    }
}
