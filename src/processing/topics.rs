use crate::domain::topic::{GENERAL_TOPIC_SLUG, TopicDefinition};
use crate::processing::embedding::{EmbeddingResult, TextEmbedder, cosine_similarity};
use crate::{MAX_TOPICS, TOPIC_THRESHOLD};

/// A topic that passed the acceptance bound for one article.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTopic {
    pub slug: String,
    pub similarity: f32,
}

fn general() -> Vec<String> {
    vec![GENERAL_TOPIC_SLUG.to_string()]
}

/// Keyword embeddings of every non-inert topic, in definition order.
///
/// Building the classifier once per batch embeds each topic's keywords a
/// single time instead of once per article.
#[derive(Debug, Clone, Default)]
pub struct TopicClassifier {
    topics: Vec<(String, Vec<f32>)>,
}

impl TopicClassifier {
    pub fn build<E>(embedder: &E, definitions: &[TopicDefinition]) -> EmbeddingResult<Self>
    where
        E: TextEmbedder + ?Sized,
    {
        let mut topics = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if definition.is_inert() {
                log::debug!("Skipping topic {} without keywords", definition.slug);
                continue;
            }
            let embedding = embedder.embed(&definition.keyword_text())?;
            topics.push((definition.slug.clone(), embedding));
        }
        Ok(Self { topics })
    }

    /// Use precomputed keyword embeddings, given as `(slug, embedding)`.
    pub fn from_embeddings(topics: Vec<(String, Vec<f32>)>) -> Self {
        Self { topics }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Topics scoring above [`TOPIC_THRESHOLD`], best first.
    ///
    /// Ties keep definition order.
    pub fn score(&self, embedding: &[f32]) -> Vec<ScoredTopic> {
        let mut matches: Vec<ScoredTopic> = self
            .topics
            .iter()
            .filter(|(_, topic_embedding)| topic_embedding.len() == embedding.len())
            .map(|(slug, topic_embedding)| ScoredTopic {
                slug: slug.clone(),
                similarity: cosine_similarity(embedding, topic_embedding),
            })
            .filter(|scored| scored.similarity > TOPIC_THRESHOLD)
            .collect();

        matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matches
    }

    /// Classify `text` whose embedding has already been computed.
    pub fn classify_embedding(&self, text: &str, embedding: &[f32]) -> Vec<String> {
        if text.trim().is_empty() {
            return general();
        }

        let slugs: Vec<String> = self
            .score(embedding)
            .into_iter()
            .take(MAX_TOPICS)
            .map(|scored| scored.slug)
            .collect();

        if slugs.is_empty() { general() } else { slugs }
    }

    pub fn classify<E>(&self, embedder: &E, text: &str) -> EmbeddingResult<Vec<String>>
    where
        E: TextEmbedder + ?Sized,
    {
        if text.trim().is_empty() {
            return Ok(general());
        }
        let embedding = embedder.embed(text)?;
        Ok(self.classify_embedding(text, &embedding))
    }
}

/// Assign at most [`MAX_TOPICS`] topic slugs to `text`, or `general`.
pub fn classify<E>(
    embedder: &E,
    text: &str,
    definitions: &[TopicDefinition],
) -> EmbeddingResult<Vec<String>>
where
    E: TextEmbedder + ?Sized,
{
    if text.trim().is_empty() {
        return Ok(general());
    }

    let embedding = embedder.embed(text)?;
    let classifier = TopicClassifier::build(embedder, definitions)?;
    Ok(classifier.classify_embedding(text, &embedding))
}
