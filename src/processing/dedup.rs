use crate::domain::article::Article;
use crate::processing::embedding::{
    EmbeddingResult, TextEmbedder, cosine_similarity, deserialize_embedding,
};

/// Find the stored article that `new_article` duplicates, if any.
///
/// Embeds the new article's title and content, then delegates to
/// [`find_duplicate_by_embedding`].
pub fn find_duplicate<'a, E>(
    embedder: &E,
    new_article: &Article,
    candidates: &'a [Article],
    threshold: f32,
) -> EmbeddingResult<Option<&'a Article>>
where
    E: TextEmbedder + ?Sized,
{
    let embedding = embedder.embed(&new_article.embedding_text())?;
    Ok(find_duplicate_by_embedding(&embedding, candidates, threshold))
}

/// Scan `candidates` in the order given and return the first one whose
/// similarity to `embedding` is at least `threshold`.
///
/// This is not a best-match search: callers order the pool (the processing
/// stage passes the most recent articles first). Candidates without an
/// embedding, with unreadable bytes, or of a different dimension are skipped.
pub fn find_duplicate_by_embedding<'a>(
    embedding: &[f32],
    candidates: &'a [Article],
    threshold: f32,
) -> Option<&'a Article> {
    for candidate in candidates {
        let Some(blob) = candidate.embedding.as_deref() else {
            continue;
        };

        let candidate_embedding = match deserialize_embedding(blob) {
            Ok(value) => value,
            Err(error) => {
                log::debug!("Skipping duplicate candidate {}: {error}", candidate.id);
                continue;
            }
        };

        if candidate_embedding.len() != embedding.len() {
            log::debug!(
                "Skipping duplicate candidate {}: dimension {} != {}",
                candidate.id,
                candidate_embedding.len(),
                embedding.len()
            );
            continue;
        }

        if cosine_similarity(embedding, &candidate_embedding) >= threshold {
            return Some(candidate);
        }
    }

    None
}

/// Point `article` at `original`. Calling again overwrites the reference.
pub fn mark_duplicate(article: &mut Article, original: &Article) {
    article.is_duplicate = true;
    article.duplicate_of = Some(original.id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DUPLICATE_THRESHOLD;
    use crate::processing::embedding::serialize_embedding;
    use crate::processing::test_support::{TableEmbedder, article};

    fn with_embedding(id: i32, embedding: &[f32]) -> Article {
        let mut candidate = article(id, "Stored", None);
        candidate.embedding = Some(serialize_embedding(embedding));
        candidate
    }

    fn new_article_embedder(embedding: Vec<f32>) -> TableEmbedder {
        TableEmbedder::new(&[("Breaking News Important story", embedding)])
    }

    fn new_article() -> Article {
        article(100, "Breaking News", Some("Important story"))
    }

    #[test]
    fn empty_pool_has_no_duplicate() {
        let embedder = new_article_embedder(vec![0.1, 0.2, 0.3]);

        let duplicate = find_duplicate(&embedder, &new_article(), &[], DUPLICATE_THRESHOLD)
            .expect("embedding should succeed");

        assert!(duplicate.is_none());
    }

    #[test]
    fn identical_embedding_is_duplicate() {
        let embedder = new_article_embedder(vec![0.5, 0.5, 0.5]);
        let pool = vec![with_embedding(1, &[0.5, 0.5, 0.5])];

        let duplicate = find_duplicate(&embedder, &new_article(), &pool, DUPLICATE_THRESHOLD)
            .expect("embedding should succeed");

        assert_eq!(duplicate.map(|a| a.id.get()), Some(1));
    }

    #[test]
    fn threshold_decides_close_pairs() {
        // cosine([1, 0, 0], [0.9, 0.1, 0]) is about 0.9939
        let pool = vec![with_embedding(1, &[0.9, 0.1, 0.0])];

        assert!(find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.85).is_some());
        assert!(find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.99).is_some());
        assert!(find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.995).is_none());
    }

    #[test]
    fn below_threshold_is_not_duplicate() {
        let pool = vec![with_embedding(1, &[0.5, 0.5, 0.5])];

        assert!(find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.85).is_none());
    }

    #[test]
    fn first_candidate_above_threshold_wins() {
        let pool = vec![
            with_embedding(1, &[0.0, 1.0, 0.0]),
            with_embedding(2, &[0.95, 0.05, 0.0]),
            with_embedding(3, &[1.0, 0.0, 0.0]),
        ];

        let duplicate = find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.85);

        // Candidate 3 is an exact match but candidate 2 comes first.
        assert_eq!(duplicate.map(|a| a.id.get()), Some(2));
    }

    #[test]
    fn candidates_without_usable_embeddings_are_skipped() {
        let mut corrupted = article(2, "Corrupted", None);
        corrupted.embedding = Some(b"corrupted data".to_vec());
        let pool = vec![
            article(1, "No embedding", None),
            corrupted,
            with_embedding(3, &[1.0, 0.0]),
            with_embedding(4, &[1.0, 0.0, 0.0]),
        ];

        let duplicate = find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &pool, 0.85);

        assert_eq!(duplicate.map(|a| a.id.get()), Some(4));
    }

    #[test]
    fn only_corrupted_candidates_yield_none() {
        let mut corrupted = article(1, "Corrupted", None);
        corrupted.embedding = Some(b"corrupted data".to_vec());

        assert!(find_duplicate_by_embedding(&[1.0, 0.0, 0.0], &[corrupted], 0.85).is_none());
    }

    #[test]
    fn embedding_failure_is_returned() {
        let embedder = TableEmbedder::new(&[]);
        let pool = vec![with_embedding(1, &[1.0, 0.0, 0.0])];

        assert!(find_duplicate(&embedder, &new_article(), &pool, 0.85).is_err());
    }

    #[test]
    fn mark_duplicate_sets_flag_and_reference() {
        let mut article_b = article(2, "B", None);
        let original = article(42, "A", None);

        mark_duplicate(&mut article_b, &original);

        assert!(article_b.is_duplicate);
        assert_eq!(article_b.duplicate_of.map(|id| id.get()), Some(42));
        assert!(!original.is_duplicate);
    }

    #[test]
    fn mark_duplicate_overwrites_previous_reference() {
        let mut article_b = article(2, "B", None);
        mark_duplicate(&mut article_b, &article(10, "Old", None));

        mark_duplicate(&mut article_b, &article(42, "New", None));

        assert!(article_b.is_duplicate);
        assert_eq!(article_b.duplicate_of.map(|id| id.get()), Some(42));
    }
}
