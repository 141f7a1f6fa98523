use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use bytemuck::{cast_slice, pod_collect_to_vec};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
    #[error("failed to initialize embedding model: {0}")]
    ModelInit(String),
    #[error("failed to generate embedding: {0}")]
    Inference(String),
    #[error("embedding model returned no vector")]
    EmptyOutput,
    #[error("embedding blob of {len} bytes is not a sequence of f32 values")]
    Corrupt { len: usize },
    #[error("failed to persist embedding: {0}")]
    Persist(String),
}

impl EmbeddingError {
    /// The model itself is unusable, as opposed to one input failing.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            EmbeddingError::UnknownModel(_) | EmbeddingError::ModelInit(_)
        )
    }
}

pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Produces a fixed-length vector for any text.
///
/// Empty text is embedded like any other input; callers that give empty text
/// a domain meaning check for it before calling.
pub trait TextEmbedder {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Identifier of the model the vectors come from. Vectors produced under
    /// different identifiers are never compared.
    fn model_id(&self) -> &str;
}

/// Map a configured model name onto a fastembed model.
pub fn embedding_model_from_name(name: &str) -> Option<EmbeddingModel> {
    match name.trim().to_ascii_lowercase().as_str() {
        "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            Some(EmbeddingModel::AllMiniLML6V2)
        }
        "all-minilm-l12-v2" | "sentence-transformers/all-minilm-l12-v2" => {
            Some(EmbeddingModel::AllMiniLML12V2)
        }
        "bge-small-en-v1.5" => Some(EmbeddingModel::BGESmallENV15),
        "bge-base-en-v1.5" => Some(EmbeddingModel::BGEBaseENV15),
        "multilingual-e5-small" => Some(EmbeddingModel::MultilingualE5Small),
        "multilingual-e5-large" => Some(EmbeddingModel::MultilingualE5Large),
        _ => None,
    }
}

/// fastembed-backed embedder, loaded on first use and reused afterwards.
///
/// The mutex is the initialization barrier: concurrent first callers block
/// until the model is loaded, and inference is serialized because
/// [`TextEmbedding::embed`] needs exclusive access.
pub struct FastEmbedService {
    model: EmbeddingModel,
    model_id: String,
    cache_dir: Option<PathBuf>,
    embedder: Mutex<Option<TextEmbedding>>,
}

impl FastEmbedService {
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> EmbeddingResult<Self> {
        let model = embedding_model_from_name(model_name)
            .ok_or_else(|| EmbeddingError::UnknownModel(model_name.to_string()))?;

        Ok(Self {
            model,
            model_id: model_name.trim().to_ascii_lowercase(),
            cache_dir,
            embedder: Mutex::new(None),
        })
    }

    /// Load the model now instead of on the first `embed` call.
    pub fn preload(&self) -> EmbeddingResult<()> {
        self.with_embedder(|_| Ok(()))
    }

    pub fn is_loaded(&self) -> bool {
        self.lock_embedder().is_some()
    }

    /// Lock the model slot. A slot poisoned by a panicking caller is emptied
    /// so the next use loads a fresh model.
    fn lock_embedder(&self) -> MutexGuard<'_, Option<TextEmbedding>> {
        match self.embedder.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Embedding model {} was poisoned, discarding it", self.model_id);
                let mut guard = poisoned.into_inner();
                *guard = None;
                self.embedder.clear_poison();
                guard
            }
        }
    }

    fn with_embedder<T, F>(&self, job: F) -> EmbeddingResult<T>
    where
        F: FnOnce(&mut TextEmbedding) -> EmbeddingResult<T>,
    {
        let mut guard = self.lock_embedder();

        if guard.is_none() {
            log::info!("Loading embedding model {}", self.model_id);
            let mut options =
                InitOptions::new(self.model.clone()).with_show_download_progress(false);
            if let Some(cache_dir) = &self.cache_dir {
                options = options.with_cache_dir(cache_dir.clone());
            }
            let embedder = TextEmbedding::try_new(options)
                .map_err(|error| EmbeddingError::ModelInit(format!("{error:?}")))?;
            *guard = Some(embedder);
            log::info!("Embedding model {} loaded", self.model_id);
        }

        match guard.as_mut() {
            Some(embedder) => job(embedder),
            None => Err(EmbeddingError::ModelInit(self.model_id.clone())),
        }
    }
}

impl TextEmbedder for FastEmbedService {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.with_embedder(|embedder| {
            embedder
                .embed(vec![text], None)
                .map_err(|error| EmbeddingError::Inference(format!("{error:?}")))?
                .into_iter()
                .next()
                .ok_or(EmbeddingError::EmptyOutput)
        })
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Convert a vector into its storable byte form.
pub fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    cast_slice(embedding).to_vec()
}

/// Decode bytes produced by [`serialize_embedding`].
///
/// The blob is copied out, so it does not need to be aligned for `f32`.
pub fn deserialize_embedding(blob: &[u8]) -> EmbeddingResult<Vec<f32>> {
    let width = std::mem::size_of::<f32>();
    if blob.is_empty() || blob.len() % width != 0 {
        return Err(EmbeddingError::Corrupt { len: blob.len() });
    }
    Ok(pod_collect_to_vec::<u8, f32>(blob))
}

/// `dot(a, b) / (|a| * |b|)`, or 0.0 when either vector has zero magnitude.
///
/// Both vectors are expected to have the same dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    let denom = norm_a * norm_b;
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Load an embedding from blob when present, otherwise generate and persist it.
///
/// A blob that fails to decode is regenerated. Returns the embedding and a
/// flag indicating whether a new embedding was generated.
pub fn load_or_generate_embedding<E, F>(
    existing_blob: Option<&[u8]>,
    text: &str,
    embedder: &E,
    persist: F,
) -> EmbeddingResult<(Vec<f32>, bool)>
where
    E: TextEmbedder + ?Sized,
    F: FnOnce(&[f32]) -> Result<(), String>,
{
    if let Some(blob) = existing_blob {
        match deserialize_embedding(blob) {
            Ok(embedding) => return Ok((embedding, false)),
            Err(error) => log::warn!("Regenerating unreadable stored embedding: {error}"),
        }
    }

    let generated = embedder.embed(text)?;
    persist(&generated).map_err(EmbeddingError::Persist)?;

    Ok((generated, true))
}
