//! Text encoding for similarity search.
//!
//! The encoder must be the same model that produced the vector store offline,
//! otherwise query vectors and stored vectors live in different spaces. The
//! only check available at load time is the dimension, which the workbench
//! enforces.

use std::path::Path;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use crate::vector::types::{EncoderError, VectorDimension};

/// Model names accepted in `search.model`.
pub const SUPPORTED_MODELS: &str = "ParaphraseMLMiniLML12V2, ParaphraseMLMpnetBaseV2, \
     MultilingualE5Small, MultilingualE5Base, AllMiniLML6V2, AllMiniLML12V2, BGESmallENV15";

/// Maps free text to fixed-length vectors.
///
/// Implementations must be deterministic for identical input and return
/// L2-normalized vectors, so a dot product is a cosine similarity.
pub trait TextEncoder: Send + Sync {
    /// Encode a batch of texts, one vector per input in order.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError>;

    /// Dimension of produced vectors.
    fn dimension(&self) -> VectorDimension;

    /// Encode a single text.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        self.encode_batch(&[text])?
            .pop()
            .ok_or_else(|| EncoderError::EmbeddingFailed("encoder returned no vector".to_string()))
    }
}

/// Parses a configured model name into a fastembed model.
pub fn parse_embedding_model(name: &str) -> Result<EmbeddingModel, EncoderError> {
    match name.trim() {
        "ParaphraseMLMiniLML12V2" | "paraphrase-multilingual-MiniLM-L12-v2" => {
            Ok(EmbeddingModel::ParaphraseMLMiniLML12V2)
        }
        "ParaphraseMLMpnetBaseV2" | "paraphrase-multilingual-mpnet-base-v2" => {
            Ok(EmbeddingModel::ParaphraseMLMpnetBaseV2)
        }
        "MultilingualE5Small" | "multilingual-e5-small" => Ok(EmbeddingModel::MultilingualE5Small),
        "MultilingualE5Base" | "multilingual-e5-base" => Ok(EmbeddingModel::MultilingualE5Base),
        "AllMiniLML6V2" | "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "AllMiniLML12V2" | "all-MiniLM-L12-v2" => Ok(EmbeddingModel::AllMiniLML12V2),
        "BGESmallENV15" | "bge-small-en-v1.5" => Ok(EmbeddingModel::BGESmallENV15),
        other => Err(EncoderError::UnknownModel(
            other.to_string(),
            SUPPORTED_MODELS,
        )),
    }
}

/// Scales a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [f32]) {
    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

/// fastembed-backed encoder.
///
/// The ONNX session is not `Sync`, so embedding calls are serialized behind a lock.
pub struct FastEmbedEncoder {
    model: Mutex<TextEmbedding>,
    dimension: VectorDimension,
    model_name: String,
}

impl std::fmt::Debug for FastEmbedEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedEncoder")
            .field("model", &self.model_name)
            .field("dimension", &self.dimension.get())
            .finish()
    }
}

impl FastEmbedEncoder {
    /// Loads (downloading on first use) the named model into `cache_dir`.
    ///
    /// # Errors
    /// Returns an error if the name is unknown or the model fails to initialize.
    pub fn new(model_name: &str, cache_dir: &Path, show_progress: bool) -> Result<Self, EncoderError> {
        let model = parse_embedding_model(model_name)?;
        tracing::debug!(model = model_name, cache = %cache_dir.display(), "initializing encoder");

        let mut embedding = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir.to_path_buf())
                .with_show_download_progress(show_progress),
        )
        .map_err(|e| EncoderError::ModelInit(e.to_string()))?;

        // Probe once to learn the output dimension
        let probe = embedding
            .embed(vec!["probe".to_string()], None)
            .map_err(|e| EncoderError::ModelInit(e.to_string()))?;
        let dimension = probe
            .first()
            .map(Vec::len)
            .ok_or_else(|| EncoderError::ModelInit("model produced no probe vector".to_string()))?;

        Ok(Self {
            model: Mutex::new(embedding),
            dimension: VectorDimension::new(dimension)?,
            model_name: model_name.trim().to_string(),
        })
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl TextEncoder for FastEmbedEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let owned: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();
        let mut embeddings = self
            .model
            .lock()
            .embed(owned, None)
            .map_err(|e| EncoderError::EmbeddingFailed(e.to_string()))?;

        for embedding in embeddings.iter_mut() {
            self.dimension.validate_vector(embedding)?;
            normalize(embedding);
        }

        Ok(embeddings)
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Deterministic encoder for unit tests: one axis per keyword.
#[cfg(test)]
pub struct MockEncoder {
    keywords: Vec<&'static str>,
}

#[cfg(test)]
impl MockEncoder {
    pub fn new(keywords: Vec<&'static str>) -> Self {
        Self { keywords }
    }
}

#[cfg(test)]
impl TextEncoder for MockEncoder {
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                // Last axis keeps unmatched text away from the zero vector
                let mut vector: Vec<f32> = self
                    .keywords
                    .iter()
                    .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
                    .collect();
                vector.push(0.05);
                normalize(&mut vector);
                vector
            })
            .collect())
    }

    fn dimension(&self) -> VectorDimension {
        VectorDimension::new(self.keywords.len() + 1).unwrap()
    }
}
