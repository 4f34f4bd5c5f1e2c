//! Text embeddings for the evidence index

use crate::config::{EmbeddingBackend, RetrievalConfig};
use crate::error::{Result, ResumeFitError};
use anyhow::Context;
use log::info;
use model2vec_rs::model::StaticModel;
use std::time::Instant;
use unicode_segmentation::UnicodeSegmentation;

/// Anything that turns texts into fixed-size vectors
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn name(&self) -> &str;
}

/// Deterministic feature-hashing embedder over lowercased unicode words.
///
/// Needs no model files, so identical inputs always map to identical vectors.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.unicode_words() {
            let token = word.to_lowercase();
            let hash = fnv1a(token.as_bytes());
            let slot = (hash % self.dimensions as u64) as usize;
            vector[slot] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(512)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

/// Model2Vec static embeddings, loaded from a local folder or a Hugging Face repo id
pub struct Model2VecEmbedder {
    model: StaticModel,
    model_name: String,
}

impl Model2VecEmbedder {
    pub fn load(repo_or_path: &str) -> Result<Self> {
        let start_time = Instant::now();
        info!("Loading Model2Vec embedding model from: {}", repo_or_path);

        let model = StaticModel::from_pretrained(repo_or_path, None, None, None)
            .with_context(|| format!("Failed to load model {}", repo_or_path))?;

        info!("Model loaded successfully in {:.2?}", start_time.elapsed());

        Ok(Self {
            model,
            model_name: repo_or_path.to_string(),
        })
    }
}

impl Embedder for Model2VecEmbedder {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(self.model.encode(texts))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

/// Build the embedder selected in the retrieval config
pub fn embedder_from_config(config: &RetrievalConfig) -> Result<Box<dyn Embedder>> {
    match config.embedding {
        EmbeddingBackend::Hashing => Ok(Box::new(HashingEmbedder::new(config.hashing_dimensions))),
        EmbeddingBackend::Model2vec => Ok(Box::new(Model2VecEmbedder::load(&config.model2vec_model)?)),
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Cosine similarity; zero vectors compare as 0.0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ResumeFitError::Embedding(format!(
            "Embedding dimensions don't match: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        Ok(0.0)
    } else {
        Ok(dot_product / (norm_a * norm_b))
    }
}

fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}
