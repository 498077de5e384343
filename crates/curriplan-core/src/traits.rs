use crate::types::SearchHit;

/// Text encoder used for both corpus build and query time.
///
/// `id` must change whenever vectors stop being comparable (other model,
/// other dimension); it is pinned into the persisted corpus manifest.
pub trait Embedder: Send + Sync {
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-first chunk lookup for a free-text query.
pub trait ChunkRetriever: Send + Sync {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>>;
}

/// Remote generative model: prompt in, raw text out.
pub trait Generator: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
