use std::path::Path;
use tracing::debug;

use curriplan_core::error::Result;
use curriplan_core::traits::{ChunkRetriever, Embedder};
use curriplan_core::types::{Chunk, SearchHit};

use crate::index::FlatL2Index;
use crate::store::{self, Manifest};

/// Query-time view of a persisted corpus plus the encoder it was built with.
pub struct Retriever {
    index: FlatL2Index,
    chunks: Vec<Chunk>,
    manifest: Manifest,
    embedder: Box<dyn Embedder>,
}

impl Retriever {
    /// Loads the artifacts in `dir`; fails if they were built by another encoder.
    pub fn open(dir: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        let artifacts = store::load(dir, embedder.id())?;
        Ok(Self {
            index: artifacts.index,
            chunks: artifacts.chunks,
            manifest: artifacts.manifest,
            embedder,
        })
    }

    pub fn manifest(&self) -> &Manifest { &self.manifest }

    pub fn len(&self) -> usize { self.chunks.len() }

    pub fn is_empty(&self) -> bool { self.chunks.is_empty() }
}

impl ChunkRetriever for Retriever {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let mut vectors = self.embedder.embed_batch(&[query.to_string()])?;
        let q = vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("encoder returned no vector for the query"))?;
        let hits = self
            .index
            .search(&q, k)?
            .into_iter()
            .filter_map(|(position, distance)| {
                self.chunks
                    .get(position)
                    .map(|chunk| SearchHit { position, distance, chunk: chunk.clone() })
            })
            .collect::<Vec<_>>();
        debug!(query, k, hits = hits.len(), "retrieved");
        Ok(hits)
    }
}
