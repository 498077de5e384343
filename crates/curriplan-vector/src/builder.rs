use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tracing::info;

use curriplan_core::data_processor::DataProcessor;
use curriplan_core::error::{Error, Result};
use curriplan_core::traits::Embedder;
use curriplan_core::types::Chunk;

use crate::index::FlatL2Index;
use crate::store::{self, Manifest};

/// Offline corpus build: read, chunk, embed, index, persist.
pub struct CorpusBuilder<'a> {
    processor: DataProcessor,
    embedder: &'a dyn Embedder,
    batch_size: usize,
    show_progress: bool,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(processor: DataProcessor, embedder: &'a dyn Embedder) -> Self {
        Self { processor, embedder, batch_size: 32, show_progress: false }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Builds from every `.txt` under `corpus_dir` (or the first `limit`
    /// files) and writes the artifacts into `out_dir`.
    pub fn build(&self, corpus_dir: &Path, out_dir: &Path, limit: Option<usize>) -> Result<Manifest> {
        let chunks = match limit {
            Some(n) => self.processor.process_directory_limited(corpus_dir, n)?,
            None => self.processor.process_directory(corpus_dir)?,
        };
        if chunks.is_empty() {
            return Err(Error::EmptyCorpus(corpus_dir.display().to_string()));
        }
        let index = self.embed_all(&chunks)?;
        store::save(out_dir, &index, &chunks, self.embedder.id(), self.processor.chunking_config())
    }

    fn embed_all(&self, chunks: &[Chunk]) -> Result<FlatL2Index> {
        info!(chunks = chunks.len(), encoder = self.embedder.id(), "embedding corpus");
        let pb = if self.show_progress {
            let pb = ProgressBar::new(chunks.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%)")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut index = FlatL2Index::new(self.embedder.dim());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self
                .embedder
                .embed_batch(&texts)
                .map_err(|e| Error::Operation(format!("embedding failed: {e:#}")))?;
            if vectors.len() != batch.len() {
                return Err(Error::Operation(format!(
                    "encoder returned {} vectors for {} chunks",
                    vectors.len(),
                    batch.len()
                )));
            }
            for vector in &vectors {
                index.add(vector)?;
            }
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();
        Ok(index)
    }
}
