//! On-disk corpus: `index.json`, `chunks.json` and `manifest.json`.
//!
//! The manifest pins the encoder id and a blake3 digest of the chunk file so
//! a corpus is never queried with incomparable vectors or a mismatched
//! chunk list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use curriplan_core::data_processor::ChunkingConfig;
use curriplan_core::error::{Error, Result};
use curriplan_core::types::Chunk;

use crate::index::FlatL2Index;

pub const INDEX_FILE: &str = "index.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub encoder_id: String,
    pub dim: usize,
    pub count: usize,
    pub chunks_blake3: String,
    pub built_at: DateTime<Utc>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug)]
pub struct CorpusArtifacts {
    pub index: FlatL2Index,
    pub chunks: Vec<Chunk>,
    pub manifest: Manifest,
}

/// Writes the three artifact files into `dir`, replacing any previous corpus.
/// Each file is written to a temporary sibling first and renamed into place;
/// the manifest goes last.
pub fn save(
    dir: &Path,
    index: &FlatL2Index,
    chunks: &[Chunk],
    encoder_id: &str,
    chunking: ChunkingConfig,
) -> Result<Manifest> {
    if index.len() != chunks.len() {
        return Err(Error::CorruptArtifacts(format!(
            "{} vectors for {} chunks",
            index.len(),
            chunks.len()
        )));
    }
    fs::create_dir_all(dir)?;

    let chunk_bytes = serde_json::to_vec(chunks)?;
    let manifest = Manifest {
        encoder_id: encoder_id.to_string(),
        dim: index.dim(),
        count: chunks.len(),
        chunks_blake3: blake3::hash(&chunk_bytes).to_hex().to_string(),
        built_at: Utc::now(),
        chunk_size: chunking.chunk_size,
        chunk_overlap: chunking.chunk_overlap,
    };

    write_atomic(dir, INDEX_FILE, &serde_json::to_vec(index)?)?;
    write_atomic(dir, CHUNKS_FILE, &chunk_bytes)?;
    write_atomic(dir, MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)?;
    info!(dir = %dir.display(), count = manifest.count, encoder = %manifest.encoder_id, "corpus saved");
    Ok(manifest)
}

fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(dir.join(name)).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Reads and cross-checks a persisted corpus. `encoder_id` is the id of the
/// encoder that will embed queries against it.
pub fn load(dir: &Path, encoder_id: &str) -> Result<CorpusArtifacts> {
    for name in [INDEX_FILE, CHUNKS_FILE, MANIFEST_FILE] {
        let path = dir.join(name);
        if !path.is_file() {
            return Err(Error::NotFound(format!(
                "{} (build the corpus with curriplan-indexer first)",
                path.display()
            )));
        }
    }

    let manifest: Manifest = parse(&fs::read(dir.join(MANIFEST_FILE))?, MANIFEST_FILE)?;
    if manifest.encoder_id != encoder_id {
        return Err(Error::EncoderMismatch {
            expected: manifest.encoder_id,
            found: encoder_id.to_string(),
        });
    }

    let chunk_bytes = fs::read(dir.join(CHUNKS_FILE))?;
    let digest = blake3::hash(&chunk_bytes).to_hex().to_string();
    if digest != manifest.chunks_blake3 {
        return Err(Error::CorruptArtifacts(format!(
            "{} does not match the digest recorded in {}",
            CHUNKS_FILE, MANIFEST_FILE
        )));
    }
    let chunks: Vec<Chunk> = parse(&chunk_bytes, CHUNKS_FILE)?;
    let index: FlatL2Index = parse(&fs::read(dir.join(INDEX_FILE))?, INDEX_FILE)?;
    index.validate()?;

    if index.len() != chunks.len() || chunks.len() != manifest.count {
        return Err(Error::CorruptArtifacts(format!(
            "index has {} vectors, chunk file {} records, manifest {}",
            index.len(),
            chunks.len(),
            manifest.count
        )));
    }
    if index.dim() != manifest.dim {
        return Err(Error::CorruptArtifacts(format!(
            "index dimension {} differs from manifest dimension {}",
            index.dim(),
            manifest.dim
        )));
    }

    info!(dir = %dir.display(), count = manifest.count, built_at = %manifest.built_at, "corpus loaded");
    Ok(CorpusArtifacts { index, chunks, manifest })
}

fn parse<T: serde::de::DeserializeOwned>(bytes: &[u8], name: &str) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| Error::CorruptArtifacts(format!("{}: {}", name, e)))
}
