//! Domain types shared by the corpus builder, the retriever and the planner.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// A span of a source document that is independently encoded and indexed.
///
/// - `id`: `"<doc_id>:<chunk_index>"`, unique within one corpus build
/// - `doc_id`: file stem of the source document
/// - `source`: file name of the source document (provenance)
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
/// - `char_start`/`char_end`: char offsets of the span in the source text
///
/// Chunks are never mutated after the build that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    pub char_start: usize,
    pub char_end: usize,
}

/// One retrieval result: the chunk plus its squared L2 distance to the query.
/// Lower is closer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub position: usize,
    pub distance: f32,
    pub chunk: Chunk,
}
