//! Corpus index: exact flat L2 search over chunk embeddings, persisted next
//! to the chunk records it is positionally aligned with.

pub mod builder;
pub mod index;
pub mod retriever;
pub mod store;

pub use builder::CorpusBuilder;
pub use index::FlatL2Index;
pub use retriever::Retriever;
pub use store::{CorpusArtifacts, Manifest};
