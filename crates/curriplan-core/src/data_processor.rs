use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Char-based window size and overlap used when splitting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1500, chunk_overlap: 150 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than a positive chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_config(chunking_config: ChunkingConfig) -> Result<Self> {
        chunking_config.validate()?;
        Ok(Self { chunking_config })
    }

    pub fn chunking_config(&self) -> ChunkingConfig { self.chunking_config }

    /// Reads every `.txt` file under `data_dir` and splits it into chunks,
    /// in sorted path order. Unreadable files are logged and skipped.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<Chunk>> {
        let files = self.list_txt_files(data_dir)?;
        Ok(self.process_files(data_dir, &files))
    }

    pub fn process_directory_limited(&self, data_dir: &Path, limit: usize) -> Result<Vec<Chunk>> {
        let mut files = self.list_txt_files(data_dir)?;
        if files.len() > limit {
            files.truncate(limit);
            info!(limit, "limited corpus to the first files");
        }
        Ok(self.process_files(data_dir, &files))
    }

    fn process_files(&self, data_dir: &Path, files: &[PathBuf]) -> Vec<Chunk> {
        if files.is_empty() {
            warn!(dir = %data_dir.display(), "no .txt files found");
            return vec![];
        }
        let mut all_chunks = Vec::new();
        let mut read_ok = 0usize;
        for (file_index, file_path) in files.iter().enumerate() {
            info!("Processing file {}/{}: {}", file_index + 1, files.len(), file_path.display());
            let content = match self.read_file_content(file_path) {
                Ok(content) => content,
                Err(e) => {
                    warn!(file = %file_path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            read_ok += 1;
            let source = file_path
                .file_name()
                .map_or_else(|| file_path.display().to_string(), |n| n.to_string_lossy().to_string());
            let doc_id = file_path
                .file_stem()
                .map_or_else(|| source.clone(), |s| s.to_string_lossy().to_string());
            all_chunks.extend(self.chunk_document(&content, &doc_id, &source));
        }
        info!("Processed {} files into {} chunks", read_ok, all_chunks.len());
        all_chunks
    }

    fn read_file_content(&self, file_path: &Path) -> std::io::Result<String> {
        let bytes = fs::read(file_path)?;
        match String::from_utf8(bytes) {
            Ok(content) => Ok(content),
            Err(e) => {
                warn!(file = %file_path.display(), "file is not valid UTF-8, decoding lossily");
                Ok(String::from_utf8_lossy(e.as_bytes()).to_string())
            }
        }
    }

    /// Splits one document into chunks carrying their char span and provenance.
    pub fn chunk_document(&self, content: &str, doc_id: &str, source: &str) -> Vec<Chunk> {
        let spans = self.split_spans(content);
        let byte_at: Vec<usize> = content
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(content.len()))
            .collect();
        let total_chunks = spans.len();
        spans
            .into_iter()
            .enumerate()
            .map(|(chunk_index, (start, end))| Chunk {
                id: format!("{}:{}", doc_id, chunk_index),
                doc_id: doc_id.to_string(),
                source: source.to_string(),
                content: content[byte_at[start]..byte_at[end]].to_string(),
                chunk_index,
                total_chunks,
                char_start: start,
                char_end: end,
            })
            .collect()
    }

    /// Char spans `[start, end)` covering `text` in order.
    ///
    /// Consecutive spans overlap by at most `chunk_overlap` chars, every span
    /// ends past the previous one, the first starts at 0 and the last ends at
    /// the text length. Whitespace-only input yields no spans.
    pub fn split_spans(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<char> = text.chars().collect();
        let n = chars.len();
        if chars.iter().all(|c| c.is_whitespace()) {
            return vec![];
        }
        let size = self.chunking_config.chunk_size;
        let overlap = self.chunking_config.chunk_overlap;

        let mut spans = Vec::new();
        let mut start = 0usize;
        loop {
            let mut end = if n - start <= size {
                n
            } else {
                find_cut(&chars, start + overlap + 1, start + size)
            };
            if chars[end..].iter().all(|c| c.is_whitespace()) {
                end = n;
            }
            spans.push((start, end));
            if end == n {
                break;
            }
            start = next_start(&chars, end, overlap);
        }
        spans
    }

    fn list_txt_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!("corpus directory {}", root.display())));
        }
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().and_then(|s| s.to_str()) == Some("txt") {
                txt_files.push(path.to_path_buf());
            }
        }
        txt_files.sort();
        Ok(txt_files)
    }
}

/// Picks the cut position in `[min_end, hard_end]`, preferring the latest
/// paragraph break, then line break, sentence end, whitespace, and finally
/// the hard limit.
fn find_cut(chars: &[char], min_end: usize, hard_end: usize) -> usize {
    let is_paragraph = |p: usize| p >= 2 && chars[p - 1] == '\n' && chars[p - 2] == '\n';
    let is_line = |p: usize| chars[p - 1] == '\n';
    let is_sentence = |p: usize| {
        matches!(chars[p - 1], '.' | '!' | '?' | '…') && p < chars.len() && chars[p].is_whitespace()
    };
    let is_space = |p: usize| chars[p - 1].is_whitespace();

    let rules: [&dyn Fn(usize) -> bool; 4] = [&is_paragraph, &is_line, &is_sentence, &is_space];
    for rule in rules {
        if let Some(p) = (min_end..=hard_end).rev().find(|&p| rule(p)) {
            return p;
        }
    }
    hard_end
}

/// Start of the next span: `overlap` chars before `end`, moved forward to the
/// first word start inside the overlap when there is one.
fn next_start(chars: &[char], end: usize, overlap: usize) -> usize {
    let start = end - overlap;
    match chars[start..end].iter().position(|c| c.is_whitespace()) {
        Some(offset) => {
            let word_start = chars[start + offset..end]
                .iter()
                .position(|c| !c.is_whitespace())
                .map(|p| start + offset + p);
            word_start.unwrap_or(start)
        }
        None => start,
    }
}
