#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use curriplan_core::traits::{ChunkRetriever, Generator};
use curriplan_core::types::{Chunk, SearchHit};

/// Returns `k` synthetic hits per query and records every call.
#[derive(Default)]
pub struct RecordingRetriever {
    pub calls: Mutex<Vec<(String, usize)>>,
}

impl RecordingRetriever {
    pub fn calls(&self) -> Vec<(String, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChunkRetriever for RecordingRetriever {
    fn search(&self, query: &str, k: usize) -> anyhow::Result<Vec<SearchHit>> {
        let mut calls = self.calls.lock().unwrap();
        let call = calls.len();
        calls.push((query.to_string(), k));
        Ok((0..k)
            .map(|i| SearchHit {
                position: i,
                distance: i as f32,
                chunk: Chunk {
                    id: format!("doc:{call}-{i}"),
                    doc_id: "doc".to_string(),
                    source: "doc.txt".to_string(),
                    content: format!("chunk {call}-{i}"),
                    chunk_index: i,
                    total_chunks: k,
                    char_start: 0,
                    char_end: 0,
                },
            })
            .collect())
    }
}

/// Answers with a markdown-ish reply; fails for prompts containing `fail_on`.
pub struct ScriptedGenerator {
    pub fail_on: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn ok() -> Self {
        Self { fail_on: None, calls: AtomicUsize::new(0) }
    }

    pub fn failing_on(marker: &str) -> Self {
        Self { fail_on: Some(marker.to_string()), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Generator for ScriptedGenerator {
    fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_on {
            if prompt.contains(marker.as_str()) {
                anyhow::bail!("429 Resource exhausted");
            }
        }
        Ok("**Цели:** развивать\n\nСодержание работы: игра\n".to_string())
    }
}

pub const CURRICULUM: &str = r#"{
    "Средняя группа (3-4 года)": {
        "Физическая культура": [
            {"month": "Октябрь", "key_topics": ["Ходьба"], "reinforcement_topics": []},
            {"month": "Сентябрь", "key_topics": ["Бег", "Прыжки"], "reinforcement_topics": ["Равновесие"]},
            {"month": "Ноябрь", "key_topics": ["Ползание"]}
        ],
        "Музыка": [
            {"month": "Сентябрь", "key_topics": ["Осень"], "example_activities": ["Марш"]}
        ],
        "Шахматы": [
            {"month": "Сентябрь", "key_topics": ["Фигуры"]}
        ],
        "Основы математики": [
            {"month": "Сентябрь", "key_topics": [], "reinforcement_topics": []}
        ]
    }
}"#;

pub fn months() -> Vec<String> {
    ["Сентябрь", "Октябрь", "Ноябрь", "Декабрь"].iter().map(|m| (*m).to_string()).collect()
}
