//! Condenses raw documents into the plain-text corpus the index is built from.

use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use curriplan_core::error::{Error, Result};
use curriplan_core::traits::Generator;

const DISTILL_PROMPT: &str = r#"ТЫ — ЭКСПЕРТ-МЕТОДИСТ, который конспектирует объемный педагогический документ.

ТВОЯ ЗАДАЧА: Прочитай предоставленный фрагмент текста. Выдели и оставь ТОЛЬКО самую важную, конкретную и практическую информацию. Удали всю "воду", общие рассуждения, приветствия, вступления и повторяющиеся фразы.

ТРЕБОВАНИЯ К РЕЗУЛЬТАТУ:
1.  **КОНКРЕТИКА:** Сохраняй только конкретные названия тем, игр, упражнений, целей, навыков, методических приемов и требований.
2.  **СТРУКТУРА:** Если в исходном тексте есть заголовки, списки или таблицы, постарайся сохранить эту структуру.
3.  **КРАТКОСТЬ:** Переформулируй длинные предложения в более короткие и емкие тезисы.
4.  **НИЧЕГО ЛИШНЕГО:** Не добавляй никаких собственных комментариев. Твоя задача — только "выжать" суть из исходного текста.

ИСХОДНЫЙ ФРАГМЕНТ ТЕКСТА:
---
{chunk}
---

ПРЕДОСТАВЬ СЖАТЫЙ КОНСПЕКТ ЭТОГО ФРАГМЕНТА:
"#;

pub fn distill_prompt(window: &str) -> String {
    DISTILL_PROMPT.replace("{chunk}", window)
}

/// Consecutive non-overlapping windows of at most `window_chars` chars.
pub fn split_windows(text: &str, window_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(window_chars.max(1))
        .map(|w| w.iter().collect())
        .collect()
}

pub struct Distiller<'a> {
    generator: &'a dyn Generator,
    window_chars: usize,
    show_progress: bool,
}

impl<'a> Distiller<'a> {
    pub fn new(generator: &'a dyn Generator, window_chars: usize) -> Self {
        Self { generator, window_chars, show_progress: false }
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Condensed text of every window joined by blank lines. A failed window
    /// contributes an empty string.
    pub fn distill_text(&self, source: &str, text: &str) -> String {
        self.distill_windows(source, text, &ProgressBar::hidden())
    }

    fn distill_windows(&self, source: &str, text: &str, pb: &ProgressBar) -> String {
        let windows = split_windows(text, self.window_chars);
        let total = windows.len();
        windows
            .iter()
            .enumerate()
            .map(|(i, window)| {
                pb.set_message(format!("{} [{}/{}]", source, i + 1, total));
                match self.generator.generate(&distill_prompt(window)) {
                    Ok(summary) => summary,
                    Err(e) => {
                        warn!(source, window = i + 1, total, error = %e, "distillation failed for window");
                        String::new()
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Distills every `.txt` under `raw_dir` into `out_dir`, keeping each
    /// file's relative directory. Returns the number of files written; empty
    /// inputs are skipped.
    pub fn distill_directory(&self, raw_dir: &Path, out_dir: &Path) -> Result<usize> {
        if !raw_dir.is_dir() {
            return Err(Error::NotFound(format!("raw documents directory {}", raw_dir.display())));
        }
        fs::create_dir_all(out_dir)?;

        let mut files: Vec<_> = walkdir::WalkDir::new(raw_dir)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
            .map(|e| e.into_path())
            .collect();
        files.sort();
        info!(count = files.len(), dir = %raw_dir.display(), "distilling documents");

        let pb = if self.show_progress {
            let pb = ProgressBar::new(files.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        let mut produced: HashSet<PathBuf> = HashSet::new();
        let mut written = 0usize;
        for path in files {
            pb.inc(1);
            let Some(out_path) = output_path(raw_dir, out_dir, &path) else { continue };
            if !produced.insert(out_path.clone()) {
                warn!(file = %path.display(), to = %out_path.display(), "output already written in this run, skipping");
                continue;
            }
            let text = match fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };
            if text.trim().is_empty() {
                warn!(file = %path.display(), "empty document, skipping");
                continue;
            }
            let source = path.display().to_string();
            let distilled = self.distill_windows(&source, &text, &pb);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out_path, distilled)?;
            info!(from = %source, to = %out_path.display(), "document distilled");
            written += 1;
        }
        pb.finish_and_clear();
        Ok(written)
    }
}

/// `out_dir/<relative dir>/<stem>.txt` for a source file under `raw_dir`.
fn output_path(raw_dir: &Path, out_dir: &Path, path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?;
    let relative_dir = path
        .parent()
        .and_then(|p| p.strip_prefix(raw_dir).ok())
        .unwrap_or_else(|| Path::new(""));
    Some(out_dir.join(relative_dir).join(format!("{}.txt", stem.to_string_lossy())))
}
