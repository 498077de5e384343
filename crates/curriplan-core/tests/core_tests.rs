use std::fs;
use std::io::Write;
use tempfile::TempDir;

use curriplan_core::data_processor::{ChunkingConfig, DataProcessor};
use curriplan_core::error::Error;

fn processor(chunk_size: usize, chunk_overlap: usize) -> DataProcessor {
    DataProcessor::with_config(ChunkingConfig { chunk_size, chunk_overlap }).expect("valid config")
}

fn reconstruct(text: &str, spans: &[(usize, usize)]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::new();
    let mut covered = 0usize;
    for &(start, end) in spans {
        assert!(start <= covered, "spans leave a gap at {covered}");
        out.extend(&chars[covered..end]);
        covered = end;
    }
    out
}

#[test]
fn process_directory_single_small_file() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    let file_path = dir.join("a.txt");
    let mut f = fs::File::create(&file_path).unwrap();
    writeln!(f, "Short text").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor.process_directory(dir).expect("process");

    assert_eq!(chunks.len(), 1, "one small document becomes one chunk");
    assert_eq!(chunks[0].content.trim(), "Short text");
    assert_eq!(chunks[0].source, "a.txt");
    assert_eq!(chunks[0].id, "a:0");
}

#[test]
fn process_directory_limited_two_files_limit_one() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("a.txt"), "alpha bravo").unwrap();
    fs::write(dir.join("b.txt"), "charlie delta").unwrap();

    let processor = DataProcessor::new();
    let chunks = processor
        .process_directory_limited(dir, 1)
        .expect("process limited");

    // Only chunks from one document should be present
    let mut doc_ids = std::collections::HashSet::new();
    for c in &chunks { doc_ids.insert(c.doc_id.clone()); }
    assert_eq!(doc_ids.len(), 1, "limited to one source document");
    assert_eq!(chunks[0].doc_id, "a");
}

#[test]
fn process_directory_ignores_other_extensions_and_keeps_path_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("b.txt"), "second").unwrap();
    fs::write(dir.join("a.txt"), "first").unwrap();
    fs::write(dir.join("notes.md"), "ignored").unwrap();

    let chunks = DataProcessor::new().process_directory(dir).expect("process");
    let sources: Vec<&str> = chunks.iter().map(|c| c.source.as_str()).collect();
    assert_eq!(sources, vec!["a.txt", "b.txt"]);
}

#[test]
fn process_directory_decodes_invalid_utf8_lossily() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("bad.txt"), [0x66, 0x6f, 0xff, 0x6f]).unwrap();

    let chunks = DataProcessor::new().process_directory(tmp.path()).expect("process");
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].content.starts_with("fo"));
}

#[test]
fn process_directory_missing_dir_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = DataProcessor::new()
        .process_directory(&tmp.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn empty_directory_yields_no_chunks() {
    let tmp = TempDir::new().unwrap();
    let chunks = DataProcessor::new().process_directory(tmp.path()).expect("process");
    assert!(chunks.is_empty());
}

#[test]
fn hard_cuts_match_window_count_formula() {
    let text = "x".repeat(250);
    let spans = processor(100, 20).split_spans(&text);
    // ceil((250 - 20) / (100 - 20)) = 3
    assert_eq!(spans, vec![(0, 100), (80, 180), (160, 250)]);
}

#[test]
fn chunk_count_formula_holds_for_unbroken_text() {
    for n in [101usize, 180, 181, 999, 1000, 4321] {
        let text = "я".repeat(n);
        let spans = processor(100, 20).split_spans(&text);
        let expected = (n - 20).div_ceil(80);
        assert_eq!(spans.len(), expected, "n = {n}");
        assert_eq!(reconstruct(&text, &spans), text);
    }
}

#[test]
fn spans_reconstruct_prose_losslessly() {
    let paragraph = "Дети играют в мяч. Воспитатель показывает упражнение! Почему важно дышать ровно? ";
    let text = format!("{}\n\n{}\nИтог.\n", paragraph.repeat(4), paragraph.repeat(3));
    let p = processor(120, 30);
    let spans = p.split_spans(&text);
    assert!(spans.len() > 1);
    assert_eq!(reconstruct(&text, &spans), text);
    for pair in spans.windows(2) {
        let ((s0, e0), (s1, e1)) = (pair[0], pair[1]);
        assert!(s1 > s0 && e1 > e0);
        assert!(e0 - s1 <= 30, "overlap bounded by chunk_overlap");
    }
    for &(s, e) in &spans[..spans.len() - 1] {
        assert!(e - s <= 120, "chunks respect the size limit");
    }
}

#[test]
fn cut_prefers_paragraph_break_over_sentence_end() {
    let text = format!("{}\n\n{}. {}", "a".repeat(50), "b".repeat(20), "c".repeat(60));
    let spans = processor(100, 10).split_spans(&text);
    // The paragraph break ends at char 52 and wins over the later ". ".
    assert_eq!(spans[0], (0, 52));
}

#[test]
fn cut_falls_back_to_sentence_then_whitespace() {
    let sentence = format!("{}. {} {}", "a".repeat(40), "b".repeat(30), "c".repeat(60));
    let spans = processor(100, 10).split_spans(&sentence);
    assert_eq!(spans[0], (0, 41), "cut right after the period");

    let words = format!("{} {}", "a".repeat(70), "b".repeat(60));
    let spans = processor(100, 10).split_spans(&words);
    assert_eq!(spans[0], (0, 71), "cut after the last space");
}

#[test]
fn whitespace_only_input_and_tails() {
    let p = processor(10, 2);
    assert!(p.split_spans("   \n\n  ").is_empty());

    let text = format!("{}{}", "a".repeat(10), " ".repeat(5));
    assert_eq!(p.split_spans(&text), vec![(0, 15)], "whitespace tail folds into the last chunk");
}

#[test]
fn chunk_document_sets_offsets_and_totals() {
    let text = "ёжик ".repeat(40);
    let chunks = processor(50, 10).chunk_document(&text, "doc", "doc.txt");
    assert!(chunks.len() > 1);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.chunk_index, i);
        assert_eq!(c.total_chunks, chunks.len());
        assert_eq!(c.content.chars().count(), c.char_end - c.char_start);
        assert_eq!(c.id, format!("doc:{i}"));
    }
}

#[test]
fn invalid_chunking_config_is_rejected() {
    let err = DataProcessor::with_config(ChunkingConfig { chunk_size: 100, chunk_overlap: 100 })
        .err()
        .expect("overlap equal to size is invalid");
    assert!(matches!(err, Error::InvalidConfig(_)));
}
