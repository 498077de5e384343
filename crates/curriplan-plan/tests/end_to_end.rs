mod common;

use std::fs;
use tempfile::TempDir;

use common::{months, ScriptedGenerator, CURRICULUM};
use curriplan_core::config::{EmbeddingBackend, Settings};
use curriplan_core::data_processor::DataProcessor;
use curriplan_core::error::Error;
use curriplan_embed::FakeEmbedder;
use curriplan_plan::{generate_plan_file, output_file_name, CurriculumMap, EventSink, PlanGenerator, TemplateRegistry};
use curriplan_vector::{CorpusBuilder, Retriever};

#[test]
fn corpus_to_document() {
    let corpus = TempDir::new().unwrap();
    let kb = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(
        corpus.path().join("fizo.txt"),
        "Бег врассыпную. Прыжки на двух ногах с продвижением вперед.\n\nИгра «Воробышки и автомобиль».",
    )
    .unwrap();
    fs::write(corpus.path().join("music.txt"), "Песня «Осень», слушание марша, игра на ложках.").unwrap();

    let embedder = FakeEmbedder::new(64);
    CorpusBuilder::new(DataProcessor::new(), &embedder)
        .build(corpus.path(), kb.path(), None)
        .expect("build corpus");
    let retriever = Retriever::open(kb.path(), Box::new(FakeEmbedder::new(64))).expect("open corpus");

    let map = CurriculumMap::from_json_str(CURRICULUM).expect("map");
    let group = map.age_group("Средняя группа (3-4 года)").expect("group");
    let templates = TemplateRegistry::builtin().expect("templates");
    let generator = ScriptedGenerator::ok();

    let doc = PlanGenerator::new(&retriever, &generator, &templates).generate(
        group,
        "2025-2026",
        &months(),
        &EventSink::silent(),
    );
    let path = out.path().join(output_file_name(doc.age_group()));
    doc.save(&path).expect("save");
    assert!(path.ends_with("Годовой_Перспективный_план_Средняя_группа_3-4_года.docx"));
    assert_eq!(&fs::read(&path).unwrap()[..2], b"PK");
}

#[test]
fn missing_credential_aborts_before_output() {
    let out = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.generation.api_key = Some("   ".to_string());
    settings.embedding.backend = EmbeddingBackend::Fake;
    settings.data.output_dir = out.path().display().to_string();

    let err = generate_plan_file(&settings, "Средняя группа (3-4 года)", &EventSink::silent()).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingCredential)));
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn unknown_age_group_aborts_before_output() {
    let dir = TempDir::new().unwrap();
    let map_path = dir.path().join("curriculum_map.json");
    fs::write(&map_path, CURRICULUM).unwrap();
    let mut settings = Settings::default();
    settings.generation.api_key = Some("test-key".to_string());
    settings.embedding.backend = EmbeddingBackend::Fake;
    settings.data.curriculum_map = map_path.display().to_string();
    settings.data.output_dir = dir.path().join("out").display().to_string();

    let err = generate_plan_file(&settings, "Ясли", &EventSink::silent()).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UnknownAgeGroup(_))));
    assert!(!dir.path().join("out").exists());
}
