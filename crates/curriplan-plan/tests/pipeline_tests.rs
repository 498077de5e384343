mod common;

use common::{months, RecordingRetriever, ScriptedGenerator, CURRICULUM};
use curriplan_plan::context::{assemble_context, ENTRY_DELIMITER};
use curriplan_plan::document::MonthCell;
use curriplan_plan::pipeline::MISSING_TEMPLATE_TEXT;
use curriplan_plan::{CurriculumMap, EventSink, MonthlyPlan, PlanEvent, PlanGenerator, TemplateRegistry};

const GROUP: &str = "Средняя группа (3-4 года)";

fn plan(keys: &[&str], reinforcement: &[&str]) -> MonthlyPlan {
    MonthlyPlan {
        month: "Сентябрь".to_string(),
        key_topics: keys.iter().map(|s| (*s).to_string()).collect(),
        reinforcement_topics: reinforcement.iter().map(|s| (*s).to_string()).collect(),
        example_activities: vec![],
    }
}

#[test]
fn empty_topics_give_empty_context_without_retrieval() {
    let templates = TemplateRegistry::builtin().expect("templates");
    let template = templates.for_area("Развитие речи").expect("template");
    let retriever = RecordingRetriever::default();

    let context = assemble_context(&retriever, template, GROUP, &plan(&[], &[])).expect("context");
    assert_eq!(context, "");
    assert!(retriever.calls().is_empty());
}

#[test]
fn context_groups_follow_topic_order() {
    let templates = TemplateRegistry::builtin().expect("templates");
    let template = templates.for_area("Физическая культура").expect("template");
    let retriever = RecordingRetriever::default();

    let context = assemble_context(&retriever, template, GROUP, &plan(&["A", "B"], &["C"])).expect("context");
    let entries: Vec<&str> = context.split(ENTRY_DELIMITER).collect();
    assert_eq!(entries.len(), 6);
    let expected_prefixes = ["A", "A", "B", "B", "C", "C"];
    for (entry, topic) in entries.iter().zip(expected_prefixes) {
        assert!(
            entry.starts_with(&format!("[Пример методики по теме '{topic}']: ")),
            "entry {entry:?} should be tagged with {topic}"
        );
    }
    assert!(entries[0].ends_with("chunk 0-0"));
    assert!(entries[1].ends_with("chunk 0-1"));

    let calls = retriever.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0].0,
        "Конкретная игра, упражнение или комплекс для детей Средняя группа (3-4 года) на тему: 'A'"
    );
    assert!(calls.iter().all(|(_, k)| *k == 2));
}

#[test]
fn visual_arts_retrieve_single_chunk() {
    let templates = TemplateRegistry::builtin().expect("templates");
    let template = templates
        .for_area("Рисование/Лепка/Аппликация/Конструирование")
        .expect("template");
    let retriever = RecordingRetriever::default();
    let context = assemble_context(&retriever, template, GROUP, &plan(&["Листья"], &["Круг"])).expect("context");
    assert_eq!(context.split(ENTRY_DELIMITER).count(), 2);
    assert!(retriever.calls().iter().all(|(_, k)| *k == 1));
}

#[test]
fn rows_follow_months_then_map_order_with_merged_month_cells() {
    let map = CurriculumMap::from_json_str(CURRICULUM).expect("map");
    let group = map.age_group(GROUP).expect("group");
    let templates = TemplateRegistry::builtin().expect("templates");
    let retriever = RecordingRetriever::default();
    let generator = ScriptedGenerator::ok();

    let doc = PlanGenerator::new(&retriever, &generator, &templates).generate(
        group,
        "2025-2026",
        &months(),
        &EventSink::silent(),
    );
    let layout: Vec<(&str, &str, MonthCell)> = doc
        .rows()
        .iter()
        .map(|r| (r.month.as_str(), r.area.as_str(), r.month_cell))
        .collect();
    assert_eq!(
        layout,
        vec![
            ("Сентябрь", "Физическая культура", MonthCell::Label),
            ("Сентябрь", "Музыка", MonthCell::Merged),
            ("Сентябрь", "Шахматы", MonthCell::Merged),
            ("Сентябрь", "Основы математики", MonthCell::Merged),
            ("Октябрь", "Физическая культура", MonthCell::Label),
            ("Ноябрь", "Физическая культура", MonthCell::Label),
        ]
    );
    assert_eq!(doc.rows()[0].content, "Цели: развивать\nСодержание работы: игра");
    assert_eq!(doc.rows()[2].content, MISSING_TEMPLATE_TEXT);
    // Every templated row calls the model once; the area without a template does not.
    assert_eq!(generator.calls(), 5);
}

#[test]
fn failing_cell_keeps_error_text_and_run_continues() {
    let map = CurriculumMap::from_json_str(CURRICULUM).expect("map");
    let group = map.age_group(GROUP).expect("group");
    let templates = TemplateRegistry::builtin().expect("templates");
    let retriever = RecordingRetriever::default();
    let generator = ScriptedGenerator::failing_on("МУЗЫКАЛЬНЫЙ РУКОВОДИТЕЛЬ");

    let doc = PlanGenerator::new(&retriever, &generator, &templates).generate(
        group,
        "2025-2026",
        &months(),
        &EventSink::silent(),
    );
    assert_eq!(doc.rows().len(), 6);
    let music = doc.rows().iter().find(|r| r.area == "Музыка").expect("music row");
    assert_eq!(music.content, "Ошибка генерации: 429 Resource exhausted");
    for row in doc.rows().iter().filter(|r| r.area == "Физическая культура") {
        assert_eq!(row.content, "Цели: развивать\nСодержание работы: игра");
    }
}

#[test]
fn progress_counts_emitted_cells() {
    let map = CurriculumMap::from_json_str(CURRICULUM).expect("map");
    let group = map.age_group(GROUP).expect("group");
    assert_eq!(PlanGenerator::count_cells(group, &months()), 6);

    let templates = TemplateRegistry::builtin().expect("templates");
    let retriever = RecordingRetriever::default();
    let generator = ScriptedGenerator::ok();
    let (sink, events) = EventSink::channel();
    PlanGenerator::new(&retriever, &generator, &templates).generate(group, "2025-2026", &months(), &sink);
    drop(sink);

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            PlanEvent::Progress(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.first(), Some(&0));
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(progress.len(), 7);
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
}
