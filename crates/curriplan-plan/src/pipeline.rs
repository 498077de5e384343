//! Month-major, area-minor generation of one plan document.

use std::path::PathBuf;
use tracing::{error, info, warn};

use curriplan_core::config::{resolve_with_base, Settings};
use curriplan_core::traits::{ChunkRetriever, Generator};
use curriplan_embed::load_embedder;
use curriplan_vector::Retriever;

use crate::context::assemble_context;
use crate::curriculum::{AgeGroupPlan, CurriculumMap, MonthlyPlan};
use crate::document::{clean_text, output_file_name, PlanDocument};
use crate::generation::GeminiClient;
use crate::prompt::compose_prompt;
use crate::templates::{AreaTemplate, TemplateRegistry};
use crate::worker::EventSink;

/// Cell text for an area that has no template.
pub const MISSING_TEMPLATE_TEXT: &str = "Функции-генераторы не найдены.";

pub fn cell_error_text(err: &anyhow::Error) -> String {
    format!("Ошибка генерации: {err:#}")
}

pub struct PlanGenerator<'a> {
    retriever: &'a dyn ChunkRetriever,
    generator: &'a dyn Generator,
    templates: &'a TemplateRegistry,
}

impl<'a> PlanGenerator<'a> {
    pub fn new(
        retriever: &'a dyn ChunkRetriever,
        generator: &'a dyn Generator,
        templates: &'a TemplateRegistry,
    ) -> Self {
        Self { retriever, generator, templates }
    }

    /// Number of rows `generate` will emit for `group` over `months`.
    pub fn count_cells(group: &AgeGroupPlan, months: &[String]) -> usize {
        months
            .iter()
            .map(|m| group.areas.iter().filter(|a| a.plan_for(m).is_some()).count())
            .sum()
    }

    /// Builds the document. Failures inside a cell become that cell's text;
    /// nothing here aborts the run.
    pub fn generate(&self, group: &AgeGroupPlan, year: &str, months: &[String], sink: &EventSink) -> PlanDocument {
        let total = Self::count_cells(group, months);
        let mut done = 0usize;
        let mut doc = PlanDocument::new(&group.name, year);
        info!(age_group = %group.name, cells = total, "generating plan");
        sink.progress(0, total);

        for month in months {
            sink.status(format!("Обработка месяца: {}", month));
            for area in &group.areas {
                let Some(plan) = area.plan_for(month) else {
                    info!(area = %area.area, month = %month, "no plan for this month, skipping");
                    continue;
                };
                sink.status(format!("Генерация ячейки: {} / {}", month, area.area));
                let content = match self.templates.for_area(&area.area) {
                    Some(template) => match self.generate_cell(template, &group.name, month, plan) {
                        Ok(text) => clean_text(&text),
                        Err(e) => {
                            error!(area = %area.area, month = %month, error = %e, "cell generation failed");
                            cell_error_text(&e)
                        }
                    },
                    None => {
                        warn!(area = %area.area, "no template for this area");
                        MISSING_TEMPLATE_TEXT.to_string()
                    }
                };
                doc.push_row(month, &area.area, &content);
                done += 1;
                sink.progress(done, total);
            }
        }
        doc
    }

    fn generate_cell(
        &self,
        template: &AreaTemplate,
        age_group: &str,
        month: &str,
        plan: &MonthlyPlan,
    ) -> anyhow::Result<String> {
        let context = assemble_context(self.retriever, template, age_group, plan)?;
        let prompt = compose_prompt(template, &context, month, plan);
        self.generator.generate(&prompt)
    }
}

/// Full run for one age group: setup, generation, save. Setup errors
/// (credential, corpus, curriculum, age group, templates) abort before any
/// output is written.
pub fn generate_plan_file(settings: &Settings, age_group: &str, sink: &EventSink) -> anyhow::Result<PathBuf> {
    sink.status("Подготовка: ключ API, база знаний, карта учебного года");
    let generator = GeminiClient::from_settings(&settings.generation)?;
    let curriculum = CurriculumMap::load(&settings.data.curriculum_map())?;
    let group = curriculum.age_group(age_group)?;
    let templates = TemplateRegistry::from_settings(&settings.plan)?;

    sink.status("Загрузка модели и базы знаний");
    let embedder = load_embedder(&settings.embedding)?;
    let retriever = Retriever::open(&settings.data.index_dir(), embedder)?;

    let doc = PlanGenerator::new(&retriever, &generator, &templates).generate(
        group,
        &settings.plan.year,
        &settings.plan.months,
        sink,
    );

    let out_dir = resolve_with_base(&std::env::current_dir()?, &settings.data.output_dir);
    let path = out_dir.join(output_file_name(age_group));
    doc.save(&path)?;
    info!(path = %path.display(), "generation finished");
    Ok(path)
}
