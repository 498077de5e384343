//! Curriculum plan generation: curriculum map, per-area templates, context
//! assembly, prompting, Gemini calls and the .docx plan document.

pub mod context;
pub mod curriculum;
pub mod distill;
pub mod document;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod templates;
pub mod worker;

pub use curriculum::{AgeGroupPlan, AreaPlan, CurriculumMap, MonthlyPlan};
pub use document::{clean_text, output_file_name, PlanDocument};
pub use pipeline::{generate_plan_file, PlanGenerator};
pub use templates::TemplateRegistry;
pub use worker::{spawn, EventSink, PlanEvent, PlanJob};
