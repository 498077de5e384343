//! Per-area prompt templates, one declarative record per subject area.

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use curriplan_core::config::{expand_path, PlanSettings};
use curriplan_core::error::{Error, Result};

const BUILTIN: &str = include_str!("../templates/areas.toml");

/// Optional third line of the task block, e.g. recommended repertoire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamplesLine {
    pub label: String,
    /// Printed when the monthly plan has no example activities.
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaTemplate {
    pub id: String,
    /// Area key as it appears in the curriculum map.
    pub label: String,
    pub role: String,
    /// Retrieval query with `{age_group}` and `{topic}` placeholders.
    pub query: String,
    pub top_k: usize,
    pub key_label: String,
    pub materials_note: String,
    #[serde(default)]
    pub examples: Option<ExamplesLine>,
    pub instructions: Vec<String>,
}

impl AreaTemplate {
    pub fn render_query(&self, age_group: &str, topic: &str) -> String {
        self.query.replace("{age_group}", age_group).replace("{topic}", topic)
    }
}

#[derive(Deserialize)]
struct TemplateFile {
    areas: Vec<AreaTemplate>,
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: Vec<AreaTemplate>,
}

impl TemplateRegistry {
    /// The nine templates shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_figment(Figment::from(Toml::string(BUILTIN)), "built-in templates")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("templates file {}", path.display())));
        }
        Self::from_figment(Figment::from(Toml::file(path)), &path.display().to_string())
    }

    /// `plan.templates_file` when set, otherwise the built-in set.
    pub fn from_settings(plan: &PlanSettings) -> Result<Self> {
        match &plan.templates_file {
            Some(file) => Self::from_file(&expand_path(file)),
            None => Self::builtin(),
        }
    }

    fn from_figment(figment: Figment, origin: &str) -> Result<Self> {
        let file: TemplateFile = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", origin, e)))?;
        let registry = Self { templates: file.areas };
        registry.validate(origin)?;
        info!(origin, areas = registry.templates.len(), "area templates loaded");
        Ok(registry)
    }

    fn validate(&self, origin: &str) -> Result<()> {
        let mut labels = HashSet::new();
        for t in &self.templates {
            if !labels.insert(t.label.as_str()) {
                return Err(Error::InvalidConfig(format!("{}: duplicate area '{}'", origin, t.label)));
            }
            if t.top_k == 0 {
                return Err(Error::InvalidConfig(format!("{}: area '{}' has top_k = 0", origin, t.id)));
            }
            if !t.query.contains("{topic}") {
                return Err(Error::InvalidConfig(format!(
                    "{}: query of area '{}' lacks the {{topic}} placeholder",
                    origin, t.id
                )));
            }
        }
        Ok(())
    }

    pub fn for_area(&self, label: &str) -> Option<&AreaTemplate> {
        self.templates.iter().find(|t| t.label == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AreaTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize { self.templates.len() }

    pub fn is_empty(&self) -> bool { self.templates.is_empty() }
}
