//! Curriculum map: age group → subject area → per-month plans.
//!
//! JSON object order is significant (it is the row order of the generated
//! table), so both object levels are read into ordered vectors.

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use curriplan_core::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPlan {
    pub month: String,
    #[serde(default)]
    pub key_topics: Vec<String>,
    #[serde(default)]
    pub reinforcement_topics: Vec<String>,
    #[serde(default)]
    pub example_activities: Vec<String>,
}

impl MonthlyPlan {
    /// Key topics first, then reinforcement topics.
    pub fn search_topics(&self) -> impl Iterator<Item = &str> {
        self.key_topics
            .iter()
            .chain(self.reinforcement_topics.iter())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaPlan {
    pub area: String,
    pub months: Vec<MonthlyPlan>,
}

impl AreaPlan {
    pub fn plan_for(&self, month: &str) -> Option<&MonthlyPlan> {
        self.months.iter().find(|p| p.month == month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgeGroupPlan {
    pub name: String,
    pub areas: Vec<AreaPlan>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurriculumMap {
    groups: Vec<AgeGroupPlan>,
}

impl CurriculumMap {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::NotFound(format!("curriculum map {}", path.display())));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn age_group(&self, name: &str) -> Result<&AgeGroupPlan> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| Error::UnknownAgeGroup(name.to_string()))
    }

    pub fn age_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }
}

impl<'de> Deserialize<'de> for CurriculumMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let Ordered(groups) = Ordered::<Ordered<Vec<MonthlyPlan>>>::deserialize(deserializer)?;
        let groups = groups
            .into_iter()
            .map(|(name, Ordered(areas))| AgeGroupPlan {
                name,
                areas: areas
                    .into_iter()
                    .map(|(area, months)| AreaPlan { area, months })
                    .collect(),
            })
            .collect();
        Ok(Self { groups })
    }
}

/// A JSON object read as its entries in document order.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}
