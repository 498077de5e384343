//! Topic-to-context assembly: one retrieval per topic, results tagged and
//! joined into a single block.

use tracing::debug;

use curriplan_core::traits::ChunkRetriever;

use crate::curriculum::MonthlyPlan;
use crate::templates::AreaTemplate;

pub const ENTRY_DELIMITER: &str = "\n\n---\n\n";

pub fn tag_entry(topic: &str, text: &str) -> String {
    format!("[Пример методики по теме '{}']: {}", topic, text)
}

/// Context block for one (area, month). Empty topic lists give an empty
/// block without touching the retriever.
pub fn assemble_context(
    retriever: &dyn ChunkRetriever,
    template: &AreaTemplate,
    age_group: &str,
    plan: &MonthlyPlan,
) -> anyhow::Result<String> {
    let mut entries = Vec::new();
    for topic in plan.search_topics() {
        let query = template.render_query(age_group, topic);
        let hits = retriever.search(&query, template.top_k)?;
        debug!(area = %template.id, topic, hits = hits.len(), "topic retrieval");
        entries.extend(hits.iter().map(|hit| tag_entry(topic, &hit.chunk.content)));
    }
    if entries.is_empty() {
        debug!(area = %template.id, month = %plan.month, "no topics to search, context is empty");
    }
    Ok(entries.join(ENTRY_DELIMITER))
}
