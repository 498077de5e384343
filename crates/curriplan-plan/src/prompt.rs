use crate::curriculum::MonthlyPlan;
use crate::templates::AreaTemplate;

const NONE_PLACEHOLDER: &str = "Нет";

/// Renders the instruction prompt for one cell. The context block is
/// inserted verbatim.
pub fn compose_prompt(template: &AreaTemplate, context: &str, month: &str, plan: &MonthlyPlan) -> String {
    let reinforcement = plan.reinforcement_topics.join(", ");
    let mut lines = vec![
        format!(
            "ТЫ — {}, который составляет план занятия СТРОГО ПО ЗАДАННОМУ УЧЕБНОМУ ПЛАНУ.",
            template.role
        ),
        format!("ТВОЕ ТЕХНИЧЕСКОЕ ЗАДАНИЕ НА ЭТОТ МЕСЯЦ ({}):", month),
        "---".to_string(),
        format!("- {}: {}", template.key_label, plan.key_topics.join(", ")),
        format!(
            "- Темы для закрепления: {}",
            if reinforcement.is_empty() { NONE_PLACEHOLDER } else { reinforcement.as_str() }
        ),
    ];
    if let Some(examples) = &template.examples {
        let joined = plan.example_activities.join(", ");
        lines.push(format!(
            "- {}: {}",
            examples.label,
            if joined.is_empty() { examples.fallback.as_str() } else { joined.as_str() }
        ));
    }
    lines.push("---".to_string());
    lines.push(format!("ОПОРНЫЕ МАТЕРИАЛЫ ({}):", template.materials_note));
    lines.push("---".to_string());
    lines.push(context.to_string());
    lines.push("---".to_string());
    lines.push("ИНСТРУКЦИИ ПО ГЕНЕРАЦИИ:".to_string());
    lines.extend(
        template
            .instructions
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}.  {}", i + 1, text)),
    );
    lines.push("ПРЕДОСТАВЬ ГОТОВЫЙ, ДЕТАЛЬНЫЙ ТЕКСТ ДЛЯ ЯЧЕЙКИ, ВЫПОЛНЕННЫЙ ПО ТЕХНИЧЕСКОМУ ЗАДАНИЮ:".to_string());
    let mut prompt = lines.join("\n");
    prompt.push('\n');
    prompt
}
