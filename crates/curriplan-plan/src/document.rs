//! The generated plan: header plus a three-column table with the month
//! column merged across consecutive rows of the same month.

use docx_rs::{
    AlignmentType, BreakType, Docx, Paragraph, Run, Table, TableCell, TableLayoutType, TableRow,
    VMergeType, WidthType,
};
use std::fs::File;
use std::path::Path;
use tracing::info;

use curriplan_core::error::{Error, Result};

/// Column widths in twentieths of a point: 2.5 cm, 3.5 cm, 10 cm.
const COLUMN_WIDTHS: [usize; 3] = [1418, 1985, 5670];
const HEADERS: [&str; 3] = ["Месяц", "Образовательная область", "Задачи организованной деятельности"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthCell {
    /// First row of a month; carries the label.
    Label,
    /// Merged into the month cell above.
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRow {
    pub month: String,
    pub area: String,
    pub content: String,
    pub month_cell: MonthCell,
}

#[derive(Debug, Clone)]
pub struct PlanDocument {
    age_group: String,
    year: String,
    rows: Vec<PlanRow>,
}

impl PlanDocument {
    pub fn new(age_group: &str, year: &str) -> Self {
        Self { age_group: age_group.to_string(), year: year.to_string(), rows: Vec::new() }
    }

    pub fn age_group(&self) -> &str { &self.age_group }

    pub fn rows(&self) -> &[PlanRow] { &self.rows }

    /// Appends a row; the month cell merges with the previous row when both
    /// belong to the same month.
    pub fn push_row(&mut self, month: &str, area: &str, content: &str) {
        let month_cell = match self.rows.last() {
            Some(prev) if prev.month == month => MonthCell::Merged,
            _ => MonthCell::Label,
        };
        self.rows.push(PlanRow {
            month: month.to_string(),
            area: area.to_string(),
            content: content.to_string(),
            month_cell,
        });
    }

    pub fn to_docx(&self) -> Docx {
        let title = format!("Перспективный план организованной деятельности на {} учебный год", self.year);
        let subtitle = format!("Группа: {}", self.age_group);

        let mut table_rows = vec![TableRow::new(
            HEADERS
                .iter()
                .zip(COLUMN_WIDTHS)
                .map(|(h, w)| {
                    TableCell::new()
                        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(*h).bold()))
                        .width(w, WidthType::Dxa)
                })
                .collect(),
        )];
        table_rows.extend(self.rows.iter().map(row_to_docx));

        Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text("Согласовано"))
                    .align(AlignmentType::Left),
            )
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(title).bold().size(52))
                    .align(AlignmentType::Center),
            )
            .add_paragraph(
                Paragraph::new()
                    .add_run(Run::new().add_text(subtitle).size(30))
                    .align(AlignmentType::Center),
            )
            .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)))
            .add_table(
                Table::new(table_rows)
                    .set_grid(COLUMN_WIDTHS.to_vec())
                    .layout(TableLayoutType::Fixed),
            )
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        self.to_docx()
            .build()
            .pack(file)
            .map_err(|e| Error::Operation(format!("writing {}: {}", path.display(), e)))?;
        info!(path = %path.display(), rows = self.rows.len(), "plan document saved");
        Ok(())
    }
}

fn row_to_docx(row: &PlanRow) -> TableRow {
    let month = match row.month_cell {
        MonthCell::Label => TableCell::new()
            .add_paragraph(text_paragraph(&row.month))
            .vertical_merge(VMergeType::Restart),
        MonthCell::Merged => TableCell::new()
            .add_paragraph(Paragraph::new())
            .vertical_merge(VMergeType::Continue),
    };
    let area = TableCell::new().add_paragraph(text_paragraph(&row.area));
    let mut content = TableCell::new();
    let mut lines = row.content.lines().peekable();
    if lines.peek().is_none() {
        content = content.add_paragraph(Paragraph::new());
    }
    for line in lines {
        content = content.add_paragraph(text_paragraph(line));
    }
    TableRow::new(vec![
        month.width(COLUMN_WIDTHS[0], WidthType::Dxa),
        area.width(COLUMN_WIDTHS[1], WidthType::Dxa),
        content.width(COLUMN_WIDTHS[2], WidthType::Dxa),
    ])
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

/// Removes `**` bold markers and blank lines, keeping line order.
pub fn clean_text(text: &str) -> String {
    text.replace("**", "")
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `Годовой_Перспективный_план_<age group>.docx` with spaces and slashes
/// turned into underscores and parentheses dropped.
pub fn output_file_name(age_group: &str) -> String {
    let safe: String = age_group
        .chars()
        .filter(|c| !matches!(c, '(' | ')'))
        .map(|c| if c == ' ' || c == '/' { '_' } else { c })
        .collect();
    format!("Годовой_Перспективный_план_{}.docx", safe)
}
