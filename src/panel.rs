//! Plain-text column listings for the two tables of a relationship, laid out
//! side by side. Widths are terminal display widths, so CJK names line up.

use unicode_width::UnicodeWidthStr;

use crate::catalog::SchemaCatalog;
use crate::infer::Relationship;

const COLUMN_HEADER: &str = "Column";
const TYPE_HEADER: &str = "Data Type";

pub struct TablePanel<'a> {
    pub title: String,
    pub rows: Vec<(&'a str, &'a str)>,
}

impl<'a> TablePanel<'a> {
    pub fn new(title: impl Into<String>, rows: Vec<(&'a str, &'a str)>) -> Self {
        Self {
            title: title.into(),
            rows,
        }
    }

    fn lines(&self) -> Vec<String> {
        let name_width = self
            .rows
            .iter()
            .map(|(name, _)| name.width())
            .fold(COLUMN_HEADER.width(), usize::max);
        let type_width = self
            .rows
            .iter()
            .map(|(_, typ)| typ.width())
            .fold(TYPE_HEADER.width(), usize::max);

        let mut lines = vec![
            self.title.clone(),
            format!("{}  {}", pad(COLUMN_HEADER, name_width), TYPE_HEADER),
            format!("{}  {}", "-".repeat(name_width), "-".repeat(type_width)),
        ];
        lines.extend(
            self.rows
                .iter()
                .map(|(name, typ)| format!("{}  {}", pad(name, name_width), typ)),
        );
        lines
    }
}

/// From-table and to-table panels for `relationship`.
pub fn relationship_panels<'a>(
    catalog: &'a SchemaCatalog,
    relationship: &Relationship,
) -> (TablePanel<'a>, TablePanel<'a>) {
    (
        TablePanel::new(
            format!("From Table: {}", relationship.from_table),
            catalog.columns_of(&relationship.from_table),
        ),
        TablePanel::new(
            format!("To Table: {}", relationship.to_table),
            catalog.columns_of(&relationship.to_table),
        ),
    )
}

pub fn side_by_side(left: &TablePanel, right: &TablePanel, gap: usize) -> String {
    let left_lines = left.lines();
    let right_lines = right.lines();
    let left_width = left_lines.iter().map(|l| l.width()).max().unwrap_or(0);

    let mut out = String::new();
    for i in 0..left_lines.len().max(right_lines.len()) {
        let l = left_lines.get(i).map(String::as_str).unwrap_or("");
        let r = right_lines.get(i).map(String::as_str).unwrap_or("");
        let line = format!("{}{}{}", pad(l, left_width), " ".repeat(gap), r);
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(fill))
}
