use std::collections::HashSet;

use unicode_width::UnicodeWidthStr;

pub const NULL_MARKER: &str = "null";

/// Raw output of one executed query: column names plus rows of nullable
/// opaque values, each row as wide as `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl ResultSet {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<Vec<u8>>>>) -> Self {
        Self { columns, rows }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RenderedTable {
    #[must_use]
    pub fn from_result_set(result: &ResultSet) -> Self {
        let mut seen = HashSet::with_capacity(result.columns.len());
        let header = result
            .columns
            .iter()
            .filter(|column| seen.insert(column.as_str()))
            .cloned()
            .collect::<Vec<_>>();

        let rows = result
            .rows
            .iter()
            .map(|row| row.iter().map(|value| cell_text(value.as_deref())).collect())
            .collect();

        Self { header, rows }
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.header.len()))
            .max()
            .unwrap_or(0)
    }

    /// Draws the table as an ASCII box with a separator after every row.
    #[must_use]
    pub fn render(&self) -> String {
        let column_count = self.column_count();
        if column_count == 0 {
            return String::new();
        }

        let mut widths = vec![0_usize; column_count];
        for cells in std::iter::once(&self.header).chain(self.rows.iter()) {
            for (index, cell) in cells.iter().enumerate() {
                let width = cell.lines().map(UnicodeWidthStr::width).max().unwrap_or(0);
                widths[index] = widths[index].max(width);
            }
        }

        let border = border_line(&widths);
        let mut lines = vec![border.clone()];
        push_row_lines(&mut lines, &self.header, &widths);
        lines.push(border.clone());
        for row in &self.rows {
            push_row_lines(&mut lines, row, &widths);
            lines.push(border.clone());
        }
        lines.join("\n")
    }
}

fn cell_text(value: Option<&[u8]>) -> String {
    match value {
        Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        None => NULL_MARKER.to_string(),
    }
}

fn border_line(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

fn push_row_lines(lines: &mut Vec<String>, cells: &[String], widths: &[usize]) {
    let cell_lines = (0..widths.len())
        .map(|index| {
            cells
                .get(index)
                .map(|cell| cell.lines().collect::<Vec<_>>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();
    let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);

    for line_index in 0..height {
        let mut line = String::from("|");
        for (column, width) in widths.iter().enumerate() {
            let text = cell_lines[column].get(line_index).copied().unwrap_or("");
            let padding = width.saturating_sub(UnicodeWidthStr::width(text));
            line.push(' ');
            line.push_str(text);
            line.push_str(&" ".repeat(padding));
            line.push_str(" |");
        }
        lines.push(line);
    }
}
