//! Plain-text tables for list output.

use clap::ValueEnum;
use unicode_width::UnicodeWidthStr;

/// Column gap between cells.
const GAP: &str = "  ";

/// How list commands print their results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One short line per item.
    #[default]
    Simple,
    /// Aligned columns with a header row.
    Table,
}

/// A table of string cells aligned by display width.
#[derive(Debug, Default)]
pub struct Table {
    /// Header cells; empty for a headerless table.
    headers: Vec<String>,
    /// Body rows.
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create a table with a header row.
    pub(crate) fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Create a headerless key/value style table.
    pub(crate) fn bare() -> Self {
        Self::default()
    }

    /// Append a row.
    pub(crate) fn row<I, S>(&mut self, cells: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    /// Render with dashed rules under the header (or around a headerless body).
    pub(crate) fn render(&self) -> String {
        let widths = self.widths();
        let rule = widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join(GAP);
        let mut lines = Vec::with_capacity(self.rows.len() + 3);
        if self.headers.is_empty() {
            lines.push(rule.clone());
        } else {
            lines.push(format_row(&self.headers, &widths));
            lines.push(rule.clone());
        }
        lines.extend(self.rows.iter().map(|row| format_row(row, &widths)));
        if self.headers.is_empty() {
            lines.push(rule);
        }
        lines.join("\n")
    }

    /// Widest display width per column.
    fn widths(&self) -> Vec<usize> {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain([self.headers.len()])
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in [&self.headers].into_iter().chain(&self.rows) {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.width());
            }
        }
        widths
    }
}

/// Pad each cell to its column width and trim the trailing gap.
fn format_row(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::new();
    for (index, width) in widths.iter().enumerate() {
        let cell = cells.get(index).map_or("", String::as_str);
        if index > 0 {
            line.push_str(GAP);
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::Table;

    #[test]
    fn aligns_columns_under_headers() {
        let mut table = Table::new(["Number", "Title"]);
        table.row(["#1", "Fix crash"]).row(["#12", "Docs"]);
        assert_eq!(
            table.render(),
            "Number  Title\n------  ---------\n#1      Fix crash\n#12     Docs"
        );
    }

    #[test]
    fn headerless_tables_are_ruled_on_both_sides() {
        let mut table = Table::bare();
        table.row(["Username", "octocat"]).row(["Name", "N/A"]);
        assert_eq!(
            table.render(),
            "--------  -------\nUsername  octocat\nName      N/A\n--------  -------"
        );
    }

    #[test]
    fn measures_wide_characters_by_display_width() {
        let mut table = Table::new(["Base → Head", "User"]);
        table.row(["main → 機能", "me"]);
        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[1], "-----------  ----");
        assert_eq!(lines[2], "main → 機能  me");
    }
}
