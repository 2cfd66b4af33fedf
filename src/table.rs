//! In-memory tables shared by every pipeline stage.
//!
//! A [`Table`] is an ordered header plus rows of optional [`Value`] cells, where
//! `None` is the missing marker. Rows are always exactly as wide as the header.
//! The module also renders tables as aligned text for terminal previews.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::data::{Value, display_cell, text_cell};

pub type Cell = Option<Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    /// Builds a table of text cells, as produced by the CSV/TSV parser.
    pub fn from_strings<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| text_cell(cell.as_ref())).collect())
            .collect();
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Left-most column with exactly this name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_ref()
    }

    pub fn column_values(&self, name: &str) -> Option<Vec<Option<&Value>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_ref()).collect())
    }

    pub fn rename_column(&mut self, idx: usize, name: &str) {
        if let Some(header) = self.headers.get_mut(idx) {
            *header = name.to_string();
        }
    }

    pub(crate) fn headers_mut(&mut self) -> &mut [String] {
        &mut self.headers
    }

    pub(crate) fn column_cells_mut(&mut self, idx: usize) -> impl Iterator<Item = &mut Cell> {
        self.rows.iter_mut().filter_map(move |row| row.get_mut(idx))
    }

    /// Appends a column, or overwrites the left-most column of the same name.
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) {
        let mut values = values;
        values.resize(self.rows.len(), None);
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Projects onto `columns` in order. Absent columns are filled with missing.
    pub fn select<S: AsRef<str>>(&self, columns: &[S]) -> Table {
        let indices = columns
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Vec<_>>();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| row[i].clone()))
                    .collect()
            })
            .collect();
        Table {
            headers: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        }
    }

    /// Prefixes every header except those listed in `keep`.
    pub fn with_prefix(mut self, prefix: &str, keep: &[&str]) -> Table {
        for header in &mut self.headers {
            if !keep.contains(&header.as_str()) {
                *header = format!("{prefix}{header}");
            }
        }
        self
    }

    /// Row cells rendered as strings, missing cells as empty.
    pub fn display_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows
            .iter()
            .map(|row| row.iter().map(|cell| display_cell(cell.as_ref())).collect())
    }
}

/// Renders the header and the first `limit` rows as aligned plain text.
pub fn render_preview(table: &Table, limit: usize) -> String {
    let rows = table.display_rows().take(limit).collect::<Vec<_>>();
    render_table(table.headers(), &rows)
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(display_width(cell));
        }
    }
    for width in &mut widths {
        *width = (*width).max(1);
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));
    let rule = widths.iter().map(|w| "-".repeat((*w).max(3))).collect::<Vec<_>>();
    let rule_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&rule, &rule_widths));
    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let sanitized = sanitize_cell(value);
            let padding = width.saturating_sub(display_width(&sanitized));
            format!("{sanitized}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    line.truncate(line.trim_end().len());
    line
}

fn display_width(value: &str) -> usize {
    value.chars().count()
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_strings(["Target", "DR"], [vec!["a.com", "10"], vec!["b.com", ""]])
    }

    #[test]
    fn from_strings_maps_empty_cells_to_missing() {
        let table = sample();
        assert_eq!(table.get(0, "DR"), Some(&Value::String("10".to_string())));
        assert_eq!(table.get(1, "DR"), None);
    }

    #[test]
    fn new_pads_short_rows() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Some(Value::Integer(1))]],
        );
        assert_eq!(table.rows()[0].len(), 2);
        assert_eq!(table.get(0, "b"), None);
    }

    #[test]
    fn select_fills_absent_columns() {
        let table = sample().select(&["DR", "Traffic"]);
        assert_eq!(table.headers(), ["DR", "Traffic"]);
        assert_eq!(table.get(0, "Traffic"), None);
        assert_eq!(table.get(0, "DR"), Some(&Value::String("10".to_string())));
    }

    #[test]
    fn set_column_overwrites_existing() {
        let mut table = sample();
        table.set_column("DR", vec![Some(Value::Integer(1)), Some(Value::Integer(2))]);
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.get(1, "DR"), Some(&Value::Integer(2)));
    }

    #[test]
    fn with_prefix_skips_kept_columns() {
        let table = sample().with_prefix("domain.", &["Target"]);
        assert_eq!(table.headers(), ["Target", "domain.DR"]);
    }

    #[test]
    fn render_preview_aligns_columns() {
        let rendered = render_preview(&sample(), 10);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, vec!["Target  DR", "------  ---", "a.com   10", "b.com"]);
    }
}
