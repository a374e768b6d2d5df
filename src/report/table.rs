use serde_json::Value;

use crate::error::{PaperError, PaperResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

/// Row-oriented tabular data rendered as a Markdown pipe table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    index: Option<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            index: None,
        }
    }

    pub fn push_row<I, S>(&mut self, row: I) -> PaperResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.index.is_some() {
            return Err(PaperError::InvalidTable(
                "rows cannot be added after index labels are set".to_string(),
            ));
        }
        let row: Vec<String> = row.into_iter().map(Into::into).collect();
        if row.len() != self.headers.len() {
            return Err(PaperError::InvalidTable(format!(
                "row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Labels for the index column; defaults to 0-based row numbers. Set
    /// once all rows are in: later `push_row` calls are rejected.
    pub fn with_index<I, S>(mut self, labels: I) -> PaperResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.len() != self.rows.len() {
            return Err(PaperError::InvalidTable(format!(
                "{} index labels for {} rows",
                labels.len(),
                self.rows.len()
            )));
        }
        self.index = Some(labels);
        Ok(self)
    }

    /// Builds a table from JSON objects; columns follow the order keys are
    /// first seen while iterating the records.
    pub fn from_records(records: &[Value]) -> PaperResult<Self> {
        let mut headers: Vec<String> = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                PaperError::InvalidTable(format!("record {i} is not a JSON object"))
            })?;
            for key in object.keys() {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
        }

        let mut table = Table::new(headers.clone());
        for record in records {
            let row: Vec<String> = headers
                .iter()
                .map(|h| record.get(h).map(cell_text).unwrap_or_default())
                .collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_markdown(&self, show_index: bool) -> String {
        let mut columns: Vec<(String, Vec<String>)> = Vec::new();
        if show_index {
            let labels = match &self.index {
                Some(labels) => labels.clone(),
                None => (0..self.rows.len()).map(|i| i.to_string()).collect(),
            };
            columns.push((String::new(), labels));
        }
        for (c, header) in self.headers.iter().enumerate() {
            let cells = self.rows.iter().map(|row| escape(&row[c])).collect();
            columns.push((escape(header), cells));
        }

        let layout: Vec<(usize, Align)> = columns
            .iter()
            .map(|(header, cells)| {
                let width = cells
                    .iter()
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .max(3);
                (width, column_alignment(cells))
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(format_line(columns.iter().map(|(h, _)| h.as_str()), &layout));
        lines.push(
            layout
                .iter()
                .map(|(width, align)| match align {
                    Align::Left => format!(":{}", "-".repeat(width + 1)),
                    Align::Right => format!("{}:", "-".repeat(width + 1)),
                })
                .fold(String::from("|"), |acc, seg| acc + &seg + "|"),
        );
        for r in 0..self.rows.len() {
            lines.push(format_line(
                columns.iter().map(|(_, cells)| cells[r].as_str()),
                &layout,
            ));
        }
        lines.join("\n")
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn escape(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

fn column_alignment(cells: &[String]) -> Align {
    let mut filled = cells.iter().filter(|c| !c.trim().is_empty()).peekable();
    if filled.peek().is_none() {
        return Align::Left;
    }
    if filled.all(|c| c.trim().parse::<f64>().is_ok()) {
        Align::Right
    } else {
        Align::Left
    }
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, layout: &[(usize, Align)]) -> String {
    let mut line = String::from("|");
    for (cell, &(width, align)) in cells.zip(layout) {
        let padded = match align {
            Align::Left => format!(" {cell:<width$} "),
            Align::Right => format!(" {cell:>width$} "),
        };
        line.push_str(&padded);
        line.push('|');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Table {
        let mut table = Table::new(["host", "alerts"]);
        table.push_row(["web-01", "12"]).unwrap();
        table.push_row(["db", "3"]).unwrap();
        table
    }

    #[test]
    fn test_pipe_table_without_index() {
        assert_eq!(
            sample().to_markdown(false),
            "| host   | alerts |\n\
             |:-------|-------:|\n\
             | web-01 |     12 |\n\
             | db     |      3 |"
        );
    }

    #[test]
    fn test_pipe_table_with_row_number_index() {
        let markdown = sample().to_markdown(true);
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines[0], "|     | host   | alerts |");
        assert_eq!(lines[1], "|----:|:-------|-------:|");
        assert_eq!(lines[2], "|   0 | web-01 |     12 |");
        assert_eq!(lines[3], "|   1 | db     |      3 |");
    }

    #[test]
    fn test_explicit_index_labels() {
        let table = sample().with_index(["a", "b"]).unwrap();
        let markdown = table.to_markdown(true);
        assert!(markdown.lines().nth(2).unwrap().starts_with("| a   |"));
        assert!(sample().with_index(["only-one"]).is_err());
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let mut table = Table::new(["a", "b"]);
        let err = table.push_row(["1"]).unwrap_err();
        assert!(matches!(err, PaperError::InvalidTable(_)));
        assert!(table.is_empty());
    }

    #[test]
    fn test_from_records() {
        let table = Table::from_records(&[
            json!({"name": "alpha", "count": 2}),
            json!({"name": "beta", "owner": null, "count": 10}),
        ])
        .unwrap();

        assert_eq!(table.len(), 2);
        let markdown = table.to_markdown(false);
        let lines: Vec<&str> = markdown.lines().collect();
        assert_eq!(lines[0], "| name  | count | owner |");
        assert_eq!(lines[2], "| alpha |     2 |       |");
        assert_eq!(lines[3], "| beta  |    10 |       |");
    }

    #[test]
    fn test_from_records_keeps_key_order() {
        let table = Table::from_records(&[json!({"zeta": 1, "alpha": 2})]).unwrap();
        assert!(table.to_markdown(false).starts_with("| zeta | alpha |"));
    }

    #[test]
    fn test_rows_rejected_once_index_is_set() {
        let mut table = Table::new(["host"]).with_index(Vec::<String>::new()).unwrap();
        let err = table.push_row(["web-01"]).unwrap_err();
        assert!(matches!(err, PaperError::InvalidTable(_)));
        assert!(table.is_empty());
        assert_eq!(table.to_markdown(true), "|     | host |\n|:----|:-----|");
    }

    #[test]
    fn test_from_records_rejects_non_objects() {
        assert!(Table::from_records(&[json!([1, 2])]).is_err());
    }

    #[test]
    fn test_escapes_pipes() {
        let mut table = Table::new(["expr"]);
        table.push_row(["a|b"]).unwrap();
        assert!(table.to_markdown(false).contains(r"a\|b"));
    }
}
