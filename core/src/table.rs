//! In-memory materialization of a query result set.
//!
//! Reports read columns by name (case-insensitive, warehouse names are
//! upper-case) and convert into typed rows.

use crate::error::{ReportError, ReportResult};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Real(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text as written to CSV and plain console dumps.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => format!("{f}"),
            Value::Text(s) => s.clone(),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for Value {
    fn from(v: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Text(format!("<{} bytes>", b.len())),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: columns.into_iter().map(|c| c.to_ascii_uppercase()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> ReportResult<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| ReportError::MissingColumn { column: name.to_ascii_uppercase() })
    }

    /// Row accessor bound to this table's column names.
    pub fn row(&self, index: usize) -> RowRef<'_> {
        RowRef { table: self, index }
    }

    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        (0..self.rows.len()).map(move |index| RowRef { table: self, index })
    }

    /// Fixed-width dump of every column, like a dataframe's `to_string`.
    pub fn to_text(&self) -> String {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(Value::render).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(c.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:>w$}"))
            .collect();
        out.push_str(&header.join(" "));
        for r in &cells {
            out.push('\n');
            let line: Vec<String> = r.iter().zip(&widths).map(|(v, w)| format!("{v:>w$}")).collect();
            out.push_str(&line.join(" "));
        }
        out
    }
}

#[derive(Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a ResultTable,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn value(&self, column: &str) -> ReportResult<&'a Value> {
        let col = self.table.column_index(column)?;
        Ok(&self.table.rows[self.index][col])
    }

    pub fn i64(&self, column: &str) -> ReportResult<i64> {
        self.value(column)?.as_i64().ok_or_else(|| self.bad(column, "integer"))
    }

    pub fn f64(&self, column: &str) -> ReportResult<f64> {
        self.value(column)?.as_f64().ok_or_else(|| self.bad(column, "number"))
    }

    /// Nullable numeric column (e.g. a rate over an empty denominator).
    pub fn opt_f64(&self, column: &str) -> ReportResult<Option<f64>> {
        let v = self.value(column)?;
        if v.is_null() {
            return Ok(None);
        }
        v.as_f64().map(Some).ok_or_else(|| self.bad(column, "number"))
    }

    pub fn text(&self, column: &str) -> ReportResult<String> {
        match self.value(column)? {
            Value::Null => Err(self.bad(column, "text")),
            v => Ok(v.render()),
        }
    }

    fn bad(&self, column: &str, expected: &'static str) -> ReportError {
        ReportError::BadValue {
            column: column.to_ascii_uppercase(),
            row: self.index,
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultTable {
        let mut t = ResultTable::new(vec!["statement_number".into(), "rate".into()]);
        t.push(vec![Value::Integer(18), Value::Real(91.25)]);
        t.push(vec![Value::Text("26".into()), Value::Null]);
        t
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let t = sample();
        assert_eq!(t.columns[0], "STATEMENT_NUMBER");
        assert_eq!(t.row(0).i64("Statement_Number").unwrap(), 18);
        assert_eq!(t.row(1).i64("STATEMENT_NUMBER").unwrap(), 26);
    }

    #[test]
    fn null_rate_is_none_but_required_rate_errors() {
        let t = sample();
        assert_eq!(t.row(1).opt_f64("rate").unwrap(), None);
        assert!(matches!(t.row(1).f64("rate"), Err(ReportError::BadValue { row: 1, .. })));
        assert!(matches!(t.row(0).f64("missing"), Err(ReportError::MissingColumn { .. })));
    }

    #[test]
    fn text_dump_aligns_columns() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("STATEMENT_NUMBER"));
        assert!(lines[1].ends_with("91.25"));
    }
}
