//! The labelled value matrix and loaders for delimited text and spreadsheets.

use crate::error::{DendroHeatError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// A rectangular matrix of finite values with row and column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl Table {
    /// Build a table, checking that it is rectangular and finite.
    pub fn new(
        row_labels: Vec<String>,
        column_labels: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if row_labels.len() != values.len() {
            return Err(DendroHeatError::LabelMismatch {
                labels: row_labels.len(),
                rows: values.len(),
            });
        }
        let expected = column_labels.len();
        for (row, row_values) in values.iter().enumerate() {
            if row_values.len() != expected {
                return Err(DendroHeatError::RaggedRow {
                    row,
                    expected,
                    found: row_values.len(),
                });
            }
            if let Some(column) = row_values.iter().position(|v| !v.is_finite()) {
                return Err(DendroHeatError::NonFiniteValue { row, column });
            }
        }
        Ok(Self {
            row_labels,
            column_labels,
            values,
        })
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    pub fn row_count(&self) -> usize {
        self.row_labels.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_labels.len()
    }
}

/// Field separator for delimited input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
}

impl Delimiter {
    fn as_char(self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
        }
    }

    /// Pick the delimiter from a file extension (`.tsv`/`.tab` are tab separated).
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" | "tab" => Delimiter::Tab,
            _ => Delimiter::Comma,
        }
    }
}

/// Split one line, honoring double-quoted fields and `""` escapes.
/// Whitespace is trimmed outside quotes only.
fn split_line(line: &str, sep: char) -> Vec<String> {
    fn finish(field: &mut String, quoted_end: usize) -> String {
        let kept = field[quoted_end..].trim_end().len();
        field.truncate(quoted_end + kept);
        std::mem::take(field)
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted_end = 0;
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                    quoted_end = current.len();
                }
            } else {
                current.push(c);
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == sep {
            fields.push(finish(&mut current, quoted_end));
            quoted_end = 0;
        } else if !(c.is_whitespace() && current.is_empty()) {
            current.push(c);
        }
    }
    fields.push(finish(&mut current, quoted_end));
    fields
}

/// Parse delimited text whose first column holds row labels and whose first
/// line holds column labels.
pub fn parse_table(text: &str, delim: Delimiter) -> Result<Table> {
    let sep = delim.as_char();
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim_end_matches('\r')))
        .filter(|(_, l)| !l.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Table::new(Vec::new(), Vec::new(), Vec::new());
    };
    // The first header field names the index column.
    let column_labels: Vec<String> = split_line(header, sep).into_iter().skip(1).collect();

    let mut row_labels = Vec::new();
    let mut values = Vec::new();
    for (line_no, line) in lines {
        let mut fields = split_line(line, sep).into_iter();
        let label = fields.next().unwrap_or_default();
        let row = fields
            .map(|f| {
                f.parse::<f64>().map_err(|e| DendroHeatError::Parse {
                    line: line_no,
                    message: format!("{:?} is not a number: {}", f, e),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        row_labels.push(label);
        values.push(row);
    }

    debug!(
        "Parsed {} rows x {} columns",
        row_labels.len(),
        column_labels.len()
    );
    Table::new(row_labels, column_labels, values)
}

fn cell_label(cell: &Data) -> String {
    match cell {
        Data::Float(f) => f.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

fn cell_value(cell: &Data, row: usize, column: usize) -> Result<f64> {
    let parsed = match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| DendroHeatError::Parse {
        line: row + 1,
        message: format!("cell {} ({:?}) is not a number", column + 1, cell),
    })
}

/// Read the first worksheet of a spreadsheet: first row holds column labels,
/// first column holds row labels.
pub fn load_spreadsheet(path: &Path) -> Result<Table> {
    info!("Loading spreadsheet from {:?}...", path);
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DendroHeatError::UnsupportedFormat(format!("{} has no sheets", path.display())))??;

    let mut rows = range
        .rows()
        .enumerate()
        .filter(|(_, r)| r.iter().any(|c| !matches!(c, Data::Empty)));
    let Some((_, header)) = rows.next() else {
        return Table::new(Vec::new(), Vec::new(), Vec::new());
    };
    let column_labels: Vec<String> = header.iter().skip(1).map(cell_label).collect();

    let mut row_labels = Vec::new();
    let mut values = Vec::new();
    for (row, cells) in rows {
        let Some((label, rest)) = cells.split_first() else {
            continue;
        };
        let row_values = rest
            .iter()
            .enumerate()
            .map(|(j, c)| cell_value(c, row, j + 1))
            .collect::<Result<Vec<f64>>>()?;
        row_labels.push(cell_label(label));
        values.push(row_values);
    }

    debug!(
        "Read {} rows x {} columns from first sheet",
        row_labels.len(),
        column_labels.len()
    );
    Table::new(row_labels, column_labels, values)
}

/// Load a CSV, TSV or spreadsheet (`.xlsx`, `.xlsm`, `.xls`, `.ods`) file into a [`Table`].
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "ods") {
        return load_spreadsheet(path);
    }

    info!("Loading table from {:?}...", path);
    let text = fs::read_to_string(path)?;
    parse_table(&text, Delimiter::from_path(path))
}
