//! Error types for dendroheat.

/// All errors raised while loading, laying out, or rendering a heatmap.
#[derive(Debug, thiserror::Error)]
pub enum DendroHeatError {
    /// The table has no rows or no columns.
    #[error("Empty input: table has {rows} rows and {columns} columns")]
    EmptyInput { rows: usize, columns: usize },

    /// Leaf order is not a permutation of the table's row indices.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),

    /// Tree coordinates have no usable range to scale against.
    #[error("Degenerate tree: {0}")]
    DegenerateTree(String),

    /// Position and depth arrays do not pair up.
    #[error("Mismatched branches: {positions} position arrays vs {depths} depth arrays{detail}")]
    MismatchedBranches {
        positions: usize,
        depths: usize,
        detail: String,
    },

    /// A value row does not have one entry per column.
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Number of row labels differs from the number of value rows.
    #[error("{labels} row labels for {rows} value rows")]
    LabelMismatch { labels: usize, rows: usize },

    /// NaN or infinite value in the matrix.
    #[error("Non-finite value at row {row}, column {column}")]
    NonFiniteValue { row: usize, column: usize },

    /// Linkage matrix does not describe a valid binary tree.
    #[error("Invalid linkage: {0}")]
    InvalidLinkage(String),

    /// Delimited text could not be parsed.
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Input file type the loader cannot read.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    /// Spreadsheet could not be opened or read.
    #[error("Spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DendroHeatError>;
