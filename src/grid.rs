//! Heatmap cell layout.
//!
//! Every value becomes a [`Cell`] centered in a unit slot: row `i` sits at
//! `y = i + 0.5` and column `j` at `x = j + 0.5`. Intensity is the value
//! min-max normalized within its own column, and color is fixed per column.

use crate::error::{DendroHeatError, Result};
use crate::palette::{column_color, Rgb};
use crate::table::Table;
use log::debug;
use rayon::prelude::*;

/// Intensity given to every cell of a column whose values are all equal.
pub const CONSTANT_COLUMN_INTENSITY: f64 = 0.0;

/// One positioned heatmap cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub row_label: String,
    pub column_label: String,
    pub value: f64,
    /// Normalized value in [0, 1], used as fill opacity.
    pub intensity: f64,
    pub color: Rgb,
    pub x: f64,
    pub y: f64,
}

impl Cell {
    /// Hover text: row label, column label and raw value.
    pub fn tooltip(&self) -> String {
        format!(
            "Name: {}\nAttribute: {}\nValue: {}",
            self.row_label, self.column_label, self.value
        )
    }
}

/// Coordinate extents of a laid out grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridExtents {
    pub max_x: f64,
    pub max_y: f64,
}

/// All cells of one table in row-major order, plus the grid extents.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    cells: Vec<Cell>,
    row_labels: Vec<String>,
    column_labels: Vec<String>,
    extents: GridExtents,
}

impl CellGrid {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn extents(&self) -> GridExtents {
        self.extents
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[String] {
        &self.column_labels
    }

    pub fn row_count(&self) -> usize {
        self.row_labels.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_labels.len()
    }

    /// Cells of grid row `row`, left to right.
    pub fn row(&self, row: usize) -> &[Cell] {
        let n = self.column_count();
        let start = (row * n).min(self.cells.len());
        let end = (start + n).min(self.cells.len());
        &self.cells[start..end]
    }

    /// Cell at grid row `row`, column `column`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        if column >= self.column_count() {
            return None;
        }
        self.cells.get(row * self.column_count() + column)
    }
}

/// Per-column (min, max)
fn column_ranges(values: &[Vec<f64>], columns: usize) -> Vec<(f64, f64)> {
    (0..columns)
        .into_par_iter()
        .map(|j| {
            values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), row| {
                (lo.min(row[j]), hi.max(row[j]))
            })
        })
        .collect()
}

fn normalize(value: f64, (min, max): (f64, f64)) -> f64 {
    if max <= min {
        return CONSTANT_COLUMN_INTENSITY;
    }
    let range = max - min;
    let t = if range.is_finite() {
        (value - min) / range
    } else {
        // Span exceeds f64::MAX; halve everything first.
        (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
    };
    t.clamp(0.0, 1.0)
}

/// Lay out `table` as a grid of cells, in table row order.
pub fn build(table: &Table) -> Result<CellGrid> {
    let rows = table.row_count();
    let columns = table.column_count();
    if rows == 0 || columns == 0 {
        return Err(DendroHeatError::EmptyInput { rows, columns });
    }

    let values = table.values();
    let ranges = column_ranges(values, columns);
    let constant = ranges.iter().filter(|(lo, hi)| lo == hi).count();
    if constant > 0 {
        debug!(
            "{} constant column(s), intensity fixed at {}",
            constant, CONSTANT_COLUMN_INTENSITY
        );
    }

    let column_labels = table.column_labels();
    let ranges_ref = &ranges;
    let cells: Vec<Cell> = table
        .row_labels()
        .par_iter()
        .zip(values.par_iter())
        .enumerate()
        .flat_map_iter(|(i, (row_label, row_values))| {
            column_labels
                .iter()
                .zip(row_values.iter())
                .enumerate()
                .map(move |(j, (column_label, &value))| Cell {
                    row_label: row_label.clone(),
                    column_label: column_label.clone(),
                    value,
                    intensity: normalize(value, ranges_ref[j]),
                    color: column_color(j),
                    x: j as f64 + 0.5,
                    y: i as f64 + 0.5,
                })
        })
        .collect();

    debug!("Built {} cells ({} x {})", cells.len(), rows, columns);

    Ok(CellGrid {
        cells,
        row_labels: table.row_labels().to_vec(),
        column_labels: column_labels.to_vec(),
        extents: GridExtents {
            max_x: columns as f64,
            max_y: rows as f64,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::PALETTE;

    fn table(rows: &[&str], cols: &[&str], values: Vec<Vec<f64>>) -> Table {
        Table::new(
            rows.iter().map(|s| s.to_string()).collect(),
            cols.iter().map(|s| s.to_string()).collect(),
            values,
        )
        .unwrap()
    }

    fn example() -> Table {
        table(&["A", "B"], &["c1", "c2"], vec![vec![0.0, 10.0], vec![5.0, 20.0]])
    }

    #[test]
    fn normalizes_each_column() {
        let grid = build(&example()).unwrap();
        assert_eq!(grid.cells().len(), 4);
        let c1: Vec<f64> = (0..2).map(|i| grid.cell(i, 0).unwrap().intensity).collect();
        let c2: Vec<f64> = (0..2).map(|i| grid.cell(i, 1).unwrap().intensity).collect();
        assert_eq!(c1, vec![0.0, 1.0]);
        assert_eq!(c2, vec![0.0, 1.0]);
    }

    #[test]
    fn cells_are_centered_in_slots() {
        let grid = build(&example()).unwrap();
        let a_c1 = grid.cell(0, 0).unwrap();
        assert_eq!((a_c1.row_label.as_str(), a_c1.column_label.as_str()), ("A", "c1"));
        assert_eq!((a_c1.x, a_c1.y), (0.5, 0.5));
        let b_c2 = grid.cell(1, 1).unwrap();
        assert_eq!((b_c2.x, b_c2.y), (1.5, 1.5));
        assert_eq!(b_c2.value, 20.0);
    }

    #[test]
    fn extents_are_tight() {
        let grid = build(&example()).unwrap();
        assert_eq!(
            grid.extents(),
            GridExtents {
                max_x: 2.0,
                max_y: 2.0
            }
        );
    }

    #[test]
    fn constant_column_gets_neutral_intensity() {
        let t = table(
            &["A", "B", "C"],
            &["flat", "slope"],
            vec![vec![3.0, 1.0], vec![3.0, 2.0], vec![3.0, 3.0]],
        );
        let grid = build(&t).unwrap();
        for i in 0..3 {
            let cell = grid.cell(i, 0).unwrap();
            assert!(!cell.intensity.is_nan());
            assert_eq!(cell.intensity, CONSTANT_COLUMN_INTENSITY);
        }
        assert_eq!(grid.cell(1, 1).unwrap().intensity, 0.5);
    }

    #[test]
    fn single_row_table() {
        let t = table(&["only"], &["a", "b", "c"], vec![vec![1.0, -4.0, 9.0]]);
        let grid = build(&t).unwrap();
        assert_eq!(grid.cells().len(), 3);
        assert!(grid
            .cells()
            .iter()
            .all(|c| c.intensity == CONSTANT_COLUMN_INTENSITY));
    }

    #[test]
    fn colors_cycle_by_column_index() {
        let cols: Vec<String> = (0..23).map(|j| format!("c{}", j)).collect();
        let col_refs: Vec<&str> = cols.iter().map(String::as_str).collect();
        let values = vec![(0..23).map(|j| j as f64).collect::<Vec<_>>(); 2];
        let t = table(&["r0", "r1"], &col_refs, values);
        let grid = build(&t).unwrap();
        for j in 0..13 {
            assert_eq!(grid.cell(0, j).unwrap().color, grid.cell(1, j + 10).unwrap().color);
        }
        assert_eq!(grid.cell(0, 22).unwrap().color, PALETTE[2]);
        assert_eq!(build(&t).unwrap(), grid);
    }

    #[test]
    fn empty_tables_are_rejected() {
        let no_rows = table(&[], &["c1"], vec![]);
        assert!(matches!(
            build(&no_rows),
            Err(DendroHeatError::EmptyInput { rows: 0, columns: 1 })
        ));
        let no_cols = table(&["A"], &[], vec![vec![]]);
        assert!(matches!(
            build(&no_cols),
            Err(DendroHeatError::EmptyInput { rows: 1, columns: 0 })
        ));
    }

    #[test]
    fn intensities_stay_in_unit_range() {
        let t = table(
            &["a", "b", "c", "d"],
            &["x", "y"],
            vec![
                vec![-1e9, 0.1],
                vec![3.0, 0.2],
                vec![1e-12, 0.3],
                vec![7.5, 0.1],
            ],
        );
        let grid = build(&t).unwrap();
        assert_eq!(grid.cells().len(), 8);
        assert!(grid
            .cells()
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.intensity)));
    }

    #[test]
    fn overflowing_column_span_stays_finite() {
        let t = table(
            &["lo", "mid", "hi"],
            &["c"],
            vec![vec![-1.7e308], vec![0.0], vec![1.7e308]],
        );
        let grid = build(&t).unwrap();
        let intensities: Vec<f64> = (0..3).map(|i| grid.cell(i, 0).unwrap().intensity).collect();
        assert_eq!(intensities, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn tooltip_has_label_and_value() {
        let grid = build(&example()).unwrap();
        let tip = grid.cell(1, 0).unwrap().tooltip();
        assert_eq!(tip, "Name: B\nAttribute: c1\nValue: 5");
    }

    #[test]
    fn row_slices_follow_table_order() {
        let grid = build(&example()).unwrap();
        let values: Vec<f64> = grid.row(1).iter().map(|c| c.value).collect();
        assert_eq!(values, vec![5.0, 20.0]);
        assert!(grid.cell(0, 2).is_none());
        assert!(grid.cell(2, 0).is_none());
    }
}
