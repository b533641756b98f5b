//! Aligns an externally computed clustering tree with the heatmap grid.

use crate::error::{DendroHeatError, Result};
use crate::grid::GridExtents;
use crate::table::Table;
use log::debug;
use rustc_hash::FxHashSet;

/// Row order induced by the tree's left-to-right leaf sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafOrder(Vec<usize>);

impl LeafOrder {
    pub fn new(order: Vec<usize>) -> Self {
        Self(order)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check that this is a permutation of `0..rows`.
    pub fn validate(&self, rows: usize) -> Result<()> {
        if self.0.len() != rows {
            return Err(DendroHeatError::InvalidPermutation(format!(
                "leaf order has {} entries for {} rows",
                self.0.len(),
                rows
            )));
        }
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for &idx in &self.0 {
            if idx >= rows {
                return Err(DendroHeatError::InvalidPermutation(format!(
                    "row index {} out of range for {} rows",
                    idx, rows
                )));
            }
            if !seen.insert(idx) {
                return Err(DendroHeatError::InvalidPermutation(format!(
                    "row index {} appears more than once",
                    idx
                )));
            }
        }
        Ok(())
    }
}

/// Raw branch geometry: one (position, depth) array pair per branch.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeCoordinates {
    positions: Vec<Vec<f64>>,
    depths: Vec<Vec<f64>>,
}

impl TreeCoordinates {
    pub fn new(positions: Vec<Vec<f64>>, depths: Vec<Vec<f64>>) -> Result<Self> {
        if positions.len() != depths.len() {
            return Err(DendroHeatError::MismatchedBranches {
                positions: positions.len(),
                depths: depths.len(),
                detail: String::new(),
            });
        }
        if let Some((branch, (p, d))) = positions
            .iter()
            .zip(depths.iter())
            .enumerate()
            .find(|(_, (p, d))| p.len() != d.len())
        {
            return Err(DendroHeatError::MismatchedBranches {
                positions: positions.len(),
                depths: depths.len(),
                detail: format!(
                    " (branch {} has {} positions and {} depths)",
                    branch,
                    p.len(),
                    d.len()
                ),
            });
        }
        Ok(Self { positions, depths })
    }

    pub fn positions(&self) -> &[Vec<f64>] {
        &self.positions
    }

    pub fn depths(&self) -> &[Vec<f64>] {
        &self.depths
    }

    pub fn branch_count(&self) -> usize {
        self.positions.len()
    }
}

/// Clustering result handed to the layout: leaf order plus branch geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub leaf_order: LeafOrder,
    pub tree: TreeCoordinates,
}

/// A branch rescaled into grid coordinates, drawn as a connected line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSegment {
    /// Negated, rescaled depths.
    pub x: Vec<f64>,
    /// Rescaled leaf-axis positions.
    pub y: Vec<f64>,
}

impl ScaledSegment {
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Return a copy of `table` with rows in leaf order. Labels travel with their values.
pub fn reorder(table: &Table, leaf_order: &LeafOrder) -> Result<Table> {
    leaf_order.validate(table.row_count())?;

    let labels = table.row_labels();
    let values = table.values();
    let (row_labels, rows): (Vec<String>, Vec<Vec<f64>>) = leaf_order
        .as_slice()
        .iter()
        .map(|&i| (labels[i].clone(), values[i].clone()))
        .unzip();

    debug!("Reordered {} rows to leaf order", rows.len());
    Table::new(row_labels, table.column_labels().to_vec(), rows)
}

fn global_max(arrays: &[Vec<f64>]) -> f64 {
    arrays
        .iter()
        .flatten()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

fn checked_max(arrays: &[Vec<f64>], what: &str) -> Result<f64> {
    let max = global_max(arrays);
    if max.is_finite() && max > 0.0 {
        Ok(max)
    } else {
        Err(DendroHeatError::DegenerateTree(format!(
            "maximum {} value is {}",
            what, max
        )))
    }
}

/// Rescale tree coordinates so positions span `extents.max_y` and depths span
/// `extents.max_x`, mirrored to the left of the grid.
pub fn scale(tree: &TreeCoordinates, extents: GridExtents) -> Result<Vec<ScaledSegment>> {
    if tree.branch_count() == 0 {
        return Err(DendroHeatError::DegenerateTree(
            "tree has no branches".to_string(),
        ));
    }

    // Divide before multiplying so the global maximum lands exactly on the extent.
    let max_position = checked_max(tree.positions(), "position")?;
    let max_depth = checked_max(tree.depths(), "depth")?;
    debug!(
        "Scaling {} branches (position x{:.4}, depth x{:.4})",
        tree.branch_count(),
        extents.max_y / max_position,
        extents.max_x / max_depth
    );

    Ok(tree
        .positions()
        .iter()
        .zip(tree.depths())
        .map(|(p, d)| ScaledSegment {
            x: d.iter().map(|v| -(v / max_depth * extents.max_x)).collect(),
            y: p.iter().map(|v| v / max_position * extents.max_y).collect(),
        })
        .collect())
}
