//! Linkage matrix input for the dendrogram.
//!
//! A linkage for `n` leaves has `n - 1` merge rows `(left, right, distance,
//! count)`. Ids below `n` are leaves; id `n + k` is the cluster formed by
//! merge row `k`. [`Linkage::to_clustering`] derives the leaf order and the
//! raw U-shaped branch coordinates consumed by [`crate::dendrogram::scale`].

use crate::dendrogram::{Clustering, LeafOrder, TreeCoordinates};
use crate::error::{DendroHeatError, Result};
use crate::table::Table;
use log::debug;

/// Leaf spacing on the position axis; the first leaf sits at half a spacing.
const LEAF_SPACING: f64 = 10.0;

/// One agglomeration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
}

/// A validated linkage matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    merges: Vec<Merge>,
}

impl Linkage {
    pub fn new(merges: Vec<Merge>) -> Result<Self> {
        let n = merges.len() + 1;
        let mut used = vec![false; 2 * n - 1];

        for (k, m) in merges.iter().enumerate() {
            if !m.distance.is_finite() || m.distance < 0.0 {
                return Err(DendroHeatError::InvalidLinkage(format!(
                    "merge {} has distance {}",
                    k, m.distance
                )));
            }
            for id in [m.left, m.right] {
                if id >= n + k {
                    return Err(DendroHeatError::InvalidLinkage(format!(
                        "merge {} refers to cluster {} which does not exist yet",
                        k, id
                    )));
                }
                if used[id] {
                    return Err(DendroHeatError::InvalidLinkage(format!(
                        "cluster {} is merged more than once",
                        id
                    )));
                }
                used[id] = true;
            }
        }

        Ok(Self { merges })
    }

    /// Read merges from the first three columns of `table` (left, right, distance).
    /// Any count column is ignored.
    pub fn from_table(table: &Table) -> Result<Self> {
        if table.row_count() > 0 && table.column_count() < 3 {
            return Err(DendroHeatError::InvalidLinkage(format!(
                "expected at least 3 columns, found {}",
                table.column_count()
            )));
        }

        let as_id = |v: f64, row: usize| -> Result<usize> {
            if v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(DendroHeatError::InvalidLinkage(format!(
                    "row {} has non-integer cluster id {}",
                    row, v
                )))
            }
        };

        let merges = table
            .values()
            .iter()
            .enumerate()
            .map(|(row, v)| {
                Ok(Merge {
                    left: as_id(v[0], row)?,
                    right: as_id(v[1], row)?,
                    distance: v[2],
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(merges)
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn leaf_count(&self) -> usize {
        self.merges.len() + 1
    }

    /// Walk the tree from the root, left child first, producing the leaf
    /// order and one position/depth array pair per merge in post-order.
    pub fn to_clustering(&self) -> Result<Clustering> {
        enum Step {
            Enter(usize),
            Exit(usize),
        }

        let n = self.leaf_count();
        let mut position = vec![0.0f64; 2 * n - 1];
        let mut height = vec![0.0f64; 2 * n - 1];
        let mut order = Vec::with_capacity(n);
        let mut positions = Vec::with_capacity(self.merges.len());
        let mut depths = Vec::with_capacity(self.merges.len());

        let mut stack = vec![Step::Enter(2 * n - 2)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(id) if id < n => {
                    position[id] = LEAF_SPACING * order.len() as f64 + LEAF_SPACING / 2.0;
                    order.push(id);
                }
                Step::Enter(id) => {
                    let m = self.merges[id - n];
                    stack.push(Step::Exit(id - n));
                    stack.push(Step::Enter(m.right));
                    stack.push(Step::Enter(m.left));
                }
                Step::Exit(k) => {
                    let m = self.merges[k];
                    let (pl, pr) = (position[m.left], position[m.right]);
                    let (hl, hr) = (height[m.left], height[m.right]);
                    positions.push(vec![pl, pl, pr, pr]);
                    depths.push(vec![hl, m.distance, m.distance, hr]);
                    position[n + k] = (pl + pr) / 2.0;
                    height[n + k] = m.distance;
                }
            }
        }

        debug!("Linkage walk: {} leaves, {} branches", order.len(), positions.len());

        Ok(Clustering {
            leaf_order: LeafOrder::new(order),
            tree: TreeCoordinates::new(positions, depths)?,
        })
    }
}
