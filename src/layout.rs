//! Pipeline entry point tying the grid and the dendrogram together.
//!
//! Rows are put in leaf order before the grid is built, so the dendrogram's
//! vertical axis lines up with the rows it describes.

use crate::dendrogram::{self, Clustering, ScaledSegment};
use crate::error::Result;
use crate::grid::{self, CellGrid};
use crate::table::Table;
use log::info;

/// Complete layout model handed to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapLayout {
    pub grid: CellGrid,
    /// Dendrogram branches, when a clustering was supplied.
    pub segments: Option<Vec<ScaledSegment>>,
}

/// Reorder rows to the clustering's leaf order (if any), lay out the grid,
/// then scale the tree against the grid's extents.
pub fn build_layout(table: &Table, clustering: Option<&Clustering>) -> Result<HeatmapLayout> {
    let Some(clustering) = clustering else {
        info!("Laying out heatmap...");
        return Ok(HeatmapLayout {
            grid: grid::build(table)?,
            segments: None,
        });
    };

    info!("Reordering rows to match dendrogram leaves...");
    let ordered = dendrogram::reorder(table, &clustering.leaf_order)?;

    info!("Laying out heatmap...");
    let grid = grid::build(&ordered)?;

    info!("Scaling dendrogram...");
    let segments = dendrogram::scale(&clustering.tree, grid.extents())?;

    Ok(HeatmapLayout {
        grid,
        segments: Some(segments),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dendrogram::{LeafOrder, TreeCoordinates};
    use crate::error::DendroHeatError;

    fn example() -> Table {
        Table::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec!["c1".into(), "c2".into()],
            vec![vec![0.0, 10.0], vec![5.0, 20.0], vec![2.0, 15.0]],
        )
        .unwrap()
    }

    fn clustering(order: Vec<usize>) -> Clustering {
        Clustering {
            leaf_order: LeafOrder::new(order),
            tree: TreeCoordinates::new(
                vec![vec![5.0, 5.0, 15.0, 15.0], vec![10.0, 10.0, 25.0, 25.0]],
                vec![vec![0.0, 1.0, 1.0, 0.0], vec![1.0, 3.0, 3.0, 0.0]],
            )
            .unwrap(),
        }
    }

    #[test]
    fn without_clustering_keeps_table_order() {
        let layout = build_layout(&example(), None).unwrap();
        assert!(layout.segments.is_none());
        assert_eq!(layout.grid.row_labels(), &["A", "B", "C"]);
    }

    #[test]
    fn grid_rows_follow_leaf_order() {
        let table = example();
        let order = vec![2, 0, 1];
        let layout = build_layout(&table, Some(&clustering(order.clone()))).unwrap();
        for (i, &src) in order.iter().enumerate() {
            let row = layout.grid.row(i);
            let values: Vec<f64> = row.iter().map(|c| c.value).collect();
            assert_eq!(values, table.values()[src]);
            assert!(row.iter().all(|c| c.row_label == table.row_labels()[src]));
            assert!(row.iter().all(|c| c.y == i as f64 + 0.5));
        }
        let segments = layout.segments.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].y[3], 3.0);
        assert_eq!(segments[1].x[1], -2.0);
    }

    #[test]
    fn duplicate_leaf_leaves_input_untouched() {
        let table = example();
        let err = build_layout(&table, Some(&clustering(vec![2, 2, 0]))).unwrap_err();
        assert!(matches!(err, DendroHeatError::InvalidPermutation(_)));
        assert_eq!(table, example());
        assert_eq!(table.row_labels(), &["A", "B", "C"]);
    }

    #[test]
    fn leaf_order_for_wrong_row_count_fails() {
        let err = build_layout(&example(), Some(&clustering(vec![1, 0]))).unwrap_err();
        assert!(matches!(err, DendroHeatError::InvalidPermutation(_)));
    }
}
