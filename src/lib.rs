//! Heatmap and dendrogram layout.
//!
//! [`build_layout`] turns a [`Table`] and an optional [`Clustering`] into a
//! [`HeatmapLayout`]: positioned, colored cells plus dendrogram branches
//! scaled into the same coordinate space. Renderers consume that model; the
//! [`render`] module has SVG and PNG implementations.

pub mod dendrogram;
pub mod error;
pub mod grid;
pub mod layout;
pub mod linkage;
pub mod palette;
pub mod render;
pub mod table;

pub use dendrogram::{reorder, scale, Clustering, LeafOrder, ScaledSegment, TreeCoordinates};
pub use error::{DendroHeatError, Result};
pub use grid::{build, Cell, CellGrid, GridExtents, CONSTANT_COLUMN_INTENSITY};
pub use layout::{build_layout, HeatmapLayout};
pub use linkage::{Linkage, Merge};
pub use palette::{column_color, Rgb, PALETTE};
pub use table::{load_spreadsheet, load_table, parse_table, Delimiter, Table};
