//! Reference renderer for a [`HeatmapLayout`]: SVG with hover tooltips, or a PNG raster.
//!
//! Plot coordinates put row 0 at the bottom. The dendrogram, whose x values
//! are negative, is drawn in a band of `dendrogram_width` pixels left of the grid.

use crate::layout::HeatmapLayout;
use image::{Rgb as Pixel, RgbImage};
use log::debug;

/// Rendering knobs.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Side length of one cell in pixels.
    pub cell_size: u32,
    /// Width of the dendrogram band in pixels.
    pub dendrogram_width: u32,
    pub line_width: f64,
    pub title: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            cell_size: 24,
            dendrogram_width: 160,
            line_width: 1.0,
            title: "Heatmap".to_string(),
        }
    }
}

const TITLE_HEIGHT: f64 = 30.0;
const LABEL_CHAR_WIDTH: f64 = 7.0;

/// Pixel geometry shared by both backends.
struct Frame {
    band: f64,
    cell: f64,
    top: f64,
    max_x: f64,
    max_y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn new(layout: &HeatmapLayout, opts: &RenderOptions, label_space: f64) -> Self {
        let ext = layout.grid.extents();
        let band = if layout.segments.is_some() {
            opts.dendrogram_width as f64
        } else {
            0.0
        };
        let cell = opts.cell_size.max(1) as f64;
        Self {
            band,
            cell,
            top: TITLE_HEIGHT,
            max_x: ext.max_x,
            max_y: ext.max_y,
            width: band + ext.max_x * cell,
            height: TITLE_HEIGHT + ext.max_y * cell + label_space,
        }
    }

    /// Map a plot point to pixels. Negative x falls in the dendrogram band.
    fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let px = if x < 0.0 {
            self.band + x * (self.band / self.max_x)
        } else {
            self.band + x * self.cell
        };
        (px, self.top + (self.max_y - y) * self.cell)
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Render the layout as a standalone SVG document.
pub fn render_svg(layout: &HeatmapLayout, opts: &RenderOptions) -> String {
    let grid = &layout.grid;
    let max_label = grid
        .column_labels()
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0);
    let frame = Frame::new(layout, opts, max_label as f64 * LABEL_CHAR_WIDTH + 10.0);

    let mut svg = String::new();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
  .title {{ font-family: sans-serif; font-size: 16px; }}
  .column-label {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; font-size: 7pt; }}
</style>
<rect width="100%" height="100%" fill="white"/>
<text x="{tx}" y="20" class="title">{title}</text>
"#,
        w = frame.width,
        h = frame.height,
        tx = frame.band,
        title = escape_xml(&opts.title),
    ));

    for cell in grid.cells() {
        let (x, y) = frame.to_pixel(cell.x - 0.5, cell.y + 0.5);
        svg.push_str(&format!(
            r#"<rect x="{:.2}" y="{:.2}" width="{}" height="{}" fill="{}" fill-opacity="{:.4}" stroke="black" stroke-opacity="0.1"><title>{}</title></rect>"#,
            x,
            y,
            frame.cell,
            frame.cell,
            cell.color,
            cell.intensity,
            escape_xml(&cell.tooltip())
        ));
        svg.push('\n');
    }

    let label_y = frame.top + frame.max_y * frame.cell + 4.0;
    for (j, label) in grid.column_labels().iter().enumerate() {
        let (x, _) = frame.to_pixel(j as f64 + 0.5, 0.0);
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" class="column-label" transform="rotate(90 {x:.2} {y:.2})" dominant-baseline="middle">{}</text>"#,
            escape_xml(label),
            x = x,
            y = label_y,
        ));
        svg.push('\n');
    }

    if let Some(segments) = &layout.segments {
        debug!("Drawing {} dendrogram branches", segments.len());
        for segment in segments {
            let points: Vec<String> = segment
                .points()
                .map(|(x, y)| {
                    let (px, py) = frame.to_pixel(x, y);
                    format!("{:.2},{:.2}", px, py)
                })
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" fill="none" stroke="black" stroke-width="{}"/>"#,
                points.join(" "),
                opts.line_width
            ));
            svg.push('\n');
        }
    }

    svg.push_str("</svg>\n");
    svg
}

fn draw_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Pixel<u8>) {
    let (x0, y0) = (from.0.round() as i64, from.1.round() as i64);
    let (x1, y1) = (to.0.round() as i64, to.1.round() as i64);
    let (dx, dy) = ((x1 - x0).abs(), -(y1 - y0).abs());
    let (sx, sy) = (if x0 < x1 { 1 } else { -1 }, if y0 < y1 { 1 } else { -1 });
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);
    let (w, h) = (img.width() as i64, img.height() as i64);

    loop {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            img.put_pixel(x as u32, y as u32, color);
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Rasterize the layout. Cell colors are blended over white by intensity;
/// column labels are left to the SVG output.
pub fn render_png(layout: &HeatmapLayout, opts: &RenderOptions) -> RgbImage {
    let frame = Frame::new(layout, opts, 0.0);
    let (width, height) = (frame.width.ceil() as u32, frame.height.ceil() as u32);
    let mut img = RgbImage::from_pixel(width.max(1), height.max(1), Pixel([255, 255, 255]));
    debug!("image size: {}x{}", width, height);

    let size = frame.cell as u32;
    for cell in layout.grid.cells() {
        let (x, y) = frame.to_pixel(cell.x - 0.5, cell.y + 0.5);
        let (r, g, b) = cell.color.over_white(cell.intensity);
        let (x0, y0) = (x.round() as u32, y.round() as u32);
        for py in y0..(y0 + size).min(img.height()) {
            for px in x0..(x0 + size).min(img.width()) {
                img.put_pixel(px, py, Pixel([r, g, b]));
            }
        }
    }

    if let Some(segments) = &layout.segments {
        let black = Pixel([0, 0, 0]);
        for segment in segments {
            let points: Vec<(f64, f64)> = segment
                .points()
                .map(|(x, y)| frame.to_pixel(x, y))
                .collect();
            for pair in points.windows(2) {
                draw_line(&mut img, pair[0], pair[1], black);
            }
        }
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dendrogram::{Clustering, LeafOrder, TreeCoordinates};
    use crate::layout::build_layout;
    use crate::table::Table;

    fn table() -> Table {
        Table::new(
            vec!["A".into(), "B<&>".into()],
            vec!["c1".into(), "c2".into()],
            vec![vec![0.0, 10.0], vec![5.0, 20.0]],
        )
        .unwrap()
    }

    fn clustered() -> HeatmapLayout {
        let clustering = Clustering {
            leaf_order: LeafOrder::new(vec![1, 0]),
            tree: TreeCoordinates::new(vec![vec![5.0, 5.0, 15.0, 15.0]], vec![vec![0.0, 1.0, 1.0, 0.0]])
                .unwrap(),
        };
        build_layout(&table(), Some(&clustering)).unwrap()
    }

    #[test]
    fn svg_has_one_rect_per_cell_and_escaped_tooltips() {
        let layout = build_layout(&table(), None).unwrap();
        let svg = render_svg(&layout, &RenderOptions::default());
        assert_eq!(svg.matches("<title>").count(), 4);
        assert!(svg.contains("Name: B&lt;&amp;&gt;"));
        assert!(!svg.contains("<polyline"));
        assert!(svg.contains("fill=\"#66ff66\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn svg_draws_dendrogram_in_band() {
        let svg = render_svg(&clustered(), &RenderOptions::default());
        assert_eq!(svg.matches("<polyline").count(), 1);
        // Depth 1.0 is the maximum, so it reaches the left edge of the band.
        assert!(svg.contains("points=\"160.00,"));
        assert!(svg.contains(" 0.00,"));
    }

    #[test]
    fn png_size_and_cell_colors() {
        let opts = RenderOptions {
            cell_size: 10,
            dendrogram_width: 40,
            ..RenderOptions::default()
        };
        let img = render_png(&clustered(), &opts);
        assert_eq!(img.width(), 40 + 20);
        assert_eq!(img.height(), TITLE_HEIGHT as u32 + 20);

        // Bottom-left cell is grid row 0 (B) column c1, the column max.
        let bottom_left = img.get_pixel(45, TITLE_HEIGHT as u32 + 15);
        assert_eq!(*bottom_left, Pixel([0x66, 0xff, 0x66]));
        // Top-left cell is A/c1, the column min: fully transparent.
        let top_left = img.get_pixel(45, TITLE_HEIGHT as u32 + 5);
        assert_eq!(*top_left, Pixel([255, 255, 255]));
    }

    #[test]
    fn png_draws_branch_pixels() {
        let opts = RenderOptions {
            cell_size: 10,
            dendrogram_width: 40,
            ..RenderOptions::default()
        };
        let img = render_png(&clustered(), &opts);
        let dark = img
            .enumerate_pixels()
            .filter(|(x, _, p)| *x < 40 && **p == Pixel([0, 0, 0]))
            .count();
        assert!(dark > 0);
    }
}
