use std::fmt;

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Blend this color over white with the given opacity in [0, 1].
    pub fn over_white(self, alpha: f64) -> (u8, u8, u8) {
        let a = alpha.clamp(0.0, 1.0);
        let mix = |c: u8| (255.0 - (255.0 - c as f64) * a).round() as u8;
        (mix(self.0), mix(self.1), mix(self.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Column palette, cycled by column index.
pub const PALETTE: [Rgb; 10] = [
    Rgb(0x66, 0xff, 0x66), // light green
    Rgb(0x00, 0xff, 0xff), // cyan
    Rgb(0x00, 0x00, 0x99), // navy
    Rgb(0x66, 0x00, 0xff), // violet
    Rgb(0xff, 0x00, 0xff), // magenta
    Rgb(0x99, 0x00, 0x99), // purple
    Rgb(0xff, 0x00, 0x66), // rose
    Rgb(0x99, 0x33, 0x33), // brown
    Rgb(0xff, 0x99, 0x33), // orange
    Rgb(0xff, 0xff, 0x00), // yellow
];

/// Get color for a column index
pub fn column_color(column: usize) -> Rgb {
    PALETTE[column % PALETTE.len()]
}
