//! Fixed chart colors.
//!
//! Colors are assigned by rank, never by label, so the same distribution always renders with the
//! same colors.

use genpdf::style::Color;

/// Base sequence cycled through for pie slices and legend swatches.
pub const BASE_PALETTE: [Color; 10] = [
    Color::Rgb(0xff, 0xcc, 0x00),
    Color::Rgb(0xff, 0x99, 0x00),
    Color::Rgb(0xff, 0x66, 0x00),
    Color::Rgb(0xcc, 0x33, 0x99),
    Color::Rgb(0x99, 0x00, 0x66),
    Color::Rgb(0x33, 0x99, 0xcc),
    Color::Rgb(0x00, 0x66, 0x99),
    Color::Rgb(0xcc, 0xee, 0x66),
    Color::Rgb(0x99, 0xcc, 0x33),
    Color::Rgb(0x66, 0x99, 0x00),
];

/// Fill of regular bars in the answer bar chart.
pub const BAR_COLOR: Color = Color::Rgb(0x99, 0x33, 0x33);

/// Fill of the leading bar in the answer bar chart.
pub const LEADING_BAR_COLOR: Color = Color::Rgb(0xa9, 0x1e, 0x22);

/// Default color of the page border.
pub const BORDER_COLOR: Color = Color::Rgb(0xa9, 0x1e, 0x22);

/// Color for the category at `rank`, cycling through [`BASE_PALETTE`].
pub fn color_for_rank(rank: usize) -> Color {
    BASE_PALETTE[rank % BASE_PALETTE.len()]
}

/// The first `n` palette colors.
pub fn palette(n: usize) -> Vec<Color> {
    (0..n).map(color_for_rank).collect()
}

/// RGB channels of `color`, converting CMYK and greyscale values.
pub fn rgb_channels(color: Color) -> [u8; 3] {
    match color {
        Color::Rgb(r, g, b) => [r, g, b],
        Color::Greyscale(value) => [value, value, value],
        Color::Cmyk(c, m, y, k) => {
            let channel = |value: u8| {
                let scaled = (255 - value as u16) * (255 - k as u16) / 255;
                scaled as u8
            };
            [channel(c), channel(m), channel(y)]
        }
    }
}
