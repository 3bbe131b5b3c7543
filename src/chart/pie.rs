//! Pie chart geometry and rasterization.
//!
//! Angles are in degrees, measured clockwise from twelve o'clock. Slices follow the ranked order
//! of the distribution, so the first slice starts at the top and is always the leading category.

use genpdf::style::Color;
use image::{ImageBuffer, Rgb, RgbImage};

use crate::aggregate::Distribution;
use crate::palette::{color_for_rank, rgb_channels};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const SEPARATOR: Rgb<u8> = Rgb([255, 255, 255]);

/// One slice of a pie chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    /// Category label.
    pub label: String,
    /// Raw count.
    pub count: u64,
    /// Share of the total in percent.
    pub percentage: f64,
    /// Start angle in degrees, clockwise from the top.
    pub start: f64,
    /// Angular extent in degrees.
    pub sweep: f64,
    /// Fill color, assigned by rank.
    pub color: Color,
    /// Whether the slice is drawn offset from the centre.
    pub popped: bool,
}

impl Slice {
    /// Angle of the slice bisector.
    pub fn mid_angle(&self) -> f64 {
        self.start + self.sweep / 2.0
    }

    fn contains_angle(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.start + self.sweep
    }
}

/// Slices of one demographic distribution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PieLayout {
    slices: Vec<Slice>,
    total: u64,
}

impl PieLayout {
    /// Builds slices from `distribution`.
    ///
    /// Categories with a zero count get no slice. An empty or all-zero distribution yields a
    /// layout with no slices, which callers render as a "no responses" note.
    pub fn from_distribution(distribution: &Distribution) -> Self {
        let total = distribution.total();
        if total == 0 {
            return Self::default();
        }

        let mut start = 0.0;
        let slices = distribution
            .ranked()
            .into_iter()
            .filter(|entry| entry.count > 0)
            .map(|entry| {
                let sweep = 360.0 * entry.count as f64 / total as f64;
                let slice = Slice {
                    popped: entry.rank == 0,
                    color: color_for_rank(entry.rank),
                    label: entry.label,
                    count: entry.count,
                    percentage: entry.percentage,
                    start,
                    sweep,
                };
                start += sweep;
                slice
            })
            .collect();

        Self { slices, total }
    }

    /// Returns the slices in drawing order.
    pub fn slices(&self) -> &[Slice] {
        &self.slices
    }

    /// Sum of slice counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Returns `true` when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Returns the popped-out slice.
    pub fn popped(&self) -> Option<&Slice> {
        self.slices.iter().find(|slice| slice.popped)
    }

    /// Offset of `slice` from the pie centre, as (dx, dy) with y pointing down.
    ///
    /// A pie with a single slice is never offset.
    pub fn offset(&self, slice: &Slice, popout: f64) -> (f64, f64) {
        if !slice.popped || self.slices.len() < 2 {
            return (0.0, 0.0);
        }
        let angle = slice.mid_angle().to_radians();
        (angle.sin() * popout, -angle.cos() * popout)
    }

    /// Index of the slice covering the point `(x, y)` relative to the unshifted centre.
    pub fn slice_at(&self, x: f64, y: f64, radius: f64, popout: f64) -> Option<usize> {
        self.slices.iter().position(|slice| {
            let (dx, dy) = self.offset(slice, popout);
            let (px, py) = (x - dx, y - dy);
            px.hypot(py) <= radius && slice.contains_angle(clockwise_angle(px, py))
        })
    }

    /// Draws the pie into a square RGB image of `size` pixels.
    ///
    /// `popout` and `separator` are given in pixels. The radius leaves room for the popped
    /// slice to stay inside the image.
    pub fn rasterize(&self, size: u32, popout: f64, separator: f64) -> RgbImage {
        let centre = size as f64 / 2.0;
        let radius = (centre - popout - 1.0).max(1.0);
        let colors: Vec<Rgb<u8>> = self
            .slices
            .iter()
            .map(|slice| Rgb(rgb_channels(slice.color)))
            .collect();

        ImageBuffer::from_fn(size, size, |x, y| {
            let px = x as f64 + 0.5 - centre;
            let py = y as f64 + 0.5 - centre;
            match self.slice_at(px, py, radius, popout) {
                Some(index) => {
                    let slice = &self.slices[index];
                    let (dx, dy) = self.offset(slice, popout);
                    if self.slices.len() > 1
                        && near_edge(slice, px - dx, py - dy, separator / 2.0)
                    {
                        SEPARATOR
                    } else {
                        colors[index]
                    }
                }
                None => BACKGROUND,
            }
        })
    }
}

/// Angle of `(x, y)` (y pointing down) in degrees clockwise from the top, in `[0, 360)`.
fn clockwise_angle(x: f64, y: f64) -> f64 {
    x.atan2(-y).to_degrees().rem_euclid(360.0)
}

/// Whether the point lies within `half_width` of either radial edge of `slice`.
fn near_edge(slice: &Slice, x: f64, y: f64, half_width: f64) -> bool {
    [slice.start, slice.start + slice.sweep]
        .into_iter()
        .any(|edge| {
            let angle = edge.to_radians();
            let (ux, uy) = (angle.sin(), -angle.cos());
            let along = x * ux + y * uy;
            let across = (x * uy - y * ux).abs();
            along >= 0.0 && across <= half_width
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::BASE_PALETTE;

    fn distribution(pairs: &[(&str, u64)]) -> Distribution {
        let mut distribution = Distribution::new();
        for &(label, count) in pairs {
            distribution.add(label, count);
        }
        distribution
    }

    #[test]
    fn slices_cover_full_circle_in_rank_order() {
        let pie = PieLayout::from_distribution(&distribution(&[("X", 1), ("Y", 3), ("Z", 2)]));
        let labels: Vec<_> = pie.slices().iter().map(|slice| slice.label.as_str()).collect();
        assert_eq!(labels, ["Y", "Z", "X"]);

        let sweep: f64 = pie.slices().iter().map(|slice| slice.sweep).sum();
        assert!((sweep - 360.0).abs() < 1e-9);
        let percent: f64 = pie.slices().iter().map(|slice| slice.percentage).sum();
        assert!((percent - 100.0).abs() < 1e-9);
        assert_eq!(pie.slices()[0].start, 0.0);
    }

    #[test]
    fn popped_slice_is_the_leader() {
        let pie = PieLayout::from_distribution(&distribution(&[("b", 5), ("a", 5), ("c", 1)]));
        let popped: Vec<_> = pie.slices().iter().filter(|slice| slice.popped).collect();
        assert_eq!(popped.len(), 1);
        assert_eq!(popped[0].label, "a");
        assert_eq!(pie.popped().map(|slice| slice.count), Some(5));
    }

    #[test]
    fn colors_follow_rank() {
        let pie = PieLayout::from_distribution(&distribution(&[("X", 1), ("Y", 2), ("Z", 3)]));
        let colors: Vec<_> = pie.slices().iter().map(|slice| slice.color).collect();
        assert_eq!(colors, BASE_PALETTE[..3].to_vec());
        let again = PieLayout::from_distribution(&distribution(&[("Z", 3), ("Y", 2), ("X", 1)]));
        assert_eq!(pie, again);
    }

    #[test]
    fn zero_total_yields_empty_layout() {
        let pie = PieLayout::from_distribution(&distribution(&[("Nobody", 0)]));
        assert!(pie.is_empty());
        assert_eq!(pie.total(), 0);
        assert!(pie.popped().is_none());
    }

    #[test]
    fn popped_offset_points_along_bisector() {
        let pie = PieLayout::from_distribution(&distribution(&[("a", 1), ("b", 1)]));
        // The leader spans 0..180 degrees, so it moves right.
        let (dx, dy) = pie.offset(&pie.slices()[0], 10.0);
        assert!((dx - 10.0).abs() < 1e-9);
        assert!(dy.abs() < 1e-9);
        assert_eq!(pie.offset(&pie.slices()[1], 10.0), (0.0, 0.0));

        let single = PieLayout::from_distribution(&distribution(&[("only", 4)]));
        assert_eq!(single.offset(&single.slices()[0], 10.0), (0.0, 0.0));
    }

    #[test]
    fn raster_places_leader_on_the_right() {
        let pie = PieLayout::from_distribution(&distribution(&[("a", 3), ("b", 1)]));
        let image = pie.rasterize(101, 5.0, 0.0);
        let leader = Rgb(rgb_channels(pie.slices()[0].color));
        let other = Rgb(rgb_channels(pie.slices()[1].color));

        assert_eq!(*image.get_pixel(75, 70), leader);
        assert_eq!(*image.get_pixel(25, 30), other);
        assert_eq!(*image.get_pixel(0, 0), BACKGROUND);
    }
}
