//! Geometry and rasterization of the per-question answer bar chart.

use genpdf::style::Color;
use image::{ImageBuffer, Rgb, RgbImage};

use crate::aggregate::Distribution;
use crate::palette::{rgb_channels, BAR_COLOR, LEADING_BAR_COLOR};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Approximate number of gridline intervals on the value axis.
const TARGET_TICKS: u64 = 5;

/// One bar of the chart.
#[derive(Clone, Debug, PartialEq)]
pub struct Bar {
    /// Answer label printed under the bar.
    pub label: String,
    /// Raw count, printed above the bar.
    pub count: u64,
    /// Whether this is the leading answer.
    pub highlighted: bool,
}

impl Bar {
    /// Fill color: [`LEADING_BAR_COLOR`] for the leading answer, [`BAR_COLOR`] otherwise.
    pub fn color(&self) -> Color {
        if self.highlighted {
            LEADING_BAR_COLOR
        } else {
            BAR_COLOR
        }
    }
}

/// Position and extent of a bar inside the plot area, in plot units.
///
/// `x` is measured from the left edge of the plot area; `height` grows upwards from the axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BarRect {
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

/// Bars plus value-axis scale for one question.
#[derive(Clone, Debug, PartialEq)]
pub struct BarChartLayout {
    bars: Vec<Bar>,
    axis_max: u64,
    tick_step: u64,
}

impl BarChartLayout {
    /// Builds the layout from answer totals.
    ///
    /// Bars are ordered by descending count with lexical tie-break, and the first bar is the
    /// highlighted one. The value axis always starts at zero.
    pub fn from_distribution(totals: &Distribution) -> Self {
        let bars: Vec<Bar> = totals
            .ranked()
            .into_iter()
            .map(|entry| Bar {
                highlighted: entry.rank == 0,
                label: entry.label,
                count: entry.count,
            })
            .collect();

        let max = bars.iter().map(|bar| bar.count).max().unwrap_or(0);
        let tick_step = nice_step(max.div_ceil(TARGET_TICKS));
        let axis_max = max.div_ceil(tick_step).max(1) * tick_step;

        Self {
            bars,
            axis_max,
            tick_step,
        }
    }

    /// Returns the bars in drawing order.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Returns the highlighted bar, if there is any bar at all.
    pub fn leading(&self) -> Option<&Bar> {
        self.bars.iter().find(|bar| bar.highlighted)
    }

    /// Upper bound of the value axis. Never zero.
    pub fn axis_max(&self) -> u64 {
        self.axis_max
    }

    /// Tick values from zero to [`Self::axis_max`] inclusive.
    pub fn ticks(&self) -> Vec<u64> {
        (0..=self.axis_max / self.tick_step)
            .map(|index| index * self.tick_step)
            .collect()
    }

    /// Places every bar within a plot area of the given size.
    ///
    /// Each bar gets an equal slot and occupies `fill` (0..=1) of it, centred.
    pub fn geometry(&self, plot_width: f64, plot_height: f64, fill: f64) -> Vec<BarRect> {
        if self.bars.is_empty() {
            return Vec::new();
        }
        let slot = plot_width / self.bars.len() as f64;
        let width = slot * fill.clamp(0.0, 1.0);

        self.bars
            .iter()
            .enumerate()
            .map(|(index, bar)| BarRect {
                x: slot * index as f64 + (slot - width) / 2.0,
                width,
                height: plot_height * bar.count as f64 / self.axis_max as f64,
            })
            .collect()
    }

    /// Draws the filled bars into an RGB image covering the plot area.
    ///
    /// The bottom pixel row is the zero line of the value axis. Axes, ticks and labels are left
    /// to the caller.
    pub fn rasterize(&self, width: u32, height: u32, fill: f64) -> RgbImage {
        let rects = self.geometry(width as f64, height as f64, fill);
        let colors: Vec<Rgb<u8>> = self
            .bars
            .iter()
            .map(|bar| Rgb(rgb_channels(bar.color())))
            .collect();

        ImageBuffer::from_fn(width, height, |x, y| {
            let px = x as f64 + 0.5;
            let rise = height as f64 - (y as f64 + 0.5);
            rects
                .iter()
                .position(|rect| px >= rect.x && px < rect.x + rect.width && rise < rect.height)
                .map_or(BACKGROUND, |index| colors[index])
        })
    }
}

/// Rounds `raw` up to 1, 2 or 5 times a power of ten.
fn nice_step(raw: u64) -> u64 {
    let raw = raw.max(1);
    let mut magnitude = 1;
    while magnitude * 10 <= raw {
        magnitude *= 10;
    }
    [1, 2, 5, 10]
        .into_iter()
        .map(|factor| factor * magnitude)
        .find(|&step| step >= raw)
        .unwrap_or(10 * magnitude)
}
