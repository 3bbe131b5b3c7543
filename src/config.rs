//! Report layout settings.

use std::path::PathBuf;

use genpdf::style::Color;

use crate::model::Demographic;
use crate::palette::BORDER_COLOR;

/// Maximum characters per legend line.
pub const DEFAULT_LEGEND_LINE_CHARS: usize = 28;

/// Resolution charts are rasterized at unless configured otherwise.
pub const DEFAULT_CHART_DPI: f64 = 200.0;

/// Settings that shape the rendered report.
///
/// Every field has a fixed default; the CLI only overrides the logo path.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Attributes charted on each answer page, in column order without repeats.
    pub demographics: Vec<Demographic>,
    /// Color of the page border.
    pub border_color: Color,
    /// Distance between the paper edge and the border, in millimetres.
    pub border_inset_mm: f64,
    /// Margins inside the border, in millimetres.
    pub margins_mm: f64,
    /// Character budget of one legend line.
    pub legend_line_chars: usize,
    /// Font size of legend labels.
    pub legend_font_size: u8,
    /// Pie diameter in millimetres.
    pub pie_diameter_mm: f64,
    /// Distance the leading slice is pushed out, in millimetres.
    pub popout_mm: f64,
    /// Resolution pie and bar charts are rasterized at.
    pub chart_dpi: f64,
    /// Width of the answer bar chart, in millimetres.
    pub bar_chart_width_mm: f64,
    /// Height of the answer bar chart, in millimetres.
    pub bar_chart_height_mm: f64,
    /// Logo image; a generated badge is used when unset.
    pub logo_path: Option<PathBuf>,
    /// Width of the logo on title pages, in millimetres.
    pub title_logo_width_mm: f64,
    /// Width of the logo in the page header, in millimetres.
    pub header_logo_width_mm: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            demographics: Demographic::ALL.to_vec(),
            border_color: BORDER_COLOR,
            border_inset_mm: 8.0,
            margins_mm: 14.0,
            legend_line_chars: DEFAULT_LEGEND_LINE_CHARS,
            legend_font_size: 8,
            pie_diameter_mm: 45.0,
            popout_mm: 2.5,
            chart_dpi: DEFAULT_CHART_DPI,
            bar_chart_width_mm: 150.0,
            bar_chart_height_mm: 80.0,
            logo_path: None,
            title_logo_width_mm: 35.0,
            header_logo_width_mm: 10.0,
        }
    }
}

impl ReportConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the logo file and returns the updated configuration.
    pub fn with_logo(mut self, path: impl Into<Option<PathBuf>>) -> Self {
        self.logo_path = path.into();
        self
    }

    /// Restricts the charted attributes and returns the updated configuration.
    ///
    /// Attributes are kept in column order and listed once, whatever order they are given in.
    pub fn with_demographics(
        mut self,
        demographics: impl IntoIterator<Item = Demographic>,
    ) -> Self {
        let mut demographics: Vec<_> = demographics.into_iter().collect();
        demographics.sort();
        demographics.dedup();
        self.demographics = demographics;
        self
    }

    /// Sets the legend character budget and returns the updated configuration.
    pub fn with_legend_line_chars(mut self, chars: usize) -> Self {
        self.legend_line_chars = chars.max(1);
        self
    }

    /// Sets the page border color and returns the updated configuration.
    pub fn with_border_color(mut self, color: Color) -> Self {
        self.border_color = color;
        self
    }

    /// Pie diameter converted to pixels at [`Self::chart_dpi`].
    pub fn pie_pixels(&self) -> u32 {
        mm_to_pixels(self.pie_diameter_mm, self.chart_dpi)
    }

    /// Slice pop-out distance converted to pixels at [`Self::chart_dpi`].
    pub fn popout_pixels(&self) -> f64 {
        self.popout_mm / MM_PER_INCH * self.chart_dpi
    }
}

const MM_PER_INCH: f64 = 25.4;

fn mm_to_pixels(mm: f64, dpi: f64) -> u32 {
    (mm / MM_PER_INCH * dpi).round().max(1.0) as u32
}
