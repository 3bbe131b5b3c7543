//! Report elements built on top of `genpdf` primitives.
//!
//! The chart layouts in [`crate::chart`] are font independent; the elements here measure text with
//! the document fonts and draw the result. `genpdf` only strokes hairlines, so every filled shape
//! (bars, pie slices, legend swatches) is rasterized with [`image`] and placed as a picture,
//! while axes and text stay vector.
//!
//! Charts never abort the document when they are too tall. A chart that would fit on a fresh page
//! moves there once; anything taller is drawn as far as it fits and its legend continues on the
//! following pages.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage};

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::style::{Color, Style};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Scale, Size};

use crate::aggregate::Distribution;
use crate::chart::{wrap_label, BarChartLayout, LegendCursor, LegendLayout, LegendWindow, PieLayout};
use crate::config::{ReportConfig, DEFAULT_CHART_DPI};
use crate::model::Demographic;
use crate::palette::{rgb_channels, BORDER_COLOR};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

const AXIS_COLOR: Color = Color::Greyscale(90);
const AXIS_GUTTER_MM: f64 = 12.0;
const TICK_LENGTH_MM: f64 = 1.2;
const BAR_FILL: f64 = 0.6;
const BAR_LABEL_ROWS: usize = 2;
const BAR_LABEL_FONT_SIZE: u8 = 8;
/// Rough advance of an average glyph at [`BAR_LABEL_FONT_SIZE`].
const BAR_LABEL_CHAR_MM: f64 = 1.7;

const CHART_HEADING_FONT_SIZE: u8 = 11;
const CHART_HEADING_GAP_MM: f64 = 1.5;
const LEGEND_GAP_MM: f64 = 6.0;
const SWATCH_MM: f64 = 3.0;
const SWATCH_TEXT_GAP_MM: f64 = 1.5;
const SEPARATOR_PX: f64 = 2.0;
const SWATCH_PX: u32 = 12;
const CONTINUED_SUFFIX: &str = " (continued)";

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn position(x: f64, y: f64) -> Position {
    Position::new(mm_from_f64(x), mm_from_f64(y))
}

fn mm_to_pixels(mm: f64, dpi: f64) -> u32 {
    (mm / MM_PER_INCH * dpi).round().max(1.0) as u32
}

fn estimated_image_size(image: &DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
///
/// Transparent pixels are composited onto white, since `genpdf` rejects alpha channels.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    let image = reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))?;
    Ok(flatten_alpha(&image))
}

/// Composites `image` onto a white background and drops the alpha channel.
pub fn flatten_alpha(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let buffer = ImageBuffer::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u16;
        let blend = |channel: u8| ((channel as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(buffer)
}

/// Generates the circular badge used when no logo file is configured.
pub fn default_logo_image(size: u32) -> DynamicImage {
    let start = rgb_channels(BORDER_COLOR);
    let end = [255u8, 204, 0];
    let centre = size as f32 / 2.0;
    let radius = centre - 1.0;

    let buffer = ImageBuffer::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - centre;
        let dy = y as f32 + 0.5 - centre;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance > radius {
            return Rgb([255, 255, 255]);
        }
        if distance < radius * 0.35 {
            return Rgb([255, 255, 255]);
        }
        let mix = ((dx + dy) / (4.0 * radius) + 0.5).clamp(0.0, 1.0);
        let mut channels = [0u8; 3];
        for (index, channel) in channels.iter_mut().enumerate() {
            let start = start[index] as f32;
            let end = end[index] as f32;
            *channel = (start + (end - start) * mix).round().clamp(0.0, 255.0) as u8;
        }
        Rgb(channels)
    });

    DynamicImage::ImageRgb8(buffer)
}

fn line_style(color: Color) -> Style {
    Style::new().with_color(color)
}

/// Places `raster` with its top-left corner at `(x, y)`, stretched to `width` x `height` mm.
fn place_raster(
    area: &render::Area<'_>,
    context: &genpdf::Context,
    style: Style,
    raster: RgbImage,
    origin: (f64, f64),
    size: (f64, f64),
) -> Result<(), Error> {
    let (width, height) = size;
    let (px_width, px_height) = raster.dimensions();
    if px_width == 0 || px_height == 0 || width <= 0.0 || height <= 0.0 {
        return Ok(());
    }
    let natural_width = MM_PER_INCH * px_width as f64 / DEFAULT_IMAGE_DPI;
    let natural_height = MM_PER_INCH * px_height as f64 / DEFAULT_IMAGE_DPI;

    Image::from_dynamic_image(DynamicImage::ImageRgb8(raster))?
        .with_position(position(origin.0, origin.1))
        .with_scale(Scale::new(width / natural_width, height / natural_height))
        .render(context, area.clone(), style)?;
    Ok(())
}

fn swatch_image(color: Color) -> RgbImage {
    ImageBuffer::from_pixel(SWATCH_PX, SWATCH_PX, Rgb(rgb_channels(color)))
}

fn print_text(
    area: &render::Area<'_>,
    context: &genpdf::Context,
    x: f64,
    y: f64,
    style: Style,
    text: &str,
) -> Result<(), Error> {
    area.print_str(&context.font_cache, position(x, y), style, text)?;
    Ok(())
}

fn text_width(context: &genpdf::Context, style: Style, text: &str) -> f64 {
    mm_to_f64(style.str_width(&context.font_cache, text))
}

/// Number of whole text lines that fit into `space` millimetres.
fn lines_fitting(space: f64, line_height: f64) -> usize {
    if space <= 0.0 || line_height <= 0.0 {
        return 0;
    }
    (space / line_height + 1e-9).floor() as usize
}

/// Result of an element that postpones itself to the next page.
///
/// The width is non-zero so that `genpdf` does not treat a postponed element on a fresh page as
/// one that can never fit.
fn postponed(area: &render::Area<'_>) -> RenderResult {
    RenderResult {
        size: Size::new(area.size().width, 0),
        has_more: true,
    }
}

/// Height of the writable page body, shared between the page decorator and the charts.
///
/// The decorator records the height left after drawing the header and footer of every page.
#[derive(Clone, Debug, Default)]
pub struct PageBody(Rc<Cell<Option<Mm>>>);

impl PageBody {
    /// Creates an empty record; charts treat an unknown height as "fits on a fresh page".
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the body height of the page being decorated.
    pub fn record(&self, height: Mm) {
        self.0.set(Some(height));
    }

    /// Body height of the most recently decorated page.
    pub fn height(&self) -> Option<Mm> {
        self.0.get()
    }
}

/// An image rendered at a fixed width, keeping its aspect ratio.
///
/// The decoded image is kept and converted on every render, so the same element can be
/// produced once per page by the page decorator.
pub struct ScaledImage {
    image: DynamicImage,
    width: Option<Mm>,
    alignment: Alignment,
}

impl ScaledImage {
    /// Wraps an already decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            width: None,
            alignment: Alignment::Left,
        }
    }

    /// Constrains the rendered width and returns the updated element.
    pub fn with_width(mut self, width: impl Into<Option<Mm>>) -> Self {
        self.width = width.into();
        self
    }

    /// Sets the horizontal alignment and returns the updated element.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn scale(&self) -> Scale {
        let natural = mm_to_f64(estimated_image_size(&self.image, DEFAULT_IMAGE_DPI).width);
        match self.width {
            Some(width) if natural > f64::EPSILON => {
                let scale = mm_to_f64(width) / natural;
                Scale::new(scale, scale)
            }
            _ => Scale::new(1.0, 1.0),
        }
    }
}

impl Element for ScaledImage {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut image = Image::from_dynamic_image(self.image.clone())?;
        image.set_scale(self.scale());
        image.set_alignment(self.alignment);
        image.render(context, area, style)
    }
}

/// Answer totals of one question as a vertical bar chart.
///
/// The value axis starts at zero and every bar is labelled with its raw count. The chart moves
/// to the next page once when it does not fit; on that page it shrinks to the space available.
pub struct BarChart {
    layout: BarChartLayout,
    width: f64,
    height: f64,
    dpi: f64,
    postponed: bool,
}

impl BarChart {
    /// Creates a chart of the given size in millimetres.
    pub fn new(layout: BarChartLayout, width_mm: f64, height_mm: f64) -> Self {
        Self {
            layout,
            width: width_mm,
            height: height_mm,
            dpi: DEFAULT_CHART_DPI,
            postponed: false,
        }
    }

    /// Sets the resolution the bars are rasterized at and returns the updated chart.
    pub fn with_dpi(mut self, dpi: f64) -> Self {
        self.dpi = dpi;
        self
    }
}

impl Element for BarChart {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size();
        let available_height = mm_to_f64(available.height);
        let height = if self.height <= available_height {
            self.height
        } else if !self.postponed {
            self.postponed = true;
            return Ok(postponed(&area));
        } else {
            available_height
        };

        let width = self.width.min(mm_to_f64(available.width));
        let text_style = style.with_font_size(BAR_LABEL_FONT_SIZE);
        let line_height = mm_to_f64(text_style.line_height(&context.font_cache));

        let plot_left = AXIS_GUTTER_MM;
        let plot_top = line_height;
        let plot_bottom = (height - line_height * BAR_LABEL_ROWS as f64 - 1.0).max(plot_top);
        let plot_width = (width - plot_left).max(0.0);
        let plot_height = plot_bottom - plot_top;
        let axis_max = self.layout.axis_max() as f64;

        if plot_width > 0.0 && plot_height > 0.0 {
            let raster = self.layout.rasterize(
                mm_to_pixels(plot_width, self.dpi),
                mm_to_pixels(plot_height, self.dpi),
                BAR_FILL,
            );
            place_raster(
                &area,
                context,
                style,
                raster,
                (plot_left, plot_top),
                (plot_width, plot_height),
            )?;
        }

        for tick in self.layout.ticks() {
            let y = plot_bottom - plot_height * tick as f64 / axis_max;
            area.draw_line(
                vec![position(plot_left - TICK_LENGTH_MM, y), position(plot_left, y)],
                line_style(AXIS_COLOR),
            );
            let label = tick.to_string();
            let label_width = text_width(context, text_style, &label);
            print_text(
                &area,
                context,
                plot_left - TICK_LENGTH_MM - 0.8 - label_width,
                y - line_height / 2.0,
                text_style,
                &label,
            )?;
        }

        area.draw_line(
            vec![
                position(plot_left, plot_top),
                position(plot_left, plot_bottom),
                position(plot_left + plot_width, plot_bottom),
            ],
            line_style(AXIS_COLOR),
        );

        let rects = self.layout.geometry(plot_width, plot_height, BAR_FILL);
        let slot = if rects.is_empty() {
            plot_width
        } else {
            plot_width / rects.len() as f64
        };
        let label_chars = ((slot / BAR_LABEL_CHAR_MM).floor() as usize).max(3);

        for (bar, rect) in self.layout.bars().iter().zip(&rects) {
            let centre = plot_left + rect.x + rect.width / 2.0;

            let count = bar.count.to_string();
            let count_style = if bar.highlighted {
                text_style.bold()
            } else {
                text_style
            };
            print_text(
                &area,
                context,
                centre - text_width(context, count_style, &count) / 2.0,
                plot_bottom - rect.height - line_height,
                count_style,
                &count,
            )?;

            let mut lines = wrap_label(&bar.label, label_chars);
            if lines.len() > BAR_LABEL_ROWS {
                lines.truncate(BAR_LABEL_ROWS);
                if let Some(last) = lines.last_mut() {
                    last.push_str("...");
                }
            }
            for (row, line) in lines.iter().enumerate() {
                print_text(
                    &area,
                    context,
                    centre - text_width(context, text_style, line) / 2.0,
                    plot_bottom + 1.0 + row as f64 * line_height,
                    text_style,
                    line,
                )?;
            }
        }

        Ok(RenderResult {
            size: Size::new(mm_from_f64(width), mm_from_f64(height)),
            has_more: false,
        })
    }
}

struct ChartMetrics {
    heading_style: Style,
    legend_style: Style,
    line_height: f64,
    top: f64,
}

/// Heading, pie chart and two-column legend for one demographic attribute.
///
/// An empty distribution renders a "No responses" note instead of a pie. A block that would fit
/// on a fresh page moves there as a whole. A taller block starts where it is and continues its
/// legend on the following pages under a "(continued)" heading.
pub struct DemographicChart {
    title: String,
    pie: PieLayout,
    legend: LegendLayout,
    image: Option<DynamicImage>,
    diameter: f64,
    legend_font_size: u8,
    page_body: Option<PageBody>,
    postponed: bool,
    continuation: Option<LegendCursor>,
}

impl DemographicChart {
    /// Lays out and rasterizes the chart for `distribution`.
    pub fn new(
        demographic: Demographic,
        distribution: &Distribution,
        config: &ReportConfig,
    ) -> Self {
        let pie = PieLayout::from_distribution(distribution);
        let legend = LegendLayout::from_pie(&pie, config.legend_line_chars);
        let image = if pie.is_empty() {
            None
        } else {
            let raster = pie.rasterize(config.pie_pixels(), config.popout_pixels(), SEPARATOR_PX);
            Some(DynamicImage::ImageRgb8(raster))
        };

        Self {
            title: demographic.label().to_string(),
            pie,
            legend,
            image,
            diameter: config.pie_diameter_mm,
            legend_font_size: config.legend_font_size,
            page_body: None,
            postponed: false,
            continuation: None,
        }
    }

    /// Uses the page body height recorded by the page decorator to decide whether moving to a
    /// new page helps, and returns the updated chart.
    pub fn with_page_body(mut self, page_body: PageBody) -> Self {
        self.page_body = Some(page_body);
        self
    }

    /// Returns the pie layout.
    pub fn pie(&self) -> &PieLayout {
        &self.pie
    }

    /// Returns the legend layout.
    pub fn legend(&self) -> &LegendLayout {
        &self.legend
    }

    fn metrics(&self, context: &genpdf::Context, style: Style) -> ChartMetrics {
        let heading_style = style.bold().with_font_size(CHART_HEADING_FONT_SIZE);
        let heading_height = mm_to_f64(heading_style.line_height(&context.font_cache));
        let legend_style = style.with_font_size(self.legend_font_size);
        ChartMetrics {
            heading_style,
            legend_style,
            line_height: mm_to_f64(legend_style.line_height(&context.font_cache)),
            top: heading_height + CHART_HEADING_GAP_MM,
        }
    }

    /// Height of the whole block below the heading.
    fn body_height(&self, line_height: f64) -> f64 {
        match self.image {
            Some(_) => self
                .diameter
                .max(line_height * self.legend.height_in_lines() as f64),
            None => line_height,
        }
    }

    fn fits_on_fresh_page(&self, height: f64) -> bool {
        self.page_body
            .as_ref()
            .and_then(PageBody::height)
            .map_or(true, |body| height <= mm_to_f64(body))
    }

    /// Draws the entries of `window` starting at `top` and returns the height used.
    fn render_legend(
        &self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        metrics: &ChartMetrics,
        window: &LegendWindow<'_>,
    ) -> Result<f64, Error> {
        let line_height = metrics.line_height;
        let left = self.diameter + LEGEND_GAP_MM;
        let column_width = ((mm_to_f64(area.size().width) - left) / 2.0).max(0.0);
        let swatch = SWATCH_MM.min(line_height * 0.8);
        let mut used_lines = 0;

        for &(column, entry, line) in &window.entries {
            let x = left + column_width * column as f64;
            let y = metrics.top + line as f64 * line_height;
            place_raster(
                area,
                context,
                metrics.legend_style,
                swatch_image(entry.color),
                (x, y + (line_height - swatch) / 2.0),
                (swatch, swatch),
            )?;
            for (row, text) in entry.lines.iter().enumerate() {
                print_text(
                    area,
                    context,
                    x + swatch + SWATCH_TEXT_GAP_MM,
                    y + row as f64 * line_height,
                    metrics.legend_style,
                    text,
                )?;
            }
            used_lines = used_lines.max(line + entry.lines.len());
        }
        Ok(used_lines as f64 * line_height)
    }

    fn render_continuation(
        &mut self,
        context: &genpdf::Context,
        area: &render::Area<'_>,
        metrics: &ChartMetrics,
        cursor: LegendCursor,
    ) -> Result<RenderResult, Error> {
        let heading = format!("{}{}", self.title, CONTINUED_SUFFIX);
        print_text(area, context, 0.0, 0.0, metrics.heading_style, &heading)?;

        let space = mm_to_f64(area.size().height) - metrics.top;
        let window = self
            .legend
            .window(cursor, lines_fitting(space, metrics.line_height));
        let legend_height = self.render_legend(context, area, metrics, &window)?;
        self.continuation = window.next;

        Ok(RenderResult {
            size: Size::new(area.size().width, mm_from_f64(metrics.top + legend_height)),
            has_more: self.continuation.is_some(),
        })
    }
}

impl Element for DemographicChart {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let metrics = self.metrics(context, style);
        if let Some(cursor) = self.continuation {
            return self.render_continuation(context, &area, &metrics, cursor);
        }

        let available = mm_to_f64(area.size().height);
        let whole = metrics.top + self.body_height(metrics.line_height);
        let minimum = metrics.top
            + if self.image.is_some() {
                self.diameter
            } else {
                metrics.line_height
            };
        if whole > available
            && !self.postponed
            && (self.fits_on_fresh_page(whole) || minimum > available)
        {
            self.postponed = true;
            return Ok(postponed(&area));
        }

        print_text(&area, context, 0.0, 0.0, metrics.heading_style, &self.title)?;

        let Some(image) = &self.image else {
            print_text(
                &area,
                context,
                0.0,
                metrics.top,
                metrics.legend_style.italic(),
                "No responses",
            )?;
            return Ok(RenderResult {
                size: Size::new(area.size().width, mm_from_f64(minimum)),
                has_more: false,
            });
        };

        let space = available - metrics.top;
        let diameter = self.diameter.min(space);
        if diameter > 0.0 {
            let mut pie_area = area.clone();
            pie_area.add_offset(position(0.0, metrics.top));
            ScaledImage::new(image.clone())
                .with_width(mm_from_f64(diameter))
                .render(context, pie_area, style)?;
        }

        let window = self.legend.window(
            LegendCursor::default(),
            lines_fitting(space, metrics.line_height),
        );
        let legend_height = self.render_legend(context, &area, &metrics, &window)?;
        self.continuation = window.next;

        Ok(RenderResult {
            size: Size::new(
                area.size().width,
                mm_from_f64(metrics.top + diameter.max(legend_height)),
            ),
            has_more: self.continuation.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattening_blends_transparent_pixels_to_white() {
        let rgba = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                image::Rgba([10u8, 20, 30, 255])
            } else {
                image::Rgba([10u8, 20, 30, 0])
            }
        });
        let flat = flatten_alpha(&DynamicImage::ImageRgba8(rgba)).to_rgb8();
        assert_eq!(flat.get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(flat.get_pixel(1, 0).0, [255, 255, 255]);
    }

    #[test]
    fn default_logo_is_opaque_and_square() {
        let logo = default_logo_image(64);
        assert_eq!(logo.dimensions(), (64, 64));
        assert!(matches!(logo, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn empty_distribution_has_no_raster() {
        let chart = DemographicChart::new(
            Demographic::Gender,
            &Distribution::new(),
            &ReportConfig::default(),
        );
        assert!(chart.image.is_none());
        assert!(chart.legend().is_empty());
    }

    #[test]
    fn chart_legend_matches_pie_slices() {
        let distribution = Distribution::from_values(["Male", "Female", "Female", "Other"]);
        let chart =
            DemographicChart::new(Demographic::Gender, &distribution, &ReportConfig::default());
        assert_eq!(chart.legend().len(), chart.pie().slices().len());
        assert_eq!(chart.legend().columns()[0][0].lines, ["Female (50.0%)"]);
        assert_eq!(chart.title, "Gender");
    }

    #[test]
    fn counts_only_whole_lines() {
        assert_eq!(lines_fitting(10.0, 3.0), 3);
        assert_eq!(lines_fitting(9.0, 3.0), 3);
        assert_eq!(lines_fitting(2.9, 3.0), 0);
        assert_eq!(lines_fitting(-4.0, 3.0), 0);
    }

    #[test]
    fn swatch_is_a_solid_square() {
        let swatch = swatch_image(Color::Rgb(12, 34, 56));
        assert_eq!(swatch.dimensions(), (SWATCH_PX, SWATCH_PX));
        assert!(swatch.pixels().all(|pixel| pixel.0 == [12, 34, 56]));
    }

    #[test]
    fn long_legend_does_not_wait_for_a_fresh_page() {
        let values: Vec<String> = (0..200).map(|i| format!("School number {i}")).collect();
        let distribution = Distribution::from_values(values.iter().map(String::as_str));
        let body = PageBody::new();
        let chart =
            DemographicChart::new(Demographic::School, &distribution, &ReportConfig::default())
                .with_page_body(body.clone());
        let line_height = 3.5;
        let height = chart.body_height(line_height);

        assert!(chart.fits_on_fresh_page(height), "unknown page height");
        body.record(mm_from_f64(230.0));
        assert!(!chart.fits_on_fresh_page(height));
        assert!(chart.fits_on_fresh_page(chart.diameter));
    }
}
