//! Assembly of the report document.
//!
//! [`ReportBuilder`] walks the page plan produced by [`crate::pagination::plan_pages`], pushes
//! the matching elements into a `genpdf::Document`, and serializes it. Every physical page is
//! decorated identically with a border, the logo, and a 1-indexed page number.
//!
//! The border is a few hairline rectangles drawn side by side, since `genpdf` strokes every line
//! at the same width.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use genpdf::elements::{Break, PageBreak, Paragraph};
use genpdf::error::{Error, ErrorKind};
use genpdf::style::{self, Color, StyledString};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position};
use image::DynamicImage;
use log::{debug, info};

use crate::aggregate::{aggregate, AnswerGroup, Aggregation, QuestionSummary};
use crate::chart::BarChartLayout;
use crate::config::ReportConfig;
use crate::dataset::SurveyTable;
use crate::elements::{self, BarChart, DemographicChart, PageBody, ScaledImage};
use crate::error::{ReportError, ReportResult};
use crate::fonts;
use crate::pagination::{plan_pages, PagePlan};

const DOCUMENT_TITLE: &str = "Survey Report";
const QUESTION_FONT_SIZE: u8 = 18;
const ANSWER_FONT_SIZE: u8 = 14;
const FOOTER_HEIGHT_MM: f64 = 8.0;
const HEADER_GAP_MM: f64 = 2.0;
const BORDER_RULES: usize = 3;
const BORDER_RULE_SPACING_MM: f64 = 0.3;
const GENERATED_LOGO_PIXELS: u32 = 240;

type ElementFactory = dyn Fn(usize) -> Box<dyn Element>;

/// The serialized report.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    /// PDF file contents.
    pub bytes: Vec<u8>,
    /// Number of physical pages, as counted by the page decorator.
    pub pages: usize,
    /// Number of logical pages (title and answer pages) in the plan.
    pub logical_pages: usize,
}

/// Renders aggregated survey data into a PDF.
#[derive(Clone, Debug, Default)]
pub struct ReportBuilder {
    config: ReportConfig,
    title: Option<String>,
}

impl ReportBuilder {
    /// Creates a builder using `config`.
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            title: None,
        }
    }

    /// Sets the PDF document title and returns the updated builder.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Aggregates `table` and renders the report.
    pub fn render_table(&self, table: &SurveyTable) -> ReportResult<RenderedReport> {
        self.render(&aggregate(table))
    }

    /// Renders the report for an existing aggregation.
    ///
    /// Either the complete document is returned or an error; nothing is written to disk.
    pub fn render(&self, aggregation: &Aggregation) -> ReportResult<RenderedReport> {
        if aggregation.is_empty() {
            return Err(ReportError::EmptyInput);
        }

        let logo = self.load_logo()?;
        let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(self.title.as_deref().unwrap_or(DOCUMENT_TITLE));
        document.set_paper_size(PaperSize::Letter);

        let page_counter = Rc::new(Cell::new(0));
        let page_body = PageBody::new();
        document.set_page_decorator(self.page_decorator(
            logo.clone(),
            Rc::clone(&page_counter),
            page_body.clone(),
        ));

        let plan = plan_pages(aggregation);
        info!(
            "Rendering {} questions into {} logical pages",
            aggregation.questions().len(),
            plan.len()
        );

        for (index, page) in plan.iter().enumerate() {
            if index > 0 {
                document.push(PageBreak::new());
            }
            match *page {
                PagePlan::Title { question } => {
                    debug!("Title page for '{}'", question.question());
                    self.push_title_page(&mut document, question, &logo);
                }
                PagePlan::AnswerDetail { question, group } => {
                    debug!(
                        "Answer page for '{}' / '{}'",
                        question.question(),
                        group.answer()
                    );
                    self.push_answer_page(&mut document, aggregation, group, &page_body);
                }
            }
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;

        let report = RenderedReport {
            bytes,
            pages: page_counter.get(),
            logical_pages: plan.len(),
        };
        info!(
            "Rendered {} pages ({} bytes)",
            report.pages,
            report.bytes.len()
        );
        Ok(report)
    }

    /// Renders the report and writes it to `path` once rendering has succeeded.
    pub fn write_pdf(
        &self,
        aggregation: &Aggregation,
        path: impl AsRef<Path>,
    ) -> ReportResult<RenderedReport> {
        let report = self.render(aggregation)?;
        fs::write(path.as_ref(), &report.bytes)?;
        info!("Wrote {}", path.as_ref().display());
        Ok(report)
    }

    fn load_logo(&self) -> ReportResult<DynamicImage> {
        match &self.config.logo_path {
            Some(path) => {
                elements::decode_image_from_path(path).map_err(|source| ReportError::Logo {
                    path: path.clone(),
                    source,
                })
            }
            None => Ok(elements::default_logo_image(GENERATED_LOGO_PIXELS)),
        }
    }

    fn page_decorator(
        &self,
        logo: DynamicImage,
        counter: Rc<Cell<usize>>,
        body: PageBody,
    ) -> ReportPageDecorator {
        let header_width = mm(self.config.header_logo_width_mm);
        let header: Box<ElementFactory> = Box::new(move |_| {
            Box::new(
                ScaledImage::new(logo.clone())
                    .with_width(header_width)
                    .with_alignment(Alignment::Right),
            ) as Box<dyn Element>
        });

        let footer = FooterSpec::new(mm(FOOTER_HEIGHT_MM), |page| {
            let mut line = Paragraph::new(footer_text(page));
            line.set_alignment(Alignment::Center);
            line
        });

        ReportPageDecorator {
            page: counter,
            body,
            border: Some(Border {
                color: self.config.border_color,
                inset: mm(self.config.border_inset_mm),
            }),
            margins: Margins::all(mm(self.config.margins_mm)),
            header: Some(header),
            footer: Some(footer),
        }
    }

    fn push_title_page(
        &self,
        document: &mut genpdf::Document,
        question: &QuestionSummary,
        logo: &DynamicImage,
    ) {
        document.push(
            ScaledImage::new(logo.clone())
                .with_width(mm(self.config.title_logo_width_mm))
                .with_alignment(Alignment::Center),
        );
        document.push(Break::new(1.0));
        document.push(heading(question.question(), QUESTION_FONT_SIZE, Alignment::Center));
        document.push(
            Paragraph::new(format!("{} responses", question.respondents()))
                .aligned(Alignment::Center),
        );
        document.push(Break::new(1.5));
        document.push(
            BarChart::new(
                BarChartLayout::from_distribution(question.answer_totals()),
                self.config.bar_chart_width_mm,
                self.config.bar_chart_height_mm,
            )
            .with_dpi(self.config.chart_dpi),
        );
    }

    fn push_answer_page(
        &self,
        document: &mut genpdf::Document,
        aggregation: &Aggregation,
        group: &AnswerGroup,
        page_body: &PageBody,
    ) {
        document.push(heading(
            &format!("Answer: {}", group.answer()),
            ANSWER_FONT_SIZE,
            Alignment::Left,
        ));
        document.push(Paragraph::new(format!("{} respondents", group.size())));
        document.push(Break::new(1.0));

        let charted = self
            .config
            .demographics
            .iter()
            .filter(|demographic| aggregation.demographics().contains(*demographic));
        for &demographic in charted {
            if let Some(distribution) = group.distribution(demographic) {
                document.push(
                    DemographicChart::new(demographic, distribution, &self.config)
                        .with_page_body(page_body.clone()),
                );
                document.push(Break::new(1.0));
            }
        }
    }
}

/// Footer line of the 1-indexed physical page `page`.
pub fn footer_text(page: usize) -> String {
    format!("Page {}", page)
}

fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn heading(text: &str, size: u8, alignment: Alignment) -> Paragraph {
    let style = style::Style::new().bold().with_font_size(size);
    Paragraph::new(StyledString::new(text.to_string(), style)).aligned(alignment)
}

/// Definition of a footer rendered through the page decorator.
struct FooterSpec {
    height: Mm,
    factory: Box<ElementFactory>,
}

impl FooterSpec {
    /// Creates a footer of fixed height whose content is produced per page.
    fn new<F, E>(height: impl Into<Mm>, factory: F) -> Self
    where
        F: Fn(usize) -> E + 'static,
        E: Element + 'static,
    {
        Self {
            height: height.into(),
            factory: Box::new(move |page| Box::new(factory(page)) as Box<dyn Element>),
        }
    }
}

struct Border {
    color: Color,
    inset: Mm,
}

struct ReportPageDecorator {
    page: Rc<Cell<usize>>,
    body: PageBody,
    border: Option<Border>,
    margins: Margins,
    header: Option<Box<ElementFactory>>,
    footer: Option<FooterSpec>,
}

impl PageDecorator for ReportPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.page.get() + 1;
        self.page.set(page);

        if let Some(border) = &self.border {
            let size = area.size();
            let line_style = style::Style::new().with_color(border.color);
            for rule in 0..BORDER_RULES {
                let inset = border.inset + mm(rule as f64 * BORDER_RULE_SPACING_MM);
                let (left, top) = (inset, inset);
                let (right, bottom) = (size.width - inset, size.height - inset);
                area.draw_line(
                    vec![
                        Position::new(left, top),
                        Position::new(right, top),
                        Position::new(right, bottom),
                        Position::new(left, bottom),
                        Position::new(left, top),
                    ],
                    line_style,
                );
            }
        }

        area.add_margins(self.margins);

        if let Some(header_cb) = &self.header {
            let mut element = header_cb(page);
            let result = element.render(context, area.clone(), style)?;
            area.add_offset(Position::new(0, result.size.height + mm(HEADER_GAP_MM)));
        }

        if let Some(footer) = &self.footer {
            let available = area.size().height;
            if footer.height > available {
                return Err(Error::new(
                    "Footer height exceeds available space",
                    ErrorKind::InvalidData,
                ));
            }

            let mut footer_area = area.clone();
            footer_area.add_offset(Position::new(0, available - footer.height));
            let mut element = (footer.factory)(page);
            let result = element.render(context, footer_area, style)?;
            if result.has_more {
                return Err(Error::new(
                    "Footer element does not fit into the reserved space",
                    ErrorKind::PageSizeExceeded,
                ));
            }

            area.set_height(available - footer.height);
        }

        self.body.record(area.size().height);
        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_numbers_pages_from_one() {
        assert_eq!(footer_text(1), "Page 1");
        assert_eq!(footer_text(12), "Page 12");
    }
}
