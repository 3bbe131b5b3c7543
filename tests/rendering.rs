use std::path::PathBuf;

use sha2::{Digest, Sha256};
use survey_report::{
    aggregate, fonts, synth, Aggregation, Demographic, ReportBuilder, ReportConfig, ReportError,
    ResponseRecord, SurveyDefinition, SurveyTable,
};

const SKIP_NOTE: &str =
    "bundled fonts missing. Set SURVEY_REPORT_FONTS_DIR or copy assets/fonts next to the binary.";

fn sample_aggregation() -> Aggregation {
    let definition = SurveyDefinition::default()
        .with_question("Do you own a bike?", [("Yes", 0.6), ("No", 0.4)])
        .with_question(
            "How often do you cycle?",
            [("Daily", 0.2), ("Weekly", 0.3), ("Rarely", 0.5)],
        );
    let records = synth::generate(&definition, 60, 11).expect("generate sample records");
    aggregate(&SurveyTable::new(records))
}

fn render_sample_pdf() -> Option<survey_report::RenderedReport> {
    if !fonts::default_fonts_available() {
        return None;
    }

    let report = ReportBuilder::new(ReportConfig::new())
        .render(&sample_aggregation())
        .expect("render sample pdf");

    Some(report)
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

/// Counts `/Type /Page` dictionaries, skipping the `/Type /Pages` tree node.
fn count_page_objects(bytes: &[u8]) -> usize {
    const TYPE: &[u8] = b"/Type";
    const PAGE: &[u8] = b"/Page";

    let mut count = 0;
    let mut index = 0;
    while index + TYPE.len() <= bytes.len() {
        if !bytes[index..].starts_with(TYPE) {
            index += 1;
            continue;
        }
        let mut cursor = index + TYPE.len();
        while cursor < bytes.len() && bytes[cursor].is_ascii_whitespace() {
            cursor += 1;
        }
        if bytes[cursor..].starts_with(PAGE) {
            let after = bytes.get(cursor + PAGE.len());
            if !after.map_or(false, u8::is_ascii_alphanumeric) {
                count += 1;
            }
        }
        index = cursor;
    }
    count
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let Some(report) = render_sample_pdf() else {
        eprintln!("Skipping renders_non_empty_output: {SKIP_NOTE}");
        return;
    };
    assert!(
        report.bytes.starts_with(b"%PDF"),
        "rendered report should start with a PDF header"
    );
}

#[test]
fn every_logical_page_starts_a_physical_page() {
    let Some(report) = render_sample_pdf() else {
        eprintln!("Skipping every_logical_page_starts_a_physical_page: {SKIP_NOTE}");
        return;
    };
    // 2 title pages plus 5 answer pages.
    assert_eq!(report.logical_pages, 7);
    assert!(
        report.pages >= report.logical_pages,
        "{} physical pages for {} logical pages",
        report.pages,
        report.logical_pages
    );
    assert_eq!(
        count_page_objects(&report.bytes),
        report.pages,
        "decorated pages should match the page objects in the PDF"
    );
}

#[test]
fn page_object_counter_skips_the_page_tree() {
    let fragment = b"<</Type/Pages/Kids[4 0 R]>> <</Type /Page/Parent 3 0 R>> <</Type/Page>>";
    assert_eq!(count_page_objects(fragment), 2);
}

#[test]
fn oversized_legend_continues_on_following_pages() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping oversized_legend_continues_on_following_pages: {SKIP_NOTE}");
        return;
    }
    let records: Vec<_> = (0..200)
        .map(|i| {
            ResponseRecord::new("Q1", "A")
                .with_demographic(Demographic::School, format!("School number {i}"))
        })
        .collect();
    let table = SurveyTable::new(records).with_demographics([Demographic::School]);
    let aggregation = aggregate(&table);

    let report = ReportBuilder::new(ReportConfig::new().with_demographics([Demographic::School]))
        .render(&aggregation)
        .expect("a legend taller than a page should not abort rendering");

    assert_eq!(report.logical_pages, 2);
    assert!(
        report.pages > report.logical_pages,
        "legend of 200 schools should spill onto extra pages, got {} pages",
        report.pages
    );
    assert_eq!(count_page_objects(&report.bytes), report.pages);
}

#[test]
fn oversized_bar_chart_shrinks_to_the_page() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping oversized_bar_chart_shrinks_to_the_page: {SKIP_NOTE}");
        return;
    }
    let config = ReportConfig {
        bar_chart_height_mm: 400.0,
        ..ReportConfig::new()
    };
    let report = ReportBuilder::new(config)
        .render(&sample_aggregation())
        .expect("a bar chart taller than a page should not abort rendering");
    assert_eq!(report.logical_pages, 7);
    assert_eq!(count_page_objects(&report.bytes), report.pages);
}

#[test]
fn rendering_is_deterministic() {
    let Some(report_a) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_NOTE}");
        return;
    };
    let Some(report_b) = render_sample_pdf() else {
        eprintln!("Skipping rendering_is_deterministic: {SKIP_NOTE}");
        return;
    };

    assert_eq!(
        report_a.bytes.len(),
        report_b.bytes.len(),
        "PDF sizes should match"
    );
    assert_eq!(
        normalized_hash(&report_a.bytes),
        normalized_hash(&report_b.bytes),
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn renders_with_a_subset_of_demographics() {
    if !fonts::default_fonts_available() {
        eprintln!("Skipping renders_with_a_subset_of_demographics: {SKIP_NOTE}");
        return;
    }
    let records = vec![
        ResponseRecord::new("Q1", "A").with_demographic(Demographic::Gender, "Female"),
        ResponseRecord::new("Q1", "B"),
    ];
    let table = SurveyTable::new(records).with_demographics([Demographic::Gender]);
    let report = ReportBuilder::new(ReportConfig::new())
        .render_table(&table)
        .expect("render table");
    assert_eq!(report.logical_pages, 3);
}

#[test]
fn empty_input_is_rejected_before_rendering() {
    let err = ReportBuilder::default()
        .render(&Aggregation::default())
        .unwrap_err();
    assert!(matches!(err, ReportError::EmptyInput));
}

#[test]
fn unreadable_logo_writes_nothing() {
    let output = std::env::temp_dir().join(format!(
        "survey_report_missing_logo_{}.pdf",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&output);

    let config = ReportConfig::new().with_logo(PathBuf::from("does/not/exist/logo.png"));
    let err = ReportBuilder::new(config)
        .write_pdf(&sample_aggregation(), &output)
        .unwrap_err();

    assert!(matches!(err, ReportError::Logo { .. }), "unexpected error: {err}");
    assert!(!output.exists(), "no partial output should be written");
}
