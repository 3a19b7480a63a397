//! Integration tests for style application.

mod common;

use common::{
    anchored_image_run, docx, image_run, para, para_with_runs, table, table_with_image,
    three_paragraphs, write_docx, IMAGE_BYTES,
};
use docxstyle::xml::{ns, XmlDocument};
use docxstyle::{
    classify_file, format_bytes, format_file, Classifier, Document, DocxPackage, ElementKind,
    Error, HighlightColor, HighlightPolicy, StyleApplicator, StyleConfig, TypedElement,
};

#[derive(Debug, PartialEq)]
struct RunFormat {
    font: Option<String>,
    size: Option<f32>,
    bold: Option<bool>,
    highlight: Option<HighlightColor>,
}

fn paragraph_runs(doc: &Document, index: usize) -> Vec<RunFormat> {
    doc.paragraph(index)
        .unwrap()
        .runs()
        .map(|run| RunFormat {
            font: run.font_name(),
            size: run.font_size(),
            bold: run.bold(),
            highlight: run.highlight(),
        })
        .collect()
}

fn table_runs(doc: &Document, index: usize) -> Vec<RunFormat> {
    let table = doc.table(index).unwrap();
    let mut runs = Vec::new();
    for row in table.rows() {
        for cell in row.cells() {
            for paragraph in cell.paragraphs() {
                for run in paragraph.runs().filter(|r| !r.has_drawing()) {
                    runs.push(RunFormat {
                        font: run.font_name(),
                        size: run.font_size(),
                        bold: run.bold(),
                        highlight: run.highlight(),
                    });
                }
            }
        }
    }
    runs
}

fn outlines(doc: &Document) -> XmlDocument {
    XmlDocument::parse(&doc.to_xml().unwrap()).unwrap()
}

fn scenario_config() -> StyleConfig {
    StyleConfig::new()
        .with_title_font("Georgia", 24)
        .with_heading_font("Calibri", 16)
        .with_para_font("Arial", 11)
        .with_bold_titles(true)
        .with_highlight(false)
}

fn format_in_memory(body: &str, config: &StyleConfig) -> DocxPackage {
    let mut package = DocxPackage::from_bytes(docx(body)).unwrap();
    let elements = Classifier::new().classify(package.document());
    StyleApplicator::new(config)
        .apply(package.document_mut(), &elements)
        .unwrap();
    DocxPackage::from_bytes(package.to_bytes().unwrap()).unwrap()
}

#[test]
fn test_scenario_fonts_without_highlight() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "report.docx", &three_paragraphs());
    let output = dir.path().join("report_formatted.docx");

    let elements = classify_file(&input).unwrap();
    let stats = format_file(&input, &elements, &output, &scenario_config()).unwrap();
    assert_eq!(stats.runs_formatted, 3);
    assert_eq!(stats.runs_highlighted, 0);

    let package = DocxPackage::open(&output).unwrap();
    let doc = package.document();

    let title = &paragraph_runs(doc, 0)[0];
    assert_eq!(title.font.as_deref(), Some("Georgia"));
    assert_eq!(title.size, Some(24.0));
    assert_eq!(title.bold, Some(true));

    let heading = &paragraph_runs(doc, 1)[0];
    assert_eq!(heading.font.as_deref(), Some("Calibri"));
    assert_eq!(heading.size, Some(16.0));
    assert_eq!(heading.bold, Some(true));

    let body = &paragraph_runs(doc, 2)[0];
    assert_eq!(body.font.as_deref(), Some("Arial"));
    assert_eq!(body.size, Some(11.0));
    assert_ne!(body.bold, Some(true));

    for index in 0..3 {
        assert!(paragraph_runs(doc, index).iter().all(|r| r.highlight.is_none()));
    }
}

#[test]
fn test_scenario_policy_highlight() {
    let config = scenario_config().with_highlight(true);
    let package = format_in_memory(&three_paragraphs(), &config);
    let doc = package.document();

    assert_eq!(paragraph_runs(doc, 0)[0].highlight, Some(HighlightColor::Yellow));
    assert_eq!(paragraph_runs(doc, 1)[0].highlight, Some(HighlightColor::Green));
    assert_eq!(paragraph_runs(doc, 2)[0].highlight, Some(HighlightColor::LightGray));
}

#[test]
fn test_analyzer_policy() {
    let body = [
        para_with_runs(
            Some("Title"),
            r#"<w:r><w:rPr><w:color w:val="FF0000"/></w:rPr><w:t>Red title</w:t></w:r>"#,
        ),
        para(Some("Heading1"), "Heading"),
    ]
    .concat();
    let config = StyleConfig::new().with_highlight_colors(HighlightPolicy::analyzer());
    let package = format_in_memory(&body, &config);
    let doc = package.document();

    let title = doc.paragraph(0).unwrap();
    let run = title.runs().next().unwrap();
    assert_eq!(run.highlight(), Some(HighlightColor::Red));
    assert_eq!(run.color(), None);
    assert_eq!(paragraph_runs(doc, 1)[0].highlight, Some(HighlightColor::DarkMagenta));
}

#[test]
fn test_scenario_table_image() {
    let body = table_with_image("Cell text");

    let package = format_in_memory(&body, &StyleConfig::default());
    let doc = package.document();
    let xml = outlines(doc);
    assert_eq!(xml.root().count(ns::A, "ln"), 1);
    let line = xml.root().find(ns::A, "ln").unwrap();
    assert_eq!(line.attribute("w").as_deref(), Some("3175"));
    let color = line.find(ns::A, "srgbClr").unwrap();
    assert_eq!(color.attribute("val").as_deref(), Some("000000"));
    let dash = line.find(ns::A, "prstDash").unwrap();
    assert_eq!(dash.attribute("val").as_deref(), Some("solid"));

    let runs = table_runs(doc, 0);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].highlight, Some(HighlightColor::Yellow));
    assert_eq!(runs[0].font.as_deref(), Some("Courier New"));
    assert_eq!(runs[0].size, Some(10.0));

    let package = format_in_memory(&body, &StyleConfig::default().with_highlight(false));
    let doc = package.document();
    assert_eq!(outlines(doc).root().count(ns::A, "ln"), 1);
    assert_eq!(table_runs(doc, 0)[0].highlight, None);
}

#[test]
fn test_scenario_empty_document() {
    let original = DocxPackage::from_bytes(docx("")).unwrap();
    let elements = Classifier::new().classify(original.document());
    assert!(elements.is_empty());

    let package = format_in_memory("", &StyleConfig::default());
    assert_eq!(
        package.document().to_xml().unwrap(),
        original.document().to_xml().unwrap()
    );
}

#[test]
fn test_highlight_gating_keeps_existing_highlights() {
    let highlighted = r#"<w:r><w:rPr><w:highlight w:val="cyan"/></w:rPr><w:t>Marked</w:t></w:r>"#;
    let body = [
        para_with_runs(Some("Title"), highlighted),
        para_with_runs(None, highlighted),
        format!("<w:tbl><w:tr><w:tc><w:p>{highlighted}</w:p></w:tc></w:tr></w:tbl>"),
    ]
    .concat();
    let package = format_in_memory(&body, &StyleConfig::default().with_highlight(false));
    let doc = package.document();

    assert_eq!(paragraph_runs(doc, 0)[0].highlight, Some(HighlightColor::Cyan));
    assert_eq!(paragraph_runs(doc, 1)[0].highlight, Some(HighlightColor::Cyan));
    assert_eq!(table_runs(doc, 0)[0].highlight, Some(HighlightColor::Cyan));
}

#[test]
fn test_table_text_keeps_font() {
    let body = table(&[&["a", "b"], &["c", "d"]]);
    let package = format_in_memory(&body, &StyleConfig::default());
    for run in table_runs(package.document(), 0) {
        assert_eq!(run.font, None);
        assert_eq!(run.size, None);
        assert_eq!(run.bold, None);
        assert_eq!(run.highlight, Some(HighlightColor::Yellow));
    }
}

#[test]
fn test_images_in_unclassified_paragraphs() {
    let body = [
        para_with_runs(None, &image_run()),
        para_with_runs(
            Some("Title"),
            &format!("{}<w:r><w:t>Logo</w:t></w:r>", anchored_image_run()),
        ),
    ]
    .concat();
    let mut package = DocxPackage::from_bytes(docx(&body)).unwrap();
    let elements = Classifier::new().classify(package.document());
    assert_eq!(elements.len(), 1);

    let stats = StyleApplicator::new(&StyleConfig::default())
        .apply(package.document_mut(), &elements)
        .unwrap();
    assert_eq!(stats.images_bordered, 2);
    assert_eq!(stats.runs_formatted, 1);
    assert_eq!(outlines(package.document()).root().count(ns::A, "ln"), 2);
}

#[test]
fn test_repeated_formatting_is_stable() {
    let body = [three_paragraphs(), table_with_image("x")].concat();
    let config = StyleConfig::default();
    let once = format_in_memory(&body, &config);

    let mut twice = DocxPackage::from_bytes(once.to_bytes().unwrap()).unwrap();
    let elements = Classifier::new().classify(twice.document());
    StyleApplicator::new(&config)
        .apply(twice.document_mut(), &elements)
        .unwrap();

    assert_eq!(
        twice.document().to_xml().unwrap(),
        once.document().to_xml().unwrap()
    );
    assert_eq!(outlines(twice.document()).root().count(ns::A, "ln"), 1);
}

#[test]
fn test_other_parts_untouched() {
    let package = format_in_memory(&three_paragraphs(), &StyleConfig::default());
    assert_eq!(
        package.read_part("word/media/image1.png").unwrap().unwrap(),
        IMAGE_BYTES
    );
    assert_eq!(
        package.document().metadata.title.as_deref(),
        Some("Quarterly Report")
    );
    assert_eq!(
        package.document().plain_text(),
        "Annual Report\nOverview\nRevenue grew in every region."
    );
}

#[test]
fn test_stale_elements_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_docx(dir.path(), "short.docx", &para(None, "Only"));
    let output = dir.path().join("out.docx");

    let elements = vec![TypedElement::paragraph(ElementKind::Title, 5)];
    let err = format_file(&input, &elements, &output, &StyleConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Formatting(_)));
    assert!(!output.exists());
}

#[test]
fn test_out_of_range_table_is_skipped() {
    let mut package = DocxPackage::from_bytes(docx(&three_paragraphs())).unwrap();
    let stats = StyleApplicator::new(&StyleConfig::default())
        .apply(package.document_mut(), &[TypedElement::table(3)])
        .unwrap();
    assert_eq!(stats.tables_skipped, 1);
    assert_eq!(stats.tables_formatted, 0);
}

#[test]
fn test_format_bytes() {
    let formatted = format_bytes(docx(&three_paragraphs()), &scenario_config()).unwrap();
    let package = DocxPackage::from_bytes(formatted).unwrap();
    assert_eq!(
        paragraph_runs(package.document(), 0)[0].font.as_deref(),
        Some("Georgia")
    );

    let err = format_bytes(b"not a package".to_vec(), &StyleConfig::default()).unwrap_err();
    assert!(err.is_client_error());

    let bad = StyleConfig::default().with_title_font("Georgia", 0);
    let err = format_bytes(docx(""), &bad).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}
