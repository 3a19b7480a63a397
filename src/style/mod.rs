//! Style application.
//!
//! The applicator re-walks the same top-level paragraph and table
//! collections the classifier walked, looks each position up in a
//! [`PositionIndex`], and edits run properties accordingly:
//!
//! - Paragraph runs get the font family and size of their kind. Headings
//!   are always bold, titles are bold or explicitly not bold per
//!   `bold_titles`, body paragraphs keep their weight.
//! - With highlighting on, paragraph runs get their kind's policy color and
//!   table cell runs get the table color. Table text keeps its font.
//! - Runs carrying pictures are never given text formatting; their pictures
//!   get a border instead, in classified and unclassified paragraphs alike.

mod border;
mod config;

pub use border::{add_image_borders, border_width_emu, EMU_PER_POINT};
pub use config::{
    HighlightPolicy, StyleConfig, DEFAULT_BORDER_PT, MAX_BORDER_PT, MAX_FONT_SIZE,
};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::{ElementKind, PositionIndex, TypedElement};
use crate::error::{Error, Result};
use crate::model::{Document, RunMut};
use crate::package::DocxPackage;

/// Counts of what a formatting pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyStats {
    /// Paragraphs with at least one formatted run
    pub paragraphs_formatted: usize,
    /// Runs given font formatting
    pub runs_formatted: usize,
    /// Runs given a highlight color
    pub runs_highlighted: usize,
    /// Pictures bordered
    pub images_bordered: usize,
    /// Tables visited
    pub tables_formatted: usize,
    /// Table elements past the end of the table collection
    pub tables_skipped: usize,
}

/// Applies a [`StyleConfig`] to classified documents.
#[derive(Debug, Clone, Copy)]
pub struct StyleApplicator<'a> {
    config: &'a StyleConfig,
}

impl<'a> StyleApplicator<'a> {
    /// Create an applicator for a configuration.
    pub fn new(config: &'a StyleConfig) -> Self {
        Self { config }
    }

    /// Format `doc` in place according to `elements`.
    ///
    /// The elements must come from classifying this same tree; a paragraph
    /// position past the end of the paragraph collection fails with
    /// [`Error::StaleIndex`] before anything is changed. An invalid
    /// configuration fails with [`Error::InvalidConfig`].
    pub fn apply(&self, doc: &mut Document, elements: &[TypedElement]) -> Result<ApplyStats> {
        self.config.validate()?;

        let index = PositionIndex::new(elements);
        let paragraph_count = doc.paragraph_count();
        if let Some(max) = index.max_paragraph_index() {
            if max >= paragraph_count {
                return Err(Error::StaleIndex {
                    index: max,
                    paragraphs: paragraph_count,
                });
            }
        }

        let mut stats = ApplyStats::default();
        self.format_paragraphs(doc, &index, &mut stats);
        self.format_tables(doc, &index, &mut stats);

        log::info!(
            "Formatted {} runs in {} paragraphs, highlighted {}, bordered {} images, {} tables ({} skipped)",
            stats.runs_formatted,
            stats.paragraphs_formatted,
            stats.runs_highlighted,
            stats.images_bordered,
            stats.tables_formatted,
            stats.tables_skipped
        );
        Ok(stats)
    }

    fn format_paragraphs(
        &self,
        doc: &mut Document,
        index: &PositionIndex,
        stats: &mut ApplyStats,
    ) {
        let border_pt = self.config.image_border_pt;

        for (para_idx, mut paragraph) in doc.paragraphs_mut().enumerate() {
            let kind = index.paragraph_kind(para_idx);
            let mut touched = false;

            for mut run in paragraph.runs_mut() {
                if run.has_drawing() {
                    stats.images_bordered += add_image_borders(run.element_mut(), border_pt);
                    continue;
                }
                let Some(kind) = kind else {
                    continue;
                };
                self.format_run(&mut run, kind, stats);
                touched = true;
            }

            if touched {
                stats.paragraphs_formatted += 1;
            }
        }
    }

    fn format_run(&self, run: &mut RunMut<'_>, kind: ElementKind, stats: &mut ApplyStats) {
        let Some((font, size)) = self.config.font_for(kind) else {
            return;
        };
        run.set_font_name(font);
        run.set_font_size(size);
        match kind {
            ElementKind::Title => run.set_bold(self.config.bold_titles),
            ElementKind::Heading => run.set_bold(true),
            ElementKind::Paragraph | ElementKind::Table => {}
        }
        stats.runs_formatted += 1;

        if self.config.highlight {
            let policy = &self.config.highlight_colors;
            if let Some(color) = policy.color_for(kind) {
                run.set_highlight(color);
                if policy.clear_text_color {
                    run.clear_color();
                }
                stats.runs_highlighted += 1;
            }
        }
    }

    fn format_tables(&self, doc: &mut Document, index: &PositionIndex, stats: &mut ApplyStats) {
        let border_pt = self.config.image_border_pt;
        let table_color = self
            .config
            .highlight
            .then_some(self.config.highlight_colors.table)
            .flatten();
        let table_count = doc.table_count();

        for &table_idx in index.tables() {
            if table_idx >= table_count {
                log::debug!(
                    "Skipping table {} (document has {} tables)",
                    table_idx,
                    table_count
                );
                stats.tables_skipped += 1;
                continue;
            }
            let Some(mut table) = doc.table_mut(table_idx) else {
                continue;
            };

            for mut run in table.runs_mut() {
                if run.has_drawing() {
                    stats.images_bordered += add_image_borders(run.element_mut(), border_pt);
                } else if let Some(color) = table_color {
                    run.set_highlight(color);
                    stats.runs_highlighted += 1;
                }
            }
            stats.tables_formatted += 1;
        }
    }
}

/// Open `input`, format it, and save the result to `output`.
///
/// Open failures are reported as [`Error::DocumentParse`], failures while
/// formatting or saving as [`Error::Formatting`]. Nothing is written to
/// `output` unless the whole pass succeeds.
pub fn format_file<P, Q>(
    input: P,
    elements: &[TypedElement],
    output: Q,
    config: &StyleConfig,
) -> Result<ApplyStats>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    config.validate()?;
    let mut package = DocxPackage::open(input).map_err(Error::into_parse_error)?;

    StyleApplicator::new(config)
        .apply(package.document_mut(), elements)
        .and_then(|stats| package.save(output.as_ref()).map(|()| stats))
        .map_err(|e| {
            log::error!("Formatting failed: {}", e);
            e.into_formatting_error()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::model::HighlightColor;
    use crate::xml::ns;

    fn document(body: &str) -> Document {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture"><w:body>{body}</w:body></w:document>"#
        );
        Document::parse(xml.as_bytes()).unwrap()
    }

    fn para(style: Option<&str>, runs: &str) -> String {
        let ppr = style
            .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
            .unwrap_or_default();
        format!("<w:p>{ppr}{runs}</w:p>")
    }

    const TEXT_RUN: &str = "<w:r><w:t>text</w:t></w:r>";
    const IMAGE_RUN: &str = r#"<w:r><w:drawing><wp:inline><a:graphic><a:graphicData><pic:pic><pic:spPr/></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#;

    fn scenario_document() -> Document {
        document(
            &[
                para(Some("Title"), TEXT_RUN),
                para(Some("Heading 1"), TEXT_RUN),
                para(None, TEXT_RUN),
            ]
            .concat(),
        )
    }

    fn scenario_config() -> StyleConfig {
        StyleConfig::new()
            .with_title_font("Georgia", 24)
            .with_heading_font("Calibri", 16)
            .with_para_font("Arial", 11)
            .with_bold_titles(true)
            .with_highlight(false)
    }

    #[test]
    fn test_fonts_and_weights() {
        let mut doc = scenario_document();
        let elements = classify(&doc);
        let stats = StyleApplicator::new(&scenario_config())
            .apply(&mut doc, &elements)
            .unwrap();
        assert_eq!(stats.runs_formatted, 3);
        assert_eq!(stats.runs_highlighted, 0);

        let runs: Vec<_> = doc
            .paragraphs()
            .map(|p| p.runs().next().unwrap())
            .collect();
        assert_eq!(runs[0].font_name().as_deref(), Some("Georgia"));
        assert_eq!(runs[0].font_size(), Some(24.0));
        assert_eq!(runs[0].bold(), Some(true));
        assert_eq!(runs[1].font_name().as_deref(), Some("Calibri"));
        assert_eq!(runs[1].font_size(), Some(16.0));
        assert_eq!(runs[1].bold(), Some(true));
        assert_eq!(runs[2].font_name().as_deref(), Some("Arial"));
        assert_eq!(runs[2].font_size(), Some(11.0));
        assert_eq!(runs[2].bold(), None);
        assert!(runs.iter().all(|r| r.highlight().is_none()));
    }

    #[test]
    fn test_title_not_bold() {
        let mut doc = scenario_document();
        let elements = classify(&doc);
        let config = scenario_config().with_bold_titles(false);
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();

        let title = doc.paragraph(0).unwrap().runs().next().unwrap();
        assert_eq!(title.bold(), Some(false));
        let heading = doc.paragraph(1).unwrap().runs().next().unwrap();
        assert_eq!(heading.bold(), Some(true));
    }

    #[test]
    fn test_policy_colors() {
        let mut doc = scenario_document();
        let elements = classify(&doc);
        let config = scenario_config().with_highlight(true);
        let stats = StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();
        assert_eq!(stats.runs_highlighted, 3);

        let colors: Vec<_> = doc
            .paragraphs()
            .map(|p| p.runs().next().unwrap().highlight())
            .collect();
        assert_eq!(
            colors,
            vec![
                Some(HighlightColor::Yellow),
                Some(HighlightColor::Green),
                Some(HighlightColor::LightGray),
            ]
        );
    }

    #[test]
    fn test_missing_policy_color_keeps_highlight() {
        let run = r#"<w:r><w:rPr><w:highlight w:val="cyan"/><w:color w:val="FF0000"/></w:rPr><w:t>x</w:t></w:r>"#;
        let mut doc = document(&para(None, run));
        let elements = classify(&doc);
        let policy = HighlightPolicy {
            paragraph: None,
            ..HighlightPolicy::analyzer()
        };
        let config = StyleConfig::new().with_highlight_colors(policy);
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();

        let run = doc.paragraph(0).unwrap().runs().next().unwrap();
        assert_eq!(run.highlight(), Some(HighlightColor::Cyan));
        assert_eq!(run.color().as_deref(), Some("FF0000"));
    }

    #[test]
    fn test_analyzer_clears_text_color() {
        let run = r#"<w:r><w:rPr><w:color w:val="FF0000"/></w:rPr><w:t>x</w:t></w:r>"#;
        let mut doc = document(&para(Some("Title"), run));
        let elements = classify(&doc);
        let config = StyleConfig::new().with_highlight_colors(HighlightPolicy::analyzer());
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();

        let run = doc.paragraph(0).unwrap().runs().next().unwrap();
        assert_eq!(run.highlight(), Some(HighlightColor::Red));
        assert!(run.color().is_none());
    }

    #[test]
    fn test_image_runs_are_bordered_not_formatted() {
        let body = [
            para(Some("Title"), &[TEXT_RUN, IMAGE_RUN].concat()),
            // Blank paragraphs are never classified but their pictures
            // still get borders.
            para(None, IMAGE_RUN),
        ]
        .concat();
        let mut doc = document(&body);
        let elements = classify(&doc);
        assert_eq!(elements.len(), 1);

        let stats = StyleApplicator::new(&StyleConfig::default())
            .apply(&mut doc, &elements)
            .unwrap();
        assert_eq!(stats.images_bordered, 2);
        assert_eq!(stats.runs_formatted, 1);

        let image_run = doc.paragraph(0).unwrap().runs().nth(1).unwrap();
        assert!(image_run.element().child(ns::W, "rPr").is_none());
    }

    #[test]
    fn test_tables_highlight_only() {
        let cell_run = r#"<w:r><w:rPr><w:rFonts w:ascii="Courier"/><w:sz w:val="20"/></w:rPr><w:t>cell</w:t></w:r>"#;
        let table = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            para(None, cell_run),
            para(None, IMAGE_RUN)
        );
        let mut doc = document(&table);
        let elements = classify(&doc);

        let stats = StyleApplicator::new(&StyleConfig::default())
            .apply(&mut doc, &elements)
            .unwrap();
        assert_eq!(stats.tables_formatted, 1);
        assert_eq!(stats.images_bordered, 1);
        assert_eq!(stats.runs_formatted, 0);

        let table = doc.table(0).unwrap();
        let cell = table.rows().next().unwrap().cells().next().unwrap();
        let run = cell.paragraphs().next().unwrap().runs().next().unwrap();
        assert_eq!(run.highlight(), Some(HighlightColor::Yellow));
        assert_eq!(run.font_name().as_deref(), Some("Courier"));
        assert_eq!(run.font_size(), Some(10.0));
        assert_eq!(run.bold(), None);
    }

    #[test]
    fn test_table_highlight_gated() {
        let table = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            para(None, TEXT_RUN)
        );
        let mut doc = document(&table);
        let elements = classify(&doc);
        let config = StyleConfig::default().with_highlight(false);
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();
        let run = doc.table(0).unwrap().element().find(ns::W, "r").unwrap();
        assert!(run.child(ns::W, "rPr").is_none());
    }

    #[test]
    fn test_out_of_range_table_skipped() {
        let mut doc = document(&para(None, TEXT_RUN));
        let elements = vec![TypedElement::table(4)];
        let stats = StyleApplicator::new(&StyleConfig::default())
            .apply(&mut doc, &elements)
            .unwrap();
        assert_eq!(stats.tables_skipped, 1);
        assert_eq!(stats.tables_formatted, 0);
    }

    #[test]
    fn test_stale_paragraph_index() {
        let mut doc = document(&para(None, TEXT_RUN));
        let before = doc.to_xml().unwrap();
        let elements = vec![
            TypedElement::paragraph(ElementKind::Paragraph, 0),
            TypedElement::paragraph(ElementKind::Title, 7),
        ];
        let err = StyleApplicator::new(&StyleConfig::default())
            .apply(&mut doc, &elements)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::StaleIndex {
                index: 7,
                paragraphs: 1
            }
        ));
        assert_eq!(doc.to_xml().unwrap(), before);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut doc = scenario_document();
        let before = doc.to_xml().unwrap();
        let elements = classify(&doc);
        let config = StyleConfig::new().with_para_font("Arial", u32::MAX);
        let err = StyleApplicator::new(&config)
            .apply(&mut doc, &elements)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert_eq!(doc.to_xml().unwrap(), before);
    }

    #[test]
    fn test_reapplying_is_stable() {
        let mut doc = scenario_document();
        let elements = classify(&doc);
        let config = StyleConfig::default();
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();
        let once = doc.to_xml().unwrap();
        StyleApplicator::new(&config).apply(&mut doc, &elements).unwrap();
        assert_eq!(doc.to_xml().unwrap(), once);
    }
}
