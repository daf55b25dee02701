//! Offline converter: read the PDF text layer and infer Markdown structure.
//!
//! pdfium gives us text objects with a font size and a bounding box. From
//! those we rebuild lines (top-to-bottom, left-to-right), estimate the body
//! font size, and apply a handful of layout rules:
//!
//! - lines set noticeably larger than the body font become headings, the
//!   largest size mapping to `#`
//! - bullet glyphs become `- ` items, `1.` / `1)` prefixes ordered items
//! - lines separated by a small vertical gap are joined into one paragraph
//!
//! Pages without text objects (e.g. text drawn inside form XObjects) fall
//! back to pdfium's flat page text.

use crate::converter::MarkupConverter;
use crate::error::PageError;
use crate::pipeline::extract::ExtractedPage;
use crate::pipeline::postprocess::tidy_markdown;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// A line is a heading when its font is at least this much larger than the body font.
const HEADING_RATIO: f32 = 1.15;

/// Longest line still treated as a heading.
const MAX_HEADING_CHARS: usize = 120;

/// Vertical gap, relative to font size, that starts a new block.
const PARAGRAPH_GAP_RATIO: f32 = 0.6;

/// Deepest heading level emitted.
const MAX_HEADING_LEVEL: usize = 3;

/// Converts a page using its embedded text layer. No network, no API key.
pub struct TextLayerConverter<'a> {
    pdfium: &'a Pdfium,
}

impl<'a> TextLayerConverter<'a> {
    pub fn new(pdfium: &'a Pdfium) -> Self {
        Self { pdfium }
    }
}

impl MarkupConverter for TextLayerConverter<'_> {
    fn name(&self) -> &'static str {
        "text-layer"
    }

    fn to_markup(&self, page: &ExtractedPage) -> Result<String, PageError> {
        let page_num = page.page_num();
        let fail = |detail: String| PageError::ConversionFailed {
            page: page_num,
            detail,
        };

        let document = self
            .pdfium
            .load_pdf_from_file(page.path(), None)
            .map_err(|e| fail(format!("{:?}", e)))?;

        let pages = document.pages();
        if pages.len() != 1 {
            return Err(fail(format!(
                "expected a single-page document, got {} pages",
                pages.len()
            )));
        }
        let pdf_page = pages.get(0).map_err(|e| fail(format!("{:?}", e)))?;

        let runs = collect_runs(&pdf_page);
        let markdown = if runs.is_empty() {
            let text = pdf_page
                .text()
                .map(|t| t.all())
                .map_err(|e| fail(format!("{:?}", e)))?;
            tidy_markdown(&text)
        } else {
            debug!("Page {}: {} text runs", page_num, runs.len());
            render_markdown(runs)
        };

        Ok(markdown)
    }
}

fn collect_runs(page: &PdfPage) -> Vec<TextRun> {
    page.objects()
        .iter()
        .filter_map(|object| {
            let text_object = object.as_text_object()?;
            let text = text_object.text();
            if text.trim().is_empty() {
                return None;
            }
            let bounds = object.bounds().ok()?;
            Some(TextRun {
                text,
                font_size: text_object.scaled_font_size().value,
                left: bounds.left().value,
                top: bounds.top().value,
                bottom: bounds.bottom().value,
            })
        })
        .collect()
}

// ── Layout model ─────────────────────────────────────────────────────────

/// A piece of text with its size and position, in PDF points.
///
/// PDF user space grows upwards, so a larger `top` is higher on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font_size: f32,
    pub left: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug)]
struct Line {
    text: String,
    font_size: f32,
    top: f32,
    bottom: f32,
}

#[derive(Debug)]
enum Block {
    Heading(usize, String),
    Item { text: String, ordered: bool },
    Paragraph(String),
}

static RE_BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[•▪◦●‣∙]\s*|[-*–]\s+)(\S.*)$").unwrap());

static RE_ORDERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3})[.)]\s+(\S.*)$").unwrap());

/// Turn a page's text runs into Markdown.
pub fn render_markdown(runs: Vec<TextRun>) -> String {
    let lines = group_lines(runs);
    if lines.is_empty() {
        return String::new();
    }

    let body = body_font_size(&lines);
    let heading_sizes = heading_sizes(&lines, body);

    let mut blocks: Vec<Block> = Vec::new();
    let mut prev: Option<&Line> = None;

    for line in &lines {
        let close = prev.is_some_and(|p| {
            let gap = p.bottom - line.top;
            gap <= PARAGRAPH_GAP_RATIO * p.font_size.max(line.font_size)
        });
        prev = Some(line);

        let level = heading_sizes
            .iter()
            .position(|&k| k == size_key(line.font_size))
            .filter(|_| line.text.chars().count() <= MAX_HEADING_CHARS)
            .map(|i| (i + 1).min(MAX_HEADING_LEVEL));

        if let Some(level) = level {
            match blocks.last_mut() {
                Some(Block::Heading(l, text)) if close && *l == level => {
                    text.push(' ');
                    text.push_str(&line.text);
                }
                _ => blocks.push(Block::Heading(level, line.text.clone())),
            }
            continue;
        }

        if let Some(caps) = RE_BULLET.captures(&line.text) {
            blocks.push(Block::Item {
                text: format!("- {}", &caps[1]),
                ordered: false,
            });
            continue;
        }

        if let Some(caps) = RE_ORDERED.captures(&line.text) {
            blocks.push(Block::Item {
                text: format!("{}. {}", &caps[1], &caps[2]),
                ordered: true,
            });
            continue;
        }

        match blocks.last_mut() {
            Some(Block::Paragraph(text)) | Some(Block::Item { text, .. }) if close => {
                text.push(' ');
                text.push_str(&line.text);
            }
            _ => blocks.push(Block::Paragraph(escape_line_start(&line.text))),
        }
    }

    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            let tight = matches!(
                (&blocks[i - 1], block),
                (Block::Item { ordered: a, .. }, Block::Item { ordered: b, .. }) if a == b
            );
            out.push_str(if tight { "\n" } else { "\n\n" });
        }
        match block {
            Block::Heading(level, text) => {
                out.push_str(&"#".repeat(*level));
                out.push(' ');
                out.push_str(text);
            }
            Block::Item { text, .. } | Block::Paragraph(text) => out.push_str(text),
        }
    }

    tidy_markdown(&out)
}

fn group_lines(mut runs: Vec<TextRun>) -> Vec<Line> {
    runs.sort_by(|a, b| b.top.total_cmp(&a.top).then(a.left.total_cmp(&b.left)));

    let mut grouped: Vec<Vec<TextRun>> = Vec::new();
    for run in runs {
        match grouped.last_mut() {
            Some(line) if same_line(&line[0], &run) => line.push(run),
            _ => grouped.push(vec![run]),
        }
    }

    grouped
        .into_iter()
        .map(|mut runs| {
            runs.sort_by(|a, b| a.left.total_cmp(&b.left));
            let text = runs
                .iter()
                .map(|r| r.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Line {
                text,
                font_size: runs.iter().map(|r| r.font_size).fold(0.0, f32::max),
                top: runs.iter().map(|r| r.top).fold(f32::MIN, f32::max),
                bottom: runs.iter().map(|r| r.bottom).fold(f32::MAX, f32::min),
            }
        })
        .filter(|line| !line.text.is_empty())
        .collect()
}

fn same_line(anchor: &TextRun, run: &TextRun) -> bool {
    let tolerance = 0.5 * anchor.font_size.max(run.font_size).max(1.0);
    (anchor.top - run.top).abs() <= tolerance
}

/// Font sizes are compared at half-point resolution.
fn size_key(size: f32) -> i32 {
    (size * 2.0).round() as i32
}

/// The font size carrying the most characters; ties go to the smaller size.
fn body_font_size(lines: &[Line]) -> f32 {
    let mut weights: HashMap<i32, usize> = HashMap::new();
    for line in lines {
        *weights.entry(size_key(line.font_size)).or_default() += line.text.chars().count();
    }
    weights
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(key, _)| key as f32 / 2.0)
        .unwrap_or(0.0)
}

/// Size keys that qualify as headings, largest first.
fn heading_sizes(lines: &[Line], body: f32) -> Vec<i32> {
    let threshold = body * HEADING_RATIO;
    let mut keys: Vec<i32> = lines
        .iter()
        .filter(|l| l.font_size > threshold)
        .map(|l| size_key(l.font_size))
        .collect();
    keys.sort_unstable_by(|a, b| b.cmp(a));
    keys.dedup();
    keys
}

/// Keep body text from being read as Markdown structure.
fn escape_line_start(text: &str) -> String {
    if text.starts_with('#') || text.starts_with('>') {
        format!("\\{text}")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, font_size: f32, left: f32, top: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_size,
            left,
            top,
            bottom: top - font_size,
        }
    }

    #[test]
    fn headings_paragraphs_and_lists() {
        let runs = vec![
            run("Annual Report", 24.0, 72.0, 800.0),
            run("This is the first", 11.0, 72.0, 740.0),
            run("line of text.", 11.0, 72.0, 727.0),
            run("• Apples", 11.0, 72.0, 690.0),
            run("• Pears", 11.0, 72.0, 677.0),
            run("1. Step one", 11.0, 72.0, 640.0),
        ];
        assert_eq!(
            render_markdown(runs),
            "# Annual Report\n\nThis is the first line of text.\n\n- Apples\n- Pears\n\n1. Step one\n"
        );
    }

    #[test]
    fn runs_on_one_line_are_ordered_left_to_right() {
        let runs = vec![
            run("world", 11.0, 110.0, 700.5),
            run("Hello", 11.0, 72.0, 700.0),
        ];
        assert_eq!(render_markdown(runs), "Hello world\n");
    }

    #[test]
    fn heading_levels_follow_size_rank() {
        let runs = vec![
            run("Title", 24.0, 72.0, 800.0),
            run("Section", 16.0, 72.0, 740.0),
            run("Body text that is long enough to dominate.", 10.0, 72.0, 700.0),
        ];
        let md = render_markdown(runs);
        assert!(md.starts_with("# Title\n\n## Section\n\n"), "got: {md:?}");
    }

    #[test]
    fn heading_depth_stops_at_three() {
        let runs = vec![
            run("One", 30.0, 72.0, 800.0),
            run("Two", 26.0, 72.0, 740.0),
            run("Three", 22.0, 72.0, 680.0),
            run("Four", 18.0, 72.0, 620.0),
            run("Five", 14.0, 72.0, 560.0),
            run("Body text that is long enough to set the body size.", 10.0, 72.0, 500.0),
        ];
        let md = render_markdown(runs);
        assert!(!md.contains("####"), "got: {md:?}");
        assert!(md.contains("### Three\n\n### Four\n\n### Five\n\n"), "got: {md:?}");
    }

    #[test]
    fn wrapped_heading_is_merged() {
        let runs = vec![
            run("A Very Long", 20.0, 72.0, 800.0),
            run("Title", 20.0, 72.0, 778.0),
            run("Plenty of body text on this page.", 10.0, 72.0, 700.0),
        ];
        assert!(render_markdown(runs).starts_with("# A Very Long Title\n"));
    }

    #[test]
    fn list_item_continuation_is_joined() {
        let runs = vec![
            run("- first item that", 11.0, 72.0, 700.0),
            run("wraps onto a second line", 11.0, 84.0, 687.0),
        ];
        assert_eq!(render_markdown(runs), "- first item that wraps onto a second line\n");
    }

    #[test]
    fn hash_in_body_is_escaped() {
        let runs = vec![run("#1 best seller", 11.0, 72.0, 700.0)];
        assert_eq!(render_markdown(runs), "\\#1 best seller\n");
    }

    #[test]
    fn negative_number_is_not_a_bullet() {
        let runs = vec![run("-5 degrees overnight", 11.0, 72.0, 700.0)];
        assert_eq!(render_markdown(runs), "-5 degrees overnight\n");
    }

    #[test]
    fn no_runs_gives_empty_markdown() {
        assert_eq!(render_markdown(Vec::new()), "");
        assert_eq!(render_markdown(vec![run("   ", 11.0, 72.0, 700.0)]), "");
    }

    #[test]
    fn body_size_prefers_most_text() {
        let lines = vec![
            Line { text: "Big".into(), font_size: 18.0, top: 0.0, bottom: 0.0 },
            Line { text: "lots of small text".into(), font_size: 9.0, top: 0.0, bottom: 0.0 },
        ];
        assert_eq!(body_font_size(&lines), 9.0);
    }
}
