//! Post-processing: deterministic cleanup of converter output.
//!
//! Both converters finish with these passes. VLM replies additionally get
//! their outer ```` ```markdown ```` fence stripped, since models wrap the
//! answer in one despite the prompt. Each rule is a pure `&str → String`
//! function and is tested on its own.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule only sees `\n`;
//! the final-newline pass runs last.

use once_cell::sync::Lazy;
use regex::Regex;

/// Cleanup for VLM output: strip outer fences, then [`tidy_markdown`].
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = strip_markdown_fences(&s);
    tidy_markdown(&s)
}

/// Cleanup shared by all converters.
///
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Trim trailing whitespace per line
/// 4. Ensure a blank line before headings
/// 5. Collapse runs of blank lines
/// 6. End with exactly one newline
pub fn tidy_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = space_headings(&s);
    let s = collapse_blank_lines(&s);
    ensure_final_newline(&s)
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?[ \t]*\n(.*)\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    match RE_OUTER_FENCES.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input.replace(['\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}'], "")
}

fn trim_trailing_whitespace(input: &str) -> String {
    input.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6} \S").unwrap());

fn space_headings(input: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in input.lines() {
        if RE_HEADING.is_match(line) && out.last().is_some_and(|prev| !prev.is_empty()) {
            out.push("");
        }
        out.push(line);
    }
    out.join("\n")
}

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").into_owned()
}

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        assert_eq!(strip_markdown_fences("```markdown\n# Hello\nWorld\n```"), "# Hello\nWorld");
        assert_eq!(strip_markdown_fences("```\n# Hello\n```\n"), "# Hello");
    }

    #[test]
    fn inner_code_blocks_survive() {
        let input = "Intro\n\n```rust\nfn main() {}\n```\n";
        assert_eq!(strip_markdown_fences(input), input);
    }

    #[test]
    fn line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(remove_invisible_chars("he\u{200B}llo\u{FEFF} wor\u{00AD}ld"), "hello world");
    }

    #[test]
    fn heading_gets_blank_line_before() {
        assert_eq!(space_headings("text\n# Title\nbody"), "text\n\n# Title\nbody");
        assert_eq!(space_headings("# Title\nbody"), "# Title\nbody");
        // `#hashtag` is not a heading
        assert_eq!(space_headings("a\n#tag"), "a\n#tag");
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn final_newline() {
        assert_eq!(ensure_final_newline("x\n\n\n"), "x\n");
        assert_eq!(ensure_final_newline("   \n"), "");
    }

    #[test]
    fn clean_pipeline() {
        let raw = "```markdown\r\n# Title   \r\nSome text\r\n\r\n\r\n\r\n## Next\r\n```";
        assert_eq!(clean_markdown(raw), "# Title\nSome text\n\n## Next\n");
    }
}
