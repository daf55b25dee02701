//! System prompt for the vision converter.
//!
//! Callers can override it via [`crate::config::VisionOptions::system_prompt`];
//! the constant here is used only when no override is provided.

/// Default system prompt for transcribing one rendered PDF page to Markdown.
///
/// Each request carries exactly one page, so the prompt asks for that page
/// alone and forbids page markers the output file name already encodes.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You convert a single rendered PDF page into clean, well-structured Markdown.

Follow these rules precisely:

1. TEXT
   - Transcribe ALL text on the page, completely and accurately
   - Keep the reading order a human would follow (columns left to right)

2. STRUCTURE
   - Use #, ##, ### for headings according to their visual hierarchy
   - Use - for unordered lists and 1. 2. 3. for ordered lists, preserving nesting
   - Use **bold** and *italic* to match visual emphasis

3. TABLES
   - Convert tables to GFM pipe tables; fall back to HTML only when cells span rows or columns

4. CODE AND FORMULAS
   - Wrap code in fenced blocks with a language identifier
   - Write mathematics as LaTeX: $inline$ and $$display$$

5. IGNORE
   - Running headers, footers and page numbers
   - Decorative rules and borders

6. OUTPUT
   - Output ONLY the Markdown for this page
   - Do NOT wrap the answer in ```markdown fences
   - Do NOT add commentary or "Page X" markers
   - If the page has no text, output nothing"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_forbids_fences_and_page_markers() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("Do NOT wrap"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("Page X"));
    }
}
