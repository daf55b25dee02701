//! Pipeline stages for splitting a PDF into per-page Markdown files.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ engine ──▶ document ──▶ extract ──▶ (converter) ──▶ write
//! (checks)  (pdfium)   (open)       (1 page)                   (page_NNN.md)
//! ```
//!
//! 1. [`input`]    validate the source file and prepare the output directory
//! 2. [`engine`]   bind the pdfium shared library
//! 3. [`document`] open the source document and hand out pages one by one
//! 4. [`extract`]  copy one page into a temporary single-page PDF
//! 5. [`write`]    persist the Markdown for one page
//!
//! The vision converter additionally uses [`render`], [`encode`] and [`llm`];
//! both converters share [`postprocess`].

pub mod document;
pub mod encode;
pub mod engine;
pub mod extract;
pub mod input;
pub mod llm;
pub mod postprocess;
pub mod render;
pub mod write;
