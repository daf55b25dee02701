//! Page rasterisation for the vision converter.
//!
//! The image is sized from the page's physical width at the configured DPI,
//! then capped so neither edge exceeds `max_rendered_pixels`.

use crate::config::VisionOptions;
use crate::error::PageError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

/// Render the only page of the single-page PDF at `path`.
pub fn render_single_page(
    pdfium: &Pdfium,
    path: &Path,
    page_num: usize,
    options: &VisionOptions,
) -> Result<DynamicImage, PageError> {
    let fail = |detail: String| PageError::RenderFailed {
        page: page_num,
        detail,
    };

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| fail(format!("{:?}", e)))?;
    let page = document
        .pages()
        .get(0)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let target_width = target_width_px(page.width().value, options.dpi, options.max_rendered_pixels);
    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width as i32)
        .set_maximum_height(options.max_rendered_pixels as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| fail(format!("{:?}", e)))?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Pixel width for a page `width_pt` points wide at `dpi`, capped at `max_px`.
fn target_width_px(width_pt: f32, dpi: u32, max_px: u32) -> u32 {
    let px = (width_pt / 72.0 * dpi as f32).round();
    if !px.is_finite() || px < 1.0 {
        return max_px;
    }
    (px as u32).min(max_px)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letter_page_at_150_dpi() {
        // 8.5in × 72pt
        assert_eq!(target_width_px(612.0, 150, 2000), 1275);
    }

    #[test]
    fn wide_page_is_capped() {
        assert_eq!(target_width_px(2384.0, 150, 2000), 2000);
    }

    #[test]
    fn degenerate_width_falls_back_to_cap() {
        assert_eq!(target_width_px(0.0, 150, 1500), 1500);
        assert_eq!(target_width_px(f32::NAN, 150, 1500), 1500);
    }
}
