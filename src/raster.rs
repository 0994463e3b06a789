//! PNG rasterization of the live document.
//!
//! Renders at twice the configured display size onto an opaque background
//! (dark or light per presentation mode), then encodes RGBA8 PNG.

use image::ImageEncoder as _;

use crate::config::DisplayOptions;
use crate::error::{InkflowError, InkflowResult};

pub const RASTER_SCALE: u32 = 2;

/// Opaque backdrop per presentation mode.
pub const DARK_BACKGROUND_RGB: [u8; 3] = [0x1f, 0x29, 0x37];
pub const LIGHT_BACKGROUND_RGB: [u8; 3] = [0xff, 0xff, 0xff];

pub fn render_png(svg_text: &str, display: &DisplayOptions) -> InkflowResult<Vec<u8>> {
    display.validate()?;

    let tree = usvg::Tree::from_str(svg_text, &usvg::Options::default())
        .map_err(|e| InkflowError::export(format!("svg is not renderable: {e}")))?;

    let px = display.size_px * RASTER_SCALE;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(px, px)
        .ok_or_else(|| InkflowError::export("failed to allocate raster pixmap"))?;

    let [r, g, b] = if display.dark_mode {
        DARK_BACKGROUND_RGB
    } else {
        LIGHT_BACKGROUND_RGB
    };
    pixmap.fill(resvg::tiny_skia::Color::from_rgba8(r, g, b, 255));

    // Stretch the document onto the square canvas, matching the preview
    // surface's sizing.
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(InkflowError::export("svg has invalid width/height"));
    }
    let sx = px as f32 / size.width();
    let sy = px as f32 / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let rgba: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();

    let mut out = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut out);
    encoder
        .write_image(&rgba, px, px, image::ExtendedColorType::Rgba8)
        .map_err(|e| InkflowError::export(format!("png encode failed: {e}")))?;
    Ok(out)
}
